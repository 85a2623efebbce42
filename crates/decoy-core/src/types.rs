//! Fundamental geometric, identity, and simulation-time types.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Simulation-wide identifier of a synthetic return.
pub type BlipId = u64;

/// Identifier of a real object (target) in the host simulation.
pub type ObjectId = u64;

/// Identifier of a platform (site, jammer carrier, or target carrier).
pub type PlatformId = u32;

/// Identifier of a sensor on a platform.
pub type SensorId = u32;

/// Identifier of one jammer transmitter channel.
pub type ChannelId = u32;

/// Arena key of a false-target generator.
pub type GeneratorId = u32;

/// Arena key of a screener.
pub type ScreenerId = u32;

/// Arena key of a fusion center.
pub type FusionId = u32;

/// Opaque handle returned by a track store.
pub type TrackHandle = u64;

/// A (site, sensor) pair identifying one observer of a blip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObserverKey {
    pub site: PlatformId,
    pub sensor: SensorId,
}

impl ObserverKey {
    pub fn new(site: PlatformId, sensor: SensorId) -> Self {
        Self { site, sensor }
    }
}

impl std::fmt::Display for ObserverKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.site, self.sensor)
    }
}

/// 3D position in simulation space (meters, Cartesian).
/// x = East, y = North, z = Up (altitude).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// 3D velocity in simulation space (m/s).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current step number (increments by 1 each step).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Range to another position in meters (3D distance).
    pub fn range_to(&self, other: &Position) -> f64 {
        (other.as_dvec3() - self.as_dvec3()).length()
    }

    /// Horizontal range (ignoring altitude).
    pub fn horizontal_range_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Bearing to another position in radians (0 = North, clockwise).
    pub fn bearing_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx.atan2(dy).rem_euclid(std::f64::consts::TAU)
    }

    /// Offset by a north/east/up displacement in meters.
    pub fn offset_ned(&self, north: f64, east: f64, up: f64) -> Position {
        Position::new(self.x + east, self.y + north, self.z + up)
    }

    /// Translate by `velocity * dt`.
    pub fn advanced(&self, velocity: &Velocity, dt: f64) -> Position {
        Position::from_dvec3(self.as_dvec3() + velocity.as_dvec3() * dt)
    }

    pub fn as_dvec3(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    pub fn from_dvec3(v: DVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl Velocity {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Horizontal velocity from speed (m/s) and heading (radians, 0 = North, clockwise).
    pub fn from_speed_heading(speed: f64, heading: f64) -> Self {
        Self::new(speed * heading.sin(), speed * heading.cos(), 0.0)
    }

    /// Speed magnitude (m/s).
    pub fn speed(&self) -> f64 {
        self.as_dvec3().length()
    }

    /// Horizontal speed (ignoring vertical component).
    pub fn horizontal_speed(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Heading in radians (0 = North, clockwise).
    pub fn heading(&self) -> f64 {
        self.x.atan2(self.y).rem_euclid(std::f64::consts::TAU)
    }

    pub fn as_dvec3(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }
}

impl SimTime {
    /// Advance by one step of `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.elapsed_secs += dt;
    }
}

/// Kinematic state of a platform or blip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub position: Position,
    pub velocity: Velocity,
}

impl Kinematics {
    pub fn new(position: Position, velocity: Velocity) -> Self {
        Self { position, velocity }
    }

    pub fn stationary(position: Position) -> Self {
        Self {
            position,
            velocity: Velocity::default(),
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.horizontal_speed()
    }

    pub fn heading(&self) -> f64 {
        self.velocity.heading()
    }
}

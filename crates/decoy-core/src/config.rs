//! Configuration for generators, screeners, and fusion centers.
//!
//! All structs deserialize with defaults for missing fields and are checked
//! with `validate()` before the pipeline uses them. Angles are radians,
//! ranges meters, times seconds.

use std::collections::HashSet;
use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::*;
use crate::error::{ConfigError, ConfigResult};
use crate::types::{PlatformId, Position};

/// A closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn check(&self, name: &'static str) -> ConfigResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ConfigError::InvalidExtent {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Fixed point around which blips are placed, optionally drifting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceCentroid {
    pub position: Position,
    /// Drift speed (m/s).
    pub speed: f64,
    /// Drift heading (radians, 0 = North).
    pub heading: f64,
}

/// Settings of one false-target generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Used in blip names and as the stable key for platform-consistent placement.
    pub name: String,
    /// Blips placed per jammer channel per scan.
    pub quantity: usize,
    pub scan_interval: f64,
    /// Fraction of a consistent population that survives each scan.
    pub persistence: f64,
    /// Blips nearer to a radar than the jammer are never detectable by it.
    pub range_constrained: bool,
    pub blip_behavior: BlipBehavior,
    pub radar_behavior: RadarBehavior,
    pub platform_behavior: PlatformBehavior,
    pub bearing_reference: BearingReference,
    pub range_distribution: RangeDistribution,
    pub blip_reference: BlipReference,
    /// Azimuth sectors relative to the bearing reference. One full-circle
    /// extent gives circular placement, several give sectored placement.
    pub azimuth_extents: Vec<Extent>,
    /// Radial bands from the centroid.
    pub range_extents: Vec<Extent>,
    pub blip_speeds: Extent,
    pub blip_headings: Extent,
    /// Placement centre. When absent the jammer's position at scan time is used.
    pub centroid: Option<ReferenceCentroid>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            name: String::from("false_target"),
            quantity: 0,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            persistence: DEFAULT_PERSISTENCE,
            range_constrained: false,
            blip_behavior: BlipBehavior::default(),
            radar_behavior: RadarBehavior::default(),
            platform_behavior: PlatformBehavior::default(),
            bearing_reference: BearingReference::default(),
            range_distribution: RangeDistribution::default(),
            blip_reference: BlipReference::default(),
            azimuth_extents: vec![Extent::new(-PI, PI)],
            range_extents: Vec::new(),
            blip_speeds: Extent::default(),
            blip_headings: Extent::default(),
            centroid: None,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        check_positive("scan_interval", self.scan_interval)?;
        check_ratio("persistence", self.persistence)?;
        for extent in &self.azimuth_extents {
            extent.check("azimuth")?;
        }
        for extent in &self.range_extents {
            extent.check("range")?;
            if extent.min < 0.0 {
                return Err(ConfigError::InvalidExtent {
                    name: "range",
                    min: extent.min,
                    max: extent.max,
                });
            }
        }
        self.blip_speeds.check("blip_speeds")?;
        self.blip_headings.check("blip_headings")?;

        if self.quantity > 0 {
            if self.azimuth_extents.is_empty() {
                return Err(ConfigError::MissingExtent { name: "azimuth" });
            }
            if self.range_extents.is_empty() {
                return Err(ConfigError::MissingExtent { name: "range" });
            }
        }

        if self.radar_behavior == RadarBehavior::RandomToMultipleRadars
            && self.platform_behavior == PlatformBehavior::ConsistentToMultiplePlatforms
        {
            return Err(ConfigError::IncompatibleBehaviors);
        }
        if self.radar_behavior == RadarBehavior::ConsistentToMultipleRadars
            && self.centroid.is_none()
        {
            return Err(ConfigError::MissingCentroid);
        }
        Ok(())
    }
}

/// Rejection ratios keyed by scan-to-scan behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlipRatios {
    pub random_scan_to_scan: f64,
    pub consistent_scan_to_scan: f64,
}

impl BlipRatios {
    pub fn get(&self, behavior: BlipBehavior) -> f64 {
        match behavior {
            BlipBehavior::RandomScanToScan => self.random_scan_to_scan,
            BlipBehavior::ConsistentScanToScan => self.consistent_scan_to_scan,
        }
    }

    pub fn any(&self) -> bool {
        self.random_scan_to_scan > 0.0 || self.consistent_scan_to_scan > 0.0
    }

    fn check(&self, name: &'static str) -> ConfigResult<()> {
        check_ratio(name, self.random_scan_to_scan)?;
        check_ratio(name, self.consistent_scan_to_scan)
    }
}

/// Rejection ratios keyed by multi-radar behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarRatios {
    pub random_to_multiple_radars: f64,
    pub consistent_to_multiple_radars: f64,
}

impl RadarRatios {
    pub fn get(&self, behavior: RadarBehavior) -> f64 {
        match behavior {
            RadarBehavior::RandomToMultipleRadars => self.random_to_multiple_radars,
            RadarBehavior::ConsistentToMultipleRadars => self.consistent_to_multiple_radars,
        }
    }
}

/// Policy for real targets that must bypass capacity gating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceTrackConfig {
    pub range_force: RangeForce,
    /// Width of the azimuth window centred on the target.
    pub sector_arc: f64,
    /// Half-width of the range window centred on the target. `None` is unbounded.
    pub force_range: Option<f64>,
    /// Force when at most this many false tracks share the window. 0 disables.
    pub count_per_sector: usize,
    /// Only false tracks with J/S in `[1/t, t]` count. `None` admits any J/S.
    pub jtos_delta_threshold: Option<f64>,
}

impl Default for ForceTrackConfig {
    fn default() -> Self {
        Self {
            range_force: RangeForce::None,
            sector_arc: TAU,
            force_range: None,
            count_per_sector: 0,
            jtos_delta_threshold: None,
        }
    }
}

impl ForceTrackConfig {
    /// True when either the azimuth or the range window is narrower than everything.
    pub fn has_window(&self) -> bool {
        (TAU - self.sector_arc) > FULL_CIRCLE_TOLERANCE || self.force_range.is_some()
    }

    fn check(&self) -> ConfigResult<()> {
        if !(0.0..=TAU).contains(&self.sector_arc) {
            return Err(ConfigError::InvalidExtent {
                name: "sector_arc",
                min: 0.0,
                max: self.sector_arc,
            });
        }
        if let Some(range) = self.force_range {
            check_positive("force_range", range)?;
        }
        if let Some(threshold) = self.jtos_delta_threshold {
            check_positive("jtos_delta_threshold", threshold)?;
        }
        Ok(())
    }
}

/// Settings of one per-site screener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    pub plot_capacity: usize,
    pub track_capacity: usize,
    pub transfer_capacity: usize,
    /// When flooded, keep reporting up to transfer capacity instead of cutting off.
    pub track_reporting_when_flooded: bool,
    /// Update on request only, rather than once per frame.
    pub request_based_tracking: bool,
    /// Sensor frame period used by `needs_update`.
    pub frame_time: f64,
    /// Applied once when a generator hands over a fresh population.
    pub initial_rejection: BlipRatios,
    /// Applied to detected blips every cycle.
    pub rejection: BlipRatios,
    pub force: ForceTrackConfig,
    /// Whether the sensor reports SNR (enables the J/S window check).
    pub reports_signal_to_noise: bool,
    pub overload_multiple: usize,
    pub plot_multiple: usize,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            plot_capacity: DEFAULT_SCREENER_PLOT_CAPACITY,
            track_capacity: DEFAULT_SCREENER_TRACK_CAPACITY,
            transfer_capacity: DEFAULT_TRANSFER_CAPACITY,
            track_reporting_when_flooded: true,
            request_based_tracking: false,
            frame_time: DEFAULT_FRAME_TIME,
            initial_rejection: BlipRatios::default(),
            rejection: BlipRatios::default(),
            force: ForceTrackConfig::default(),
            reports_signal_to_noise: true,
            overload_multiple: DEFAULT_OVERLOAD_MULTIPLE,
            plot_multiple: DEFAULT_PLOT_MULTIPLE,
        }
    }
}

impl ScreenerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        check_capacity("plot_capacity", self.plot_capacity)?;
        check_capacity("track_capacity", self.track_capacity)?;
        if self.transfer_capacity > self.track_capacity {
            return Err(ConfigError::TransferExceedsTrack {
                transfer: self.transfer_capacity,
                track: self.track_capacity,
            });
        }
        check_positive("frame_time", self.frame_time)?;
        self.initial_rejection.check("initial_rejection")?;
        self.rejection.check("rejection")?;
        self.force.check()?;
        check_capacity("overload_multiple", self.overload_multiple)?;
        check_capacity("plot_multiple", self.plot_multiple)
    }
}

/// Settings of one multi-site fusion center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub frame_time: f64,
    pub track_capacity: usize,
    pub plot_capacity: usize,
    pub rejection: RadarRatios,
    /// Platforms whose screeners may register.
    pub valid_sites: Vec<PlatformId>,
    /// Only objects seen by every registered site are fusible.
    pub consistency_constrained: bool,
    pub overload_multiple: usize,
    pub plot_multiple: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            frame_time: DEFAULT_FRAME_TIME,
            track_capacity: DEFAULT_FUSION_TRACK_CAPACITY,
            plot_capacity: DEFAULT_FUSION_PLOT_CAPACITY,
            rejection: RadarRatios::default(),
            valid_sites: Vec::new(),
            consistency_constrained: true,
            overload_multiple: DEFAULT_OVERLOAD_MULTIPLE,
            plot_multiple: DEFAULT_PLOT_MULTIPLE,
        }
    }
}

impl FusionConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        check_positive("frame_time", self.frame_time)?;
        check_capacity("track_capacity", self.track_capacity)?;
        check_capacity("plot_capacity", self.plot_capacity)?;
        check_ratio(
            "random_to_multiple_radars",
            self.rejection.random_to_multiple_radars,
        )?;
        check_ratio(
            "consistent_to_multiple_radars",
            self.rejection.consistent_to_multiple_radars,
        )?;
        check_capacity("overload_multiple", self.overload_multiple)?;
        check_capacity("plot_multiple", self.plot_multiple)?;

        let mut seen = HashSet::new();
        for site in &self.valid_sites {
            if !seen.insert(*site) {
                return Err(ConfigError::DuplicateSite(*site));
            }
        }
        Ok(())
    }
}

fn check_ratio(name: &'static str, value: f64) -> ConfigResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::RatioOutOfRange { name, value });
    }
    Ok(())
}

fn check_positive(name: &'static str, value: f64) -> ConfigResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ConfigError::NotPositive { name, value });
    }
    Ok(())
}

fn check_capacity(name: &'static str, value: usize) -> ConfigResult<()> {
    if value == 0 {
        return Err(ConfigError::ZeroCapacity { name });
    }
    Ok(())
}

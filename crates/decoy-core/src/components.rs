//! Data carried by blips and by the platform entities of the engine world.
//!
//! Blips are plain data owned by their generator. The platform components
//! are attached to hecs entities; they hold ids into the engine's arenas,
//! never references.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::STRONG_THRESHOLD_FACTOR;
use crate::enums::{BlipBehavior, BlipStrength};
use crate::interaction::{failure, Interaction, Observer};
use crate::types::*;

/// What one observer measured for a blip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub signal_to_noise: f64,
    pub range_to_observer: f64,
    pub equivalent_radar_cross_section: f64,
    pub jammer_to_observer_range: f64,
    pub strength: BlipStrength,
    /// Apparent displacement relative to the nearest observer's view (m, x/y/z).
    pub location_delta: [f64; 3],
    /// Simulation time of the evaluation that wrote this record.
    pub evaluated_at: f64,
}

/// A single synthetic return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blip {
    pub id: BlipId,
    pub name: String,
    pub generator_id: GeneratorId,
    pub channel_id: ChannelId,
    pub behavior: BlipBehavior,
    pub kinematics: Kinematics,
    pub per_observer: BTreeMap<ObserverKey, ObservationRecord>,
}

impl Blip {
    pub fn new(
        id: BlipId,
        name: String,
        generator_id: GeneratorId,
        channel_id: ChannelId,
        behavior: BlipBehavior,
        kinematics: Kinematics,
    ) -> Self {
        Self {
            id,
            name,
            generator_id,
            channel_id,
            behavior,
            kinematics,
            per_observer: BTreeMap::new(),
        }
    }

    pub fn position(&self) -> Position {
        self.kinematics.position
    }

    pub fn observation(&self, key: &ObserverKey) -> Option<&ObservationRecord> {
        self.per_observer.get(key)
    }

    /// Strength for an observer; an observer with no record sees nothing.
    pub fn strength(&self, key: &ObserverKey) -> BlipStrength {
        self.per_observer
            .get(key)
            .map(|record| record.strength)
            .unwrap_or(BlipStrength::Undetected)
    }

    /// Store an observer's evaluation and classify the blip's strength for it.
    ///
    /// Strong needs twice the threshold, Weak the threshold itself; any veto
    /// failure bit means Undetected. With `range_constrained`, a blip no
    /// farther from the observer than the jammer is always Undetected.
    pub fn record_observation(
        &mut self,
        observer: &Observer,
        interaction: &Interaction,
        jammer_position: &Position,
        range_constrained: bool,
        sim_time: f64,
    ) -> BlipStrength {
        let jammer_range = jammer_position.range_to(&observer.position);
        let threshold = observer.detection_threshold;

        let mut strength = BlipStrength::Undetected;
        if interaction.detectable && interaction.failure_reasons & failure::BLIP_VETO == 0 {
            if interaction.signal_to_noise >= STRONG_THRESHOLD_FACTOR * threshold {
                strength = BlipStrength::Strong;
            } else if interaction.signal_to_noise >= threshold {
                strength = BlipStrength::Weak;
            }
        }
        if range_constrained && interaction.range <= jammer_range {
            strength = BlipStrength::Undetected;
        }

        self.per_observer.insert(
            observer.key,
            ObservationRecord {
                signal_to_noise: interaction.signal_to_noise,
                range_to_observer: interaction.range,
                equivalent_radar_cross_section: interaction.equivalent_rcs,
                jammer_to_observer_range: jammer_range,
                strength,
                location_delta: [0.0; 3],
                evaluated_at: sim_time,
            },
        );
        self.refresh_location_deltas(jammer_position, observer);
        strength
    }

    /// Jammer-to-observer range of the closest observer on record.
    pub fn reference_jammer_range(&self) -> f64 {
        self.per_observer
            .values()
            .map(|record| record.jammer_to_observer_range)
            .fold(f64::INFINITY, f64::min)
    }

    // The delta for each observer is half its extra jammer range, along the
    // jammer-to-observer line.
    fn refresh_location_deltas(&mut self, jammer_position: &Position, observer: &Observer) {
        let reference = self.reference_jammer_range();
        if !reference.is_finite() {
            return;
        }
        if let Some(record) = self.per_observer.get_mut(&observer.key) {
            let unit =
                (observer.position.as_dvec3() - jammer_position.as_dvec3()).normalize_or_zero();
            let delta = unit * ((record.jammer_to_observer_range - reference) / 2.0);
            record.location_delta = delta.to_array();
        }
    }

    /// Mark the blip as unseen by an observer without forgetting the record.
    pub fn undetect(&mut self, key: &ObserverKey) {
        if let Some(record) = self.per_observer.get_mut(key) {
            record.strength = BlipStrength::Undetected;
        }
    }

    pub fn forget_observer(&mut self, key: &ObserverKey) {
        self.per_observer.remove(key);
    }

    /// Drop records written before `cutoff`.
    pub fn prune_observations(&mut self, cutoff: f64) {
        self.per_observer.retain(|_, record| record.evaluated_at >= cutoff);
    }

    /// Lowest SNR among the given observers that have a record.
    pub fn minimum_signal_to_noise(&self, keys: &[ObserverKey]) -> Option<f64> {
        keys.iter()
            .filter_map(|key| self.per_observer.get(key))
            .map(|record| record.signal_to_noise)
            .reduce(f64::min)
    }
}

// --- Engine world components ---

/// Identity of a platform entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: PlatformId,
    pub name: String,
}

/// A radar mode on a platform, screened by one screener.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadarSite {
    pub sensor: SensorId,
    pub screener: ScreenerId,
    /// Whether the radar mode is currently selected and turned on.
    pub mode_on: bool,
    pub detection_threshold: f64,
}

/// One jammer transmitter channel driving one generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JammerChannel {
    pub channel: ChannelId,
    pub generator: GeneratorId,
    pub power: f64,
    pub emitting: bool,
}

/// The jammer transmitters carried by a platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Jammer {
    pub channels: Vec<JammerChannel>,
}

/// A real object that radars may track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealTarget {
    pub object_id: ObjectId,
    pub rcs: f64,
}

//! Generator settings derived from the jammed radar.
//!
//! A false-target effect fills in whatever the generator configuration
//! leaves open from the victim radar's parameters: scan interval from its
//! frame time, placement range from its unambiguous range or horizon, and
//! population size from the jammer's pulse density.

use serde::{Deserialize, Serialize};
use tracing::debug;

use decoy_core::config::{Extent, GeneratorConfig, ReferenceCentroid};
use decoy_core::constants::{
    DEFAULT_CENTROID_ALTITUDE, EARTH_RADIUS, EFFECTIVE_EARTH_FACTOR, SPEED_OF_LIGHT,
};
use decoy_core::enums::*;
use decoy_core::types::Position;

/// Victim radar parameters the effect reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarParameters {
    pub location: Position,
    /// Frame (revisit) time in seconds.
    pub frame_time: f64,
    /// Antenna maximum range in meters. `None` is unlimited.
    pub antenna_max_range: Option<f64>,
    /// Pulse repetition interval (s). Zero for continuous wave.
    pub pulse_repetition_interval: f64,
    /// Pulse width (s).
    pub pulse_width: f64,
    /// Pulses integrated per detection when the receiver uses a detector.
    pub pulses_integrated: Option<f64>,
    /// Dwell time (s) of a tracking mode; scanning modes leave this unset.
    pub dwell_time: Option<f64>,
    /// Azimuth beamwidth and scan width (radians) for time-on-target.
    pub azimuth_beamwidth: f64,
    pub azimuth_scan_width: f64,
    pub earth_radius_multiplier: f64,
    pub frequency_agile: bool,
}

impl Default for RadarParameters {
    fn default() -> Self {
        Self {
            location: Position::default(),
            frame_time: 10.0,
            antenna_max_range: None,
            pulse_repetition_interval: 0.0,
            pulse_width: 0.0,
            pulses_integrated: None,
            dwell_time: None,
            azimuth_beamwidth: 0.0,
            azimuth_scan_width: std::f64::consts::TAU,
            earth_radius_multiplier: EFFECTIVE_EARTH_FACTOR,
            frequency_agile: false,
        }
    }
}

impl RadarParameters {
    fn pulse_repetition_frequency(&self) -> f64 {
        if self.pulse_repetition_interval > 0.0 {
            self.pulse_repetition_interval.recip()
        } else {
            0.0
        }
    }

    /// Pulses the receiver integrates on one target. One for continuous wave.
    pub fn integrated_pulse_count(&self) -> f64 {
        if let Some(count) = self.pulses_integrated {
            return count.max(1.0);
        }
        let prf = self.pulse_repetition_frequency();
        if prf <= 0.0 {
            return 1.0;
        }
        let time_on_target = match self.dwell_time {
            Some(dwell) => dwell,
            None if self.azimuth_scan_width > 0.0 => {
                self.frame_time * self.azimuth_beamwidth / self.azimuth_scan_width
            }
            None => 0.0,
        };
        (time_on_target * prf).max(1.0)
    }

    /// Farthest range at which a false target can be placed.
    pub fn maximum_placement_range(&self) -> f64 {
        let antenna = self.antenna_max_range.unwrap_or(f64::INFINITY);
        if self.pulse_repetition_interval > 0.0 {
            return antenna.min(SPEED_OF_LIGHT * self.pulse_repetition_interval / 2.0);
        }
        let altitude = self.location.z.max(DEFAULT_CENTROID_ALTITUDE);
        let earth_radius = EARTH_RADIUS * self.earth_radius_multiplier;
        let horizon = (altitude * altitude + 2.0 * earth_radius * altitude).sqrt();
        antenna.min(horizon)
    }
}

/// Jammer-side settings of a false-target technique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FalseTargetEffect {
    /// Scan interval as a multiple of the radar frame time, or of `scan_interval`.
    pub scan_rate_multiplier: f64,
    /// Explicit scan interval before the multiplier.
    pub scan_interval: Option<f64>,
    /// Fraction of the radar's pulse slots the jammer fills.
    pub jammer_pulse_density: Option<f64>,
    pub blip_speeds: Option<Extent>,
    /// Overrides the radar's frequency agility as the range constraint.
    pub range_constrained: Option<bool>,
    /// Force all-random behaviors and a jammer bearing reference.
    pub auto_generate: bool,
}

impl Default for FalseTargetEffect {
    fn default() -> Self {
        Self {
            scan_rate_multiplier: 1.0,
            scan_interval: None,
            jammer_pulse_density: None,
            blip_speeds: None,
            range_constrained: None,
            auto_generate: false,
        }
    }
}

impl FalseTargetEffect {
    /// Fill `config` from the radar. Settings the configuration already
    /// pins down (centroid, range extents) are left alone.
    pub fn apply(&self, config: &GeneratorConfig, radar: &RadarParameters) -> GeneratorConfig {
        let mut derived = config.clone();

        if derived.centroid.is_none() {
            derived.centroid = Some(ReferenceCentroid {
                position: Position::new(radar.location.x, radar.location.y, DEFAULT_CENTROID_ALTITUDE),
                ..Default::default()
            });
        }

        match self.scan_interval {
            Some(interval) => derived.scan_interval = interval * self.scan_rate_multiplier,
            None if radar.frame_time > 0.0 => {
                derived.scan_interval = radar.frame_time * self.scan_rate_multiplier
            }
            None => {}
        }

        if derived.range_extents.is_empty() {
            derived.range_extents = vec![Extent::new(0.0, radar.maximum_placement_range())];
        }
        if derived.azimuth_extents.is_empty() {
            derived.azimuth_extents = vec![Extent::new(-std::f64::consts::PI, std::f64::consts::PI)];
        }
        if let Some(speeds) = self.blip_speeds.filter(|s| s.max > 0.0) {
            derived.blip_speeds = speeds;
        }

        if let Some(quantity) = self.quantity_for(radar) {
            derived.quantity = quantity;
        }

        derived.range_constrained = self.range_constrained.unwrap_or(radar.frequency_agile);

        if self.auto_generate {
            derived.bearing_reference = BearingReference::Jammer;
            derived.blip_behavior = BlipBehavior::RandomScanToScan;
            derived.radar_behavior = RadarBehavior::RandomToMultipleRadars;
            derived.platform_behavior = PlatformBehavior::RandomToMultiplePlatforms;
        }

        debug!(
            generator = %derived.name,
            quantity = derived.quantity,
            scan_interval = derived.scan_interval,
            range_constrained = derived.range_constrained,
            "false target effect applied"
        );
        derived
    }

    /// Blips per scan the pulse density yields against this radar. `None`
    /// without a density or a pulse width, or when it rounds to zero.
    pub fn quantity_for(&self, radar: &RadarParameters) -> Option<usize> {
        let density = self.jammer_pulse_density?;
        if radar.pulse_width <= 0.0 || radar.frame_time <= 0.0 {
            return None;
        }
        let slots = radar.frame_time / radar.pulse_width / radar.integrated_pulse_count();
        let quantity = (density * slots).floor() as usize;
        (quantity > 0).then_some(quantity)
    }
}

/// Pulse density needed to place `quantity` blips per scan, capped at one.
pub fn pulse_density_for(quantity: usize, radar: &RadarParameters) -> Option<f64> {
    if radar.pulse_width <= 0.0 || radar.frame_time <= 0.0 {
        return None;
    }
    let density =
        quantity as f64 * radar.pulse_width * radar.integrated_pulse_count() / radar.frame_time;
    Some(density.min(1.0))
}

//! Reference interaction evaluator.
//!
//! A calibrated stand-in for the radar equation: target returns fall off
//! with the fourth power of range, jammer energy (and so blip returns) with
//! the square of the jammer-to-radar range.

use serde::{Deserialize, Serialize};

use decoy_core::components::Blip;
use decoy_core::constants::{REFERENCE_JAMMER_RANGE, REFERENCE_RADAR_RANGE};
use decoy_core::interaction::{
    failure, Interaction, InteractionEvaluator, JammerView, Observer, TargetView,
};
use decoy_core::types::Position;

/// Closest range the evaluator will divide by (m).
const MIN_RANGE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometricEvaluator {
    /// Range at which a 1 m² target gives unit SNR.
    pub radar_reference_range: f64,
    /// Range at which a unit-power jammer gives unit JNR.
    pub jammer_reference_range: f64,
    /// Instrumented range; anything beyond is outside the field of view.
    pub max_range: Option<f64>,
}

impl Default for GeometricEvaluator {
    fn default() -> Self {
        Self {
            radar_reference_range: REFERENCE_RADAR_RANGE,
            jammer_reference_range: REFERENCE_JAMMER_RANGE,
            max_range: None,
        }
    }
}

impl GeometricEvaluator {
    fn out_of_view(&self, range: f64) -> bool {
        self.max_range.is_some_and(|max| range > max)
    }

    fn jammer_power_at(&self, observer: &Position, jammer: &JammerView) -> f64 {
        let range = observer.range_to(&jammer.kinematics.position).max(MIN_RANGE);
        jammer.power * (self.jammer_reference_range / range).powi(2)
    }

    fn classify(&self, observer: &Observer, signal_to_noise: f64, range: f64, bearing: f64) -> Interaction {
        let mut interaction = Interaction {
            detectable: true,
            signal_to_noise,
            range,
            bearing,
            failure_reasons: 0,
            equivalent_rcs: signal_to_noise * (range.max(MIN_RANGE) / self.radar_reference_range).powi(4),
        };
        if signal_to_noise < observer.detection_threshold {
            interaction.detectable = false;
            interaction.failure_reasons |= failure::SIGNAL_LEVEL;
        }
        interaction
    }
}

impl InteractionEvaluator for GeometricEvaluator {
    fn evaluate_blip(&self, observer: &Observer, blip: &Blip, jammer: &JammerView) -> Interaction {
        let range = observer.position.range_to(&blip.position());
        let bearing = observer.position.bearing_to(&blip.position());
        if self.out_of_view(range) {
            return Interaction::undetectable(range, bearing, failure::FIELD_OF_VIEW);
        }
        let signal_to_noise = self.jammer_power_at(&observer.position, jammer);
        self.classify(observer, signal_to_noise, range, bearing)
    }

    fn evaluate_target(&self, observer: &Observer, target: &TargetView) -> Interaction {
        let position = target.kinematics.position;
        let range = observer.position.range_to(&position);
        let bearing = observer.position.bearing_to(&position);
        if self.out_of_view(range) {
            return Interaction::undetectable(range, bearing, failure::FIELD_OF_VIEW);
        }
        let signal_to_noise =
            target.rcs * (self.radar_reference_range / range.max(MIN_RANGE)).powi(4);
        self.classify(observer, signal_to_noise, range, bearing)
    }

    fn jammer_to_noise(&self, observer: &Observer, jammer: &JammerView) -> f64 {
        self.jammer_power_at(&observer.position, jammer)
    }
}

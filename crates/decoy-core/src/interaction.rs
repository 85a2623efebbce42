//! Contracts with the collaborators outside the screening core.
//!
//! The electromagnetic math and the track manager are not part of this
//! workspace's pipeline logic; the pipeline talks to them only through the
//! traits below.

use serde::{Deserialize, Serialize};

use crate::components::Blip;
use crate::types::{Kinematics, ObjectId, ObserverKey, Position, TrackHandle};

/// Bits of `Interaction::failure_reasons`.
pub mod failure {
    /// Signal below the detection threshold.
    pub const SIGNAL_LEVEL: u32 = 1 << 0;
    /// Doppler outside the receiver's limits.
    pub const DOPPLER_LIMITS: u32 = 1 << 1;
    /// Jammer-to-radar leg failed (masking, horizon).
    pub const JAMMER_PATH: u32 = 1 << 2;
    /// Outside the sensor's field of view.
    pub const FIELD_OF_VIEW: u32 = 1 << 3;

    /// Failures that veto a blip's strength classification.
    pub const BLIP_VETO: u32 = SIGNAL_LEVEL | DOPPLER_LIMITS | JAMMER_PATH;
}

/// Result of evaluating one (observer, object) pair for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub detectable: bool,
    /// Linear signal-to-noise ratio.
    pub signal_to_noise: f64,
    /// Observer-to-object range (m).
    pub range: f64,
    /// Observer-to-object bearing (radians, 0 = North).
    pub bearing: f64,
    /// Bitmask of `failure::*`.
    pub failure_reasons: u32,
    /// Radar cross section that would return the same power (m²).
    pub equivalent_rcs: f64,
}

impl Interaction {
    pub fn undetectable(range: f64, bearing: f64, failure_reasons: u32) -> Self {
        Self {
            detectable: false,
            range,
            bearing,
            failure_reasons,
            ..Default::default()
        }
    }
}

/// The sensor side of an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observer {
    pub key: ObserverKey,
    pub position: Position,
    /// Linear SNR a return needs for detection.
    pub detection_threshold: f64,
}

/// A real target as seen by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetView {
    pub object_id: ObjectId,
    pub kinematics: Kinematics,
    /// Radar cross section (m²).
    pub rcs: f64,
}

/// A jammer transmitter as seen by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JammerView {
    pub kinematics: Kinematics,
    /// Effective radiated power relative to the calibration reference.
    pub power: f64,
}

/// Physical interaction evaluation.
///
/// Implementations must not keep per-observer side effects: the same pair
/// may be evaluated once per cycle by any number of observers.
pub trait InteractionEvaluator {
    /// Evaluate a synthetic return carried by `jammer`.
    fn evaluate_blip(&self, observer: &Observer, blip: &Blip, jammer: &JammerView) -> Interaction;

    /// Evaluate a real target.
    fn evaluate_target(&self, observer: &Observer, target: &TargetView) -> Interaction;

    /// Jammer-to-noise ratio of the jammer in the observer's receiver.
    fn jammer_to_noise(&self, observer: &Observer, jammer: &JammerView) -> f64;
}

/// A per-site (or fusion-center) track store.
///
/// Handles may be dropped by other parties at any time; callers must
/// re-check with `find_track` rather than assume a handle stays valid.
pub trait TrackStore {
    fn add_track(&mut self, external_id: u64) -> TrackHandle;

    /// The external id a handle was created for, if the track still exists.
    fn find_track(&self, handle: TrackHandle) -> Option<u64>;

    fn drop_track(&mut self, handle: TrackHandle);

    fn track_count(&self) -> usize;
}

//! Frame report: the visible pipeline state after each engine step.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::*;

/// Everything the pipeline exposes upward after one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub time: SimTime,
    /// Simulation time the step evaluated at (seconds).
    pub sim_time: f64,
    pub generators: Vec<GeneratorView>,
    pub screeners: Vec<ScreenerView>,
    pub fusion_centers: Vec<FusionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorView {
    pub id: GeneratorId,
    pub name: String,
    pub state: GeneratorState,
    pub channels: usize,
    /// Blips across every channel.
    pub blips: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerView {
    pub id: ScreenerId,
    pub observer: ObserverKey,
    pub mode_on: bool,
    pub trackable: usize,
    pub blocked: usize,
    pub undetected: usize,
    pub active_targets: usize,
    pub forced_targets: usize,
    pub blocked_targets: usize,
    pub null_targets: usize,
    pub allowed_real: usize,
    pub allowed_false: usize,
    pub output_type: OutputType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionView {
    pub id: FusionId,
    pub platform: PlatformId,
    pub registered_sites: usize,
    pub aggregate_false: usize,
    pub aggregate_real: usize,
    pub fused_false: usize,
    pub fused_real: usize,
    pub active_false: usize,
    pub active_real: usize,
    pub output_type: OutputType,
}

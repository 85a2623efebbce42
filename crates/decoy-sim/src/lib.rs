//! False-target generation, per-site screening and multi-site fusion.
//!
//! Owns the headless `SimulationEngine`: a hecs world of platforms plus
//! arenas of generators, screeners and fusion centers, stepped at a fixed
//! rate and reported as `FrameReport`s.

pub mod effect;
pub mod engine;
pub mod evaluation;
pub mod fusion;
pub mod generator;
pub mod ids;
pub mod scenario;
pub mod screener;
pub mod systems;
pub mod track_store;

pub use decoy_core as core;
pub use engine::SimulationEngine;

#[cfg(test)]
mod tests;

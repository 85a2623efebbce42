//! Per-step systems over the engine world and its arenas.
//!
//! Systems are free functions. They own no state: platform data lives in
//! hecs components, pipeline state in the engine's generator, screener and
//! fusion maps.

pub mod fusing;
pub mod generation;
pub mod movement;
pub mod screening;
pub mod snapshot;

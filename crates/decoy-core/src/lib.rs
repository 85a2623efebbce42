//! Core types and definitions for the decoy screening pipeline.
//!
//! This crate defines the vocabulary shared by the generator, screener,
//! and fusion center: identifiers, blips, configuration, errors, lifecycle
//! events, the collaborator traits, and logging setup. It holds no
//! simulation state of its own.

pub mod components;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod interaction;
pub mod logging;
pub mod state;
pub mod types;

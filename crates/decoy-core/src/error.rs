//! Error types for configuration and scenario loading.
//!
//! The screening pipeline itself never returns errors: lookup misses are
//! `None`, and capacity problems degrade output. Only validation and
//! loading can fail.

use thiserror::Error;

use crate::types::{GeneratorId, PlatformId, ScreenerId};

/// Result type for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Rejected configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A ratio outside [0, 1]
    #[error("{name} must be within [0, 1], got {value}")]
    RatioOutOfRange { name: &'static str, value: f64 },

    /// A value that must be strictly positive
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    /// A capacity of zero where one is required
    #[error("{name} must be at least 1")]
    ZeroCapacity { name: &'static str },

    /// Transfer capacity larger than track capacity
    #[error("transfer capacity {transfer} exceeds track capacity {track}")]
    TransferExceedsTrack { transfer: usize, track: usize },

    /// An extent with min > max or a non-finite bound
    #[error("{name} extent [{min}, {max}] is invalid")]
    InvalidExtent { name: &'static str, min: f64, max: f64 },

    /// No extents given where at least one is required
    #[error("{name} needs at least one extent")]
    MissingExtent { name: &'static str },

    /// Behavior axes that cannot be combined
    #[error("random_to_multiple_radars cannot be combined with consistent_to_multiple_platforms")]
    IncompatibleBehaviors,

    /// Consistent-to-multiple-radars needs a fixed centroid
    #[error("consistent_to_multiple_radars requires an explicit reference centroid")]
    MissingCentroid,

    /// Same site listed twice
    #[error("duplicate radar site {0}")]
    DuplicateSite(PlatformId),
}

/// Result type for scenario loading.
pub type ScenarioResult<T> = Result<T, ScenarioError>;

/// Failures while loading or wiring a scenario.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Could not read the scenario file
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed scenario JSON
    #[error("failed to parse scenario: {0}")]
    Json(#[from] serde_json::Error),

    /// A component configuration failed validation
    #[error("invalid configuration for {component}: {source}")]
    Config {
        component: String,
        #[source]
        source: ConfigError,
    },

    /// A reference to a platform that is not defined
    #[error("unknown platform {0}")]
    UnknownPlatform(PlatformId),

    /// A reference to a generator that is not defined
    #[error("unknown generator {0}")]
    UnknownGenerator(GeneratorId),

    /// A reference to a screener that is not defined
    #[error("unknown screener {0}")]
    UnknownScreener(ScreenerId),

    /// The same id used twice
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u64 },
}

impl ScenarioError {
    pub fn config(component: impl Into<String>, source: ConfigError) -> Self {
        ScenarioError::Config {
            component: component.into(),
            source,
        }
    }
}

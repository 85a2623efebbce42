//! Enumeration types used throughout the screening pipeline.

use serde::{Deserialize, Serialize};

/// How a generator's blips relate from one scan to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlipBehavior {
    /// Every scan discards the population and places a new one.
    #[default]
    RandomScanToScan,
    /// The population is kept and extrapolated; persistence thins it.
    ConsistentScanToScan,
}

/// How a generator's blips relate across the radars it jams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadarBehavior {
    /// Each jammer channel gets its own blip identities.
    #[default]
    RandomToMultipleRadars,
    /// All channels share one base population (same ids, same geometry).
    ConsistentToMultipleRadars,
}

/// How identically configured generators on different platforms relate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformBehavior {
    #[default]
    RandomToMultiplePlatforms,
    ConsistentToMultiplePlatforms,
}

/// Per-observer signal classification of a blip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlipStrength {
    /// At least twice the detection threshold.
    Strong,
    /// At or above the detection threshold.
    Weak,
    #[default]
    Undetected,
}

/// What a screener or fusion center can hand downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputType {
    /// Display-only plots, no individual tracks.
    #[default]
    Plot,
    /// Individual track reporting.
    Tracks,
    /// False-return load is beyond what can be processed.
    Overload,
}

/// Radial placement law for new blips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeDistribution {
    #[default]
    Uniform,
    /// Concentrated toward the outer edge of the extent.
    Log,
    /// Concentrated toward the outer edge, steeper than `Log`.
    Exponential,
}

/// Zero-azimuth reference for blip placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BearingReference {
    /// Azimuth extents are measured from true north.
    #[default]
    North,
    /// Azimuth extents are measured from the centroid-to-jammer bearing.
    Jammer,
}

/// Source of blip speed and heading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlipReference {
    /// Speed and heading drawn from the configured ranges.
    #[default]
    None,
    /// Blips move with the jamming platform.
    Jammer,
}

/// Range policy for forcing a real-target track past the screener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeForce {
    #[default]
    None,
    /// Force targets nearer than the nearest false track.
    Inside,
    /// Force targets farther than the farthest false track.
    Outside,
    InOut,
}

impl RangeForce {
    pub fn inside(self) -> bool {
        matches!(self, RangeForce::Inside | RangeForce::InOut)
    }

    pub fn outside(self) -> bool {
        matches!(self, RangeForce::Outside | RangeForce::InOut)
    }
}

/// Which screener blip list an id currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlipStatus {
    Trackable,
    Blocked,
    Undetected,
}

/// Which screener target list an object currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetStatus {
    Active,
    Blocked,
    Forced,
    /// Detected but no track yet.
    Null,
}

/// Emission state of a generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorState {
    #[default]
    On,
    Off,
}

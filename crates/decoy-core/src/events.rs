//! Lifecycle notifications from the host simulation.
//!
//! Queued on the engine and handled at the start of the next step, before
//! any generator, screener, or fusion center update.

use serde::{Deserialize, Serialize};

use crate::types::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LifecycleEvent {
    /// A radar mode was selected and turned on.
    RadarModeActivated { site: PlatformId, sensor: SensorId },
    /// A radar mode was deselected or turned off.
    RadarModeDeactivated { site: PlatformId, sensor: SensorId },
    /// A platform left the simulation with everything it carried.
    PlatformDeleted { platform: PlatformId },
    /// A jammer transmitter channel stopped emitting for good.
    JammerChannelRemoved {
        platform: PlatformId,
        channel: ChannelId,
    },
    /// A generator was switched on or off.
    GeneratorToggled {
        generator: GeneratorId,
        enabled: bool,
    },
}

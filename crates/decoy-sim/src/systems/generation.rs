//! Generator updates driven by the jammer channels in the world.

use hecs::World;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use decoy_core::components::{Jammer, Platform};
use decoy_core::interaction::JammerView;
use decoy_core::types::{Kinematics, Position, Velocity};

use crate::generator::GeneratorMap;
use crate::screener::JammerMap;

/// Advance every generator on every emitting channel that drives it and
/// return the jammer views the screeners evaluate against.
///
/// Channels naming an unknown generator are skipped.
pub fn run(
    world: &World,
    generators: &mut GeneratorMap,
    sim_time: f64,
    rng: &mut ChaCha8Rng,
) -> JammerMap {
    let mut jammers = JammerMap::new();
    let mut query = world.query::<(&Platform, &Position, Option<&Velocity>, &Jammer)>();
    for (_entity, (platform, position, velocity, jammer)) in query.iter() {
        let kinematics = Kinematics::new(*position, velocity.copied().unwrap_or_default());
        for channel in jammer.channels.iter().filter(|channel| channel.emitting) {
            let Some(generator) = generators.get_mut(&channel.generator) else {
                trace!(platform = platform.id, generator = channel.generator, "channel drives unknown generator");
                continue;
            };
            if generator.update(sim_time, channel.channel, &kinematics, rng) {
                trace!(
                    platform = platform.id,
                    generator = channel.generator,
                    channel = channel.channel,
                    blips = generator.blip_count(channel.channel),
                    "new blips placed"
                );
            }
            jammers.insert(
                (channel.generator, channel.channel),
                JammerView {
                    kinematics,
                    power: channel.power,
                },
            );
        }
    }
    jammers
}

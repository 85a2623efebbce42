//! Screener updates for every radar site whose mode is on.

use std::collections::BTreeMap;

use hecs::{Entity, World};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use decoy_core::components::{Platform, RadarSite, RealTarget};
use decoy_core::interaction::{InteractionEvaluator, Observer, TargetView, TrackStore};
use decoy_core::types::*;

use crate::engine::ScreenerSlot;
use crate::generator::GeneratorMap;
use crate::screener::{JammerMap, ScreenContext, TargetReport};

/// Everything the screening pass reads besides the world.
pub struct ScreeningInputs<'a> {
    pub sim_time: f64,
    pub evaluator: &'a dyn InteractionEvaluator,
    pub jammers: &'a JammerMap,
}

/// Evaluate real targets for each active site, keep the site's track table
/// in step with detections, and run its screener when one is due.
/// Returns how many screeners changed their lists.
pub fn run(
    world: &World,
    screeners: &mut BTreeMap<ScreenerId, ScreenerSlot>,
    generators: &mut GeneratorMap,
    inputs: &ScreeningInputs<'_>,
    rng: &mut ChaCha8Rng,
) -> usize {
    let targets = collect_targets(world);
    let sites = collect_sites(world);

    let mut changed = 0;
    for (site_entity, observer, screener_id) in sites {
        let Some(slot) = screeners.get_mut(&screener_id) else {
            trace!(screener = screener_id, observer = %observer.key, "site names unknown screener");
            continue;
        };
        if !slot.screener.needs_update(inputs.sim_time) {
            continue;
        }

        let mut reports = Vec::with_capacity(targets.len());
        for (target_entity, target) in &targets {
            if *target_entity == site_entity {
                continue;
            }
            let interaction = inputs.evaluator.evaluate_target(&observer, target);
            if interaction.detectable {
                let track = match slot.tracks.handle_for(target.object_id) {
                    Some(handle) => handle,
                    None => slot.tracks.add_track(target.object_id),
                };
                reports.push(TargetReport {
                    object_id: target.object_id,
                    interaction,
                    track: Some(track),
                });
            } else {
                slot.tracks.drop_external(target.object_id);
            }
        }

        let mut ctx = ScreenContext {
            sim_time: inputs.sim_time,
            observer,
            evaluator: inputs.evaluator,
            generators: &mut *generators,
            jammers: inputs.jammers,
            targets: &reports,
            track_store: &mut slot.tracks,
            rng: &mut *rng,
        };
        if slot.screener.update(&mut ctx) {
            changed += 1;
        }
    }
    changed
}

fn collect_targets(world: &World) -> Vec<(Entity, TargetView)> {
    let mut query = world.query::<(&RealTarget, &Position, Option<&Velocity>)>();
    query
        .iter()
        .map(|(entity, (target, position, velocity))| {
            (
                entity,
                TargetView {
                    object_id: target.object_id,
                    kinematics: Kinematics::new(*position, velocity.copied().unwrap_or_default()),
                    rcs: target.rcs,
                },
            )
        })
        .collect()
}

fn collect_sites(world: &World) -> Vec<(Entity, Observer, ScreenerId)> {
    let mut query = world.query::<(&Platform, &Position, &RadarSite)>();
    query
        .iter()
        .filter(|(_, (_, _, site))| site.mode_on)
        .map(|(entity, (platform, position, site))| {
            let observer = Observer {
                key: ObserverKey::new(platform.id, site.sensor),
                position: *position,
                detection_threshold: site.detection_threshold,
            };
            (entity, observer, site.screener)
        })
        .collect()
}

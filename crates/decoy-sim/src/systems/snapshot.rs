//! Snapshot system: builds the per-step `FrameReport`. Read-only.

use std::collections::BTreeMap;

use hecs::World;

use decoy_core::enums::{BlipStatus, TargetStatus};
use decoy_core::state::*;
use decoy_core::types::{FusionId, ScreenerId, SimTime};

use crate::engine::{FusionSlot, ScreenerSlot};
use crate::generator::GeneratorMap;
use crate::systems::fusing::radar_modes;

pub fn build_report(
    world: &World,
    time: &SimTime,
    sim_time: f64,
    generators: &GeneratorMap,
    screeners: &BTreeMap<ScreenerId, ScreenerSlot>,
    fusion_centers: &BTreeMap<FusionId, FusionSlot>,
) -> FrameReport {
    FrameReport {
        time: *time,
        sim_time,
        generators: build_generators(generators),
        screeners: build_screeners(world, screeners),
        fusion_centers: build_fusion_centers(fusion_centers),
    }
}

fn build_generators(generators: &GeneratorMap) -> Vec<GeneratorView> {
    generators
        .values()
        .map(|generator| GeneratorView {
            id: generator.id(),
            name: generator.name().to_string(),
            state: generator.state(),
            channels: generator.channel_ids().count(),
            blips: generator
                .channel_ids()
                .map(|channel| generator.blip_count(channel))
                .sum(),
        })
        .collect()
}

fn build_screeners(world: &World, screeners: &BTreeMap<ScreenerId, ScreenerSlot>) -> Vec<ScreenerView> {
    let modes = radar_modes(world);
    screeners
        .values()
        .map(|slot| {
            let screener = &slot.screener;
            ScreenerView {
                id: screener.id(),
                observer: screener.observer(),
                mode_on: modes.get(&screener.id()).copied().unwrap_or(false),
                trackable: screener.count_blips(BlipStatus::Trackable),
                blocked: screener.count_blips(BlipStatus::Blocked),
                undetected: screener.count_blips(BlipStatus::Undetected),
                active_targets: screener.count_targets(TargetStatus::Active),
                forced_targets: screener.count_targets(TargetStatus::Forced),
                blocked_targets: screener.count_targets(TargetStatus::Blocked),
                null_targets: screener.count_targets(TargetStatus::Null),
                allowed_real: screener.allowed_real_target_number(),
                allowed_false: screener.allowed_false_target_number(),
                output_type: screener.output_type(),
            }
        })
        .collect()
}

fn build_fusion_centers(fusion_centers: &BTreeMap<FusionId, FusionSlot>) -> Vec<FusionView> {
    fusion_centers
        .values()
        .map(|slot| {
            let fusion = &slot.fusion;
            FusionView {
                id: fusion.id(),
                platform: fusion.platform(),
                registered_sites: fusion.registered_site_count(),
                aggregate_false: fusion.aggregate_false_count(),
                aggregate_real: fusion.aggregate_real_count(),
                fused_false: fusion.fused_false_count(),
                fused_real: fusion.fused_real_count(),
                active_false: fusion.active_false_tracks().len(),
                active_real: fusion.active_real_tracks().len(),
                output_type: fusion.output_type(),
            }
        })
        .collect()
}

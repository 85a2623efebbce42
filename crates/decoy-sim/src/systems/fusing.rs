//! Fusion center updates over the screeners registered with each center.

use std::collections::BTreeMap;

use hecs::World;
use rand_chacha::ChaCha8Rng;

use decoy_core::components::RadarSite;
use decoy_core::types::{FusionId, ScreenerId};

use crate::engine::{FusionSlot, ScreenerSlot};
use crate::fusion::{FusionContext, SiteSnapshot};

/// Run every fusion center after all screeners have updated.
/// Returns how many centers changed their fused quantities.
pub fn run(
    world: &World,
    fusion_centers: &mut BTreeMap<FusionId, FusionSlot>,
    screeners: &BTreeMap<ScreenerId, ScreenerSlot>,
    sim_time: f64,
    rng: &mut ChaCha8Rng,
) -> usize {
    let modes = radar_modes(world);

    let mut changed = 0;
    for slot in fusion_centers.values_mut() {
        let sites: Vec<SiteSnapshot> = slot
            .fusion
            .screener_ids()
            .filter_map(|id| {
                let screener = &screeners.get(&id)?.screener;
                let mode_on = modes.get(&id).copied().unwrap_or(false);
                Some(SiteSnapshot::from_screener(screener, mode_on))
            })
            .collect();

        let mut ctx = FusionContext {
            sim_time,
            sites: &sites,
            track_store: &mut slot.tracks,
            rng: &mut *rng,
        };
        if slot.fusion.update(&mut ctx) {
            changed += 1;
        }
    }
    changed
}

/// Mode state of every radar site, keyed by its screener.
pub fn radar_modes(world: &World) -> BTreeMap<ScreenerId, bool> {
    let mut query = world.query::<&RadarSite>();
    query
        .iter()
        .map(|(_, site)| (site.screener, site.mode_on))
        .collect()
}

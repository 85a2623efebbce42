//! Multi-site fusion center.
//!
//! A fusion center collects the reportable tracks of every screener
//! registered with it and decides how many false and real tracks survive
//! into its own track store. Under consistency-constrained operation an
//! object is only fusible when every registered site holds a track on it
//! with its radar mode on.
//!
//! Fusion centers never hold screeners. The engine hands each update a
//! [`SiteSnapshot`] per registered screener.

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

use decoy_core::config::FusionConfig;
use decoy_core::enums::OutputType;
use decoy_core::interaction::TrackStore;
use decoy_core::types::*;

use crate::screener::Screener;

/// What one registered screener reports to fusion this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSnapshot {
    pub screener: ScreenerId,
    pub observer: ObserverKey,
    /// Whether the site's radar mode is selected and on.
    pub mode_on: bool,
    /// Whether the screener has completed an update since its last reset.
    pub valid: bool,
    /// Blips the site holds false tracks on.
    pub false_tracks: Vec<BlipId>,
    /// Objects the site holds active or forced tracks on.
    pub real_tracks: Vec<ObjectId>,
    pub output_type: OutputType,
    pub detected_false: usize,
}

impl SiteSnapshot {
    pub fn from_screener(screener: &Screener, mode_on: bool) -> Self {
        Self {
            screener: screener.id(),
            observer: screener.observer(),
            mode_on,
            valid: screener.is_valid(),
            false_tracks: screener.false_target_tracks().keys().copied().collect(),
            real_tracks: screener
                .active_target_tracks()
                .into_iter()
                .map(|(object_id, _)| object_id)
                .collect(),
            output_type: screener.output_type(),
            detected_false: screener.detected_false_count(),
        }
    }
}

/// Everything one fusion update reads or writes outside itself.
pub struct FusionContext<'a> {
    pub sim_time: f64,
    pub sites: &'a [SiteSnapshot],
    pub track_store: &'a mut dyn TrackStore,
    pub rng: &'a mut ChaCha8Rng,
}

#[derive(Debug)]
pub struct FusionCenter {
    id: FusionId,
    platform: PlatformId,
    config: FusionConfig,

    screeners: BTreeMap<ScreenerId, ObserverKey>,
    registered_sites: BTreeSet<ObserverKey>,

    // Rebuilt every frame.
    false_ids: BTreeSet<BlipId>,
    real_ids: BTreeSet<ObjectId>,
    false_reports: BTreeMap<BlipId, usize>,
    false_consistency: BTreeMap<BlipId, usize>,
    real_consistency: BTreeMap<ObjectId, usize>,

    active_false: Vec<(BlipId, TrackHandle)>,
    active_real: Vec<(ObjectId, TrackHandle)>,

    aggregate_false: usize,
    aggregate_real: usize,
    fused_false: usize,
    fused_real: usize,

    state_change: bool,
    reevaluate: bool,
    last_update: Option<f64>,
    output_type: OutputType,
}

impl FusionCenter {
    pub fn new(id: FusionId, platform: PlatformId, config: FusionConfig) -> Self {
        Self {
            id,
            platform,
            config,
            screeners: BTreeMap::new(),
            registered_sites: BTreeSet::new(),
            false_ids: BTreeSet::new(),
            real_ids: BTreeSet::new(),
            false_reports: BTreeMap::new(),
            false_consistency: BTreeMap::new(),
            real_consistency: BTreeMap::new(),
            active_false: Vec::new(),
            active_real: Vec::new(),
            aggregate_false: 0,
            aggregate_real: 0,
            fused_false: 0,
            fused_real: 0,
            state_change: false,
            reevaluate: false,
            last_update: None,
            output_type: OutputType::Plot,
        }
    }

    pub fn id(&self) -> FusionId {
        self.id
    }

    pub fn platform(&self) -> PlatformId {
        self.platform
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    // --- Registration ---

    /// Register a screener. Only screeners on a valid site are taken.
    pub fn add_screener(&mut self, screener: ScreenerId, observer: ObserverKey) -> bool {
        if !self.config.valid_sites.contains(&observer.site) {
            trace!(fusion = self.id, screener, site = observer.site, "screener not on a valid site");
            return false;
        }
        if self.screeners.insert(screener, observer).is_none() {
            info!(fusion = self.id, screener, observer = %observer, "screener registered");
        }
        self.registered_sites.insert(observer);
        true
    }

    pub fn delete_screener(&mut self, screener: ScreenerId) -> bool {
        let Some(observer) = self.screeners.remove(&screener) else {
            return false;
        };
        if !self.screeners.values().any(|key| *key == observer) {
            self.registered_sites.remove(&observer);
        }
        self.state_change = true;
        info!(fusion = self.id, screener, "screener deleted");
        true
    }

    /// Forget every screener on a platform and the platform's sites.
    pub fn delete_all_screeners_on(&mut self, platform: PlatformId) {
        let before = self.screeners.len();
        self.screeners.retain(|_, key| key.site != platform);
        self.registered_sites.retain(|key| key.site != platform);
        if self.screeners.len() != before {
            self.state_change = true;
            info!(fusion = self.id, platform, "screeners on platform deleted");
        }
    }

    pub fn platform_deleted(&mut self, platform: PlatformId) {
        self.delete_all_screeners_on(platform);
    }

    /// A radar mode came on. Registers its screener and restarts agreement counting.
    pub fn check_for_screener_add(&mut self, screener: ScreenerId, observer: ObserverKey) {
        if self.add_screener(screener, observer) {
            self.state_change = true;
            self.false_consistency.clear();
            self.real_consistency.clear();
        }
    }

    /// A radar mode went off. The screener is reset; under consistency
    /// constraint every fused track goes and the next update runs at once.
    pub fn check_for_screener_reset(&mut self, screener: &mut Screener, store: &mut dyn TrackStore) {
        if !self.screeners.contains_key(&screener.id()) {
            return;
        }
        screener.reset();
        self.state_change = true;
        self.reevaluate = true;
        if self.config.consistency_constrained {
            self.delete_all_tracks(store);
        }
    }

    pub fn screener_ids(&self) -> impl Iterator<Item = ScreenerId> + '_ {
        self.screeners.keys().copied()
    }

    pub fn is_registered(&self, screener: ScreenerId) -> bool {
        self.screeners.contains_key(&screener)
    }

    pub fn registered_site_count(&self) -> usize {
        self.registered_sites.len()
    }

    // --- Update ---

    /// Whether the frame gate or a pending re-evaluation lets an update run.
    pub fn needs_update(&self, sim_time: f64) -> bool {
        self.reevaluate
            || self
                .last_update
                .map_or(true, |last| sim_time > last + self.config.frame_time)
    }

    /// Run one fusion frame. Returns whether the fused quantities changed.
    pub fn update(&mut self, ctx: &mut FusionContext<'_>) -> bool {
        if !self.needs_update(ctx.sim_time) {
            return false;
        }
        self.last_update = Some(ctx.sim_time);
        self.reevaluate = false;

        self.update_state(ctx.sites);
        let dropped_false = self.update_false_target_tracks(ctx.track_store);
        let dropped_real = self.update_real_target_tracks(ctx.track_store);
        if dropped_false || dropped_real {
            self.state_change = true;
        }
        self.output_type = self.determine_output_type(ctx.sites);

        if !self.state_change {
            return false;
        }
        let (fused_false, fused_real) = self.split_capacity(self.aggregate_false, self.aggregate_real);
        self.fused_false = fused_false;
        self.fused_real = fused_real;
        debug!(
            fusion = self.id,
            aggregate_false = self.aggregate_false,
            aggregate_real = self.aggregate_real,
            fused_false,
            fused_real,
            sites = self.registered_sites.len(),
            "fusion state changed"
        );
        self.adjust_track_quantities(ctx.track_store, ctx.rng);
        self.state_change = false;
        true
    }

    fn update_state(&mut self, sites: &[SiteSnapshot]) {
        let previous_false = std::mem::take(&mut self.false_consistency);
        let previous_real = std::mem::take(&mut self.real_consistency);
        self.false_ids.clear();
        self.real_ids.clear();
        self.false_reports.clear();

        for site in sites {
            if !site.valid || !self.screeners.contains_key(&site.screener) {
                continue;
            }
            for id in &site.false_tracks {
                self.false_ids.insert(*id);
                *self.false_reports.entry(*id).or_default() += 1;
                if site.mode_on {
                    *self.false_consistency.entry(*id).or_default() += 1;
                }
            }
            for id in &site.real_tracks {
                self.real_ids.insert(*id);
                if site.mode_on {
                    *self.real_consistency.entry(*id).or_default() += 1;
                }
            }
        }

        let (aggregate_false, aggregate_real, consistency_changed) =
            if self.config.consistency_constrained {
                let sites = self.registered_sites.len();
                (
                    unanimous(&self.false_consistency, sites),
                    unanimous(&self.real_consistency, sites),
                    previous_false != self.false_consistency
                        || previous_real != self.real_consistency,
                )
            } else {
                (self.false_ids.len(), self.real_ids.len(), false)
            };

        if aggregate_false != self.aggregate_false
            || aggregate_real != self.aggregate_real
            || consistency_changed
        {
            self.state_change = true;
        }
        self.aggregate_false = aggregate_false;
        self.aggregate_real = aggregate_real;
    }

    /// Fused (false, real) quantities for the given aggregates.
    ///
    /// The consistent-to-multiple-radars rejection ratio thins the false
    /// aggregate first; if the remainder still overflows track capacity
    /// both classes are scaled down proportionally.
    pub fn split_capacity(&self, aggregate_false: usize, aggregate_real: usize) -> (usize, usize) {
        let ratio = self.config.rejection.consistent_to_multiple_radars;
        let remaining_false = (aggregate_false as f64 * (1.0 - ratio)).floor() as usize;
        let total = remaining_false + aggregate_real;
        let capacity = self.config.track_capacity;
        if total <= capacity {
            return (remaining_false, aggregate_real);
        }
        let fused_real = capacity * aggregate_real / total;
        (capacity - fused_real, fused_real)
    }

    // Active fused tracks the store no longer knows are forgotten, and so
    // are tracks on objects no site reports any more. Returns whether any went.
    fn update_false_target_tracks(&mut self, store: &mut dyn TrackStore) -> bool {
        let before = self.active_false.len();
        let reported = &self.false_ids;
        self.active_false.retain(|(id, handle)| {
            if store.find_track(*handle).is_none() {
                return false;
            }
            if !reported.contains(id) {
                store.drop_track(*handle);
                return false;
            }
            true
        });
        self.active_false.len() != before
    }

    fn update_real_target_tracks(&mut self, store: &mut dyn TrackStore) -> bool {
        let before = self.active_real.len();
        let reported = &self.real_ids;
        self.active_real.retain(|(id, handle)| {
            if store.find_track(*handle).is_none() {
                return false;
            }
            if !reported.contains(id) {
                store.drop_track(*handle);
                return false;
            }
            true
        });
        self.active_real.len() != before
    }

    /// Bring both active lists to their fused quantities. Tracks on objects
    /// that stopped being fusible go first. New tracks are taken in id order
    /// among fusible objects; surplus tracks are dropped at random.
    fn adjust_track_quantities(&mut self, store: &mut dyn TrackStore, rng: &mut ChaCha8Rng) {
        let fusible_false: BTreeSet<BlipId> = self
            .false_ids
            .iter()
            .copied()
            .filter(|id| self.is_false_fusible(*id))
            .collect();
        let fusible_real: BTreeSet<ObjectId> = self
            .real_ids
            .iter()
            .copied()
            .filter(|id| self.is_real_fusible(*id))
            .collect();

        let dropped_false =
            adjust_list(&mut self.active_false, &fusible_false, self.fused_false, store, rng);
        let dropped_real =
            adjust_list(&mut self.active_real, &fusible_real, self.fused_real, store, rng);

        debug_assert!(
            self.active_false.len() + self.active_real.len() <= self.config.track_capacity,
            "fusion center exceeded its track capacity"
        );
        trace!(
            fusion = self.id,
            active_false = self.active_false.len(),
            active_real = self.active_real.len(),
            dropped_false,
            dropped_real,
            "track quantities adjusted"
        );
    }

    /// Drop every fused track and restart agreement counting.
    pub fn delete_all_tracks(&mut self, store: &mut dyn TrackStore) {
        for (_, handle) in self.active_false.drain(..).chain(self.active_real.drain(..)) {
            store.drop_track(handle);
        }
        self.false_ids.clear();
        self.real_ids.clear();
        self.false_reports.clear();
        self.false_consistency.clear();
        self.real_consistency.clear();
        self.aggregate_false = 0;
        self.aggregate_real = 0;
        self.state_change = true;
        debug!(fusion = self.id, "all fused tracks deleted");
    }

    /// Overload past the overload boundary. Plot when no site produces
    /// tracks or past the plot boundary. Tracks otherwise.
    pub fn determine_output_type(&self, sites: &[SiteSnapshot]) -> OutputType {
        let mut load = 0;
        let mut any_tracks = false;
        for site in sites {
            if !site.valid || !self.screeners.contains_key(&site.screener) {
                continue;
            }
            load += site.detected_false;
            any_tracks |= site.output_type == OutputType::Tracks;
        }

        if load > self.config.overload_multiple * self.config.plot_capacity {
            OutputType::Overload
        } else if !any_tracks || load > self.config.plot_multiple * self.config.track_capacity {
            OutputType::Plot
        } else {
            OutputType::Tracks
        }
    }

    // --- Queries ---

    pub fn is_false_fusible(&self, id: BlipId) -> bool {
        !self.config.consistency_constrained
            || self.false_consistency.get(&id) == Some(&self.registered_sites.len())
    }

    pub fn is_real_fusible(&self, id: ObjectId) -> bool {
        !self.config.consistency_constrained
            || self.real_consistency.get(&id) == Some(&self.registered_sites.len())
    }

    /// Site false-track reports on fusible blips, counted per report.
    pub fn valid_blip_count(&self) -> usize {
        self.false_reports
            .iter()
            .filter(|(id, _)| self.is_false_fusible(**id))
            .map(|(_, count)| count)
            .sum()
    }

    pub fn aggregate_false_count(&self) -> usize {
        self.aggregate_false
    }

    pub fn aggregate_real_count(&self) -> usize {
        self.aggregate_real
    }

    pub fn fused_false_count(&self) -> usize {
        self.fused_false
    }

    pub fn fused_real_count(&self) -> usize {
        self.fused_real
    }

    pub fn active_false_tracks(&self) -> &[(BlipId, TrackHandle)] {
        &self.active_false
    }

    pub fn active_real_tracks(&self) -> &[(ObjectId, TrackHandle)] {
        &self.active_real
    }

    pub fn output_type(&self) -> OutputType {
        self.output_type
    }

    pub fn last_update(&self) -> Option<f64> {
        self.last_update
    }
}

fn unanimous(consistency: &BTreeMap<u64, usize>, sites: usize) -> usize {
    if sites == 0 {
        return 0;
    }
    consistency.values().filter(|count| **count == sites).count()
}

// Drop entries outside `fusible`, then fill `active` from `fusible` up to
// `target` or drop a random surplus. Returns how many tracks were dropped.
fn adjust_list(
    active: &mut Vec<(u64, TrackHandle)>,
    fusible: &BTreeSet<u64>,
    target: usize,
    store: &mut dyn TrackStore,
    rng: &mut ChaCha8Rng,
) -> usize {
    let before = active.len();
    active.retain(|(id, handle)| {
        if fusible.contains(id) {
            return true;
        }
        store.drop_track(*handle);
        false
    });
    let unfusible = before - active.len();

    if active.len() < target {
        let present: BTreeSet<u64> = active.iter().map(|(id, _)| *id).collect();
        for id in fusible {
            if active.len() >= target {
                break;
            }
            if !present.contains(id) {
                let handle = store.add_track(*id);
                active.push((*id, handle));
            }
        }
        unfusible
    } else if active.len() > target {
        let excess = active.len() - target;
        active.shuffle(rng);
        for (_, handle) in active.drain(target..) {
            store.drop_track(handle);
        }
        unfusible + excess
    } else {
        unfusible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track_store::TrackTable;
    use rand::SeedableRng;

    const FALSE_BASE: u64 = u64::MAX / 2 + 1;

    fn site(screener: ScreenerId, site: PlatformId, false_ids: &[u64], real_ids: &[u64]) -> SiteSnapshot {
        SiteSnapshot {
            screener,
            observer: ObserverKey::new(site, 1),
            mode_on: true,
            valid: true,
            false_tracks: false_ids.to_vec(),
            real_tracks: real_ids.to_vec(),
            output_type: OutputType::Tracks,
            detected_false: false_ids.len(),
        }
    }

    fn center(sites: &[PlatformId], constrained: bool, capacity: usize) -> FusionCenter {
        let config = FusionConfig {
            valid_sites: sites.to_vec(),
            consistency_constrained: constrained,
            track_capacity: capacity,
            ..Default::default()
        };
        let mut fusion = FusionCenter::new(1, 100, config);
        for (index, site) in sites.iter().enumerate() {
            fusion.add_screener(index as ScreenerId + 1, ObserverKey::new(*site, 1));
        }
        fusion
    }

    fn run(
        fusion: &mut FusionCenter,
        sim_time: f64,
        sites: &[SiteSnapshot],
        store: &mut TrackTable,
        rng: &mut ChaCha8Rng,
    ) -> bool {
        let mut ctx = FusionContext {
            sim_time,
            sites,
            track_store: store,
            rng,
        };
        fusion.update(&mut ctx)
    }

    #[test]
    fn test_proportional_split() {
        let fusion = center(&[1], false, 100);
        assert_eq!(fusion.split_capacity(120, 80), (60, 40));
        assert_eq!(fusion.split_capacity(30, 20), (30, 20));
    }

    #[test]
    fn test_rejection_thins_false_aggregate() {
        let mut fusion = center(&[1], false, 100);
        fusion.config.rejection.consistent_to_multiple_radars = 0.5;
        // 101 * 0.5 = 50.5 floors to 50; 50 + 40 fits.
        assert_eq!(fusion.split_capacity(101, 40), (50, 40));
    }

    #[test]
    fn test_union_fusion_respects_capacity() {
        let mut fusion = center(&[1], false, 100);
        let false_ids: Vec<u64> = (0..120).map(|i| FALSE_BASE + i).collect();
        let real_ids: Vec<u64> = (1..=80).collect();
        let sites = vec![site(1, 1, &false_ids, &real_ids)];
        let mut store = TrackTable::new();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        assert!(run(&mut fusion, 0.0, &sites, &mut store, &mut rng));
        assert_eq!(fusion.fused_false_count(), 60);
        assert_eq!(fusion.fused_real_count(), 40);
        assert_eq!(fusion.active_false_tracks().len(), 60);
        assert_eq!(fusion.active_real_tracks().len(), 40);
        assert_eq!(store.track_count(), 100);
    }

    #[test]
    fn test_consistency_requires_every_site() {
        let mut fusion = center(&[1, 2], true, 100);
        let a = FALSE_BASE;
        let b = FALSE_BASE + 1;
        let sites = vec![site(1, 1, &[a, b], &[7]), site(2, 2, &[a], &[7])];
        let mut store = TrackTable::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        run(&mut fusion, 0.0, &sites, &mut store, &mut rng);
        assert!(fusion.is_false_fusible(a));
        assert!(!fusion.is_false_fusible(b));
        assert!(fusion.is_real_fusible(7));
        assert_eq!(fusion.aggregate_false_count(), 1);
        assert_eq!(fusion.valid_blip_count(), 2);
        assert_eq!(fusion.active_false_tracks().len(), 1);
        assert_eq!(fusion.active_real_tracks().len(), 1);
    }

    #[test]
    fn test_mode_off_removes_vote_next_frame() {
        let mut fusion = center(&[1, 2], true, 100);
        let a = FALSE_BASE;
        let mut sites = vec![site(1, 1, &[a], &[]), site(2, 2, &[a], &[])];
        let mut store = TrackTable::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        run(&mut fusion, 0.0, &sites, &mut store, &mut rng);
        assert!(fusion.is_false_fusible(a));

        sites[1].mode_on = false;
        run(&mut fusion, 2.0, &sites, &mut store, &mut rng);
        assert!(!fusion.is_false_fusible(a));
        assert_eq!(fusion.aggregate_false_count(), 0);
        assert!(fusion.active_false_tracks().is_empty());
    }

    fn ids(tracks: &[(u64, TrackHandle)]) -> Vec<u64> {
        let mut ids: Vec<u64> = tracks.iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_lost_vote_swaps_in_newly_fusible_blip() {
        let mut fusion = center(&[1, 2], true, 100);
        let (a, b, c) = (FALSE_BASE, FALSE_BASE + 1, FALSE_BASE + 2);
        let mut store = TrackTable::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let sites = vec![site(1, 1, &[a, b], &[]), site(2, 2, &[a, b], &[])];
        run(&mut fusion, 0.0, &sites, &mut store, &mut rng);
        assert_eq!(ids(fusion.active_false_tracks()), vec![a, b]);

        // Site 2 loses a and picks up c. The fused count stays at two.
        let sites = vec![site(1, 1, &[a, b, c], &[]), site(2, 2, &[b, c], &[])];
        assert!(run(&mut fusion, 2.0, &sites, &mut store, &mut rng));
        assert!(!fusion.is_false_fusible(a));
        assert_eq!(fusion.fused_false_count(), 2);
        assert_eq!(ids(fusion.active_false_tracks()), vec![b, c]);
        assert_eq!(store.track_count(), 2);
    }

    #[test]
    fn test_lost_vote_drops_track_whatever_the_seed() {
        let (a, b) = (FALSE_BASE, FALSE_BASE + 1);
        for seed in 0..20 {
            let mut fusion = center(&[1, 2], true, 100);
            let mut store = TrackTable::new();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            let sites = vec![site(1, 1, &[a, b], &[5]), site(2, 2, &[a, b], &[5])];
            run(&mut fusion, 0.0, &sites, &mut store, &mut rng);

            // Site 1 still reports a and the real object; site 2 does not.
            let sites = vec![site(1, 1, &[a, b], &[5]), site(2, 2, &[b], &[])];
            run(&mut fusion, 2.0, &sites, &mut store, &mut rng);
            assert_eq!(ids(fusion.active_false_tracks()), vec![b], "seed {seed}");
            assert!(fusion.active_real_tracks().is_empty(), "seed {seed}");
            assert_eq!(store.track_count(), 1, "seed {seed}");
        }
    }

    #[test]
    fn test_union_churn_keeps_fused_quantity() {
        let mut fusion = center(&[1], false, 100);
        let (a, b, c) = (FALSE_BASE, FALSE_BASE + 1, FALSE_BASE + 2);
        let mut store = TrackTable::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        run(&mut fusion, 0.0, &[site(1, 1, &[a, b], &[1])], &mut store, &mut rng);
        assert_eq!(ids(fusion.active_false_tracks()), vec![a, b]);

        // Same union size, different members.
        let sites = vec![site(1, 1, &[a, c], &[2])];
        assert!(run(&mut fusion, 2.0, &sites, &mut store, &mut rng));
        assert_eq!(fusion.fused_false_count(), 2);
        assert_eq!(ids(fusion.active_false_tracks()), vec![a, c]);
        assert_eq!(ids(fusion.active_real_tracks()), vec![2]);

        assert!(!run(&mut fusion, 4.0, &sites, &mut store, &mut rng));
        assert_eq!(fusion.active_false_tracks().len(), 2);
        assert_eq!(store.track_count(), 3);
    }

    #[test]
    fn test_delete_all_tracks_forgets_reports() {
        let mut fusion = center(&[1], false, 10);
        let sites = vec![site(1, 1, &[FALSE_BASE, FALSE_BASE + 1], &[4])];
        let mut store = TrackTable::new();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        run(&mut fusion, 0.0, &sites, &mut store, &mut rng);
        assert_eq!(fusion.valid_blip_count(), 2);

        fusion.delete_all_tracks(&mut store);
        assert_eq!(fusion.valid_blip_count(), 0);
        assert_eq!(store.track_count(), 0);
        assert!(fusion.active_false_tracks().is_empty());
        assert!(fusion.active_real_tracks().is_empty());

        // The next frame rebuilds everything from the sites.
        assert!(run(&mut fusion, 2.0, &sites, &mut store, &mut rng));
        assert_eq!(fusion.valid_blip_count(), 2);
        assert_eq!(store.track_count(), 3);
    }

    #[test]
    fn test_repeat_update_is_noop() {
        let mut fusion = center(&[1], false, 100);
        let sites = vec![site(1, 1, &[FALSE_BASE, FALSE_BASE + 1], &[3])];
        let mut store = TrackTable::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        assert!(run(&mut fusion, 0.0, &sites, &mut store, &mut rng));
        let tracks = fusion.active_false_tracks().to_vec();
        assert!(!run(&mut fusion, 0.0, &sites, &mut store, &mut rng));
        assert_eq!(fusion.active_false_tracks(), tracks.as_slice());
        // Past the frame gate with the same data nothing changes either.
        assert!(!run(&mut fusion, 5.0, &sites, &mut store, &mut rng));
        assert_eq!(fusion.active_false_tracks(), tracks.as_slice());
    }

    #[test]
    fn test_frame_gate_is_strict() {
        let fusion = {
            let mut fusion = center(&[1], false, 10);
            fusion.last_update = Some(3.0);
            fusion
        };
        assert!(!fusion.needs_update(4.0));
        assert!(fusion.needs_update(4.5));
    }

    #[test]
    fn test_invalid_site_rejected() {
        let mut fusion = center(&[1], true, 10);
        assert!(!fusion.add_screener(9, ObserverKey::new(5, 1)));
        assert_eq!(fusion.registered_site_count(), 1);
    }

    #[test]
    fn test_screener_reset_bypasses_gate_and_clears_tracks() {
        use decoy_core::config::ScreenerConfig;

        let mut fusion = center(&[1], true, 10);
        let sites = vec![site(1, 1, &[FALSE_BASE], &[4])];
        let mut store = TrackTable::new();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        run(&mut fusion, 0.0, &sites, &mut store, &mut rng);
        assert_eq!(store.track_count(), 2);

        let mut screener = Screener::new(1, ObserverKey::new(1, 1), ScreenerConfig::default());
        fusion.check_for_screener_reset(&mut screener, &mut store);
        assert_eq!(store.track_count(), 0);
        assert!(fusion.needs_update(0.5));
        assert!(!screener.is_valid());
    }

    #[test]
    fn test_delete_all_screeners_on_platform() {
        let mut fusion = center(&[1, 2], true, 10);
        fusion.delete_all_screeners_on(2);
        assert_eq!(fusion.registered_site_count(), 1);
        assert_eq!(fusion.screener_ids().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_output_type() {
        let fusion = center(&[1], false, 10);
        let mut sites = vec![site(1, 1, &[], &[])];
        assert_eq!(fusion.determine_output_type(&sites), OutputType::Tracks);
        sites[0].detected_false = 101;
        assert_eq!(fusion.determine_output_type(&sites), OutputType::Plot);
        sites[0].detected_false = 20_001;
        assert_eq!(fusion.determine_output_type(&sites), OutputType::Overload);
        assert_eq!(fusion.determine_output_type(&[]), OutputType::Plot);
    }
}

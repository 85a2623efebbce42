//! False-target generator.
//!
//! One generator serves every jammer channel tied to it. Each channel owns
//! its own blip population, created lazily on the channel's first update and
//! refreshed on the scan cadence:
//!
//! - Random scan-to-scan discards and re-places the population every scan.
//! - Consistent scan-to-scan keeps the population and extrapolates it;
//!   persistence below one thins it at every scan.
//! - Consistent-to-multiple-radars places one base population and hands the
//!   same ids, names and geometry to every channel.
//! - Consistent-to-multiple-platforms seeds placement from the generator name
//!   and scan index, so equally named generators place the same geometry.

pub mod placement;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use decoy_core::components::Blip;
use decoy_core::config::{GeneratorConfig, ReferenceCentroid};
use decoy_core::constants::{FULL_PERSISTENCE, MIN_BLIP_SPEED, TIME_EPSILON};
use decoy_core::enums::*;
use decoy_core::interaction::{InteractionEvaluator, JammerView, Observer};
use decoy_core::types::*;

use crate::ids::BlipIdAllocator;
use placement::{draw_radius, draw_uniform, pick_extent, stable_seed};

/// Generators keyed by id, as the engine and screeners share them.
pub type GeneratorMap = BTreeMap<GeneratorId, FalseTargetGenerator>;

/// Generation bookkeeping for one jammer channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelState {
    pub blips_created: bool,
    pub last_scan: Option<f64>,
    pub last_update: Option<f64>,
    pub last_blip_update: Option<f64>,
    pub last_jammer_position: Position,
    /// Screeners that took the current population.
    pub screened_count: usize,
    /// Last power sufficiency check failed.
    pub rejected: bool,
}

impl ChannelState {
    fn new(jammer_position: Position) -> Self {
        Self {
            last_jammer_position: jammer_position,
            ..Default::default()
        }
    }
}

/// Owner of the blip populations of one jammer technique.
#[derive(Debug)]
pub struct FalseTargetGenerator {
    id: GeneratorId,
    config: GeneratorConfig,
    state: GeneratorState,
    /// Bumped on every on/off change; screeners compare against their last seen value.
    toggle_epoch: u64,
    ids: Arc<BlipIdAllocator>,
    populations: BTreeMap<ChannelId, Vec<Blip>>,
    channels: BTreeMap<ChannelId, ChannelState>,

    // Shared population for consistent-to-multiple-radars.
    base: Vec<Blip>,
    base_updated_at: Option<f64>,
    base_jammer_position: Position,

    centroid: Option<ReferenceCentroid>,
    centroid_updated_at: Option<f64>,
    last_scan: Option<f64>,
    scan_index: u64,
    consumed: HashSet<(ScreenerId, ChannelId)>,
    name_counter: u64,
}

impl FalseTargetGenerator {
    /// The configuration is expected to be validated already.
    pub fn new(id: GeneratorId, config: GeneratorConfig, ids: Arc<BlipIdAllocator>) -> Self {
        let centroid = config.centroid;
        Self {
            id,
            config,
            state: GeneratorState::On,
            toggle_epoch: 0,
            ids,
            populations: BTreeMap::new(),
            channels: BTreeMap::new(),
            base: Vec::new(),
            base_updated_at: None,
            base_jammer_position: Position::default(),
            centroid,
            centroid_updated_at: None,
            last_scan: None,
            scan_index: 0,
            consumed: HashSet::new(),
            name_counter: 0,
        }
    }

    pub fn id(&self) -> GeneratorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state == GeneratorState::On
    }

    pub fn toggle_epoch(&self) -> u64 {
        self.toggle_epoch
    }

    pub fn blip_behavior(&self) -> BlipBehavior {
        self.config.blip_behavior
    }

    pub fn radar_behavior(&self) -> RadarBehavior {
        self.config.radar_behavior
    }

    pub fn range_constrained(&self) -> bool {
        self.config.range_constrained
    }

    pub fn channel_state(&self, channel: ChannelId) -> Option<&ChannelState> {
        self.channels.get(&channel)
    }

    pub fn channel_ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.channels.keys().copied()
    }

    /// Switch emission on or off. Returns whether the state changed.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let next = if enabled {
            GeneratorState::On
        } else {
            GeneratorState::Off
        };
        if next == self.state {
            return false;
        }
        self.state = next;
        self.toggle_epoch += 1;
        debug!(generator = self.id, ?next, "generator toggled");
        true
    }

    /// Advance one channel to `sim_time`. Returns true when new blips were placed.
    pub fn update(
        &mut self,
        sim_time: f64,
        channel: ChannelId,
        jammer: &Kinematics,
        rng: &mut ChaCha8Rng,
    ) -> bool {
        if !self.is_on() {
            return false;
        }

        let interval = self.config.scan_interval;
        let (first_scan, scan_due, previous_update) = {
            let state = self
                .channels
                .entry(channel)
                .or_insert_with(|| ChannelState::new(jammer.position));
            if state
                .last_update
                .is_some_and(|last| sim_time <= last + TIME_EPSILON)
            {
                return false;
            }
            let due = state
                .last_scan
                .map_or(true, |last| sim_time + TIME_EPSILON >= last + interval);
            (state.last_scan.is_none(), due, state.last_update)
        };

        let random = self.config.blip_behavior == BlipBehavior::RandomScanToScan;
        let thinning = self.config.persistence < FULL_PERSISTENCE;

        let mut placed = false;
        if scan_due && (first_scan || random || thinning) {
            placed = self.rescan(sim_time, channel, jammer, rng);
        } else {
            if scan_due {
                if let Some(state) = self.channels.get_mut(&channel) {
                    state.last_scan = Some(sim_time);
                }
            }
            self.advance_blips(sim_time, channel, jammer);
        }

        if let Some(state) = self.channels.get_mut(&channel) {
            state.last_update = Some(sim_time);
        }
        if let (Some(cutoff), Some(blips)) = (previous_update, self.populations.get_mut(&channel)) {
            for blip in blips.iter_mut() {
                blip.prune_observations(cutoff);
            }
        }
        placed
    }

    fn rescan(
        &mut self,
        sim_time: f64,
        channel: ChannelId,
        jammer: &Kinematics,
        rng: &mut ChaCha8Rng,
    ) -> bool {
        let initial = self.populations.get(&channel).map_or(0, Vec::len);
        let mut removed = 0;
        let mut create = true;

        let generator_scan_due = self
            .last_scan
            .map_or(true, |last| sim_time + TIME_EPSILON >= last + self.config.scan_interval);

        match self.config.blip_behavior {
            BlipBehavior::RandomScanToScan => {
                removed += initial;
                self.populations.remove(&channel);
                if generator_scan_due {
                    self.base.clear();
                    self.base_updated_at = None;
                }
                if let Some(state) = self.channels.get_mut(&channel) {
                    state.blips_created = false;
                }
            }
            BlipBehavior::ConsistentScanToScan => {
                let created = self
                    .channels
                    .get(&channel)
                    .is_some_and(|state| state.blips_created);
                if created {
                    create = false;
                    removed += self.thin(channel, rng);
                }
            }
        }
        if generator_scan_due {
            self.last_scan = Some(sim_time);
            self.scan_index += 1;
        }

        let created = self
            .channels
            .get(&channel)
            .is_some_and(|state| state.blips_created);
        let mut placed = 0;
        if create && !created {
            placed = self.place_blips(sim_time, channel, jammer, rng);
        } else if !create && created {
            self.advance_blips(sim_time, channel, jammer);
        }

        if let Some(state) = self.channels.get_mut(&channel) {
            state.last_scan = Some(sim_time);
            if placed > 0 {
                state.screened_count = 0;
            }
        }

        let ending = self.populations.get(&channel).map_or(0, Vec::len);
        debug!(
            generator = self.id,
            channel,
            initial,
            placed,
            removed,
            ending,
            "false target rescan"
        );
        placed > 0
    }

    // Remove round(count * (1 - persistence)) blips chosen at random.
    fn thin(&mut self, channel: ChannelId, rng: &mut ChaCha8Rng) -> usize {
        let persistence = self.config.persistence;
        let Some(blips) = self.populations.get_mut(&channel) else {
            return 0;
        };
        let to_remove = (blips.len() as f64 * (1.0 - persistence)).round() as usize;
        if to_remove >= blips.len() {
            let count = blips.len();
            blips.clear();
            return count;
        }
        for _ in 0..to_remove {
            let index = rng.gen_range(0..blips.len());
            blips.remove(index);
        }
        to_remove
    }

    fn place_blips(
        &mut self,
        sim_time: f64,
        channel: ChannelId,
        jammer: &Kinematics,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let quantity = self.config.quantity;
        let centroid = self.centroid_position(sim_time, jammer);
        let reference_heading = match self.config.bearing_reference {
            BearingReference::North => 0.0,
            BearingReference::Jammer => centroid.bearing_to(&jammer.position),
        };
        let shared = self.config.radar_behavior == RadarBehavior::ConsistentToMultipleRadars;
        if shared {
            if self.base.is_empty() {
                self.base_updated_at = Some(sim_time);
                self.base_jammer_position = jammer.position;
            } else {
                self.advance_base(sim_time, jammer);
            }
        }

        let mut platform_rng = match self.config.platform_behavior {
            PlatformBehavior::ConsistentToMultiplePlatforms => Some(ChaCha8Rng::seed_from_u64(
                stable_seed(&self.config.name, self.scan_index),
            )),
            PlatformBehavior::RandomToMultiplePlatforms => None,
        };

        let mut blips = Vec::with_capacity(quantity);
        for index in 0..quantity {
            if shared && index < self.base.len() {
                let mut blip = self.base[index].clone();
                blip.channel_id = channel;
                blips.push(blip);
                continue;
            }
            let draw: &mut ChaCha8Rng = match platform_rng.as_mut() {
                Some(seeded) => seeded,
                None => &mut *rng,
            };
            let Some(blip) = self.new_blip(channel, &centroid, reference_heading, jammer, draw)
            else {
                break;
            };
            if shared {
                self.base.push(blip.clone());
            }
            blips.push(blip);
        }

        let placed = blips.len();
        self.populations.insert(channel, blips);
        if let Some(state) = self.channels.get_mut(&channel) {
            state.blips_created = true;
            state.last_blip_update = Some(sim_time);
            state.last_jammer_position = jammer.position;
        }
        if placed > 0 {
            self.consumed.retain(|(_, consumed_channel)| *consumed_channel != channel);
        }
        placed
    }

    fn new_blip(
        &mut self,
        channel: ChannelId,
        centroid: &Position,
        reference_heading: f64,
        jammer: &Kinematics,
        rng: &mut ChaCha8Rng,
    ) -> Option<Blip> {
        let range_extent = *pick_extent(&self.config.range_extents, rng)?;
        let radius = draw_radius(&range_extent, self.config.range_distribution, rng);
        let azimuth_extent = *pick_extent(&self.config.azimuth_extents, rng)?;
        let bearing = draw_uniform(&azimuth_extent, rng) + reference_heading;
        let position = centroid.offset_ned(radius * bearing.cos(), radius * bearing.sin(), 0.0);

        let velocity = match self.config.blip_reference {
            BlipReference::None => {
                let speed = draw_uniform(&self.config.blip_speeds, rng);
                let heading = draw_uniform(&self.config.blip_headings, rng);
                Velocity::from_speed_heading(speed, heading)
            }
            BlipReference::Jammer => Velocity::from_speed_heading(jammer.speed(), jammer.heading()),
        };

        self.name_counter += 1;
        let name = format!("{}_{}.{}", self.config.name, self.id, self.name_counter);
        Some(Blip::new(
            self.ids.allocate(),
            name,
            self.id,
            channel,
            self.config.blip_behavior,
            Kinematics::new(position, velocity),
        ))
    }

    // Placement centre: the configured centroid drifted to `sim_time`, or the jammer.
    fn centroid_position(&mut self, sim_time: f64, jammer: &Kinematics) -> Position {
        let Some(centroid) = self.centroid.as_mut() else {
            return jammer.position;
        };
        if let Some(last) = self.centroid_updated_at {
            let dt = sim_time - last;
            if dt > TIME_EPSILON && centroid.speed > MIN_BLIP_SPEED {
                let drift = Velocity::from_speed_heading(centroid.speed, centroid.heading);
                centroid.position = centroid.position.advanced(&drift, dt);
            }
        }
        self.centroid_updated_at = Some(sim_time);
        centroid.position
    }

    fn advance_blips(&mut self, sim_time: f64, channel: ChannelId, jammer: &Kinematics) {
        let Some(state) = self.channels.get_mut(&channel) else {
            return;
        };
        let Some(blips) = self.populations.get_mut(&channel) else {
            return;
        };
        let Some(last) = state.last_blip_update else {
            return;
        };
        let dt = sim_time - last;
        if dt < TIME_EPSILON {
            return;
        }
        let moved = move_population(
            blips,
            dt,
            &mut state.last_jammer_position,
            jammer,
            self.config.blip_reference,
            self.config.blip_speeds.max,
        );
        if moved {
            state.last_blip_update = Some(sim_time);
            trace!(generator = self.id, channel, dt, "blips advanced");
        }
    }

    fn advance_base(&mut self, sim_time: f64, jammer: &Kinematics) {
        let Some(last) = self.base_updated_at else {
            return;
        };
        let dt = sim_time - last;
        if dt < TIME_EPSILON {
            return;
        }
        if move_population(
            &mut self.base,
            dt,
            &mut self.base_jammer_position,
            jammer,
            self.config.blip_reference,
            self.config.blip_speeds.max,
        ) {
            self.base_updated_at = Some(sim_time);
        }
    }

    // --- Power ---

    /// True when the jammer is loud enough in the observer's receiver for
    /// its blips to be seen at all. The result is kept on the channel state.
    pub fn power_sufficiency_check(
        &mut self,
        evaluator: &dyn InteractionEvaluator,
        observer: &Observer,
        channel: ChannelId,
        jammer: &JammerView,
    ) -> bool {
        let jnr = evaluator.jammer_to_noise(observer, jammer);
        let sufficient = jnr >= observer.detection_threshold;
        if let Some(state) = self.channels.get_mut(&channel) {
            state.rejected = !sufficient;
        }
        if !sufficient {
            trace!(generator = self.id, channel, observer = %observer.key, jnr, "jammer power insufficient");
        }
        sufficient
    }

    // --- Blip access ---

    /// Blips of a channel. Unknown channels have none.
    pub fn blips(&self, channel: ChannelId) -> &[Blip] {
        self.populations
            .get(&channel)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn blips_mut(&mut self, channel: ChannelId) -> &mut [Blip] {
        self.populations
            .get_mut(&channel)
            .map(Vec::as_mut_slice)
            .unwrap_or(&mut [])
    }

    pub fn blip(&self, id: BlipId, channel: ChannelId) -> Option<&Blip> {
        self.blips(channel).iter().find(|blip| blip.id == id)
    }

    pub fn blip_mut(&mut self, id: BlipId, channel: ChannelId) -> Option<&mut Blip> {
        self.populations
            .get_mut(&channel)?
            .iter_mut()
            .find(|blip| blip.id == id)
    }

    pub fn blip_by_name(&self, name: &str, channel: ChannelId) -> Option<&Blip> {
        self.blips(channel).iter().find(|blip| blip.name == name)
    }

    pub fn blip_count(&self, channel: ChannelId) -> usize {
        self.blips(channel).len()
    }

    /// Mark every blip of the channel as unseen by `observer`.
    pub fn drop_tracks(&mut self, observer: &ObserverKey, channel: ChannelId) {
        for blip in self.blips_mut(channel) {
            blip.undetect(observer);
        }
    }

    // --- New-blip hand-over ---

    /// True until `screener` has taken the channel's current population.
    pub fn new_blips_pending(&self, screener: ScreenerId, channel: ChannelId) -> bool {
        self.populations.contains_key(&channel) && !self.consumed.contains(&(screener, channel))
    }

    pub fn mark_blips_consumed(&mut self, screener: ScreenerId, channel: ChannelId) {
        if self.consumed.insert((screener, channel)) {
            if let Some(state) = self.channels.get_mut(&channel) {
                state.screened_count += 1;
            }
        }
    }

    // --- Teardown ---

    /// Forget a channel. A generator left without channels is reset.
    pub fn remove_jammer(&mut self, channel: ChannelId) {
        self.channels.remove(&channel);
        self.clear_blips(channel);
        if self.channels.is_empty() {
            self.reset();
        }
    }

    pub fn clear_blips(&mut self, channel: ChannelId) {
        self.populations.remove(&channel);
        self.consumed.retain(|(_, consumed_channel)| *consumed_channel != channel);
        if let Some(state) = self.channels.get_mut(&channel) {
            state.blips_created = false;
            state.last_scan = None;
            state.screened_count = 0;
        }
    }

    pub fn clear_all_blips(&mut self) {
        let channels: Vec<ChannelId> = self.populations.keys().copied().collect();
        for channel in channels {
            self.clear_blips(channel);
        }
    }

    /// Back to the freshly constructed state, keeping id, config and on/off state.
    pub fn reset(&mut self) {
        self.populations.clear();
        self.channels.clear();
        self.base.clear();
        self.base_updated_at = None;
        self.centroid = self.config.centroid;
        self.centroid_updated_at = None;
        self.last_scan = None;
        self.scan_index = 0;
        self.consumed.clear();
    }
}

/// Move a population by `dt`. Returns whether anything moved.
fn move_population(
    blips: &mut [Blip],
    dt: f64,
    last_jammer_position: &mut Position,
    jammer: &Kinematics,
    reference: BlipReference,
    max_speed: f64,
) -> bool {
    match reference {
        BlipReference::Jammer => {
            let shift = jammer.position.as_dvec3() - last_jammer_position.as_dvec3();
            *last_jammer_position = jammer.position;
            let velocity = Velocity::from_speed_heading(jammer.speed(), jammer.heading());
            for blip in blips.iter_mut() {
                let moved = blip.kinematics.position.as_dvec3() + shift;
                blip.kinematics.position = Position::from_dvec3(moved);
                blip.kinematics.velocity = velocity;
            }
            true
        }
        BlipReference::None if max_speed > MIN_BLIP_SPEED => {
            for blip in blips.iter_mut() {
                let velocity = blip.kinematics.velocity;
                blip.kinematics.position = blip.kinematics.position.advanced(&velocity, dt);
            }
            true
        }
        BlipReference::None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decoy_core::config::Extent;

    fn generator(config: GeneratorConfig) -> FalseTargetGenerator {
        FalseTargetGenerator::new(1, config, Arc::new(BlipIdAllocator::new()))
    }

    fn ring(quantity: usize) -> GeneratorConfig {
        GeneratorConfig {
            name: "ring".into(),
            quantity,
            range_extents: vec![Extent::new(10_000.0, 20_000.0)],
            ..Default::default()
        }
    }

    fn jammer() -> Kinematics {
        Kinematics::stationary(Position::new(0.0, 0.0, 9144.0))
    }

    #[test]
    fn test_first_update_places_population() {
        let mut gen = generator(ring(25));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(gen.update(0.0, 7, &jammer(), &mut rng));
        assert_eq!(gen.blip_count(7), 25);
        for blip in gen.blips(7) {
            let r = jammer().position.horizontal_range_to(&blip.position());
            assert!((10_000.0 - 1e-6..=20_000.0 + 1e-6).contains(&r), "radius {r}");
            assert_eq!(blip.channel_id, 7);
            assert!(blip.name.starts_with("ring_1."));
        }
    }

    #[test]
    fn test_same_time_update_is_ignored() {
        let mut gen = generator(ring(5));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        gen.update(1.0, 1, &jammer(), &mut rng);
        let ids: Vec<BlipId> = gen.blips(1).iter().map(|b| b.id).collect();
        assert!(!gen.update(1.0, 1, &jammer(), &mut rng));
        let again: Vec<BlipId> = gen.blips(1).iter().map(|b| b.id).collect();
        assert_eq!(ids, again);
    }

    #[test]
    fn test_random_behavior_replaces_every_scan() {
        let mut gen = generator(ring(10));
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        gen.update(0.0, 1, &jammer(), &mut rng);
        let first: HashSet<BlipId> = gen.blips(1).iter().map(|b| b.id).collect();

        assert!(!gen.update(10.0, 1, &jammer(), &mut rng), "mid-interval update only moves blips");
        assert!(gen.update(20.0, 1, &jammer(), &mut rng));
        let second: HashSet<BlipId> = gen.blips(1).iter().map(|b| b.id).collect();
        assert_eq!(second.len(), 10);
        assert!(first.is_disjoint(&second));
    }

    #[test]
    fn test_consistent_full_persistence_keeps_population() {
        let config = GeneratorConfig {
            blip_behavior: BlipBehavior::ConsistentScanToScan,
            ..ring(10)
        };
        let mut gen = generator(config);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        gen.update(0.0, 1, &jammer(), &mut rng);
        let first: Vec<BlipId> = gen.blips(1).iter().map(|b| b.id).collect();
        assert!(!gen.update(20.0, 1, &jammer(), &mut rng));
        let second: Vec<BlipId> = gen.blips(1).iter().map(|b| b.id).collect();
        assert_eq!(first, second);
        assert_eq!(gen.channel_state(1).and_then(|s| s.last_scan), Some(20.0));
    }

    #[test]
    fn test_persistence_thins_population() {
        let config = GeneratorConfig {
            blip_behavior: BlipBehavior::ConsistentScanToScan,
            persistence: 0.5,
            ..ring(40)
        };
        let mut gen = generator(config);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        gen.update(0.0, 1, &jammer(), &mut rng);
        let first: HashSet<BlipId> = gen.blips(1).iter().map(|b| b.id).collect();
        gen.update(20.0, 1, &jammer(), &mut rng);
        assert_eq!(gen.blip_count(1), 20);
        assert!(gen.blips(1).iter().all(|b| first.contains(&b.id)), "no new blips");
        gen.update(40.0, 1, &jammer(), &mut rng);
        assert_eq!(gen.blip_count(1), 10);
    }

    #[test]
    fn test_zero_persistence_drains_population() {
        let config = GeneratorConfig {
            blip_behavior: BlipBehavior::ConsistentScanToScan,
            persistence: 0.0,
            ..ring(8)
        };
        let mut gen = generator(config);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        gen.update(0.0, 1, &jammer(), &mut rng);
        gen.update(20.0, 1, &jammer(), &mut rng);
        assert_eq!(gen.blip_count(1), 0);
        gen.update(40.0, 1, &jammer(), &mut rng);
        assert_eq!(gen.blip_count(1), 0, "a drained population is not re-placed");
    }

    #[test]
    fn test_consistent_radars_share_identities() {
        let config = GeneratorConfig {
            radar_behavior: RadarBehavior::ConsistentToMultipleRadars,
            centroid: Some(ReferenceCentroid {
                position: Position::new(0.0, 100_000.0, 9144.0),
                ..Default::default()
            }),
            ..ring(12)
        };
        let mut gen = generator(config);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        gen.update(0.0, 1, &jammer(), &mut rng);
        gen.update(0.0, 2, &jammer(), &mut rng);
        let a: Vec<(BlipId, String)> = gen.blips(1).iter().map(|b| (b.id, b.name.clone())).collect();
        let b: Vec<(BlipId, String)> = gen.blips(2).iter().map(|b| (b.id, b.name.clone())).collect();
        assert_eq!(a, b);
        assert_eq!(gen.blips(1)[0].position(), gen.blips(2)[0].position());
    }

    #[test]
    fn test_random_radars_get_distinct_identities() {
        let mut gen = generator(ring(12));
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        gen.update(0.0, 1, &jammer(), &mut rng);
        gen.update(0.0, 2, &jammer(), &mut rng);
        let a: HashSet<BlipId> = gen.blips(1).iter().map(|b| b.id).collect();
        let b: HashSet<BlipId> = gen.blips(2).iter().map(|b| b.id).collect();
        assert!(a.is_disjoint(&b));
    }

    #[test]
    fn test_consistent_platforms_place_identical_geometry() {
        let config = GeneratorConfig {
            radar_behavior: RadarBehavior::ConsistentToMultipleRadars,
            platform_behavior: PlatformBehavior::ConsistentToMultiplePlatforms,
            centroid: Some(ReferenceCentroid::default()),
            ..ring(6)
        };
        let ids = Arc::new(BlipIdAllocator::new());
        let mut first = FalseTargetGenerator::new(1, config.clone(), ids.clone());
        let mut second = FalseTargetGenerator::new(2, config, ids);
        let mut rng_a = ChaCha8Rng::seed_from_u64(100);
        let mut rng_b = ChaCha8Rng::seed_from_u64(200);
        first.update(0.0, 1, &jammer(), &mut rng_a);
        second.update(0.0, 1, &jammer(), &mut rng_b);
        let a: Vec<Position> = first.blips(1).iter().map(Blip::position).collect();
        let b: Vec<Position> = second.blips(1).iter().map(Blip::position).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_jammer_reference_follows_jammer() {
        let config = GeneratorConfig {
            blip_reference: BlipReference::Jammer,
            blip_behavior: BlipBehavior::ConsistentScanToScan,
            ..ring(3)
        };
        let mut gen = generator(config);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let start = Kinematics::new(Position::default(), Velocity::from_speed_heading(200.0, 0.0));
        gen.update(0.0, 1, &start, &mut rng);
        let before = gen.blips(1)[0].position();

        let later = Kinematics::new(Position::new(0.0, 1000.0, 0.0), start.velocity);
        gen.update(5.0, 1, &later, &mut rng);
        let after = gen.blips(1)[0].position();
        assert!((after.y - before.y - 1000.0).abs() < 1e-6);
        assert!((gen.blips(1)[0].kinematics.speed() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_blip_velocity_integrates_between_scans() {
        let config = GeneratorConfig {
            blip_behavior: BlipBehavior::ConsistentScanToScan,
            blip_speeds: Extent::new(100.0, 100.0),
            blip_headings: Extent::new(0.0, 0.0),
            ..ring(2)
        };
        let mut gen = generator(config);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        gen.update(0.0, 1, &jammer(), &mut rng);
        let before = gen.blips(1)[0].position();
        gen.update(10.0, 1, &jammer(), &mut rng);
        let after = gen.blips(1)[0].position();
        assert!((after.y - before.y - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_new_blip_handover_per_screener() {
        let mut gen = generator(ring(4));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(!gen.new_blips_pending(10, 1), "nothing placed yet");
        gen.update(0.0, 1, &jammer(), &mut rng);
        assert!(gen.new_blips_pending(10, 1));
        gen.mark_blips_consumed(10, 1);
        assert!(!gen.new_blips_pending(10, 1));
        assert!(gen.new_blips_pending(11, 1));
        assert_eq!(gen.channel_state(1).map(|s| s.screened_count), Some(1));

        gen.update(20.0, 1, &jammer(), &mut rng);
        assert!(gen.new_blips_pending(10, 1), "a rescan hands over a new population");
    }

    #[test]
    fn test_remove_last_channel_resets() {
        let mut gen = generator(ring(4));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        gen.update(0.0, 1, &jammer(), &mut rng);
        gen.remove_jammer(1);
        assert!(gen.blips(1).is_empty());
        assert!(gen.channel_state(1).is_none());
        assert!(gen.update(1.0, 1, &jammer(), &mut rng), "fresh channel places again");
    }

    #[test]
    fn test_clear_all_blips_keeps_channels() {
        let mut gen = generator(ring(6));
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        gen.update(0.0, 1, &jammer(), &mut rng);
        gen.update(0.0, 2, &jammer(), &mut rng);
        gen.mark_blips_consumed(10, 1);

        gen.clear_all_blips();
        for channel in [1, 2] {
            assert!(gen.blips(channel).is_empty());
            let state = gen.channel_state(channel).expect("channel kept");
            assert!(!state.blips_created);
            assert_eq!(state.screened_count, 0);
            assert!(!gen.new_blips_pending(10, channel));
        }

        assert!(gen.update(1.0, 1, &jammer(), &mut rng), "cleared channel places again");
        assert_eq!(gen.blip_count(1), 6);
        assert!(gen.new_blips_pending(10, 1));
    }

    #[test]
    fn test_unknown_lookups() {
        let gen = generator(ring(4));
        assert!(gen.blips(99).is_empty());
        assert!(gen.blip(42, 99).is_none());
        assert!(gen.blip_by_name("ring_1.1", 99).is_none());
    }

    #[test]
    fn test_disabled_generator_does_not_update() {
        let mut gen = generator(ring(4));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(gen.set_enabled(false));
        assert!(!gen.set_enabled(false));
        assert_eq!(gen.toggle_epoch(), 1);
        assert!(!gen.update(0.0, 1, &jammer(), &mut rng));
        assert!(gen.blips(1).is_empty());
    }

    #[test]
    fn test_drop_tracks_undetects_for_observer() {
        use decoy_core::interaction::Interaction;

        let mut gen = generator(ring(3));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        gen.update(0.0, 1, &jammer(), &mut rng);
        let observer = Observer {
            key: ObserverKey::new(5, 1),
            position: Position::new(0.0, -100_000.0, 0.0),
            detection_threshold: 1.0,
        };
        let seen = Interaction {
            detectable: true,
            signal_to_noise: 50.0,
            range: 110_000.0,
            ..Default::default()
        };
        for blip in gen.blips_mut(1) {
            blip.record_observation(&observer, &seen, &jammer().position, false, 0.0);
        }
        gen.drop_tracks(&observer.key, 1);
        assert!(gen
            .blips(1)
            .iter()
            .all(|b| b.strength(&observer.key) == BlipStrength::Undetected));
    }
}

//! Simulation engine: the headless driver of the screening pipeline.
//!
//! `SimulationEngine` owns a hecs world of platforms (position, velocity,
//! radar site, jammer, real target), arenas of generators, screeners and
//! fusion centers keyed by id, the seeded RNG and the lifecycle event
//! queue. Each step handles queued events and then runs generators,
//! screeners and fusion centers in that order before moving platforms.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use decoy_core::components::{Jammer, JammerChannel, Platform, RadarSite, RealTarget};
use decoy_core::config::GeneratorConfig;
use decoy_core::error::{ScenarioError, ScenarioResult};
use decoy_core::events::LifecycleEvent;
use decoy_core::interaction::InteractionEvaluator;
use decoy_core::state::FrameReport;
use decoy_core::types::*;

use crate::evaluation::GeometricEvaluator;
use crate::fusion::FusionCenter;
use crate::generator::{FalseTargetGenerator, GeneratorMap};
use crate::ids::BlipIdAllocator;
use crate::screener::Screener;
use crate::systems;
use crate::systems::screening::ScreeningInputs;
use crate::track_store::TrackTable;

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    /// Step length in seconds.
    pub dt: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self { seed: 42, dt: 1.0 }
    }
}

/// A screener and the track table of its site.
#[derive(Debug)]
pub struct ScreenerSlot {
    pub screener: Screener,
    pub tracks: TrackTable,
}

/// A fusion center and its own track table.
#[derive(Debug)]
pub struct FusionSlot {
    pub fusion: FusionCenter,
    pub tracks: TrackTable,
}

pub struct SimulationEngine {
    world: World,
    time: SimTime,
    dt: f64,
    rng: ChaCha8Rng,
    evaluator: Box<dyn InteractionEvaluator>,
    blip_ids: Arc<BlipIdAllocator>,
    generators: GeneratorMap,
    screeners: BTreeMap<ScreenerId, ScreenerSlot>,
    fusion_centers: BTreeMap<FusionId, FusionSlot>,
    event_queue: VecDeque<LifecycleEvent>,
}

impl SimulationEngine {
    /// Create an engine with the reference evaluator.
    pub fn new(config: SimConfig) -> Self {
        Self::with_evaluator(config, Box::new(GeometricEvaluator::default()))
    }

    pub fn with_evaluator(config: SimConfig, evaluator: Box<dyn InteractionEvaluator>) -> Self {
        Self {
            world: World::new(),
            time: SimTime::default(),
            dt: config.dt,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            evaluator,
            blip_ids: Arc::new(BlipIdAllocator::new()),
            generators: GeneratorMap::new(),
            screeners: BTreeMap::new(),
            fusion_centers: BTreeMap::new(),
            event_queue: VecDeque::new(),
        }
    }

    // --- Building ---

    pub fn spawn_platform(&mut self, platform: Platform, kinematics: Kinematics) -> ScenarioResult<Entity> {
        if self.find_platform(platform.id).is_some() {
            return Err(ScenarioError::DuplicateId {
                kind: "platform",
                id: u64::from(platform.id),
            });
        }
        Ok(self
            .world
            .spawn((platform, kinematics.position, kinematics.velocity)))
    }

    /// Put a radar site on a platform. A platform carries one site.
    pub fn add_radar_site(&mut self, platform: PlatformId, site: RadarSite) -> ScenarioResult<()> {
        let entity = self.platform_entity(platform)?;
        let slot = self
            .screeners
            .get(&site.screener)
            .ok_or(ScenarioError::UnknownScreener(site.screener))?;
        // The screener must have been created for this (site, sensor).
        if slot.screener.observer() != ObserverKey::new(platform, site.sensor) {
            return Err(ScenarioError::UnknownScreener(site.screener));
        }
        self.world
            .insert_one(entity, site)
            .map_err(|_| ScenarioError::UnknownPlatform(platform))
    }

    pub fn add_jammer_channel(&mut self, platform: PlatformId, channel: JammerChannel) -> ScenarioResult<()> {
        let entity = self.platform_entity(platform)?;
        if !self.generators.contains_key(&channel.generator) {
            return Err(ScenarioError::UnknownGenerator(channel.generator));
        }
        if let Ok(mut jammer) = self.world.get::<&mut Jammer>(entity) {
            jammer.channels.push(channel);
            return Ok(());
        }
        self.world
            .insert_one(
                entity,
                Jammer {
                    channels: vec![channel],
                },
            )
            .map_err(|_| ScenarioError::UnknownPlatform(platform))
    }

    pub fn add_real_target(&mut self, platform: PlatformId, target: RealTarget) -> ScenarioResult<()> {
        let entity = self.platform_entity(platform)?;
        self.world
            .insert_one(entity, target)
            .map_err(|_| ScenarioError::UnknownPlatform(platform))
    }

    /// Validate a configuration and create a generator sharing the engine's id allocator.
    pub fn add_generator(&mut self, id: GeneratorId, config: GeneratorConfig) -> ScenarioResult<()> {
        if self.generators.contains_key(&id) {
            return Err(ScenarioError::DuplicateId {
                kind: "generator",
                id: u64::from(id),
            });
        }
        config
            .validate()
            .map_err(|source| ScenarioError::config(format!("generator {id}"), source))?;
        let generator = FalseTargetGenerator::new(id, config, Arc::clone(&self.blip_ids));
        self.generators.insert(id, generator);
        Ok(())
    }

    pub fn add_screener(&mut self, screener: Screener) -> ScenarioResult<()> {
        let id = screener.id();
        if self.screeners.contains_key(&id) {
            return Err(ScenarioError::DuplicateId {
                kind: "screener",
                id: u64::from(id),
            });
        }
        screener
            .config()
            .validate()
            .map_err(|source| ScenarioError::config(format!("screener {id}"), source))?;
        self.screeners.insert(
            id,
            ScreenerSlot {
                screener,
                tracks: TrackTable::new(),
            },
        );
        Ok(())
    }

    pub fn add_fusion_center(&mut self, fusion: FusionCenter) -> ScenarioResult<()> {
        let id = fusion.id();
        if self.fusion_centers.contains_key(&id) {
            return Err(ScenarioError::DuplicateId {
                kind: "fusion center",
                id: u64::from(id),
            });
        }
        fusion
            .config()
            .validate()
            .map_err(|source| ScenarioError::config(format!("fusion center {id}"), source))?;
        self.platform_entity(fusion.platform())?;
        self.fusion_centers.insert(
            id,
            FusionSlot {
                fusion,
                tracks: TrackTable::new(),
            },
        );
        Ok(())
    }

    /// Have a screener screen the blips a generator places for a channel.
    pub fn attach_false_target(
        &mut self,
        screener: ScreenerId,
        generator: GeneratorId,
        channel: ChannelId,
    ) -> ScenarioResult<()> {
        if !self.generators.contains_key(&generator) {
            return Err(ScenarioError::UnknownGenerator(generator));
        }
        let slot = self
            .screeners
            .get_mut(&screener)
            .ok_or(ScenarioError::UnknownScreener(screener))?;
        slot.screener.add_false_target(generator, channel);
        Ok(())
    }

    /// Offer every screener on an enabled radar site to every fusion center.
    pub fn register_active_screeners(&mut self) {
        let mut query = self.world.query::<(&Platform, &RadarSite)>();
        for (_entity, (platform, site)) in query.iter() {
            if !site.mode_on {
                continue;
            }
            let observer = ObserverKey::new(platform.id, site.sensor);
            for slot in self.fusion_centers.values_mut() {
                slot.fusion.check_for_screener_add(site.screener, observer);
            }
        }
    }

    // --- Events ---

    /// Queue a lifecycle event for handling at the start of the next step.
    pub fn queue_event(&mut self, event: LifecycleEvent) {
        self.event_queue.push_back(event);
    }

    pub fn queue_events(&mut self, events: impl IntoIterator<Item = LifecycleEvent>) {
        self.event_queue.extend(events);
    }

    // --- Stepping ---

    /// Advance the simulation by one step and return the resulting report.
    pub fn step(&mut self) -> FrameReport {
        self.process_events();

        let sim_time = self.time.elapsed_secs;
        self.run_systems(sim_time);
        self.time.advance(self.dt);

        systems::snapshot::build_report(
            &self.world,
            &self.time,
            sim_time,
            &self.generators,
            &self.screeners,
            &self.fusion_centers,
        )
    }

    /// Report on the current state without stepping.
    pub fn report(&self) -> FrameReport {
        systems::snapshot::build_report(
            &self.world,
            &self.time,
            self.time.elapsed_secs,
            &self.generators,
            &self.screeners,
            &self.fusion_centers,
        )
    }

    fn run_systems(&mut self, sim_time: f64) {
        // 1. Generators
        let jammers =
            systems::generation::run(&self.world, &mut self.generators, sim_time, &mut self.rng);
        // 2. Screeners
        let inputs = ScreeningInputs {
            sim_time,
            evaluator: self.evaluator.as_ref(),
            jammers: &jammers,
        };
        systems::screening::run(
            &self.world,
            &mut self.screeners,
            &mut self.generators,
            &inputs,
            &mut self.rng,
        );
        // 3. Fusion centers
        systems::fusing::run(
            &self.world,
            &mut self.fusion_centers,
            &self.screeners,
            sim_time,
            &mut self.rng,
        );
        // 4. Platform movement
        systems::movement::run(&mut self.world, self.dt);
    }

    fn process_events(&mut self) {
        while let Some(event) = self.event_queue.pop_front() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: LifecycleEvent) {
        debug!(?event, "lifecycle event");
        match event {
            LifecycleEvent::RadarModeActivated { site, sensor } => {
                self.set_radar_mode(site, sensor, true);
            }
            LifecycleEvent::RadarModeDeactivated { site, sensor } => {
                self.set_radar_mode(site, sensor, false);
            }
            LifecycleEvent::PlatformDeleted { platform } => self.delete_platform(platform),
            LifecycleEvent::JammerChannelRemoved { platform, channel } => {
                self.remove_jammer_channel(platform, channel);
            }
            LifecycleEvent::GeneratorToggled { generator, enabled } => {
                match self.generators.get_mut(&generator) {
                    Some(generator) => {
                        generator.set_enabled(enabled);
                    }
                    None => warn!(generator, "toggle for unknown generator"),
                }
            }
        }
    }

    fn set_radar_mode(&mut self, site: PlatformId, sensor: SensorId, on: bool) {
        let Some(entity) = self.find_platform(site) else {
            warn!(site, sensor, "mode change on unknown platform");
            return;
        };
        let screener_id = match self.world.get::<&mut RadarSite>(entity) {
            Ok(mut radar) if radar.sensor == sensor => {
                if radar.mode_on == on {
                    return;
                }
                radar.mode_on = on;
                radar.screener
            }
            _ => {
                warn!(site, sensor, "mode change on unknown sensor");
                return;
            }
        };
        let observer = ObserverKey::new(site, sensor);
        info!(observer = %observer, screener = screener_id, on, "radar mode changed");

        if on {
            for slot in self.fusion_centers.values_mut() {
                slot.fusion.check_for_screener_add(screener_id, observer);
            }
            return;
        }

        let Some(slot) = self.screeners.get_mut(&screener_id) else {
            return;
        };
        for fusion in self.fusion_centers.values_mut() {
            fusion
                .fusion
                .check_for_screener_reset(&mut slot.screener, &mut fusion.tracks);
        }
        let sources: Vec<(GeneratorId, ChannelId)> = slot.screener.sources().collect();
        for (generator, channel) in sources {
            if let Some(generator) = self.generators.get_mut(&generator) {
                generator.drop_tracks(&observer, channel);
            }
        }
        slot.screener.reset();
        slot.tracks.clear();
    }

    fn delete_platform(&mut self, platform: PlatformId) {
        let Some(entity) = self.find_platform(platform) else {
            warn!(platform, "deletion of unknown platform");
            return;
        };

        let channels: Vec<JammerChannel> = self
            .world
            .get::<&Jammer>(entity)
            .map(|jammer| jammer.channels.clone())
            .unwrap_or_default();
        for channel in &channels {
            self.detach_channel(channel);
        }

        let site = self.world.get::<&RadarSite>(entity).map(|site| *site).ok();
        if let Some(site) = site {
            self.screeners.remove(&site.screener);
        }
        for slot in self.fusion_centers.values_mut() {
            slot.fusion.platform_deleted(platform);
        }
        self.fusion_centers
            .retain(|_, slot| slot.fusion.platform() != platform);

        if self.world.despawn(entity).is_ok() {
            info!(platform, channels = channels.len(), "platform deleted");
        }
    }

    fn remove_jammer_channel(&mut self, platform: PlatformId, channel: ChannelId) {
        let Some(entity) = self.find_platform(platform) else {
            warn!(platform, channel, "channel removal on unknown platform");
            return;
        };
        let removed: Vec<JammerChannel> = match self.world.get::<&mut Jammer>(entity) {
            Ok(mut jammer) => {
                let (removed, kept): (Vec<JammerChannel>, Vec<JammerChannel>) = jammer
                    .channels
                    .iter()
                    .copied()
                    .partition(|c| c.channel == channel);
                jammer.channels = kept;
                removed
            }
            Err(_) => Vec::new(),
        };
        if removed.is_empty() {
            warn!(platform, channel, "removal of unknown jammer channel");
        }
        for channel in &removed {
            self.detach_channel(channel);
        }
    }

    fn detach_channel(&mut self, channel: &JammerChannel) {
        if let Some(generator) = self.generators.get_mut(&channel.generator) {
            generator.remove_jammer(channel.channel);
        }
        for slot in self.screeners.values_mut() {
            slot.screener
                .remove_false_target(channel.generator, channel.channel);
        }
    }

    // --- Lookup ---

    fn find_platform(&self, id: PlatformId) -> Option<Entity> {
        let mut query = self.world.query::<&Platform>();
        let found = query
            .iter()
            .find(|(_, platform)| platform.id == id)
            .map(|(entity, _)| entity);
        found
    }

    fn platform_entity(&self, id: PlatformId) -> ScenarioResult<Entity> {
        self.find_platform(id).ok_or(ScenarioError::UnknownPlatform(id))
    }

    // --- Accessors ---

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn generator(&self, id: GeneratorId) -> Option<&FalseTargetGenerator> {
        self.generators.get(&id)
    }

    pub fn generators(&self) -> &GeneratorMap {
        &self.generators
    }

    pub fn screener(&self, id: ScreenerId) -> Option<&Screener> {
        self.screeners.get(&id).map(|slot| &slot.screener)
    }

    pub fn screener_tracks(&self, id: ScreenerId) -> Option<&TrackTable> {
        self.screeners.get(&id).map(|slot| &slot.tracks)
    }

    pub fn fusion_center(&self, id: FusionId) -> Option<&FusionCenter> {
        self.fusion_centers.get(&id).map(|slot| &slot.fusion)
    }

    pub fn fusion_tracks(&self, id: FusionId) -> Option<&TrackTable> {
        self.fusion_centers.get(&id).map(|slot| &slot.tracks)
    }

    pub fn blip_ids(&self) -> &Arc<BlipIdAllocator> {
        &self.blip_ids
    }

    /// Teleport a platform (for tests).
    #[cfg(test)]
    pub fn set_platform_position(&mut self, id: PlatformId, position: Position) -> bool {
        let Some(entity) = self.find_platform(id) else {
            return false;
        };
        match self.world.get::<&mut Position>(entity) {
            Ok(mut current) => {
                *current = position;
                true
            }
            Err(_) => false,
        }
    }
}

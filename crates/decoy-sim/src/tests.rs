//! Tests for the screening pipeline, the engine, and lifecycle events.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::thread;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use decoy_core::components::{Blip, Platform, RadarSite, RealTarget};
use decoy_core::config::*;
use decoy_core::constants::BLIP_ID_FLOOR;
use decoy_core::enums::*;
use decoy_core::events::LifecycleEvent;
use decoy_core::interaction::*;
use decoy_core::types::*;

use crate::engine::{SimConfig, SimulationEngine};
use crate::generator::{FalseTargetGenerator, GeneratorMap};
use crate::ids::BlipIdAllocator;
use crate::scenario::Scenario;
use crate::screener::{JammerMap, ScreenContext, Screener, TargetReport};
use crate::track_store::TrackTable;

// ---- Test doubles ----

/// Evaluator that answers from a script instead of geometry.
struct ScriptedEvaluator {
    blip_snr: f64,
    blip_overrides: HashMap<BlipId, f64>,
    targets: HashMap<ObjectId, Interaction>,
    jammer_to_noise: f64,
}

impl ScriptedEvaluator {
    fn new(blip_snr: f64) -> Self {
        Self {
            blip_snr,
            blip_overrides: HashMap::new(),
            targets: HashMap::new(),
            jammer_to_noise: 10.0,
        }
    }
}

impl InteractionEvaluator for ScriptedEvaluator {
    fn evaluate_blip(&self, observer: &Observer, blip: &Blip, _jammer: &JammerView) -> Interaction {
        let snr = self
            .blip_overrides
            .get(&blip.id)
            .copied()
            .unwrap_or(self.blip_snr);
        let detectable = snr >= observer.detection_threshold;
        Interaction {
            detectable,
            signal_to_noise: snr,
            range: observer.position.range_to(&blip.position()),
            bearing: observer.position.bearing_to(&blip.position()),
            failure_reasons: if detectable { 0 } else { failure::SIGNAL_LEVEL },
            equivalent_rcs: 0.0,
        }
    }

    fn evaluate_target(&self, _observer: &Observer, target: &TargetView) -> Interaction {
        self.targets
            .get(&target.object_id)
            .copied()
            .unwrap_or_else(|| Interaction::undetectable(0.0, 0.0, failure::SIGNAL_LEVEL))
    }

    fn jammer_to_noise(&self, _observer: &Observer, _jammer: &JammerView) -> f64 {
        self.jammer_to_noise
    }
}

fn detection(range: f64, bearing: f64) -> Interaction {
    Interaction {
        detectable: true,
        signal_to_noise: 50.0,
        range,
        bearing,
        failure_reasons: 0,
        equivalent_rcs: 1.0,
    }
}

// ---- Screener bench ----

/// One generator on one channel, screened by one site at the origin.
struct Bench {
    generators: GeneratorMap,
    jammers: JammerMap,
    screener: Screener,
    tracks: TrackTable,
    rng: ChaCha8Rng,
    observer: Observer,
}

fn jammer() -> Kinematics {
    Kinematics::stationary(Position::new(0.0, 0.0, 9144.0))
}

fn bench(quantity: usize, config: ScreenerConfig) -> Bench {
    let generator_config = GeneratorConfig {
        name: "bench".into(),
        quantity,
        blip_behavior: BlipBehavior::ConsistentScanToScan,
        range_extents: vec![Extent::new(10_000.0, 20_000.0)],
        ..Default::default()
    };
    let mut generators = GeneratorMap::new();
    generators.insert(
        1,
        FalseTargetGenerator::new(1, generator_config, Arc::new(BlipIdAllocator::new())),
    );
    let mut jammers = JammerMap::new();
    jammers.insert(
        (1, 1),
        JammerView {
            kinematics: jammer(),
            power: 1.0,
        },
    );
    let key = ObserverKey::new(100, 1);
    let mut screener = Screener::new(1, key, config);
    screener.add_false_target(1, 1);
    Bench {
        generators,
        jammers,
        screener,
        tracks: TrackTable::new(),
        rng: ChaCha8Rng::seed_from_u64(7),
        observer: Observer {
            key,
            position: Position::new(0.0, 0.0, 0.0),
            detection_threshold: 1.0,
        },
    }
}

impl Bench {
    /// Advance the generator and run one screening cycle at `sim_time`.
    fn cycle(
        &mut self,
        sim_time: f64,
        evaluator: &dyn InteractionEvaluator,
        targets: &[ObjectId],
    ) -> bool {
        for generator in self.generators.values_mut() {
            generator.update(sim_time, 1, &jammer(), &mut self.rng);
        }
        let reports = self.reports(evaluator, targets);
        let mut ctx = ScreenContext {
            sim_time,
            observer: self.observer,
            evaluator,
            generators: &mut self.generators,
            jammers: &self.jammers,
            targets: &reports,
            track_store: &mut self.tracks,
            rng: &mut self.rng,
        };
        self.screener.update(&mut ctx)
    }

    // Every scripted object gets a site track on first sight.
    fn reports(&mut self, evaluator: &dyn InteractionEvaluator, targets: &[ObjectId]) -> Vec<TargetReport> {
        targets
            .iter()
            .map(|&object_id| {
                let view = TargetView {
                    object_id,
                    kinematics: Kinematics::default(),
                    rcs: 1.0,
                };
                let track = match self.tracks.handle_for(object_id) {
                    Some(handle) => handle,
                    None => self.tracks.add_track(object_id),
                };
                TargetReport {
                    object_id,
                    interaction: evaluator.evaluate_target(&self.observer, &view),
                    track: Some(track),
                }
            })
            .collect()
    }

    fn population(&self) -> HashSet<BlipId> {
        self.generators[&1].blips(1).iter().map(|blip| blip.id).collect()
    }
}

fn capacity(track_capacity: usize) -> ScreenerConfig {
    ScreenerConfig {
        track_capacity,
        transfer_capacity: track_capacity,
        plot_capacity: 100,
        ..Default::default()
    }
}

// ---- Screener ----

#[test]
fn test_blip_lists_partition_population() {
    let mut evaluator = ScriptedEvaluator::new(10.0);
    let mut bench = bench(50, capacity(20));
    for t in 0..5 {
        if t == 2 {
            // Silence a handful of blips from here on.
            for id in bench.population().into_iter().take(8) {
                evaluator.blip_overrides.insert(id, 0.1);
            }
        }
        bench.cycle(t as f64, &evaluator, &[]);

        let trackable: HashSet<BlipId> = bench.screener.trackable_blip_ids().into_iter().collect();
        let blocked: HashSet<BlipId> = bench.screener.blocked_blip_ids().into_iter().collect();
        let undetected: HashSet<BlipId> = bench.screener.undetected_blip_ids().into_iter().collect();

        assert!(trackable.is_disjoint(&blocked));
        assert!(trackable.is_disjoint(&undetected));
        assert!(blocked.is_disjoint(&undetected));
        let union: HashSet<BlipId> = trackable
            .union(&blocked)
            .chain(undetected.iter())
            .copied()
            .collect();
        assert_eq!(union, bench.population(), "lists must cover the population at t={t}");
        assert!(trackable.len() + blocked.len() <= 20);
    }
}

#[test]
fn test_capacity_fills_with_trackable_blips() {
    let evaluator = ScriptedEvaluator::new(10.0);
    let mut bench = bench(50, capacity(20));
    assert!(bench.cycle(0.0, &evaluator, &[]));
    assert_eq!(bench.screener.trackable_blip_ids().len(), 20);
    assert!(bench.screener.blocked_blip_ids().is_empty());
    assert_eq!(bench.screener.undetected_blip_ids().len(), 30);
    assert_eq!(bench.screener.false_target_tracks().len(), 20);
    assert_eq!(bench.tracks.track_count(), 20);
    assert_eq!(bench.screener.output_type(), OutputType::Tracks);
}

#[test]
fn test_real_targets_share_capacity_proportionally() {
    let mut evaluator = ScriptedEvaluator::new(10.0);
    for object_id in 1..=4 {
        evaluator
            .targets
            .insert(object_id, detection(30_000.0, 0.1 * object_id as f64));
    }
    let mut bench = bench(30, capacity(10));
    bench.cycle(0.0, &evaluator, &[1, 2, 3, 4]);

    // 4 real against 10 detected false: 10 * 4 / 14 = 2 real slots.
    assert_eq!(bench.screener.allowed_real_target_number(), 2);
    assert_eq!(bench.screener.active_target_ids(), vec![3, 4]);
    assert_eq!(bench.screener.blocked_target_ids(), vec![1, 2]);
    assert_eq!(bench.screener.trackable_blip_ids().len(), 8);
    assert_eq!(bench.screener.allowed_false_target_number(), 8);

    let admitted = bench.screener.trackable_blip_ids().len()
        + bench.screener.active_target_ids().len()
        + bench.screener.forced_target_ids().len();
    assert!(admitted <= 10);
}

#[test]
fn test_target_without_track_waits_in_null() {
    let evaluator = ScriptedEvaluator::new(10.0);
    let mut bench = bench(5, capacity(10));
    bench.cycle(0.0, &evaluator, &[]);
    bench
        .screener
        .update_target_track(9, None, &detection(20_000.0, 0.0));
    assert_eq!(bench.screener.target_status(9), Some(TargetStatus::Null));
    assert!(bench.screener.active_target_tracks().is_empty());
}

#[test]
fn test_forced_target_overrides_capacity() {
    let mut evaluator = ScriptedEvaluator::new(10.0);
    evaluator.targets.insert(1, detection(5_000.0, 0.0));
    let config = ScreenerConfig {
        force: ForceTrackConfig {
            range_force: RangeForce::Inside,
            ..Default::default()
        },
        ..capacity(10)
    };
    let mut bench = bench(50, config);

    // No trackable blips yet, so nothing marks the nearest false range.
    bench.cycle(0.0, &evaluator, &[1]);
    assert_eq!(bench.screener.target_status(1), Some(TargetStatus::Blocked));

    // Closer than every trackable blip: forced despite the flood.
    bench.cycle(1.0, &evaluator, &[1]);
    assert_eq!(bench.screener.target_status(1), Some(TargetStatus::Forced));
    let active: Vec<ObjectId> = bench
        .screener
        .active_target_tracks()
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(active, vec![1]);
    assert_eq!(bench.screener.trackable_blip_ids().len(), 9);
}

#[test]
fn test_initial_rejection_thins_handover() {
    let evaluator = ScriptedEvaluator::new(10.0);
    let config = ScreenerConfig {
        initial_rejection: BlipRatios {
            consistent_scan_to_scan: 0.5,
            ..Default::default()
        },
        ..capacity(100)
    };
    let mut bench = bench(40, config);
    bench.cycle(0.0, &evaluator, &[]);
    assert_eq!(bench.screener.blip_count(), 20);
    assert_eq!(bench.screener.trackable_blip_ids().len(), 20);
}

#[test]
fn test_full_rejection_leaves_nothing_trackable() {
    let evaluator = ScriptedEvaluator::new(10.0);
    let config = ScreenerConfig {
        rejection: BlipRatios {
            consistent_scan_to_scan: 1.0,
            ..Default::default()
        },
        ..capacity(100)
    };
    let mut bench = bench(15, config);
    bench.cycle(0.0, &evaluator, &[]);
    assert_eq!(bench.screener.blip_count(), 15);
    assert!(bench.screener.trackable_blip_ids().is_empty());
    assert_eq!(bench.screener.undetected_blip_ids().len(), 15);
}

#[test]
fn test_weak_jammer_hides_blips() {
    let mut evaluator = ScriptedEvaluator::new(10.0);
    evaluator.jammer_to_noise = 0.5;
    let mut bench = bench(12, capacity(100));
    bench.cycle(0.0, &evaluator, &[]);
    assert_eq!(bench.screener.undetected_blip_ids().len(), 12);
    assert!(bench.generators[&1].channel_state(1).is_some_and(|s| s.rejected));
}

#[test]
fn test_repeat_update_is_idempotent() {
    let evaluator = ScriptedEvaluator::new(10.0);
    let mut bench = bench(30, capacity(10));
    bench.cycle(0.0, &evaluator, &[]);
    let trackable = bench.screener.trackable_blip_ids();
    let tracks = bench.tracks.track_count();

    assert!(!bench.cycle(0.0, &evaluator, &[]));
    assert_eq!(bench.screener.trackable_blip_ids(), trackable);
    assert_eq!(bench.tracks.track_count(), tracks);
}

#[test]
fn test_generator_off_clears_screener() {
    let evaluator = ScriptedEvaluator::new(10.0);
    let mut bench = bench(25, capacity(10));
    bench.cycle(0.0, &evaluator, &[]);
    assert_eq!(bench.tracks.track_count(), 10);

    if let Some(generator) = bench.generators.get_mut(&1) {
        assert!(generator.set_enabled(false));
    }
    bench.cycle(1.0, &evaluator, &[]);
    assert_eq!(bench.screener.blip_count(), 0);
    assert!(bench.screener.false_target_tracks().is_empty());
    assert_eq!(bench.tracks.track_count(), 0);
}

#[test]
fn test_reset_takes_standing_population_again() {
    let evaluator = ScriptedEvaluator::new(10.0);
    let mut bench = bench(25, capacity(10));
    bench.cycle(0.0, &evaluator, &[]);
    bench.screener.reset();
    bench.tracks.clear();
    assert_eq!(bench.screener.blip_count(), 0);

    bench.cycle(1.0, &evaluator, &[]);
    assert_eq!(bench.screener.blip_count(), 25);
    assert_eq!(bench.screener.trackable_blip_ids().len(), 10);
}

#[test]
fn test_overload_output_type() {
    let evaluator = ScriptedEvaluator::new(10.0);
    let config = ScreenerConfig {
        track_capacity: 5,
        transfer_capacity: 5,
        plot_capacity: 2,
        overload_multiple: 2,
        plot_multiple: 1,
        ..Default::default()
    };
    let mut bench = bench(30, config);
    bench.cycle(0.0, &evaluator, &[]);
    // Thirty detected blips against an overload boundary of 2 * 2.
    assert_eq!(bench.screener.output_type(), OutputType::Overload);
}

#[test]
fn test_flooded_reporting_bounded_by_transfer_capacity() {
    let evaluator = ScriptedEvaluator::new(10.0);
    let config = ScreenerConfig {
        transfer_capacity: 2,
        track_reporting_when_flooded: true,
        ..capacity(10)
    };
    let mut bench = bench(50, config);
    bench.cycle(0.0, &evaluator, &[]);

    assert!(bench.screener.allow_track_reporting(1));
    assert!(bench.screener.allow_track_reporting(2));
    assert!(!bench.screener.allow_track_reporting(3));
    // Already reporting objects keep their slot.
    assert!(bench.screener.allow_track_reporting(1));

    // Every update starts a fresh reporting set.
    bench.cycle(1.0, &evaluator, &[]);
    assert!(bench.screener.allow_track_reporting(3));
}

#[test]
fn test_reporting_without_flooding_counts_tracks() {
    let evaluator = ScriptedEvaluator::new(10.0);
    let config = ScreenerConfig {
        track_reporting_when_flooded: false,
        ..capacity(10)
    };

    // Ten false tracks fill the transfer capacity of ten.
    let mut flooded = bench(50, config.clone());
    flooded.cycle(0.0, &evaluator, &[]);
    assert_eq!(flooded.screener.false_target_tracks().len(), 10);
    assert!(!flooded.screener.allow_track_reporting(1));

    let mut sparse = bench(5, config.clone());
    sparse.cycle(0.0, &evaluator, &[]);
    assert!(sparse.screener.allow_track_reporting(1));
    assert!(sparse.screener.allow_track_reporting(2));

    // A site without false target sources reports everything.
    let mut bare = Screener::new(2, ObserverKey::new(100, 1), config);
    assert!(bare.allow_track_reporting(1));
}

#[test]
fn test_tracks_transferred_split_proportionally() {
    let mut evaluator = ScriptedEvaluator::new(10.0);
    for object_id in 1..=4 {
        evaluator
            .targets
            .insert(object_id, detection(30_000.0, 0.1 * object_id as f64));
    }
    let config = ScreenerConfig {
        transfer_capacity: 5,
        ..capacity(10)
    };
    let mut mixed = bench(30, config);
    mixed.cycle(0.0, &evaluator, &[1, 2, 3, 4]);

    // 2 active and 8 trackable over a transfer capacity of 5: 5 * 2 / 10 real.
    assert_eq!(mixed.screener.active_target_ids().len(), 2);
    assert_eq!(mixed.screener.trackable_blip_ids().len(), 8);
    assert_eq!(mixed.screener.tracks_transferred(), (1, 4));

    let mut small = bench(3, capacity(10));
    small.cycle(0.0, &evaluator, &[]);
    assert_eq!(small.screener.tracks_transferred(), (0, 3));
}

// ---- Blip ids ----

#[test]
fn test_blip_ids_unique_across_threads() {
    let ids = Arc::new(BlipIdAllocator::new());
    let workers: Vec<_> = (0..2)
        .map(|_| {
            let ids = Arc::clone(&ids);
            thread::spawn(move || (0..5_000).map(|_| ids.allocate()).collect::<Vec<_>>())
        })
        .collect();

    let mut seen = HashSet::new();
    for worker in workers {
        for id in worker.join().unwrap() {
            assert!(id > BLIP_ID_FLOOR);
            assert!(seen.insert(id), "duplicate blip id {id}");
        }
    }
    assert_eq!(seen.len(), 10_000);
}

// ---- Engine ----

fn template_engine(seed: u64) -> SimulationEngine {
    let scenario = Scenario {
        seed,
        ..Scenario::template()
    };
    scenario.build().unwrap()
}

#[test]
fn test_determinism_same_seed() {
    let mut engine_a = template_engine(12345);
    let mut engine_b = template_engine(12345);
    for _ in 0..40 {
        let json_a = serde_json::to_string(&engine_a.step()).unwrap();
        let json_b = serde_json::to_string(&engine_b.step()).unwrap();
        assert_eq!(json_a, json_b, "Reports diverged with same seed");
    }
    let blips_a: Vec<BlipId> = engine_a.generator(1).unwrap().blips(1).iter().map(|b| b.id).collect();
    let blips_b: Vec<BlipId> = engine_b.generator(1).unwrap().blips(1).iter().map(|b| b.id).collect();
    assert_eq!(blips_a, blips_b);
    assert_eq!(
        engine_a.screener(1).unwrap().trackable_blip_ids(),
        engine_b.screener(1).unwrap().trackable_blip_ids()
    );
}

#[test]
fn test_determinism_different_seeds() {
    let mut engine_a = template_engine(111);
    let mut engine_b = template_engine(222);
    engine_a.step();
    engine_b.step();
    let positions = |engine: &SimulationEngine| -> Vec<Position> {
        engine.generator(1).unwrap().blips(1).iter().map(|b| b.position()).collect()
    };
    assert_ne!(positions(&engine_a), positions(&engine_b));
}

#[test]
fn test_template_capacities_hold_every_step() {
    let mut engine = template_engine(42);
    for _ in 0..60 {
        let report = engine.step();
        assert_eq!(report.screeners.len(), 2);
        for site in &report.screeners {
            assert!(site.trackable + site.blocked <= 30);
            assert!(site.trackable + site.active_targets + site.forced_targets <= 30);
        }
        let fusion = &report.fusion_centers[0];
        assert!(fusion.active_false + fusion.active_real <= 40);
        assert!(fusion.fused_false + fusion.fused_real <= 40);
        assert_eq!(fusion.registered_sites, 2);
    }
}

#[test]
fn test_first_step_fuses_shared_blips() {
    let mut engine = template_engine(42);
    let report = engine.step();
    assert_eq!(report.sim_time, 0.0);
    assert_eq!(report.generators[0].blips, 80);

    let fusion = engine.fusion_center(1).unwrap();
    // Two draws of at most 28 from the same 40 ids overlap in at least 16.
    assert!(fusion.aggregate_false_count() >= 16);
    for (id, _) in fusion.active_false_tracks() {
        assert!(engine.screener(1).unwrap().false_target_tracks().contains_key(id));
        assert!(engine.screener(2).unwrap().false_target_tracks().contains_key(id));
    }
}

#[test]
fn test_mode_off_removes_consistency_vote() {
    let mut engine = template_engine(42);
    engine.step();
    assert!(engine.fusion_center(1).unwrap().aggregate_false_count() > 0);

    engine.queue_event(LifecycleEvent::RadarModeDeactivated { site: 2, sensor: 1 });
    let report = engine.step();

    let site = &report.screeners[1];
    assert!(!site.mode_on);
    assert_eq!(site.trackable + site.blocked + site.undetected, 0);
    let fusion = engine.fusion_center(1).unwrap();
    assert_eq!(fusion.registered_site_count(), 2);
    assert_eq!(fusion.aggregate_false_count(), 0);
    assert_eq!(fusion.aggregate_real_count(), 0);
    assert!(fusion.active_false_tracks().is_empty());
    assert_eq!(engine.fusion_tracks(1).unwrap().track_count(), 0);
}

#[test]
fn test_mode_on_again_restores_fusion() {
    let mut engine = template_engine(42);
    engine.step();
    engine.queue_event(LifecycleEvent::RadarModeDeactivated { site: 2, sensor: 1 });
    engine.step();
    engine.queue_event(LifecycleEvent::RadarModeActivated { site: 2, sensor: 1 });
    engine.step();
    engine.step();
    let report = engine.step();
    assert!(report.screeners[1].mode_on);
    assert!(report.screeners[1].trackable > 0);
    assert!(engine.fusion_center(1).unwrap().aggregate_false_count() > 0);
}

#[test]
fn test_platform_deleted_unregisters_site() {
    let mut engine = template_engine(42);
    engine.step();
    engine.queue_event(LifecycleEvent::PlatformDeleted { platform: 2 });
    engine.step();
    assert!(engine.screener(2).is_none());
    assert_eq!(engine.fusion_center(1).unwrap().registered_site_count(), 1);

    // Next frame boundary: the remaining site's tracks stand alone.
    let report = engine.step();
    assert_eq!(report.screeners.len(), 1);
    let expected = engine.screener(1).unwrap().false_target_tracks().len();
    assert_eq!(engine.fusion_center(1).unwrap().aggregate_false_count(), expected);
}

#[test]
fn test_fusion_platform_deleted() {
    let mut engine = template_engine(42);
    engine.step();
    engine.queue_event(LifecycleEvent::PlatformDeleted { platform: 1 });
    let report = engine.step();
    assert!(engine.fusion_center(1).is_none());
    assert!(report.fusion_centers.is_empty());
    assert!(engine.screener(1).is_none());
    assert!(engine.screener(2).is_some());
}

#[test]
fn test_jammer_channel_removed() {
    let mut engine = template_engine(42);
    engine.step();
    assert!(engine.screener(2).unwrap().blip_count() > 0);

    engine.queue_event(LifecycleEvent::JammerChannelRemoved {
        platform: 10,
        channel: 2,
    });
    engine.step();
    assert_eq!(engine.generator(1).unwrap().blip_count(2), 0);
    assert_eq!(engine.screener(2).unwrap().blip_count(), 0);
    assert!(engine.screener(2).unwrap().false_target_tracks().is_empty());
    assert!(engine.screener(1).unwrap().blip_count() > 0);
}

#[test]
fn test_generator_toggle_events() {
    let mut engine = template_engine(42);
    engine.step();
    engine.queue_event(LifecycleEvent::GeneratorToggled {
        generator: 1,
        enabled: false,
    });
    let report = engine.step();
    assert_eq!(report.generators[0].state, GeneratorState::Off);
    for site in &report.screeners {
        assert_eq!(site.trackable + site.blocked + site.undetected, 0);
    }

    engine.queue_event(LifecycleEvent::GeneratorToggled {
        generator: 1,
        enabled: true,
    });
    engine.step();
    let report = engine.step();
    assert_eq!(report.generators[0].state, GeneratorState::On);
    assert!(report.screeners.iter().all(|site| site.trackable > 0));
}

#[test]
fn test_unknown_event_targets_are_ignored() {
    let mut engine = template_engine(42);
    engine.queue_events([
        LifecycleEvent::PlatformDeleted { platform: 999 },
        LifecycleEvent::GeneratorToggled {
            generator: 77,
            enabled: false,
        },
        LifecycleEvent::RadarModeDeactivated { site: 1, sensor: 9 },
    ]);
    let report = engine.step();
    assert_eq!(report.screeners.len(), 2);
    assert!(report.screeners.iter().all(|site| site.mode_on));
}

#[test]
fn test_site_tracks_follow_target_detection() {
    let mut engine = SimulationEngine::with_evaluator(
        SimConfig::default(),
        Box::new(ScriptedEvaluator {
            targets: HashMap::from([(500, detection(40_000.0, 0.0))]),
            ..ScriptedEvaluator::new(10.0)
        }),
    );
    engine
        .spawn_platform(
            Platform {
                id: 1,
                name: "site".into(),
            },
            Kinematics::stationary(Position::new(0.0, 0.0, 0.0)),
        )
        .unwrap();
    engine
        .add_screener(Screener::new(1, ObserverKey::new(1, 1), capacity(10)))
        .unwrap();
    engine
        .add_radar_site(
            1,
            RadarSite {
                sensor: 1,
                screener: 1,
                mode_on: true,
                detection_threshold: 1.0,
            },
        )
        .unwrap();
    engine
        .spawn_platform(
            Platform {
                id: 500,
                name: "target".into(),
            },
            Kinematics::stationary(Position::new(40_000.0, 0.0, 5_000.0)),
        )
        .unwrap();
    engine
        .add_real_target(500, RealTarget { object_id: 500, rcs: 1.0 })
        .unwrap();

    let report = engine.step();
    assert_eq!(report.screeners[0].active_targets, 1);
    assert_eq!(engine.screener_tracks(1).unwrap().track_count(), 1);
    assert!(engine.screener_tracks(1).unwrap().handle_for(500).is_some());
}

#[test]
fn test_report_without_step() {
    let engine = template_engine(42);
    let report = engine.report();
    assert_eq!(report.sim_time, 0.0);
    assert_eq!(report.generators.len(), 1);
    assert_eq!(report.generators[0].blips, 0);
    let by_id: BTreeMap<ScreenerId, bool> = report
        .screeners
        .iter()
        .map(|site| (site.id, site.mode_on))
        .collect();
    assert_eq!(by_id, BTreeMap::from([(1, true), (2, true)]));
}

//! Scenario definitions: JSON descriptions of a jamming engagement.
//!
//! A scenario lists platforms (with their radar site, jammer channels and
//! real-target signature), generators, screeners and fusion centers. It is
//! validated as a whole before anything is built, then loaded into a
//! `SimulationEngine`.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use decoy_core::components::{JammerChannel, Platform, RadarSite, RealTarget};
use decoy_core::config::*;
use decoy_core::constants::DEFAULT_DETECTION_THRESHOLD;
use decoy_core::enums::*;
use decoy_core::error::{ScenarioError, ScenarioResult};
use decoy_core::events::LifecycleEvent;
use decoy_core::types::*;

use crate::effect::{FalseTargetEffect, RadarParameters};
use crate::engine::{SimConfig, SimulationEngine};
use crate::evaluation::GeometricEvaluator;
use crate::fusion::FusionCenter;
use crate::screener::Screener;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub seed: u64,
    /// Step length in seconds.
    pub dt: f64,
    pub evaluator: GeometricEvaluator,
    pub platforms: Vec<PlatformSpec>,
    pub generators: Vec<GeneratorSpec>,
    pub screeners: Vec<ScreenerSpec>,
    pub fusion_centers: Vec<FusionSpec>,
}

impl Default for Scenario {
    fn default() -> Self {
        let config = SimConfig::default();
        Self {
            seed: config.seed,
            dt: config.dt,
            evaluator: GeometricEvaluator::default(),
            platforms: Vec::new(),
            generators: Vec::new(),
            screeners: Vec::new(),
            fusion_centers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSpec {
    pub id: PlatformId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub velocity: Velocity,
    #[serde(default)]
    pub radar: Option<RadarSpec>,
    #[serde(default)]
    pub jammer: Vec<ChannelSpec>,
    /// Radar cross section (m²) when the platform is a real target.
    #[serde(default)]
    pub target_rcs: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadarSpec {
    pub sensor: SensorId,
    pub screener: ScreenerId,
    #[serde(default = "default_true")]
    pub mode_on: bool,
    #[serde(default = "default_threshold")]
    pub detection_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub channel: ChannelId,
    pub generator: GeneratorId,
    #[serde(default = "default_power")]
    pub power: f64,
    #[serde(default = "default_true")]
    pub emitting: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSpec {
    pub id: GeneratorId,
    #[serde(default)]
    pub config: GeneratorConfig,
    /// Fills open settings from `radar` when present.
    #[serde(default)]
    pub effect: Option<FalseTargetEffect>,
    #[serde(default)]
    pub radar: Option<RadarParameters>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl GeneratorSpec {
    /// Configuration after the effect, if any, has filled it in.
    pub fn effective_config(&self) -> GeneratorConfig {
        match &self.effect {
            Some(effect) => effect.apply(&self.config, &self.radar.unwrap_or_default()),
            None => self.config.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerSpec {
    pub id: ScreenerId,
    #[serde(default)]
    pub config: ScreenerConfig,
    /// (generator, channel) pairs whose blips this screener screens.
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub generator: GeneratorId,
    pub channel: ChannelId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionSpec {
    pub id: FusionId,
    /// Platform the center runs on.
    pub platform: PlatformId,
    #[serde(default)]
    pub config: FusionConfig,
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> f64 {
    DEFAULT_DETECTION_THRESHOLD
}

fn default_power() -> f64 {
    1.0
}

impl Scenario {
    pub fn from_json(json: &str) -> ScenarioResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ScenarioResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> ScenarioResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check ids, references and every component configuration.
    pub fn validate(&self) -> ScenarioResult<()> {
        let platforms = unique_ids("platform", self.platforms.iter().map(|p| p.id))?;
        let generators = unique_ids("generator", self.generators.iter().map(|g| g.id))?;
        let screeners = unique_ids("screener", self.screeners.iter().map(|s| s.id))?;
        unique_ids("fusion center", self.fusion_centers.iter().map(|f| f.id))?;

        for spec in &self.generators {
            spec.effective_config()
                .validate()
                .map_err(|source| ScenarioError::config(format!("generator {}", spec.id), source))?;
        }

        let mut sited = HashSet::new();
        for platform in &self.platforms {
            if let Some(radar) = &platform.radar {
                if !screeners.contains(&radar.screener) || !sited.insert(radar.screener) {
                    return Err(ScenarioError::UnknownScreener(radar.screener));
                }
            }
            for channel in &platform.jammer {
                if !generators.contains(&channel.generator) {
                    return Err(ScenarioError::UnknownGenerator(channel.generator));
                }
            }
        }

        for spec in &self.screeners {
            spec.config
                .validate()
                .map_err(|source| ScenarioError::config(format!("screener {}", spec.id), source))?;
            for source in &spec.sources {
                if !generators.contains(&source.generator) {
                    return Err(ScenarioError::UnknownGenerator(source.generator));
                }
            }
        }

        for spec in &self.fusion_centers {
            spec.config
                .validate()
                .map_err(|source| ScenarioError::config(format!("fusion center {}", spec.id), source))?;
            if !platforms.contains(&spec.platform) {
                return Err(ScenarioError::UnknownPlatform(spec.platform));
            }
            if let Some(site) = spec.config.valid_sites.iter().find(|s| !platforms.contains(s)) {
                return Err(ScenarioError::UnknownPlatform(*site));
            }
        }
        Ok(())
    }

    /// Validate and build an engine ready to step.
    pub fn build(&self) -> ScenarioResult<SimulationEngine> {
        self.validate()?;

        let mut engine = SimulationEngine::with_evaluator(
            SimConfig {
                seed: self.seed,
                dt: self.dt,
            },
            Box::new(self.evaluator),
        );

        for spec in &self.generators {
            engine.add_generator(spec.id, spec.effective_config())?;
            if !spec.enabled {
                engine.queue_event(LifecycleEvent::GeneratorToggled {
                    generator: spec.id,
                    enabled: false,
                });
            }
        }

        for platform in &self.platforms {
            engine.spawn_platform(
                Platform {
                    id: platform.id,
                    name: platform.name.clone(),
                },
                Kinematics::new(platform.position, platform.velocity),
            )?;
        }

        for platform in &self.platforms {
            if let Some(radar) = platform.radar {
                let Some(spec) = self.screeners.iter().find(|s| s.id == radar.screener) else {
                    return Err(ScenarioError::UnknownScreener(radar.screener));
                };
                let observer = ObserverKey::new(platform.id, radar.sensor);
                engine.add_screener(Screener::new(spec.id, observer, spec.config.clone()))?;
                engine.add_radar_site(
                    platform.id,
                    RadarSite {
                        sensor: radar.sensor,
                        screener: radar.screener,
                        mode_on: radar.mode_on,
                        detection_threshold: radar.detection_threshold,
                    },
                )?;
                for source in &spec.sources {
                    engine.attach_false_target(spec.id, source.generator, source.channel)?;
                }
            }
            for channel in &platform.jammer {
                engine.add_jammer_channel(
                    platform.id,
                    JammerChannel {
                        channel: channel.channel,
                        generator: channel.generator,
                        power: channel.power,
                        emitting: channel.emitting,
                    },
                )?;
            }
            if let Some(rcs) = platform.target_rcs {
                engine.add_real_target(
                    platform.id,
                    RealTarget {
                        object_id: u64::from(platform.id),
                        rcs,
                    },
                )?;
            }
        }

        for spec in &self.screeners {
            if !self.platforms.iter().any(|p| p.radar.is_some_and(|r| r.screener == spec.id)) {
                warn!(screener = spec.id, "screener not placed on any radar site");
            }
        }

        for spec in &self.fusion_centers {
            engine.add_fusion_center(FusionCenter::new(spec.id, spec.platform, spec.config.clone()))?;
        }
        engine.register_active_screeners();

        info!(
            platforms = self.platforms.len(),
            generators = self.generators.len(),
            screeners = self.screeners.len(),
            fusion_centers = self.fusion_centers.len(),
            seed = self.seed,
            "scenario loaded"
        );
        Ok(engine)
    }

    /// A small two-site scenario: one stand-off jammer, two radars feeding
    /// one fusion center, and a handful of real targets.
    pub fn template() -> Self {
        let generator = GeneratorConfig {
            name: "standoff_ft".into(),
            quantity: 40,
            scan_interval: 10.0,
            persistence: 0.9,
            blip_behavior: BlipBehavior::ConsistentScanToScan,
            radar_behavior: RadarBehavior::ConsistentToMultipleRadars,
            range_extents: vec![Extent::new(20_000.0, 80_000.0)],
            blip_speeds: Extent::new(150.0, 250.0),
            blip_headings: Extent::new(0.0, std::f64::consts::TAU),
            centroid: Some(ReferenceCentroid {
                position: Position::new(0.0, 120_000.0, 9144.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let screener = ScreenerConfig {
            track_capacity: 30,
            transfer_capacity: 20,
            plot_capacity: 100,
            ..Default::default()
        };

        let radar_site = |id: PlatformId, x: f64| PlatformSpec {
            id,
            name: format!("radar_{id}"),
            position: Position::new(x, 0.0, 20.0),
            velocity: Velocity::default(),
            radar: Some(RadarSpec {
                sensor: 1,
                screener: id,
                mode_on: true,
                detection_threshold: DEFAULT_DETECTION_THRESHOLD,
            }),
            jammer: Vec::new(),
            target_rcs: None,
        };
        let target = |id: PlatformId, x: f64, y: f64| PlatformSpec {
            id,
            name: format!("strike_{id}"),
            position: Position::new(x, y, 6000.0),
            velocity: Velocity::from_speed_heading(220.0, std::f64::consts::PI),
            radar: None,
            jammer: Vec::new(),
            target_rcs: Some(5.0),
        };

        let mut platforms = vec![
            radar_site(1, -30_000.0),
            radar_site(2, 30_000.0),
            PlatformSpec {
                id: 10,
                name: "escort_jammer".into(),
                position: Position::new(0.0, 150_000.0, 9000.0),
                velocity: Velocity::default(),
                radar: None,
                jammer: vec![
                    ChannelSpec {
                        channel: 1,
                        generator: 1,
                        power: 4.0,
                        emitting: true,
                    },
                    ChannelSpec {
                        channel: 2,
                        generator: 1,
                        power: 4.0,
                        emitting: true,
                    },
                ],
                target_rcs: None,
            },
        ];
        for (index, x) in [-10_000.0, 0.0, 10_000.0].into_iter().enumerate() {
            platforms.push(target(20 + index as PlatformId, x, 100_000.0));
        }

        Self {
            platforms,
            generators: vec![GeneratorSpec {
                id: 1,
                config: generator,
                effect: None,
                radar: None,
                enabled: true,
            }],
            screeners: vec![
                ScreenerSpec {
                    id: 1,
                    config: screener.clone(),
                    sources: vec![SourceSpec {
                        generator: 1,
                        channel: 1,
                    }],
                },
                ScreenerSpec {
                    id: 2,
                    config: screener,
                    sources: vec![SourceSpec {
                        generator: 1,
                        channel: 2,
                    }],
                },
            ],
            fusion_centers: vec![FusionSpec {
                id: 1,
                platform: 1,
                config: FusionConfig {
                    track_capacity: 40,
                    valid_sites: vec![1, 2],
                    ..Default::default()
                },
            }],
            ..Default::default()
        }
    }
}

fn unique_ids<T>(kind: &'static str, ids: impl Iterator<Item = T>) -> ScenarioResult<HashSet<T>>
where
    T: Copy + Eq + std::hash::Hash + Into<u64>,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ScenarioError::DuplicateId { kind, id: id.into() });
        }
    }
    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_validates_and_round_trips() {
        let scenario = Scenario::template();
        assert!(scenario.validate().is_ok());
        let json = scenario.to_json().unwrap();
        let parsed = Scenario::from_json(&json).unwrap();
        assert_eq!(parsed.platforms.len(), scenario.platforms.len());
        assert_eq!(parsed.generators[0].config.quantity, 40);
        assert_eq!(parsed.fusion_centers[0].config.valid_sites, vec![1, 2]);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let scenario = Scenario::from_json(r#"{ "platforms": [{ "id": 1 }] }"#).unwrap();
        assert_eq!(scenario.seed, 42);
        assert_eq!(scenario.dt, 1.0);
        assert!(scenario.platforms[0].radar.is_none());
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_duplicate_platform_rejected() {
        let mut scenario = Scenario::template();
        let copy = scenario.platforms[0].clone();
        scenario.platforms.push(copy);
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::DuplicateId { kind: "platform", id: 1 })
        ));
    }

    #[test]
    fn test_unknown_generator_rejected() {
        let mut scenario = Scenario::template();
        scenario.screeners[0].sources.push(SourceSpec {
            generator: 99,
            channel: 1,
        });
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::UnknownGenerator(99))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut scenario = Scenario::template();
        scenario.screeners[1].config.transfer_capacity = 1000;
        let err = scenario.validate().unwrap_err();
        assert!(err.to_string().contains("screener 2"));
    }

    #[test]
    fn test_fusion_site_must_exist() {
        let mut scenario = Scenario::template();
        scenario.fusion_centers[0].config.valid_sites.push(77);
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::UnknownPlatform(77))
        ));
    }

    #[test]
    fn test_build_registers_active_screeners() {
        let engine = Scenario::template().build().unwrap();
        let fusion = engine.fusion_center(1).unwrap();
        assert_eq!(fusion.registered_site_count(), 2);
        assert!(engine.screener(1).is_some_and(|s| s.has_false_targets()));
        assert_eq!(engine.generators().len(), 1);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            Scenario::from_json("{ not json"),
            Err(ScenarioError::Json(_))
        ));
    }
}

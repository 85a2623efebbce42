//! Per-site false-target screener.
//!
//! A screener sits on one radar mode. Every cycle it re-evaluates the blips
//! of each generator it has been told about, sorts them into trackable,
//! blocked and undetected, sorts the real targets the site detects into
//! active, blocked, forced and null, and then trades the two classes off
//! against the site's track capacity.
//!
//! Each blip id and each object id lives in exactly one list: the lists are
//! a single map keyed by id with the list recorded as the entry's status.

mod blips;
mod targets;

use std::collections::{BTreeMap, BTreeSet};

use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use decoy_core::config::ScreenerConfig;
use decoy_core::constants::TIME_EPSILON;
use decoy_core::enums::*;
use decoy_core::interaction::{Interaction, InteractionEvaluator, JammerView, Observer, TrackStore};
use decoy_core::types::*;

use crate::generator::GeneratorMap;

/// Jammer transmitters keyed by the (generator, channel) pair they drive.
pub type JammerMap = BTreeMap<(GeneratorId, ChannelId), JammerView>;

/// Screener-side record of one blip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlipEntry {
    pub status: BlipStatus,
    pub generator: GeneratorId,
    pub channel: ChannelId,
    pub behavior: BlipBehavior,
    pub strength: BlipStrength,
}

/// Screener-side record of one real object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetEntry {
    pub status: TargetStatus,
    pub track: Option<TrackHandle>,
    /// Admission order into Active or Forced; lower is older.
    pub admitted: u64,
}

/// A real object the site detected this cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetReport {
    pub object_id: ObjectId,
    pub interaction: Interaction,
    /// The site's track on the object, if one exists yet.
    pub track: Option<TrackHandle>,
}

/// Everything one screener update reads or writes outside itself.
pub struct ScreenContext<'a> {
    pub sim_time: f64,
    pub observer: Observer,
    pub evaluator: &'a dyn InteractionEvaluator,
    pub generators: &'a mut GeneratorMap,
    pub jammers: &'a JammerMap,
    pub targets: &'a [TargetReport],
    pub track_store: &'a mut dyn TrackStore,
    pub rng: &'a mut ChaCha8Rng,
}

#[derive(Debug, Clone, Copy, Default)]
struct SourceState {
    /// Generator toggle epoch seen at the last update.
    toggle_epoch: Option<u64>,
}

// Geometry of one false track, for the forced-track window.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ForceSample {
    range: f64,
    bearing: f64,
    signal_to_noise: f64,
}

#[derive(Debug)]
pub struct Screener {
    id: ScreenerId,
    observer: ObserverKey,
    config: ScreenerConfig,
    sources: BTreeMap<(GeneratorId, ChannelId), SourceState>,

    blips: BTreeMap<BlipId, BlipEntry>,
    targets: BTreeMap<ObjectId, TargetEntry>,
    false_tracks: BTreeMap<BlipId, TrackHandle>,
    reporting: BTreeSet<ObjectId>,

    force_data: BTreeMap<BlipId, ForceSample>,
    min_blip_range: f64,
    max_blip_range: f64,

    allowed_real: usize,
    allowed_false: usize,
    detected_false: usize,
    admission_counter: u64,

    blips_changed: bool,
    targets_changed: bool,
    valid: bool,
    last_update: Option<f64>,
    output_type: OutputType,
}

impl Screener {
    /// The configuration is expected to be validated already.
    pub fn new(id: ScreenerId, observer: ObserverKey, config: ScreenerConfig) -> Self {
        let allowed_real = config.track_capacity;
        Self {
            id,
            observer,
            config,
            sources: BTreeMap::new(),
            blips: BTreeMap::new(),
            targets: BTreeMap::new(),
            false_tracks: BTreeMap::new(),
            reporting: BTreeSet::new(),
            force_data: BTreeMap::new(),
            min_blip_range: 0.0,
            max_blip_range: f64::MAX,
            allowed_real,
            allowed_false: 0,
            detected_false: 0,
            admission_counter: 0,
            blips_changed: true,
            targets_changed: true,
            valid: false,
            last_update: None,
            output_type: OutputType::Tracks,
        }
    }

    pub fn id(&self) -> ScreenerId {
        self.id
    }

    pub fn observer(&self) -> ObserverKey {
        self.observer
    }

    pub fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    pub fn last_update(&self) -> Option<f64> {
        self.last_update
    }

    /// Whether the lists reflect a completed update since the last reset.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether a periodic update is due. Request-based screeners only
    /// update when asked through `allow_target_track`.
    pub fn needs_update(&self, sim_time: f64) -> bool {
        if self.config.request_based_tracking {
            return !self.valid;
        }
        self.last_update
            .map_or(true, |last| sim_time + TIME_EPSILON >= last + self.config.frame_time)
    }

    /// Run one screening cycle. Returns whether any list changed.
    ///
    /// A second call at the same simulation time with no new target data
    /// does nothing.
    pub fn update(&mut self, ctx: &mut ScreenContext<'_>) -> bool {
        let sim_time = ctx.sim_time;
        let repeat = self
            .last_update
            .is_some_and(|last| (sim_time - last).abs() < TIME_EPSILON);
        if repeat && self.valid && !self.targets_changed {
            return false;
        }

        self.sync_sources(ctx);
        self.update_blips(ctx);
        self.update_targets(ctx);
        self.valid = true;

        let changed = self.blips_changed || self.targets_changed;
        self.adjust_targets_and_blips(ctx.rng);
        self.sync_false_tracks(ctx.track_store);
        self.output_type = self.determine_output_type();
        self.reporting.clear();
        self.last_update = Some(sim_time);

        if changed {
            debug!(
                screener = self.id,
                observer = %self.observer,
                trackable = self.count_blips(BlipStatus::Trackable),
                blocked = self.count_blips(BlipStatus::Blocked),
                undetected = self.count_blips(BlipStatus::Undetected),
                active = self.count_targets(TargetStatus::Active),
                forced = self.count_targets(TargetStatus::Forced),
                blocked_targets = self.count_targets(TargetStatus::Blocked),
                null = self.count_targets(TargetStatus::Null),
                output = ?self.output_type,
                "screener adjusted"
            );
        }
        changed
    }

    /// Overload when the detected false load passes the overload boundary,
    /// plot when it passes the plot boundary, tracks otherwise.
    pub fn determine_output_type(&self) -> OutputType {
        let load = self.detected_false;
        if load > self.config.overload_multiple * self.config.plot_capacity {
            OutputType::Overload
        } else if load > self.config.plot_multiple * self.config.track_capacity {
            OutputType::Plot
        } else {
            OutputType::Tracks
        }
    }

    // --- False-target sources ---

    /// Screen the blips a generator places for one jammer channel.
    pub fn add_false_target(&mut self, generator: GeneratorId, channel: ChannelId) {
        if self.sources.insert((generator, channel), SourceState::default()).is_none() {
            self.valid = false;
            debug!(screener = self.id, generator, channel, "false target source added");
        }
    }

    pub fn remove_false_target(&mut self, generator: GeneratorId, channel: ChannelId) {
        if self.sources.remove(&(generator, channel)).is_some() {
            self.remove_source_blips(generator, Some(channel));
            debug!(screener = self.id, generator, channel, "false target source removed");
        }
    }

    /// Forget every source of a generator.
    pub fn remove_false_targets(&mut self, generator: GeneratorId) {
        let before = self.sources.len();
        self.sources.retain(|(source, _), _| *source != generator);
        if self.sources.len() != before {
            self.remove_source_blips(generator, None);
        }
    }

    /// Forget every source driven by a jammer channel.
    pub fn remove_jammer(&mut self, channel: ChannelId) {
        let removed: Vec<(GeneratorId, ChannelId)> = self
            .sources
            .keys()
            .filter(|(_, source_channel)| *source_channel == channel)
            .copied()
            .collect();
        for (generator, channel) in removed {
            self.remove_false_target(generator, channel);
        }
    }

    pub fn sources(&self) -> impl Iterator<Item = (GeneratorId, ChannelId)> + '_ {
        self.sources.keys().copied()
    }

    pub fn has_false_targets(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Clear every list. Sources stay attached and are re-screened next update.
    pub fn reset(&mut self) {
        self.blips.clear();
        self.targets.clear();
        self.false_tracks.clear();
        self.reporting.clear();
        self.force_data.clear();
        self.min_blip_range = 0.0;
        self.max_blip_range = f64::MAX;
        self.allowed_real = self.config.track_capacity;
        self.allowed_false = 0;
        self.detected_false = 0;
        self.blips_changed = true;
        self.targets_changed = true;
        self.valid = false;
        self.output_type = OutputType::Tracks;
        for source in self.sources.values_mut() {
            source.toggle_epoch = None;
        }
        trace!(screener = self.id, "screener reset");
    }

    // --- Accessors ---

    pub fn blip_status(&self, id: BlipId) -> Option<BlipStatus> {
        self.blips.get(&id).map(|entry| entry.status)
    }

    pub fn blip_entry(&self, id: BlipId) -> Option<&BlipEntry> {
        self.blips.get(&id)
    }

    pub fn trackable_blip_ids(&self) -> Vec<BlipId> {
        self.blip_ids(BlipStatus::Trackable)
    }

    pub fn blocked_blip_ids(&self) -> Vec<BlipId> {
        self.blip_ids(BlipStatus::Blocked)
    }

    pub fn undetected_blip_ids(&self) -> Vec<BlipId> {
        self.blip_ids(BlipStatus::Undetected)
    }

    pub fn blip_count(&self) -> usize {
        self.blips.len()
    }

    pub fn target_status(&self, object_id: ObjectId) -> Option<TargetStatus> {
        self.targets.get(&object_id).map(|entry| entry.status)
    }

    pub fn active_target_ids(&self) -> Vec<ObjectId> {
        self.target_ids(TargetStatus::Active)
    }

    pub fn blocked_target_ids(&self) -> Vec<ObjectId> {
        self.target_ids(TargetStatus::Blocked)
    }

    pub fn forced_target_ids(&self) -> Vec<ObjectId> {
        self.target_ids(TargetStatus::Forced)
    }

    pub fn null_target_ids(&self) -> Vec<ObjectId> {
        self.target_ids(TargetStatus::Null)
    }

    /// Active and forced real tracks with their site track handles.
    pub fn active_target_tracks(&self) -> Vec<(ObjectId, TrackHandle)> {
        self.targets
            .iter()
            .filter(|(_, entry)| {
                matches!(entry.status, TargetStatus::Active | TargetStatus::Forced)
            })
            .filter_map(|(id, entry)| entry.track.map(|handle| (*id, handle)))
            .collect()
    }

    /// False tracks the site currently holds, keyed by blip id.
    pub fn false_target_tracks(&self) -> &BTreeMap<BlipId, TrackHandle> {
        &self.false_tracks
    }

    pub fn allowed_real_target_number(&self) -> usize {
        self.allowed_real
    }

    pub fn allowed_false_target_number(&self) -> usize {
        self.allowed_false
    }

    /// Detected blips before the capacity cap.
    pub fn detected_false_count(&self) -> usize {
        self.detected_false
    }

    pub fn output_type(&self) -> OutputType {
        self.output_type
    }

    fn blip_ids(&self, status: BlipStatus) -> Vec<BlipId> {
        self.blips
            .iter()
            .filter(|(_, entry)| entry.status == status)
            .map(|(id, _)| *id)
            .collect()
    }

    fn target_ids(&self, status: TargetStatus) -> Vec<ObjectId> {
        self.targets
            .iter()
            .filter(|(_, entry)| entry.status == status)
            .map(|(id, _)| *id)
            .collect()
    }

    pub(crate) fn count_blips(&self, status: BlipStatus) -> usize {
        self.blips.values().filter(|entry| entry.status == status).count()
    }

    pub(crate) fn count_targets(&self, status: TargetStatus) -> usize {
        self.targets.values().filter(|entry| entry.status == status).count()
    }
}

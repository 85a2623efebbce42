//! Blip lists: hand-over, evaluation, rejection and capacity trade-off.

use std::collections::{BTreeMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use decoy_core::enums::*;
use decoy_core::interaction::TrackStore;
use decoy_core::types::*;

use super::{BlipEntry, ForceSample, ScreenContext, Screener};
use crate::generator::FalseTargetGenerator;

impl Screener {
    /// Follow toggles, departures and fresh populations of every source.
    pub(super) fn sync_sources(&mut self, ctx: &mut ScreenContext<'_>) {
        let sources: Vec<(GeneratorId, ChannelId)> = self.sources.keys().copied().collect();
        for (generator_id, channel) in sources {
            let Some(generator) = ctx.generators.get_mut(&generator_id) else {
                self.remove_source_blips(generator_id, Some(channel));
                continue;
            };

            let epoch = generator.toggle_epoch();
            let seen = self
                .sources
                .get(&(generator_id, channel))
                .and_then(|source| source.toggle_epoch);
            let toggled = seen.is_some_and(|seen| seen != epoch);
            if toggled {
                // A toggled generator is screened from scratch.
                self.remove_source_blips(generator_id, Some(channel));
                self.valid = false;
            }
            if let Some(source) = self.sources.get_mut(&(generator_id, channel)) {
                source.toggle_epoch = Some(epoch);
            }

            if !generator.is_on() {
                self.remove_source_blips(generator_id, Some(channel));
                continue;
            }

            // A source seen for the first time since it was added, the
            // screener was reset or the generator toggled takes the standing
            // population too.
            let fresh = (seen.is_none() || toggled) && generator.blip_count(channel) > 0;
            if fresh || generator.new_blips_pending(self.id, channel) {
                self.create_blips(generator, channel, ctx.rng);
                generator.mark_blips_consumed(self.id, channel);
            } else {
                self.prune_departed_blips(generator, channel);
            }
        }
    }

    /// Take a fresh population into the undetected list, minus the
    /// initial-rejection share.
    pub(super) fn create_blips(
        &mut self,
        generator: &FalseTargetGenerator,
        channel: ChannelId,
        rng: &mut ChaCha8Rng,
    ) {
        self.prune_departed_blips(generator, channel);

        let behavior = generator.blip_behavior();
        let population = generator.blips(channel);
        let ratio = self.config.initial_rejection.get(behavior);
        let keep = (population.len() as f64 * (1.0 - ratio)).round() as usize;

        let mut candidates: Vec<BlipId> = population.iter().map(|blip| blip.id).collect();
        if keep < candidates.len() {
            candidates.shuffle(rng);
            candidates.truncate(keep);
        }

        let mut added = 0;
        for id in candidates {
            if self.blips.contains_key(&id) {
                continue;
            }
            self.blips.insert(
                id,
                BlipEntry {
                    status: BlipStatus::Undetected,
                    generator: generator.id(),
                    channel,
                    behavior,
                    strength: BlipStrength::Undetected,
                },
            );
            added += 1;
        }
        if added > 0 {
            self.blips_changed = true;
        }
        trace!(
            screener = self.id,
            generator = generator.id(),
            channel,
            offered = population.len(),
            added,
            "blips handed over"
        );
    }

    // Drop entries whose blip is no longer in the generator's population.
    fn prune_departed_blips(&mut self, generator: &FalseTargetGenerator, channel: ChannelId) {
        let generator_id = generator.id();
        let live: HashSet<BlipId> = generator.blips(channel).iter().map(|blip| blip.id).collect();
        let before = self.blips.len();
        self.blips.retain(|id, entry| {
            entry.generator != generator_id || entry.channel != channel || live.contains(id)
        });
        if self.blips.len() != before {
            self.blips_changed = true;
        }
    }

    /// Remove the blips of one source, or of every channel of a generator.
    pub(super) fn remove_source_blips(&mut self, generator: GeneratorId, channel: Option<ChannelId>) {
        let before = self.blips.len();
        self.blips.retain(|_, entry| {
            entry.generator != generator || channel.is_some_and(|c| c != entry.channel)
        });
        if self.blips.len() != before {
            self.blips_changed = true;
        }
    }

    /// Evaluate every screened blip for this site and move it between lists.
    pub(super) fn update_blips(&mut self, ctx: &mut ScreenContext<'_>) {
        let observer = ctx.observer;
        let mut samples: BTreeMap<BlipId, ForceSample> = BTreeMap::new();

        let sources: Vec<(GeneratorId, ChannelId)> = self.sources.keys().copied().collect();
        for (generator_id, channel) in sources {
            let Some(generator) = ctx.generators.get_mut(&generator_id) else {
                continue;
            };
            if !generator.is_on() {
                continue;
            }
            let jammer = ctx.jammers.get(&(generator_id, channel)).copied();
            let sufficient = match jammer.as_ref() {
                Some(view) => {
                    generator.power_sufficiency_check(ctx.evaluator, &observer, channel, view)
                }
                None => false,
            };
            let range_constrained = generator.range_constrained();

            for blip in generator.blips_mut(channel) {
                let Some(entry) = self.blips.get_mut(&blip.id) else {
                    continue;
                };
                if entry.generator != generator_id || entry.channel != channel {
                    continue;
                }

                let strength = match jammer.as_ref() {
                    Some(view) if sufficient => {
                        let interaction = ctx.evaluator.evaluate_blip(&observer, blip, view);
                        let strength = blip.record_observation(
                            &observer,
                            &interaction,
                            &view.kinematics.position,
                            range_constrained,
                            ctx.sim_time,
                        );
                        if strength != BlipStrength::Undetected {
                            samples.insert(
                                blip.id,
                                ForceSample {
                                    range: interaction.range,
                                    bearing: interaction.bearing,
                                    signal_to_noise: interaction.signal_to_noise,
                                },
                            );
                        }
                        strength
                    }
                    _ => {
                        blip.undetect(&observer.key);
                        BlipStrength::Undetected
                    }
                };

                entry.strength = strength;
                let next = next_status(entry.status, strength);
                if next != entry.status {
                    entry.status = next;
                    self.blips_changed = true;
                }
            }
        }

        if self.reject_blips(ctx.rng) {
            self.blips_changed = true;
        }
        self.detected_false = self.blips.len() - self.count_blips(BlipStatus::Undetected);
        self.cap_detected_blips(ctx.rng);
        self.record_force_data(samples);
    }

    /// Per-cycle rejection draw for every detected blip.
    pub(super) fn reject_blips(&mut self, rng: &mut ChaCha8Rng) -> bool {
        if !self.config.rejection.any() {
            return false;
        }
        let mut rejected = 0;
        for entry in self.blips.values_mut() {
            if entry.status == BlipStatus::Undetected {
                continue;
            }
            let ratio = self.config.rejection.get(entry.behavior);
            if ratio > 0.0 && rng.gen_bool(ratio) {
                entry.status = BlipStatus::Undetected;
                rejected += 1;
            }
        }
        if rejected > 0 {
            trace!(screener = self.id, rejected, "blips rejected");
        }
        rejected > 0
    }

    // The detected pool never exceeds track capacity; the excess is left
    // undetected for this cycle.
    fn cap_detected_blips(&mut self, rng: &mut ChaCha8Rng) {
        let capacity = self.config.track_capacity;
        let detected = self.detected_false;
        if detected <= capacity {
            return;
        }
        let mut blocked = self.blip_ids(BlipStatus::Blocked);
        blocked.shuffle(rng);
        let excess = detected - capacity;
        debug_assert!(
            blocked.len() >= excess,
            "trackable blips alone exceed track capacity"
        );
        for id in blocked.into_iter().take(excess) {
            if let Some(entry) = self.blips.get_mut(&id) {
                entry.status = BlipStatus::Undetected;
            }
        }
        self.blips_changed = true;
    }

    fn record_force_data(&mut self, mut samples: BTreeMap<BlipId, ForceSample>) {
        samples.retain(|id, _| self.blips.get(id).map(|e| e.status) == Some(BlipStatus::Trackable));
        self.force_data = samples;
        if self.force_data.is_empty() {
            self.min_blip_range = 0.0;
            self.max_blip_range = f64::MAX;
        } else {
            self.min_blip_range = self.force_data.values().map(|s| s.range).fold(f64::MAX, f64::min);
            self.max_blip_range = self.force_data.values().map(|s| s.range).fold(0.0, f64::max);
        }
    }

    /// Bring the trackable count to the capacity left over by real targets,
    /// promoting or demoting blocked blips at random.
    pub(super) fn adjust_blips(&mut self, rng: &mut ChaCha8Rng) {
        let reserved =
            self.count_targets(TargetStatus::Forced) + self.count_targets(TargetStatus::Active);
        self.allowed_false = self.config.track_capacity.saturating_sub(reserved);
        let trackable = self.count_blips(BlipStatus::Trackable);

        if self.allowed_false > trackable {
            let mut candidates: Vec<BlipId> = self
                .blips
                .iter()
                .filter(|(_, entry)| {
                    entry.status == BlipStatus::Blocked
                        && entry.strength != BlipStrength::Undetected
                })
                .map(|(id, _)| *id)
                .collect();
            candidates.shuffle(rng);
            for id in candidates.into_iter().take(self.allowed_false - trackable) {
                if let Some(entry) = self.blips.get_mut(&id) {
                    entry.status = BlipStatus::Trackable;
                }
            }
        } else if self.allowed_false < trackable {
            let mut surplus = self.blip_ids(BlipStatus::Trackable);
            surplus.shuffle(rng);
            for id in surplus.into_iter().take(trackable - self.allowed_false) {
                if let Some(entry) = self.blips.get_mut(&id) {
                    entry.status = BlipStatus::Blocked;
                }
            }
        }
    }

    /// Keep one site false track per trackable blip and none for the rest.
    pub(super) fn sync_false_tracks(&mut self, store: &mut dyn TrackStore) {
        let departed: Vec<BlipId> = self
            .false_tracks
            .keys()
            .filter(|id| self.blip_status(**id) != Some(BlipStatus::Trackable))
            .copied()
            .collect();
        for id in departed {
            self.drop_false_target_track(id, store);
        }
        self.false_tracks.retain(|_, handle| store.find_track(*handle).is_some());

        for id in self.trackable_blip_ids() {
            if !self.false_tracks.contains_key(&id) {
                let handle = store.add_track(id);
                self.add_false_target_track(id, handle);
            }
        }
    }

    /// Record the site track created for a blip.
    pub fn add_false_target_track(&mut self, blip: BlipId, handle: TrackHandle) {
        self.false_tracks.insert(blip, handle);
    }

    /// Drop the site track held for a blip, if any.
    pub fn drop_false_target_track(&mut self, blip: BlipId, store: &mut dyn TrackStore) {
        if let Some(handle) = self.false_tracks.remove(&blip) {
            store.drop_track(handle);
        }
    }
}

// Blocked and trackable blips fall to undetected when unseen; undetected
// blips that are seen wait in blocked for capacity.
fn next_status(current: BlipStatus, strength: BlipStrength) -> BlipStatus {
    let detected = strength != BlipStrength::Undetected;
    match current {
        BlipStatus::Blocked if !detected => BlipStatus::Undetected,
        BlipStatus::Undetected if detected => BlipStatus::Blocked,
        BlipStatus::Trackable if !detected => BlipStatus::Undetected,
        status => status,
    }
}

//! Real-target lists, forced tracks and reporting gates.

use std::collections::HashSet;
use std::f64::consts::{PI, TAU};

use rand_chacha::ChaCha8Rng;
use tracing::trace;

use decoy_core::constants::FULL_CIRCLE_TOLERANCE;
use decoy_core::enums::*;
use decoy_core::interaction::Interaction;
use decoy_core::types::*;

use super::{ScreenContext, Screener, TargetEntry};

impl Screener {
    /// Fold this cycle's detections into the target lists. Objects the
    /// site no longer detects, and tracks the store no longer knows, leave.
    pub(super) fn update_targets(&mut self, ctx: &mut ScreenContext<'_>) {
        let reported: HashSet<ObjectId> = ctx.targets.iter().map(|r| r.object_id).collect();
        let store = &*ctx.track_store;
        let before = self.targets.len();
        self.targets.retain(|id, entry| {
            reported.contains(id) && entry.track.map_or(true, |h| store.find_track(h).is_some())
        });
        if self.targets.len() != before {
            self.targets_changed = true;
        }

        for report in ctx.targets {
            let track = report.track.filter(|h| store.find_track(*h).is_some());
            self.update_target_track(report.object_id, track, &report.interaction);
        }
    }

    /// Place or move one object between the target lists.
    ///
    /// Without a track the object waits in null. With one it is forced when
    /// the force policy says so, active while under the allowed real number,
    /// and blocked otherwise. Active and forced switch as forcing starts or
    /// stops.
    pub fn update_target_track(
        &mut self,
        object_id: ObjectId,
        track: Option<TrackHandle>,
        interaction: &Interaction,
    ) {
        let current = self.targets.get(&object_id).map(|entry| entry.status);
        let Some(handle) = track else {
            match current {
                None => {
                    self.set_target(object_id, TargetStatus::Null, None);
                }
                Some(TargetStatus::Blocked) => {
                    self.set_target(object_id, TargetStatus::Null, None);
                }
                _ => {}
            }
            return;
        };

        let forced = self.force_target_track(
            interaction.range,
            interaction.bearing,
            interaction.signal_to_noise,
        );
        let next = match current {
            Some(TargetStatus::Active) if forced => TargetStatus::Forced,
            Some(TargetStatus::Active) => TargetStatus::Active,
            Some(TargetStatus::Forced) if !forced => TargetStatus::Active,
            Some(TargetStatus::Forced) => TargetStatus::Forced,
            Some(TargetStatus::Blocked) if forced => TargetStatus::Forced,
            Some(TargetStatus::Blocked) if self.has_real_capacity() => TargetStatus::Active,
            Some(TargetStatus::Blocked) => TargetStatus::Blocked,
            Some(TargetStatus::Null) | None if forced => TargetStatus::Forced,
            Some(TargetStatus::Null) | None if self.has_real_capacity() => TargetStatus::Active,
            Some(TargetStatus::Null) | None => TargetStatus::Blocked,
        };
        self.set_target(object_id, next, Some(handle));
    }

    fn has_real_capacity(&self) -> bool {
        self.count_targets(TargetStatus::Active) < self.allowed_real
    }

    fn set_target(&mut self, object_id: ObjectId, status: TargetStatus, track: Option<TrackHandle>) {
        let previous = self.targets.get(&object_id).copied();
        let admitted_before = previous.is_some_and(|entry| {
            matches!(entry.status, TargetStatus::Active | TargetStatus::Forced)
        });
        let admitted_now = matches!(status, TargetStatus::Active | TargetStatus::Forced);

        let admitted = if admitted_now && !admitted_before {
            self.admission_counter += 1;
            self.admission_counter
        } else {
            previous.map_or(0, |entry| entry.admitted)
        };

        if previous.map(|entry| entry.status) != Some(status) {
            self.targets_changed = true;
        }
        self.targets.insert(
            object_id,
            TargetEntry {
                status,
                track,
                admitted,
            },
        );
    }

    /// Forget an object, whatever list it is in.
    pub fn drop_target_track(&mut self, object_id: ObjectId) {
        if self.targets.remove(&object_id).is_some() {
            self.targets_changed = true;
        }
    }

    pub fn track_exists(&self, object_id: ObjectId) -> bool {
        self.targets.contains_key(&object_id)
    }

    /// Whether a real target at this geometry bypasses capacity gating.
    ///
    /// Inside the force window only false tracks whose J/S against the
    /// target lies in `[1/t, t]` count, and their range span replaces the
    /// span of all false tracks.
    pub fn force_target_track(&self, range: f64, bearing: f64, target_snr: f64) -> bool {
        let force = &self.config.force;
        let mut min_range = self.min_blip_range;
        let mut max_range = self.max_blip_range;
        let mut sector_count = 0;

        if force.has_window() {
            let full_circle = (TAU - force.sector_arc) <= FULL_CIRCLE_TOLERANCE;
            let half_arc = force.sector_arc / 2.0;
            let (window_min, window_max) = match force.force_range {
                Some(half_width) => ((range - half_width).max(0.0), range + half_width),
                None => (0.0, f64::MAX),
            };
            let (jtos_min, jtos_max) = match force.jtos_delta_threshold {
                Some(threshold) => (threshold.recip(), threshold),
                None => (0.0, f64::MAX),
            };

            let mut span_min = f64::MAX;
            let mut span_max = 0.0_f64;
            for sample in self.force_data.values() {
                let in_sector = full_circle || angular_distance(sample.bearing, bearing) <= half_arc;
                let in_range = sample.range >= window_min && sample.range <= window_max;
                let jtos = if target_snr > 0.0 && self.config.reports_signal_to_noise {
                    sample.signal_to_noise / target_snr
                } else {
                    0.0
                };
                let admissible = jtos <= 0.0 || (jtos >= jtos_min && jtos <= jtos_max);
                if in_sector && in_range && admissible {
                    span_min = span_min.min(sample.range);
                    span_max = span_max.max(sample.range);
                    sector_count += 1;
                }
            }
            if sector_count > 0 {
                min_range = span_min;
                max_range = span_max;
            }
        }

        (range <= min_range && force.range_force.inside())
            || (range >= max_range && force.range_force.outside())
            || (force.count_per_sector > 0 && sector_count <= force.count_per_sector)
    }

    /// Split track capacity between the classes and enforce it on both.
    /// Does nothing unless blips or targets changed since the last call.
    pub(super) fn adjust_targets_and_blips(&mut self, rng: &mut ChaCha8Rng) -> bool {
        if !(self.blips_changed || self.targets_changed) {
            return false;
        }
        let capacity = self.config.track_capacity;
        let real = self.targets.len();
        let false_count =
            self.count_blips(BlipStatus::Trackable) + self.count_blips(BlipStatus::Blocked);
        let total = real + false_count;
        let forced = self.count_targets(TargetStatus::Forced);

        self.allowed_real = if total <= capacity {
            capacity - false_count
        } else {
            forced.max(capacity * real / total)
        };

        let admitted = forced + self.count_targets(TargetStatus::Active);
        if admitted > self.allowed_real {
            self.prune_target_tracks(admitted - self.allowed_real);
        }
        self.adjust_blips(rng);

        debug_assert!(
            self.count_blips(BlipStatus::Trackable)
                + self.count_targets(TargetStatus::Active)
                + forced
                <= capacity.max(forced),
            "screener admitted more than its track capacity"
        );

        self.blips_changed = false;
        self.targets_changed = false;
        true
    }

    /// Move up to `quantity` active targets to blocked, oldest first.
    /// Forced targets are never pruned. Returns how many moved.
    pub fn prune_target_tracks(&mut self, quantity: usize) -> usize {
        let mut active: Vec<(u64, ObjectId)> = self
            .targets
            .iter()
            .filter(|(_, entry)| entry.status == TargetStatus::Active)
            .map(|(id, entry)| (entry.admitted, *id))
            .collect();
        active.sort_unstable();

        let mut pruned = 0;
        for (_, id) in active.into_iter().take(quantity) {
            if let Some(entry) = self.targets.get_mut(&id) {
                entry.status = TargetStatus::Blocked;
                pruned += 1;
            }
        }
        if pruned > 0 {
            trace!(screener = self.id, pruned, "target tracks blocked");
        }
        pruned
    }

    /// Whether the presence of false targets leaves room for this object.
    pub fn allow_target_track(&self, object_id: ObjectId, interaction: &Interaction) -> bool {
        if self.sources.is_empty() {
            return true;
        }
        let admitted =
            self.count_targets(TargetStatus::Forced) + self.count_targets(TargetStatus::Active);
        if self.allowed_real > admitted {
            return true;
        }
        match self.target_status(object_id) {
            Some(TargetStatus::Active | TargetStatus::Forced) => true,
            Some(TargetStatus::Null) => self.force_target_track(
                interaction.range,
                interaction.bearing,
                interaction.signal_to_noise,
            ),
            _ => false,
        }
    }

    /// Gate one track report against transfer capacity. The reporting set
    /// is cleared at every update.
    pub fn allow_track_reporting(&mut self, object_id: ObjectId) -> bool {
        let allowed = if self.sources.is_empty() {
            true
        } else if self.config.track_reporting_when_flooded {
            self.reporting.len() < self.config.transfer_capacity
                || self.reporting.contains(&object_id)
        } else {
            let load = self.count_targets(TargetStatus::Forced)
                + self.count_targets(TargetStatus::Active)
                + self.false_tracks.len();
            load < self.config.transfer_capacity
        };

        if allowed {
            self.reporting.insert(object_id);
        } else {
            self.reporting.remove(&object_id);
        }
        allowed
    }

    /// Real and false tracks passed downstream, split proportionally when
    /// together they exceed transfer capacity.
    pub fn tracks_transferred(&self) -> (usize, usize) {
        let real = self.count_targets(TargetStatus::Forced) + self.count_targets(TargetStatus::Active);
        let false_count = self.count_blips(BlipStatus::Trackable);
        let capacity = self.config.transfer_capacity;
        let total = real + false_count;
        if total <= capacity {
            return (real, false_count);
        }
        let real_share = capacity * real / total;
        (real_share, capacity - real_share)
    }
}

fn angular_distance(a: f64, b: f64) -> f64 {
    ((a - b + PI).rem_euclid(TAU) - PI).abs()
}

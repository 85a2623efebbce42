//! In-memory track store used by screeners and fusion centers.

use std::collections::BTreeMap;

use decoy_core::interaction::TrackStore;
use decoy_core::types::TrackHandle;

/// Tracks keyed by monotonically numbered handles.
#[derive(Debug, Clone, Default)]
pub struct TrackTable {
    tracks: BTreeMap<TrackHandle, u64>,
    next_handle: TrackHandle,
}

impl TrackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle of the first live track created for `external_id`.
    pub fn handle_for(&self, external_id: u64) -> Option<TrackHandle> {
        self.tracks
            .iter()
            .find(|(_, id)| **id == external_id)
            .map(|(handle, _)| *handle)
    }

    /// Drop every track created for `external_id`. Returns how many went.
    pub fn drop_external(&mut self, external_id: u64) -> usize {
        let before = self.tracks.len();
        self.tracks.retain(|_, id| *id != external_id);
        before - self.tracks.len()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrackHandle, u64)> + '_ {
        self.tracks.iter().map(|(handle, id)| (*handle, *id))
    }
}

impl TrackStore for TrackTable {
    fn add_track(&mut self, external_id: u64) -> TrackHandle {
        self.next_handle += 1;
        self.tracks.insert(self.next_handle, external_id);
        self.next_handle
    }

    fn find_track(&self, handle: TrackHandle) -> Option<u64> {
        self.tracks.get(&handle).copied()
    }

    fn drop_track(&mut self, handle: TrackHandle) {
        self.tracks.remove(&handle);
    }

    fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

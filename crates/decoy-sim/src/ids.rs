//! Simulation-wide blip identifiers.
//!
//! Ids live in the upper half of the `u64` range; the lower half belongs to
//! the host simulation's own object ids. When the counter reaches
//! `u64::MAX` it restarts just above the floor instead of wrapping to zero.

use std::sync::atomic::{AtomicU64, Ordering};

use decoy_core::constants::BLIP_ID_FLOOR;
use decoy_core::types::BlipId;

/// Lock-free allocator shared by every generator of one simulation.
#[derive(Debug)]
pub struct BlipIdAllocator {
    last: AtomicU64,
}

impl Default for BlipIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl BlipIdAllocator {
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(BLIP_ID_FLOOR),
        }
    }

    /// Allocator whose next id follows `last`.
    #[cfg(test)]
    pub fn starting_after(last: BlipId) -> Self {
        Self {
            last: AtomicU64::new(last.max(BLIP_ID_FLOOR)),
        }
    }

    pub fn allocate(&self) -> BlipId {
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let next = successor(current);
            match self
                .last
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    /// Restart from the floor.
    pub fn reset(&self) {
        self.last.store(BLIP_ID_FLOOR, Ordering::Release);
    }
}

fn successor(id: BlipId) -> BlipId {
    if id >= u64::MAX {
        BLIP_ID_FLOOR + 1
    } else {
        id + 1
    }
}

/// True for ids that belong to the host simulation, never to a blip.
pub fn is_reserved(id: u64) -> bool {
    id <= BLIP_ID_FLOOR
}

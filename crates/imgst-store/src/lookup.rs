//! Identifier and validity scans over the slot table.
//!
//! Every scan is linear in the capacity, which is bounded by
//! [`MAX_CAPACITY`](crate::config::MAX_CAPACITY).

use crate::error::{StoreError, StoreResult};
use crate::handle::StoreFile;
use crate::layout::Slot;

impl StoreFile {
    /// Index of the first live slot whose identifier equals `id`.
    pub fn find_by_identifier(&self, id: &str) -> StoreResult<usize> {
        self.slots()
            .iter()
            .position(|s| s.is_live() && s.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// `true` iff `index` is inside the table and that slot is live.
    pub fn is_live_index(&self, index: usize) -> bool {
        self.slot(index).is_some_and(Slot::is_live)
    }

    /// Index of the first tombstone, if any.
    pub fn first_free_slot(&self) -> Option<usize> {
        self.slots().iter().position(|s| !s.is_live())
    }

    /// Number of live slots, counted from the table rather than the header.
    pub fn live_count(&self) -> usize {
        self.slots().iter().filter(|s| s.is_live()).count()
    }

    /// Live slots with their table index, in table order.
    pub fn live_slots(&self) -> impl Iterator<Item = (usize, &Slot)> + '_ {
        self.slots().iter().enumerate().filter(|(_, s)| s.is_live())
    }
}

//! Monotonic item id generator

use super::types::ItemId;

/// Hands out strictly increasing ids.
///
/// `ItemId::MAX` is never handed out; once reached the allocator is exhausted.
///
/// Owned by a `HistoryStore`; reset only by `clear_all` (back to 0) and by
/// loading persisted history (to one past the highest loaded id).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdAllocator {
    next: ItemId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator whose next id is `next`
    pub fn starting_at(next: ItemId) -> Self {
        Self { next }
    }

    /// Next id, or None when the id space is used up
    pub fn next(&mut self) -> Option<ItemId> {
        let id = self.next;
        self.next = id.checked_add(1)?;
        Some(id)
    }

    /// The id the next call to `next()` will return
    pub fn peek(&self) -> ItemId {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

//! In-memory clipboard history
//!
//! Items are kept in insertion order. Display order is never stored; every
//! call to `ordered_view()` recomputes it from the current item set.

use tracing::{debug, warn};

use super::id_allocator::IdAllocator;
use super::types::{Content, Item, ItemId};
use crate::error::{HistoryError, Result};

#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    items: Vec<Item>,
    ids: IdAllocator,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from already-decoded items.
    ///
    /// `next_id` must be greater than every id in `items`.
    pub fn from_parts(items: Vec<Item>, next_id: ItemId) -> Self {
        debug_assert!(items.iter().all(|item| item.id < next_id));
        Self {
            items,
            ids: IdAllocator::starting_at(next_id),
        }
    }

    /// Add new content unless an item with an equal payload already exists.
    ///
    /// Returns the inserted item, or None for a duplicate (or when no id is
    /// left to allocate).
    pub fn ingest(&mut self, content: Content) -> Option<&Item> {
        if let Some(existing) = self.find_duplicate(&content) {
            debug!(
                existing_id = existing.id,
                kind = %content.kind(),
                "Duplicate clipboard content, skipping"
            );
            return None;
        }

        let Some(id) = self.ids.next() else {
            warn!(kind = %content.kind(), "Item ids exhausted, dropping clipboard content");
            return None;
        };
        let item = Item {
            id,
            content,
            favorite: false,
        };
        debug!(id = item.id, kind = %item.kind(), "Added history item");
        self.items.push(item);
        self.items.last()
    }

    fn find_duplicate(&self, content: &Content) -> Option<&Item> {
        self.items
            .iter()
            .find(|item| item.content.same_payload(content))
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Flip the favorite flag, returning the new value
    pub fn toggle_favorite(&mut self, id: ItemId) -> Result<bool> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(HistoryError::ItemNotFound { id })?;
        item.favorite = !item.favorite;
        debug!(id, favorite = item.favorite, "Toggled favorite");
        Ok(item.favorite)
    }

    pub fn delete(&mut self, id: ItemId) -> Result<Item> {
        let position = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(HistoryError::ItemNotFound { id })?;
        let removed = self.items.remove(position);
        debug!(id, "Deleted history item");
        Ok(removed)
    }

    /// Remove every item and restart ids at 0
    pub fn clear_all(&mut self) {
        let removed = self.items.len();
        self.items.clear();
        self.ids.reset();
        debug!(removed, "Cleared clipboard history");
    }

    /// Favorites first, then the rest; ascending id within each group
    pub fn ordered_view(&self) -> Vec<&Item> {
        let mut view: Vec<&Item> = self.items.iter().collect();
        view.sort_by_key(|item| (!item.favorite, item.id));
        view
    }

    /// Items in insertion order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The id the next ingested item will receive
    pub fn next_id(&self) -> ItemId {
        self.ids.peek()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard_history::types::ImageBuffer;

    fn text(s: &str) -> Content {
        Content::Text(s.to_string())
    }

    fn payloads(store: &HistoryStore) -> Vec<String> {
        store
            .ordered_view()
            .iter()
            .map(|item| item.display_text(usize::MAX))
            .collect()
    }

    #[test]
    fn test_ingest_with_exhausted_ids_keeps_store_unchanged() {
        let mut store = HistoryStore::from_parts(Vec::new(), ItemId::MAX);
        assert!(store.ingest(text("a")).is_none());
        assert!(store.is_empty());
        assert_eq!(store.next_id(), ItemId::MAX);
    }

    #[test]
    fn test_ingest_assigns_sequential_ids() {
        let mut store = HistoryStore::new();
        assert_eq!(store.ingest(text("a")).map(|i| i.id), Some(0));
        assert_eq!(store.ingest(text("b")).map(|i| i.id), Some(1));
        assert_eq!(store.next_id(), 2);
    }

    #[test]
    fn test_new_items_are_not_favorites() {
        let mut store = HistoryStore::new();
        let item = store.ingest(text("a")).cloned().unwrap();
        assert!(!item.favorite);
    }

    #[test]
    fn test_duplicate_ingest_is_noop() {
        let mut store = HistoryStore::new();
        store.ingest(text("hello"));
        assert!(store.ingest(text("hello")).is_none());
        assert_eq!(store.len(), 1);
        // No id was burned by the rejected duplicate
        assert_eq!(store.next_id(), 1);
    }

    #[test]
    fn test_dedup_ignores_kind() {
        let mut store = HistoryStore::new();
        store.ingest(Content::File("/tmp/x".to_string()));
        assert!(store.ingest(text("/tmp/x")).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_dedup_images_by_pixels() {
        let mut store = HistoryStore::new();
        let image = || ImageBuffer::new(1, 2, vec![7; 8]);
        assert!(store.ingest(Content::Image(image())).is_some());
        assert!(store.ingest(Content::Image(image())).is_none());
        assert!(store
            .ingest(Content::Image(ImageBuffer::new(1, 2, vec![8; 8])))
            .is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_favorites_come_first() {
        let mut store = HistoryStore::new();
        store.ingest(Content::Url("http://a".to_string()));
        let b = store.ingest(text("b")).map(|i| i.id).unwrap();
        store.toggle_favorite(b).unwrap();
        assert_eq!(payloads(&store), vec!["b", "http://a"]);
    }

    #[test]
    fn test_order_within_partitions_is_ascending_id() {
        let mut store = HistoryStore::new();
        for s in ["a", "b", "c", "d", "e"] {
            store.ingest(text(s));
        }
        store.toggle_favorite(3).unwrap();
        store.toggle_favorite(1).unwrap();
        let ids: Vec<ItemId> = store.ordered_view().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3, 0, 2, 4]);
    }

    #[test]
    fn test_unfavorite_restores_insertion_position() {
        let mut store = HistoryStore::new();
        for s in ["a", "b", "c"] {
            store.ingest(text(s));
        }
        store.toggle_favorite(2).unwrap();
        assert_eq!(payloads(&store), vec!["c", "a", "b"]);
        assert!(!store.toggle_favorite(2).unwrap());
        assert_eq!(payloads(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_toggle_missing_item() {
        let mut store = HistoryStore::new();
        assert!(matches!(
            store.toggle_favorite(9),
            Err(HistoryError::ItemNotFound { id: 9 })
        ));
    }

    #[test]
    fn test_delete_keeps_other_ids() {
        let mut store = HistoryStore::new();
        for s in ["a", "b", "c"] {
            store.ingest(text(s));
        }
        let removed = store.delete(1).unwrap();
        assert_eq!(removed.content, text("b"));
        let ids: Vec<ItemId> = store.items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![0, 2]);
        assert!(matches!(
            store.delete(1),
            Err(HistoryError::ItemNotFound { id: 1 })
        ));
    }

    #[test]
    fn test_deleted_payload_can_be_ingested_again() {
        let mut store = HistoryStore::new();
        store.ingest(text("a"));
        store.delete(0).unwrap();
        assert_eq!(store.ingest(text("a")).map(|i| i.id), Some(1));
    }

    #[test]
    fn test_clear_all_resets_ids() {
        let mut store = HistoryStore::new();
        for s in ["a", "b", "c"] {
            store.ingest(text(s));
        }
        store.clear_all();
        assert!(store.is_empty());
        let item = store.ingest(text("fresh")).cloned().unwrap();
        assert_eq!(item.id, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_from_parts_continues_after_loaded_ids() {
        let items = [0, 2, 5]
            .into_iter()
            .map(|id| Item {
                id,
                content: text(&format!("item {id}")),
                favorite: false,
            })
            .collect();
        let mut store = HistoryStore::from_parts(items, 6);
        assert_eq!(store.ingest(text("z")).map(|i| i.id), Some(6));
    }

    #[test]
    fn test_random_sequences_keep_invariants() {
        // Deterministic pseudo-random mix of ingest/favorite/delete
        let mut store = HistoryStore::new();
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let id = seed % 40;
            match seed % 5 {
                0 | 1 | 2 => {
                    store.ingest(text(&format!("payload {}", seed % 25)));
                }
                3 => {
                    let _ = store.toggle_favorite(id);
                }
                _ => {
                    let _ = store.delete(id);
                }
            }

            let items = store.items();
            for (i, a) in items.iter().enumerate() {
                for b in &items[i + 1..] {
                    assert!(!a.content.same_payload(&b.content));
                    assert!(a.id < b.id);
                }
            }

            let view = store.ordered_view();
            let split = view.iter().take_while(|item| item.favorite).count();
            assert!(view[split..].iter().all(|item| !item.favorite));
            assert!(view[..split].windows(2).all(|w| w[0].id < w[1].id));
            assert!(view[split..].windows(2).all(|w| w[0].id < w[1].id));
        }
    }
}

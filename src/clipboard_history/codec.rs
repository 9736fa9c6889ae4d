//! History persistence
//!
//! The history file is a JSON array of records:
//!
//! ```json
//! [{"data_type": "text", "data": "hello", "favorite": false, "index": 0}]
//! ```
//!
//! Image items are never written. A missing or unreadable file loads as an
//! empty history.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::store::HistoryStore;
use super::types::{Content, Item, ItemId};
use crate::error::{HistoryError, Result};

/// Kind tag stored in `data_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Text,
    Url,
    File,
    /// Any other tag found in a hand-edited or foreign file ("image" included)
    #[serde(other)]
    Unknown,
}

/// One persisted history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub data_type: RecordKind,
    pub data: String,
    pub favorite: bool,
    pub index: ItemId,
}

/// Map items to records, dropping images.
pub fn encode<'a>(items: impl IntoIterator<Item = &'a Item>) -> Vec<Record> {
    items
        .into_iter()
        .filter_map(|item| {
            let (data_type, data) = match &item.content {
                Content::Text(s) => (RecordKind::Text, s.clone()),
                Content::Url(s) => (RecordKind::Url, s.clone()),
                Content::File(s) => (RecordKind::File, s.clone()),
                Content::Image(_) => return None,
            };
            Some(Record {
                data_type,
                data,
                favorite: item.favorite,
                index: item.id,
            })
        })
        .collect()
}

/// Rebuild items from records.
///
/// Returns the items (ascending id) and the next id to allocate: one past the
/// highest usable record index, or 0 when there are none. Records with an
/// unknown `data_type`, a reused index, an index of `ItemId::MAX`, or a
/// payload equal to an earlier record are skipped.
pub fn decode(records: &[Record]) -> (Vec<Item>, ItemId) {
    // ItemId::MAX has no successor, so it can never be a stored id
    let next_id = records
        .iter()
        .map(|record| record.index)
        .filter(|index| *index < ItemId::MAX)
        .max()
        .map_or(0, |max| max + 1);

    let mut seen_ids = HashSet::new();
    let mut items: Vec<Item> = Vec::with_capacity(records.len());

    for record in records {
        if record.index == ItemId::MAX {
            warn!(index = record.index, "Skipping history record with out-of-range index");
            continue;
        }

        let content = match record.data_type {
            RecordKind::Text => Content::Text(record.data.clone()),
            RecordKind::Url => Content::Url(record.data.clone()),
            RecordKind::File => Content::File(record.data.clone()),
            RecordKind::Unknown => {
                warn!(index = record.index, "Skipping history record with unknown type");
                continue;
            }
        };

        if !seen_ids.insert(record.index) {
            warn!(index = record.index, "Skipping history record with reused index");
            continue;
        }

        if items.iter().any(|item| item.content.same_payload(&content)) {
            debug!(index = record.index, "Skipping duplicate history record");
            continue;
        }

        items.push(Item {
            id: record.index,
            content,
            favorite: record.favorite,
        });
    }

    items.sort_by_key(|item| item.id);
    (items, next_id)
}

/// Read raw records from a history file.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let content = std::fs::read_to_string(path).map_err(|source| HistoryError::PersistenceRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| HistoryError::PersistenceRead {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

/// Load history from disk.
///
/// Never fails: a missing file is a fresh start and a malformed one is
/// logged and treated as empty.
#[instrument(name = "history_load")]
pub fn load_history(path: &Path) -> HistoryStore {
    if !path.exists() {
        info!(path = %path.display(), "History file not found, starting fresh");
        return HistoryStore::new();
    }

    match read_records(path) {
        Ok(records) => {
            let (items, next_id) = decode(&records);
            info!(
                path = %path.display(),
                record_count = records.len(),
                item_count = items.len(),
                next_id,
                "Loaded clipboard history"
            );
            HistoryStore::from_parts(items, next_id)
        }
        Err(e) => {
            warn!(error = %e, "Unreadable history file, starting with empty history");
            HistoryStore::new()
        }
    }
}

/// Save history to disk using atomic write (write temp + rename).
#[instrument(name = "history_save", skip(store), fields(item_count = store.len()))]
pub fn save_history(path: &Path, store: &HistoryStore) -> Result<()> {
    let write_err = |source: std::io::Error| HistoryError::PersistenceWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
    }

    let records = encode(store.items());
    let json = serde_json::to_string_pretty(&records).map_err(|e| write_err(e.into()))?;

    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, &json).map_err(write_err)?;
    std::fs::rename(&temp_path, path).map_err(write_err)?;

    info!(
        path = %path.display(),
        record_count = records.len(),
        skipped_images = store.len() - records.len(),
        bytes = json.len(),
        "Saved clipboard history (atomic)"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard_history::types::ImageBuffer;
    use std::fs;
    use std::path::PathBuf;

    fn record(data_type: RecordKind, data: &str, favorite: bool, index: ItemId) -> Record {
        Record {
            data_type,
            data: data.to_string(),
            favorite,
            index,
        }
    }

    fn temp_history_path() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        (dir, path)
    }

    #[test]
    fn test_encode_skips_images() {
        let items = vec![
            Item {
                id: 0,
                content: Content::Text("x".to_string()),
                favorite: false,
            },
            Item {
                id: 1,
                content: Content::Image(ImageBuffer::new(1, 1, vec![1, 2, 3, 4])),
                favorite: true,
            },
        ];
        assert_eq!(encode(&items), vec![record(RecordKind::Text, "x", false, 0)]);
    }

    #[test]
    fn test_record_json_field_names() {
        let json = serde_json::to_value(record(RecordKind::Url, "http://a", true, 3)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"data_type": "url", "data": "http://a", "favorite": true, "index": 3})
        );
    }

    #[test]
    fn test_decode_next_id_is_max_plus_one() {
        let records = vec![
            record(RecordKind::Text, "a", false, 0),
            record(RecordKind::Text, "b", false, 2),
            record(RecordKind::Text, "c", false, 5),
        ];
        let (items, next_id) = decode(&records);
        assert_eq!(items.len(), 3);
        assert_eq!(next_id, 6);
    }

    #[test]
    fn test_unknown_data_type_parses_as_unknown() {
        let records: Vec<Record> = serde_json::from_str(
            r#"[{"data_type": "image", "data": "", "favorite": false, "index": 0},
                {"data_type": "text", "data": "a", "favorite": false, "index": 1}]"#,
        )
        .unwrap();
        assert_eq!(records[0].data_type, RecordKind::Unknown);
        assert_eq!(records[1].data_type, RecordKind::Text);
    }

    #[test]
    fn test_decode_skips_max_index_without_overflow() {
        let records = vec![
            record(RecordKind::Text, "a", false, 3),
            record(RecordKind::Text, "b", false, ItemId::MAX),
        ];
        let (items, next_id) = decode(&records);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 3);
        assert_eq!(next_id, 4);
    }

    #[test]
    fn test_load_with_max_index_does_not_panic() {
        let (_dir, path) = temp_history_path();
        fs::write(
            &path,
            r#"[{"data_type": "text", "data": "x", "favorite": false, "index": 18446744073709551615}]"#,
        )
        .unwrap();

        let mut store = load_history(&path);
        assert!(store.is_empty());
        assert_eq!(store.next_id(), 0);
        assert_eq!(store.ingest(Content::Text("y".to_string())).map(|i| i.id), Some(0));
    }

    #[test]
    fn test_decode_empty() {
        let (items, next_id) = decode(&[]);
        assert!(items.is_empty());
        assert_eq!(next_id, 0);
    }

    #[test]
    fn test_decode_preserves_ids_and_favorites() {
        let records = vec![
            record(RecordKind::File, "/tmp/a", true, 4),
            record(RecordKind::Url, "https://b", false, 1),
        ];
        let (items, _) = decode(&records);
        assert_eq!(
            items,
            vec![
                Item {
                    id: 1,
                    content: Content::Url("https://b".to_string()),
                    favorite: false,
                },
                Item {
                    id: 4,
                    content: Content::File("/tmp/a".to_string()),
                    favorite: true,
                },
            ]
        );
    }

    #[test]
    fn test_decode_skips_unknown_types_and_duplicates() {
        let records = vec![
            record(RecordKind::Text, "same", false, 0),
            record(RecordKind::Unknown, "???", false, 1),
            record(RecordKind::File, "same", true, 2),
            record(RecordKind::Url, "http://c", false, 0),
        ];
        let (items, next_id) = decode(&records);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 0);
        assert_eq!(next_id, 3);
    }

    #[test]
    fn test_round_trip_through_store() {
        let mut store = HistoryStore::new();
        store.ingest(Content::Text("hello".to_string()));
        store.ingest(Content::Url("https://example.com".to_string()));
        store.ingest(Content::File("/tmp/notes.txt".to_string()));
        store.ingest(Content::Text("ünïcødé ✓".to_string()));
        store.toggle_favorite(2).unwrap();
        store.delete(0).unwrap();

        let (items, next_id) = decode(&encode(store.items()));
        let restored = HistoryStore::from_parts(items, next_id);

        assert_eq!(restored.items(), store.items());
        assert_eq!(restored.ordered_view(), store.ordered_view());
        assert_eq!(restored.next_id(), 4);
    }

    #[test]
    fn test_save_and_load() {
        let (_dir, path) = temp_history_path();
        let mut store = HistoryStore::new();
        store.ingest(Content::Text("keep me".to_string()));
        store.ingest(Content::Image(ImageBuffer::new(1, 1, vec![0; 4])));
        store.ingest(Content::Url("http://a".to_string()));
        store.toggle_favorite(2).unwrap();

        save_history(&path, &store).unwrap();
        let loaded = load_history(&path);

        let ids: Vec<ItemId> = loaded.ordered_view().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 0]);
        assert_eq!(loaded.next_id(), 3);
    }

    #[test]
    fn test_save_writes_utf8_pretty_json() {
        let (_dir, path) = temp_history_path();
        let mut store = HistoryStore::new();
        store.ingest(Content::Text("日本語".to_string()));
        save_history(&path, &store).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("日本語"));
        assert!(content.contains('\n'));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("history.json");
        save_history(&path, &HistoryStore::new()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "[]");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let store = load_history(Path::new("/nonexistent/clip-history/history.json"));
        assert!(store.is_empty());
        assert_eq!(store.next_id(), 0);
    }

    #[test]
    fn test_load_invalid_json_is_empty() {
        let (_dir, path) = temp_history_path();
        fs::write(&path, "not valid json").unwrap();
        let store = load_history(&path);
        assert!(store.is_empty());
        assert_eq!(store.next_id(), 0);
    }

    #[test]
    fn test_read_records_reports_parse_errors() {
        let (_dir, path) = temp_history_path();
        fs::write(&path, r#"[{"data_type": "text"}]"#).unwrap();
        assert!(matches!(
            read_records(&path),
            Err(HistoryError::PersistenceRead { .. })
        ));
    }

    #[test]
    fn test_load_accepts_four_space_indented_files() {
        let (_dir, path) = temp_history_path();
        fs::write(
            &path,
            "[\n    {\n        \"data_type\": \"text\",\n        \"data\": \"old\",\n        \"favorite\": true,\n        \"index\": 12\n    }\n]",
        )
        .unwrap();
        let store = load_history(&path);
        assert_eq!(store.len(), 1);
        assert!(store.get(12).unwrap().favorite);
        assert_eq!(store.next_id(), 13);
    }
}

//! Engine controller
//!
//! Owns the history store and the pause flag. Ingestion goes through
//! `on_clipboard_change`, which is the only operation the pause flag gates.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

use super::classifier::{classify, RawClipboard};
use super::store::HistoryStore;
use super::types::{Content, ImageBuffer, Item, ItemId};
use crate::error::{HistoryError, Result};

/// What the clipboard sink should place on the clipboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardWrite {
    Text(String),
    Image(ImageBuffer),
}

/// Something the shell should open with the system default handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    Url(String),
    Path(PathBuf),
}

/// Result of activating a history item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationEffect {
    pub write: ClipboardWrite,
    pub open: Option<OpenTarget>,
    /// File item whose path no longer exists. The payload is still written
    /// but nothing is opened.
    pub missing: Option<PathBuf>,
}

impl ActivationEffect {
    fn write_only(write: ClipboardWrite) -> Self {
        Self {
            write,
            open: None,
            missing: None,
        }
    }

    /// `FileMissing` for a File item whose path is gone
    pub fn missing_error(&self) -> Option<HistoryError> {
        self.missing
            .clone()
            .map(|path| HistoryError::FileMissing { path })
    }
}

pub struct EngineController {
    store: HistoryStore,
    is_paused: bool,
    export_dir: PathBuf,
}

impl EngineController {
    pub fn new(store: HistoryStore, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            is_paused: false,
            export_dir: export_dir.into(),
        }
    }

    /// Handle one clipboard change event.
    ///
    /// Returns the ids of newly created items. While paused the event is
    /// dropped before classification.
    pub fn on_clipboard_change(&mut self, raw: &RawClipboard) -> Vec<ItemId> {
        if self.is_paused {
            debug!("Clipboard history paused, ignoring change");
            return Vec::new();
        }

        classify(raw)
            .into_iter()
            .filter_map(|content| self.store.ingest(content).map(|item| item.id))
            .collect()
    }

    /// Flip the pause flag, returning the new value
    pub fn toggle_pause(&mut self) -> bool {
        self.is_paused = !self.is_paused;
        info!(paused = self.is_paused, "Clipboard history pause toggled");
        self.is_paused
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Describe what activating `id` should do.
    ///
    /// The payload is always written back. Urls and existing files are also
    /// opened; a File item whose path is gone is reported in `missing`.
    pub fn activate(&self, id: ItemId) -> Result<ActivationEffect> {
        let item = self.get(id)?;
        let effect = match &item.content {
            Content::Text(text) => {
                ActivationEffect::write_only(ClipboardWrite::Text(text.clone()))
            }
            Content::Url(url) => ActivationEffect {
                open: Some(OpenTarget::Url(url.clone())),
                ..ActivationEffect::write_only(ClipboardWrite::Text(url.clone()))
            },
            Content::File(path) => {
                let path_buf = PathBuf::from(path);
                let mut effect = ActivationEffect::write_only(ClipboardWrite::Text(path.clone()));
                if path_buf.exists() {
                    effect.open = Some(OpenTarget::Path(path_buf));
                } else {
                    warn!(id, path = %path, "Activated file no longer exists");
                    effect.missing = Some(path_buf);
                }
                effect
            }
            Content::Image(image) => {
                ActivationEffect::write_only(ClipboardWrite::Image(image.clone()))
            }
        };
        debug!(id, kind = %item.kind(), "Activated history item");
        Ok(effect)
    }

    /// Write the full payload of a Text/Url/File item to a new file in the
    /// export directory and return its path. Does not touch the store.
    pub fn export_long_entry(&self, id: ItemId) -> Result<PathBuf> {
        let item = self.get(id)?;
        let payload = item
            .content
            .as_text()
            .ok_or(HistoryError::NotExportable {
                id,
                kind: item.kind(),
            })?;

        let path = write_export_file(&self.export_dir, payload)?;
        info!(id, path = %path.display(), bytes = payload.len(), "Exported history item");
        Ok(path)
    }

    pub fn toggle_favorite(&mut self, id: ItemId) -> Result<bool> {
        self.store.toggle_favorite(id)
    }

    pub fn delete(&mut self, id: ItemId) -> Result<()> {
        self.store.delete(id).map(|_| ())
    }

    pub fn clear_all(&mut self) {
        self.store.clear_all();
    }

    pub fn ordered_view(&self) -> Vec<&Item> {
        self.store.ordered_view()
    }

    pub fn get(&self, id: ItemId) -> Result<&Item> {
        self.store.get(id).ok_or(HistoryError::ItemNotFound { id })
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }
}

/// Create `clip_save_<yyyyMMdd_HHmmss>.txt` in `dir`, adding a numeric
/// suffix when a file with that name already exists.
fn write_export_file(dir: &Path, payload: &str) -> Result<PathBuf> {
    let write_err = |path: &Path, source: std::io::Error| HistoryError::PersistenceWrite {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(|e| write_err(dir, e))?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("clip_save_{stamp}.txt")
        } else {
            format!("clip_save_{stamp}_{attempt}.txt")
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(payload.as_bytes())
                    .map_err(|e| write_err(&path, e))?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(write_err(&path, e)),
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

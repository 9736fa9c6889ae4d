//! Engine worker thread
//!
//! The `EngineController` lives on one dedicated thread and is driven by
//! messages. Clipboard events from the monitor and user actions from the UI
//! adapter share one queue, so every mutation runs to completion before the
//! next one starts and saves always see a consistent store.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result as AnyResult};
use tracing::{debug, info, warn};

use super::classifier::RawClipboard;
use super::codec::save_history;
use super::engine::{ActivationEffect, EngineController};
use super::types::{Item, ItemId};
use crate::error::{HistoryError, Result};

/// Request types for the engine worker
pub enum EngineRequest {
    /// Clipboard content changed (fire and forget)
    ClipboardChanged { raw: RawClipboard },
    /// Snapshot of the display order
    OrderedView { reply: SyncSender<Vec<Item>> },
    ToggleFavorite {
        id: ItemId,
        reply: SyncSender<Result<bool>>,
    },
    Delete {
        id: ItemId,
        reply: SyncSender<Result<()>>,
    },
    ClearAll { reply: SyncSender<()> },
    TogglePause { reply: SyncSender<bool> },
    IsPaused { reply: SyncSender<bool> },
    Activate {
        id: ItemId,
        reply: SyncSender<Result<ActivationEffect>>,
    },
    Export {
        id: ItemId,
        reply: SyncSender<Result<PathBuf>>,
    },
    /// Write the history file now
    Save { reply: SyncSender<Result<()>> },
    /// Save (best effort) and stop the worker
    Shutdown { reply: SyncSender<Result<()>> },
}

/// Cloneable handle to the engine worker
#[derive(Clone)]
pub struct EngineHandle {
    tx: Sender<EngineRequest>,
}

/// Start the engine worker thread.
///
/// `history_path` is where `Save` and `Shutdown` write the history; None
/// disables persistence (used by tests and throwaway sessions).
pub fn spawn_engine(
    controller: EngineController,
    history_path: Option<PathBuf>,
) -> AnyResult<(EngineHandle, JoinHandle<()>)> {
    let (tx, rx): (Sender<EngineRequest>, Receiver<EngineRequest>) = mpsc::channel();

    let handle = thread::Builder::new()
        .name("clip-history-engine".to_string())
        .spawn(move || engine_worker_loop(controller, history_path, rx))
        .context("Failed to spawn clipboard history engine thread")?;

    info!("Engine worker thread started");
    Ok((EngineHandle { tx }, handle))
}

fn engine_worker_loop(
    mut controller: EngineController,
    history_path: Option<PathBuf>,
    rx: Receiver<EngineRequest>,
) {
    info!(item_count = controller.store().len(), "Engine worker loop started");
    for request in rx {
        if !handle_request(&mut controller, history_path.as_ref(), request) {
            info!("Engine worker loop ended");
            return;
        }
    }

    // Every handle dropped without an explicit shutdown
    if let Err(e) = save(&controller, history_path.as_ref()) {
        warn!(error = %e, "Final history save failed");
    }
    info!("Engine worker loop ended (all handles dropped)");
}

fn save(controller: &EngineController, history_path: Option<&PathBuf>) -> Result<()> {
    match history_path {
        Some(path) => save_history(path, controller.store()),
        None => {
            debug!("No history path configured, skipping save");
            Ok(())
        }
    }
}

fn handle_request(
    controller: &mut EngineController,
    history_path: Option<&PathBuf>,
    req: EngineRequest,
) -> bool {
    match req {
        EngineRequest::ClipboardChanged { raw } => {
            let added = controller.on_clipboard_change(&raw);
            if !added.is_empty() {
                debug!(ids = ?added, "Ingested clipboard change");
            }
        }
        EngineRequest::OrderedView { reply } => {
            let view = controller.ordered_view().into_iter().cloned().collect();
            let _ = reply.send(view);
        }
        EngineRequest::ToggleFavorite { id, reply } => {
            let _ = reply.send(controller.toggle_favorite(id));
        }
        EngineRequest::Delete { id, reply } => {
            let _ = reply.send(controller.delete(id));
        }
        EngineRequest::ClearAll { reply } => {
            controller.clear_all();
            let _ = reply.send(());
        }
        EngineRequest::TogglePause { reply } => {
            let _ = reply.send(controller.toggle_pause());
        }
        EngineRequest::IsPaused { reply } => {
            let _ = reply.send(controller.is_paused());
        }
        EngineRequest::Activate { id, reply } => {
            let _ = reply.send(controller.activate(id));
        }
        EngineRequest::Export { id, reply } => {
            let _ = reply.send(controller.export_long_entry(id));
        }
        EngineRequest::Save { reply } => {
            let _ = reply.send(save(controller, history_path));
        }
        EngineRequest::Shutdown { reply } => {
            let result = save(controller, history_path);
            if let Err(e) = &result {
                warn!(error = %e, "History save on shutdown failed, shutting down anyway");
            }
            let _ = reply.send(result);
            info!("Engine worker shutdown");
            return false;
        }
    }
    true
}

impl EngineHandle {
    /// Queue a clipboard change. Never blocks.
    pub fn clipboard_changed(&self, raw: RawClipboard) -> Result<()> {
        self.tx
            .send(EngineRequest::ClipboardChanged { raw })
            .map_err(|_| HistoryError::EngineUnavailable)
    }

    fn request<T>(&self, make: impl FnOnce(SyncSender<T>) -> EngineRequest) -> Result<T> {
        let (reply, response) = mpsc::sync_channel(1);
        self.tx
            .send(make(reply))
            .map_err(|_| HistoryError::EngineUnavailable)?;
        response.recv().map_err(|_| HistoryError::EngineUnavailable)
    }

    /// Display order snapshot (favorites first, then ascending id)
    pub fn ordered_view(&self) -> Result<Vec<Item>> {
        self.request(|reply| EngineRequest::OrderedView { reply })
    }

    pub fn toggle_favorite(&self, id: ItemId) -> Result<bool> {
        self.request(|reply| EngineRequest::ToggleFavorite { id, reply })?
    }

    pub fn delete(&self, id: ItemId) -> Result<()> {
        self.request(|reply| EngineRequest::Delete { id, reply })?
    }

    pub fn clear_all(&self) -> Result<()> {
        self.request(|reply| EngineRequest::ClearAll { reply })
    }

    pub fn toggle_pause(&self) -> Result<bool> {
        self.request(|reply| EngineRequest::TogglePause { reply })
    }

    pub fn is_paused(&self) -> Result<bool> {
        self.request(|reply| EngineRequest::IsPaused { reply })
    }

    pub fn activate(&self, id: ItemId) -> Result<ActivationEffect> {
        self.request(|reply| EngineRequest::Activate { id, reply })?
    }

    pub fn export_long_entry(&self, id: ItemId) -> Result<PathBuf> {
        self.request(|reply| EngineRequest::Export { id, reply })?
    }

    pub fn save(&self) -> Result<()> {
        self.request(|reply| EngineRequest::Save { reply })?
    }

    /// Stop the worker after a best-effort save.
    ///
    /// Returns the save result; the worker stops either way.
    pub fn shutdown(&self) -> Result<()> {
        self.request(|reply| EngineRequest::Shutdown { reply })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard_history::codec::load_history;
    use crate::clipboard_history::store::HistoryStore;

    fn start(history_path: Option<PathBuf>) -> (EngineHandle, JoinHandle<()>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let controller = EngineController::new(HistoryStore::new(), dir.path());
        let (handle, join) = spawn_engine(controller, history_path).unwrap();
        (handle, join, dir)
    }

    #[test]
    fn test_requests_are_processed_in_order() {
        let (handle, join, _dir) = start(None);
        handle.clipboard_changed(RawClipboard::from_text("a")).unwrap();
        handle.clipboard_changed(RawClipboard::from_text("b")).unwrap();
        handle.clipboard_changed(RawClipboard::from_text("a")).unwrap();

        let view = handle.ordered_view().unwrap();
        let ids: Vec<ItemId> = view.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![0, 1]);

        handle.shutdown().unwrap();
        join.join().unwrap();
    }

    #[test]
    fn test_handle_operations_round_trip() {
        let (handle, join, _dir) = start(None);
        handle.clipboard_changed(RawClipboard::from_text("http://a")).unwrap();
        handle.clipboard_changed(RawClipboard::from_text("b")).unwrap();

        assert!(handle.toggle_favorite(1).unwrap());
        let first = handle.ordered_view().unwrap().remove(0);
        assert_eq!(first.id, 1);

        assert!(matches!(
            handle.delete(7),
            Err(HistoryError::ItemNotFound { id: 7 })
        ));

        assert!(handle.toggle_pause().unwrap());
        handle.clipboard_changed(RawClipboard::from_text("ignored")).unwrap();
        assert_eq!(handle.ordered_view().unwrap().len(), 2);
        assert!(handle.is_paused().unwrap());

        handle.clear_all().unwrap();
        assert!(handle.ordered_view().unwrap().is_empty());

        handle.shutdown().unwrap();
        join.join().unwrap();
    }

    #[test]
    fn test_concurrent_producers_keep_store_consistent() {
        let (handle, join, _dir) = start(None);

        let producers: Vec<_> = (0..4)
            .map(|worker| {
                let handle = handle.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        // Overlapping payloads across producers exercise dedup
                        let text = format!("entry {}", (worker * 25 + i) % 100);
                        handle.clipboard_changed(RawClipboard::from_text(text)).unwrap();
                        if i % 10 == 0 {
                            let _ = handle.delete((worker * 7 + i) as ItemId);
                        }
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let view = handle.ordered_view().unwrap();
        for (i, a) in view.iter().enumerate() {
            for b in &view[i + 1..] {
                assert!(!a.content.same_payload(&b.content));
                assert!(a.id < b.id);
            }
        }

        handle.shutdown().unwrap();
        join.join().unwrap();
    }

    #[test]
    fn test_shutdown_saves_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let (handle, join, _export_dir) = start(Some(path.clone()));

        handle.clipboard_changed(RawClipboard::from_text("persist me")).unwrap();
        handle.toggle_favorite(0).unwrap();
        handle.shutdown().unwrap();
        join.join().unwrap();

        let loaded = load_history(&path);
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get(0).unwrap().favorite);
    }

    #[test]
    fn test_shutdown_completes_when_save_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "in the way").unwrap();
        let (handle, join, _export_dir) = start(Some(blocker.join("history.json")));

        handle.clipboard_changed(RawClipboard::from_text("x")).unwrap();
        assert!(matches!(
            handle.shutdown(),
            Err(HistoryError::PersistenceWrite { .. })
        ));
        join.join().unwrap();

        assert!(matches!(
            handle.ordered_view(),
            Err(HistoryError::EngineUnavailable)
        ));
    }
}

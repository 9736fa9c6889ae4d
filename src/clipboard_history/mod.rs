//! Clipboard History Module
//!
//! In-memory clipboard history with JSON persistence and background
//! monitoring.
//!
//! ## Features
//! - Classifies clipboard content as text, URL, file path or image
//! - Suppresses duplicate payloads
//! - Favorites are listed first, everything else in insertion order
//! - Pause/resume of clipboard capture
//! - History survives restarts (images are not persisted)
//! - Long entries can be exported to a text file
//!
//! ## Module Structure
//! - `types`: Core types (Kind, Content, Item, ImageBuffer)
//! - `id_allocator`: Monotonic item ids
//! - `classifier`: Raw clipboard event → typed content
//! - `store`: Dedup, favorites and display order
//! - `codec`: History file encoding and load/save
//! - `engine`: Pause gate, activation and export
//! - `worker`: Single-owner engine thread and its handle
//! - `change_detection` / `monitor`: Background clipboard polling
//! - `sink`: Writing back to the clipboard and opening targets

mod change_detection;
mod classifier;
mod codec;
mod engine;
mod id_allocator;
mod monitor;
mod sink;
mod store;
mod types;
mod worker;

// Types
pub use types::{Content, ImageBuffer, Item, ItemId, Kind};

// Engine pieces
pub use classifier::{classify, local_path_from_uri, RawClipboard};
pub use engine::{ActivationEffect, ClipboardWrite, EngineController, OpenTarget};
pub use id_allocator::IdAllocator;
pub use store::HistoryStore;

// Persistence
pub use codec::{decode, encode, load_history, read_records, save_history, Record, RecordKind};

// Worker
pub use worker::{spawn_engine, EngineHandle, EngineRequest};

// Monitor
pub use change_detection::{fingerprint, ClipboardChangeDetector};
pub use monitor::{split_file_uri_list, start_monitor, MonitorGuard};

// Clipboard sink
pub use sink::{apply_effect, ClipboardSink, SystemSink};

#[cfg(test)]
pub(crate) use sink::RecordingSink;

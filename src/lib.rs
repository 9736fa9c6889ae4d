//! Clipboard history - background clipboard recorder with favorites
//!
//! This library provides the clipboard history engine: content
//! classification, a deduplicated history with favorites and pause, JSON
//! persistence, and the adapters that connect it to the system clipboard and
//! to a JSONL command stream.

pub mod clipboard_history;
pub mod config;
pub mod error;
pub mod logging;
pub mod stdin_commands;

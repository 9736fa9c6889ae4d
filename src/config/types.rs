//! Configuration type definitions

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Clipboard history settings, read from config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// History file (default: ~/.clip-history/history.json)
    #[serde(default = "default_history_path")]
    pub history_path: String,
    /// Directory for "save to file" exports (default: current directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,
    /// Clipboard polling interval in milliseconds (default: 500)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Characters shown per entry before truncating (default: 180)
    #[serde(default = "default_display_truncation")]
    pub display_truncation: usize,
    /// Open exported files after writing them (default: true)
    #[serde(default = "default_open_after_export")]
    pub open_after_export: bool,
}

fn default_history_path() -> String {
    DEFAULT_HISTORY_PATH.to_string()
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_display_truncation() -> usize {
    DEFAULT_DISPLAY_TRUNCATION
}
fn default_open_after_export() -> bool {
    DEFAULT_OPEN_AFTER_EXPORT
}

impl Default for Config {
    fn default() -> Self {
        Config {
            history_path: default_history_path(),
            export_dir: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            display_truncation: DEFAULT_DISPLAY_TRUNCATION,
            open_after_export: DEFAULT_OPEN_AFTER_EXPORT,
        }
    }
}

impl Config {
    /// History file path with `~` expanded
    pub fn history_file(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.history_path).as_ref())
    }

    /// Export directory with `~` expanded, falling back to the current
    /// working directory
    pub fn export_directory(&self) -> PathBuf {
        match &self.export_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).as_ref()),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Polling interval, never below 10ms
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}

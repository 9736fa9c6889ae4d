//! Configuration loading from file system
//!
//! Handles loading and parsing config.json.

use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use super::defaults::DEFAULT_CONFIG_PATH;
use super::types::Config;

/// Load configuration from ~/.clip-history/config.json
///
/// Returns Config::default() if the file is missing or invalid.
pub fn load_config() -> Config {
    let config_path = PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).as_ref());
    load_config_from(&config_path)
}

/// Load configuration from an explicit path.
///
/// Never fails: a missing file, an unreadable file, or invalid JSON all fall
/// back to defaults with a log line.
#[instrument(name = "load_config")]
pub fn load_config_from(config_path: &Path) -> Config {
    if !config_path.exists() {
        info!(path = %config_path.display(), "Config file not found, using defaults");
        return Config::default();
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            warn!(
                path = %config_path.display(),
                error = %e,
                "Failed to read config file, using defaults"
            );
            return Config::default();
        }
    };

    match serde_json::from_str::<Config>(&content) {
        Ok(config) => {
            info!(path = %config_path.display(), "Successfully loaded config");
            config
        }
        Err(e) => {
            let error_hint = if e.to_string().contains("invalid type") {
                "\n\nHint: pollIntervalMs and displayTruncation are numbers, \
                 openAfterExport is a boolean, paths are strings. Example:\n\
                 {\n  \"historyPath\": \"~/.clip-history/history.json\",\n  \"pollIntervalMs\": 500\n}"
            } else {
                ""
            };
            warn!(
                path = %config_path.display(),
                error = %e,
                hint = %error_hint,
                "Failed to parse config JSON, using defaults"
            );
            Config::default()
        }
    }
}

//! Configuration module - Application settings and user preferences
//!
//! This module provides functionality for:
//! - Loading configuration from ~/.clip-history/config.json
//! - Default values for all settings
//! - Type definitions for config structures
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - Configuration struct definitions
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{
    DEFAULT_CONFIG_PATH, DEFAULT_DISPLAY_TRUNCATION, DEFAULT_HISTORY_PATH,
    DEFAULT_POLL_INTERVAL_MS,
};
pub use loader::{load_config, load_config_from};
pub use types::Config;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

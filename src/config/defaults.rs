//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Config file location (tilde-expanded at load time)
pub const DEFAULT_CONFIG_PATH: &str = "~/.clip-history/config.json";

/// History file location (tilde-expanded at load time)
pub const DEFAULT_HISTORY_PATH: &str = "~/.clip-history/history.json";

/// Clipboard polling interval
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Characters shown per list row before truncating; longer entries offer
/// "save to file"
pub const DEFAULT_DISPLAY_TRUNCATION: usize = 180;

/// Open an exported file with the default handler after writing it
pub const DEFAULT_OPEN_AFTER_EXPORT: bool = true;

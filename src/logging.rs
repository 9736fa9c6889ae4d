//! Structured JSONL logging plus human-readable stderr output.
//!
//! This module provides dual-output logging:
//! - **JSONL to file** (~/.clip-history/logs/clip-history.jsonl) - structured for tooling
//! - **Pretty to stderr** - human-readable for developers
//!
//! # Usage
//!
//! ```rust,ignore
//! use clip_history::logging;
//!
//! // Initialize logging - MUST keep guard alive for duration of program
//! let _guard = logging::init();
//!
//! // Use tracing macros directly
//! tracing::info!(event_type = "app_start", "Application started");
//! ```
//!
//! # JSONL Output Format
//!
//! Each line is a valid JSON object:
//! ```json
//! {"timestamp":"2026-10-18T10:30:45.123Z","level":"INFO","target":"clip_history::clipboard_history::codec","fields":{"message":"Loaded clipboard history","item_count":12}}
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use time::macros::format_description;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_NAME: &str = "clip-history.jsonl";

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the dual-output logging system.
///
/// Returns a guard that MUST be kept alive for the duration of the program.
/// If the log file cannot be opened, logging continues on stderr only.
pub fn init() -> LoggingGuard {
    let log_dir = get_log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }

    let path = log_path();

    // Environment filter - default to info, allow override via RUST_LOG
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Falls back to stderr-only logging when the file can't be opened
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file {}: {}", path.display(), e);
            None
        }
    };

    let (subscriber, file_guard) = build_subscriber(env_filter, file);
    subscriber.init();

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %path.display(),
        file_logging = file_guard.is_some(),
        "Application logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Registry with the env filter, the JSONL file layer (when a file is
/// given) and the stderr layer.
fn build_subscriber(
    env_filter: EnvFilter,
    file: Option<File>,
) -> (impl Subscriber + Send + Sync + 'static, Option<WorkerGuard>) {
    // Pretty layer for stderr (human developers)
    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    let (json_layer, file_guard) = match file {
        Some(file) => {
            // Non-blocking writer so logging never stalls the engine thread
            let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file);

            let json_layer = fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_timer(UtcTime::new(format_description!(
                    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
                )))
                .with_target(true)
                .with_level(true)
                .with_thread_names(true)
                .with_file(false)
                .with_line_number(false)
                .with_span_events(FmtSpan::CLOSE);
            (Some(json_layer), Some(file_guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer);
    (subscriber, file_guard)
}

/// Get the log directory path (~/.clip-history/logs/)
fn get_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".clip-history").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("clip-history-logs"))
}

/// Get the path to the JSONL log file
pub fn log_path() -> PathBuf {
    get_log_dir().join(LOG_FILE_NAME)
}

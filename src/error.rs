use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::clipboard_history::{ItemId, Kind};

/// Error severity for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,    // informational, nothing went wrong in the engine
    Warning, // recoverable, the UI re-renders and moves on
    Error,   // operation failed
}

/// Errors returned by the clipboard history engine.
///
/// Every variant is a value handed back to the immediate caller. None of them
/// is fatal to the process.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("No history item with id {id}")]
    ItemNotFound { id: ItemId },

    #[error("File does not exist: {}", path.display())]
    FileMissing { path: PathBuf },

    #[error("Failed to read history from '{}': {source}", path.display())]
    PersistenceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{}': {source}", path.display())]
    PersistenceWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Item {id} of kind {kind} cannot be exported to a file")]
    NotExportable { id: ItemId, kind: Kind },

    #[error("Clipboard history engine is not running")]
    EngineUnavailable,
}

impl HistoryError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ItemNotFound { .. } => ErrorSeverity::Info,
            Self::FileMissing { .. } => ErrorSeverity::Warning,
            Self::PersistenceRead { .. } => ErrorSeverity::Warning,
            Self::PersistenceWrite { .. } => ErrorSeverity::Error,
            Self::NotExportable { .. } => ErrorSeverity::Warning,
            Self::EngineUnavailable => ErrorSeverity::Error,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::ItemNotFound { .. } => "That entry is no longer in the history.".to_string(),
            Self::FileMissing { path } => format!("File does not exist: {}", path.display()),
            Self::PersistenceRead { path, .. } => {
                format!("Could not read history from {}", path.display())
            }
            Self::PersistenceWrite { path, .. } => format!("Could not write {}", path.display()),
            Self::NotExportable { kind, .. } => format!("{} entries cannot be saved to a file", kind),
            Self::EngineUnavailable => "Clipboard history is not running.".to_string(),
        }
    }

    /// Short machine-readable code, used in JSON responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ItemNotFound { .. } => "item_not_found",
            Self::FileMissing { .. } => "file_missing",
            Self::PersistenceRead { .. } => "persistence_read",
            Self::PersistenceWrite { .. } => "persistence_write",
            Self::NotExportable { .. } => "not_exportable",
            Self::EngineUnavailable => "engine_unavailable",
        }
    }
}

pub type Result<T> = std::result::Result<T, HistoryError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use clip_history::error::ResultExt;
///
/// // Best-effort save on shutdown
/// save_history(&path, &store).log_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

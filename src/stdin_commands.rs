//! External command handling via stdin.
//!
//! This module lets a front end (or a test harness) drive the clipboard
//! history through JSONL commands on stdin. Each non-empty line produces
//! exactly one JSON response line on stdout; a line that doesn't parse gets an
//! `ok: false` response with the `parse_error` code.
//!
//! # Protocol
//!
//! Commands are sent as JSON objects, one per line (JSONL format):
//!
//! ```json
//! {"type": "list"}
//! {"type": "toggleFavorite", "id": 3}
//! {"type": "delete", "id": 3, "requestId": "req-1"}
//! {"type": "clearAll"}
//! {"type": "togglePause"}
//! {"type": "activate", "id": 0}
//! {"type": "export", "id": 0}
//! {"type": "save"}
//! {"type": "quit"}
//! ```
//!
//! # Example Usage
//!
//! ```bash
//! echo '{"type": "list"}' | ./clip-history
//! ```

use std::io::Write;
use std::sync::mpsc::{self, Receiver};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clipboard_history::{
    apply_effect, ClipboardSink, EngineHandle, Item, ItemId, Kind, OpenTarget,
};
use crate::config::Config;
use crate::error::{ErrorSeverity, HistoryError};

/// External commands that can be sent via stdin
///
/// All commands support an optional `requestId` field for correlation.
/// When present, it is logged and echoed back in the response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExternalCommand {
    /// Current display order and pause state
    List {
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    ToggleFavorite {
        id: ItemId,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    Delete {
        id: ItemId,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    ClearAll {
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    TogglePause {
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Put the item back on the clipboard (and open URLs and files)
    Activate {
        id: ItemId,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Save a long entry to a text file
    Export {
        id: ItemId,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Write the history file now
    Save {
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Save and exit
    Quit {
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
}

impl ExternalCommand {
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::List { request_id }
            | Self::ToggleFavorite { request_id, .. }
            | Self::Delete { request_id, .. }
            | Self::ClearAll { request_id }
            | Self::TogglePause { request_id }
            | Self::Activate { request_id, .. }
            | Self::Export { request_id, .. }
            | Self::Save { request_id }
            | Self::Quit { request_id } => request_id.as_deref(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::List { .. } => "list",
            Self::ToggleFavorite { .. } => "toggleFavorite",
            Self::Delete { .. } => "delete",
            Self::ClearAll { .. } => "clearAll",
            Self::TogglePause { .. } => "togglePause",
            Self::Activate { .. } => "activate",
            Self::Export { .. } => "export",
            Self::Save { .. } => "save",
            Self::Quit { .. } => "quit",
        }
    }
}

/// One row of the history list as a front end would render it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub id: ItemId,
    pub kind: Kind,
    pub text: String,
    pub favorite: bool,
    /// Whether a "save to file" action should be offered
    pub offers_export: bool,
}

impl ItemView {
    pub fn from_item(item: &Item, truncation: usize) -> Self {
        Self {
            id: item.id,
            kind: item.kind(),
            text: item.display_text(truncation),
            favorite: item.favorite,
            offers_export: item.offers_export(truncation),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorView {
    pub code: &'static str,
    pub severity: ErrorSeverity,
    pub message: String,
}

impl From<&HistoryError> for ErrorView {
    fn from(err: &HistoryError) -> Self {
        Self {
            code: err.code(),
            severity: err.severity(),
            message: err.user_message(),
        }
    }
}

/// Response written to stdout for every command
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub ok: bool,
    /// Fresh ordered view, present after `list` and every mutation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    /// Written export file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorView>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub quit: bool,
}

impl CommandResponse {
    fn ok(request_id: Option<String>) -> Self {
        Self {
            request_id,
            ok: true,
            ..Default::default()
        }
    }

    fn failed(request_id: Option<String>, error: ErrorView) -> Self {
        Self {
            request_id,
            ok: false,
            error: Some(error),
            ..Default::default()
        }
    }
}

/// Run one command against the engine.
///
/// Engine errors become `ok: false` responses; they never end the session.
pub fn run_command(
    handle: &EngineHandle,
    sink: &mut dyn ClipboardSink,
    config: &Config,
    cmd: ExternalCommand,
) -> CommandResponse {
    let request_id = cmd.request_id().map(str::to_string);
    info!(
        command = cmd.name(),
        request_id = request_id.as_deref().unwrap_or(""),
        "Running external command"
    );

    let result = execute(handle, sink, config, &cmd, request_id.clone());
    match result {
        Ok(response) => response,
        Err(err) => {
            warn!(
                command = cmd.name(),
                request_id = request_id.as_deref().unwrap_or(""),
                error = %err,
                code = err.code(),
                "External command failed"
            );
            CommandResponse::failed(request_id, ErrorView::from(&err))
        }
    }
}

fn execute(
    handle: &EngineHandle,
    sink: &mut dyn ClipboardSink,
    config: &Config,
    cmd: &ExternalCommand,
    request_id: Option<String>,
) -> crate::error::Result<CommandResponse> {
    let mut response = CommandResponse::ok(request_id);
    match cmd {
        ExternalCommand::List { .. } => {
            response.paused = Some(handle.is_paused()?);
            response.items = Some(view(handle, config)?);
        }
        ExternalCommand::ToggleFavorite { id, .. } => {
            response.favorite = Some(handle.toggle_favorite(*id)?);
            response.items = Some(view(handle, config)?);
        }
        ExternalCommand::Delete { id, .. } => {
            handle.delete(*id)?;
            response.items = Some(view(handle, config)?);
        }
        ExternalCommand::ClearAll { .. } => {
            handle.clear_all()?;
            response.items = Some(view(handle, config)?);
        }
        ExternalCommand::TogglePause { .. } => {
            response.paused = Some(handle.toggle_pause()?);
        }
        ExternalCommand::Activate { id, .. } => {
            let effect = handle.activate(*id)?;
            if let Err(e) = apply_effect(sink, &effect) {
                warn!(id, error = %e, "Failed to apply activation");
                return Ok(CommandResponse::failed(
                    response.request_id,
                    ErrorView {
                        code: "clipboard_unavailable",
                        severity: ErrorSeverity::Error,
                        message: format!("{:#}", e),
                    },
                ));
            }
            // Payload is on the clipboard; the file itself is gone
            if let Some(err) = effect.missing_error() {
                return Err(err);
            }
        }
        ExternalCommand::Export { id, .. } => {
            let path = handle.export_long_entry(*id)?;
            if config.open_after_export {
                if let Err(e) = sink.open_external(&OpenTarget::Path(path.clone())) {
                    warn!(path = %path.display(), error = %e, "Failed to open exported file");
                }
            }
            response.path = Some(path.display().to_string());
        }
        ExternalCommand::Save { .. } => {
            handle.save()?;
        }
        ExternalCommand::Quit { .. } => {
            response.quit = true;
        }
    }
    Ok(response)
}

fn view(handle: &EngineHandle, config: &Config) -> crate::error::Result<Vec<ItemView>> {
    Ok(handle
        .ordered_view()?
        .iter()
        .map(|item| ItemView::from_item(item, config.display_truncation))
        .collect())
}

/// Why a command session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// A `quit` command was received
    Quit,
    /// Input reached end of file
    EndOfInput,
    /// Responses could no longer be written (consumer went away)
    OutputClosed,
}

/// Run commands until `quit`, end of input, or a failed response write.
///
/// Never returns early on an error, so the caller's shutdown path always runs.
pub fn serve_commands(
    handle: &EngineHandle,
    sink: &mut dyn ClipboardSink,
    config: &Config,
    messages: impl IntoIterator<Item = StdinMessage>,
    out: &mut impl Write,
) -> SessionEnd {
    for message in messages {
        let response = match message {
            Ok(cmd) => run_command(handle, sink, config, cmd),
            Err(response) => response,
        };
        if let Err(e) = write_response(out, &response) {
            warn!(error = %e, "Failed to write command response, ending session");
            return SessionEnd::OutputClosed;
        }
        if response.quit {
            return SessionEnd::Quit;
        }
    }
    SessionEnd::EndOfInput
}

fn write_response(out: &mut impl Write, response: &CommandResponse) -> anyhow::Result<()> {
    let line = serde_json::to_string(response).context("Failed to serialize response")?;
    writeln!(out, "{}", line).context("Failed to write response")?;
    out.flush().context("Failed to flush output")
}

/// A parsed command, or the response for a line that didn't parse
pub type StdinMessage = Result<ExternalCommand, CommandResponse>;

/// Parse one stdin line.
///
/// A line that is not a valid command yields the `parse_error` response to
/// send back instead, carrying the `requestId` when one can be recovered.
pub fn parse_command(line: &str) -> StdinMessage {
    serde_json::from_str::<ExternalCommand>(line).map_err(|e| {
        warn!(error = %e, line = %line, "Failed to parse command");
        let request_id = serde_json::from_str::<serde_json::Value>(line)
            .ok()
            .and_then(|value| {
                value
                    .get("requestId")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
            });
        CommandResponse::failed(
            request_id,
            ErrorView {
                code: "parse_error",
                severity: ErrorSeverity::Warning,
                message: e.to_string(),
            },
        )
    })
}

/// Start a thread that listens on stdin for external JSONL commands.
///
/// The receiver disconnects when stdin reaches end of file. Lines that don't
/// parse arrive as the error response to write back.
pub fn start_stdin_listener() -> anyhow::Result<Receiver<StdinMessage>> {
    use std::io::BufRead;

    // Bounded: commands arrive far slower than the engine handles them
    let (tx, rx) = mpsc::sync_channel(100);

    std::thread::Builder::new()
        .name("clip-history-stdin".to_string())
        .spawn(move || {
            info!("External command listener started");
            let stdin = std::io::stdin();
            let reader = stdin.lock();

            for line in reader.lines() {
                match line {
                    Ok(line) if !line.trim().is_empty() => {
                        debug!(line = %line, "Received stdin line");
                        if tx.send(parse_command(&line)).is_err() {
                            info!("Command channel closed, exiting");
                            break;
                        }
                    }
                    Ok(_) => {} // Empty line, ignore
                    Err(e) => {
                        warn!(error = %e, "Error reading stdin");
                        break;
                    }
                }
            }
            info!("External command listener exiting");
        })
        .context("Failed to spawn stdin listener thread")?;

    Ok(rx)
}

// ============================================================================
// Tests
// ============================================================================

//! clip-history - headless clipboard history recorder
//!
//! Records clipboard changes in the background and answers JSONL commands on
//! stdin with one JSON line per command on stdout.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use clip_history::clipboard_history::{
    load_history, spawn_engine, start_monitor, EngineController, SystemSink,
};
use clip_history::config::{load_config, load_config_from};
use clip_history::error::{HistoryError, ResultExt};
use clip_history::logging;
use clip_history::stdin_commands::{serve_commands, start_stdin_listener, SessionEnd};

/// How often standalone mode checkpoints the history once stdin is closed
const STANDALONE_SAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Command-line arguments for clip-history
#[derive(Parser, Debug)]
#[command(name = "clip-history")]
#[command(version, about = "Clipboard history recorder", long_about = None)]
pub struct Args {
    /// Keep recording after stdin closes
    #[arg(short, long)]
    pub standalone: bool,

    /// History file (overrides historyPath from the config file)
    #[arg(long)]
    pub history_file: Option<PathBuf>,

    /// Directory for exported entries (overrides exportDir)
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _logging_guard = logging::init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        standalone = args.standalone,
        "clip-history starting"
    );

    let mut config = match &args.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    };
    if let Some(path) = &args.history_file {
        config.history_path = path.display().to_string();
    }
    if let Some(dir) = &args.export_dir {
        config.export_dir = Some(dir.display().to_string());
    }

    let history_path = config.history_file();
    let store = load_history(&history_path);
    let controller = EngineController::new(store, config.export_directory());
    info!(
        history_path = %history_path.display(),
        export_dir = %controller.export_dir().display(),
        "Clipboard history engine configured"
    );
    let (engine, engine_thread) = spawn_engine(controller, Some(history_path))?;

    let monitor = match start_monitor(engine.clone(), config.poll_interval()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            warn!(error = %e, "Clipboard monitoring unavailable, commands only");
            None
        }
    };

    // Past this point every exit goes through the shutdown save below
    let session_end = match start_stdin_listener() {
        Ok(messages) => {
            let mut sink = SystemSink;
            let stdout = std::io::stdout();
            // Disconnects at end of stdin
            serve_commands(&engine, &mut sink, &config, messages, &mut stdout.lock())
        }
        Err(e) => {
            warn!(error = %e, "Command input unavailable");
            SessionEnd::EndOfInput
        }
    };
    info!(session_end = ?session_end, "Command session ended");

    if args.standalone && session_end == SessionEnd::EndOfInput {
        info!("stdin closed, continuing to record in standalone mode");
        loop {
            std::thread::sleep(STANDALONE_SAVE_INTERVAL);
            match engine.save() {
                Err(HistoryError::EngineUnavailable) => break,
                result => {
                    result.warn_on_err();
                }
            }
        }
    }

    info!("Shutting down");
    if let Some(monitor) = monitor {
        monitor.stop();
    }
    engine.shutdown().log_err();
    drop(engine);
    if engine_thread.join().is_err() {
        warn!("Engine thread panicked during shutdown");
    }

    info!("clip-history exited");
    Ok(())
}

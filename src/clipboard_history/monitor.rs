//! Clipboard monitoring
//!
//! Background thread that polls the system clipboard and forwards changes to
//! the engine worker as `RawClipboard` events.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use arboard::Clipboard;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::change_detection::ClipboardChangeDetector;
use super::classifier::{local_path_from_uri, RawClipboard};
use super::types::ImageBuffer;
use super::worker::EngineHandle;

/// Stops the monitor thread when dropped
pub struct MonitorGuard {
    stop_flag: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl MonitorGuard {
    /// Stop polling and wait for the monitor thread to exit
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                error!("Clipboard monitor thread panicked");
            }
            info!("Clipboard monitoring stopped");
        }
    }
}

impl Drop for MonitorGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start polling the clipboard every `poll_interval`.
///
/// Content already on the clipboard at startup is not recorded; only changes
/// made afterwards are forwarded.
pub fn start_monitor(engine: EngineHandle, poll_interval: Duration) -> Result<MonitorGuard> {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let thread_stop = stop_flag.clone();

    let handle = thread::Builder::new()
        .name("clip-history-monitor".to_string())
        .spawn(move || {
            if let Err(e) = clipboard_monitor_loop(engine, poll_interval, thread_stop) {
                error!(error = %e, "Clipboard monitor thread failed");
            }
        })
        .context("Failed to spawn clipboard monitor thread")?;

    Ok(MonitorGuard {
        stop_flag,
        handle: Mutex::new(Some(handle)),
    })
}

fn clipboard_monitor_loop(
    engine: EngineHandle,
    poll_interval: Duration,
    stop_flag: Arc<AtomicBool>,
) -> Result<()> {
    let mut clipboard = Clipboard::new().context("Failed to create clipboard instance")?;
    let mut change_detector = ClipboardChangeDetector::new();

    // Prime with whatever is there now
    change_detector.has_changed(&read_clipboard(&mut clipboard));

    info!(
        poll_interval_ms = poll_interval.as_millis() as u64,
        "Clipboard monitor started"
    );

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            info!("Clipboard monitor stopping");
            break;
        }

        let start = Instant::now();

        let raw = read_clipboard(&mut clipboard);
        if change_detector.has_changed(&raw) && !raw.is_empty() {
            debug!(
                has_text = raw.text.is_some(),
                has_image = raw.image.is_some(),
                uri_count = raw.uris.len(),
                "Forwarding clipboard change"
            );
            if engine.clipboard_changed(raw).is_err() {
                warn!("Engine worker gone, stopping clipboard monitor");
                break;
            }
        }

        let elapsed = start.elapsed();
        if elapsed < poll_interval {
            thread::sleep(poll_interval - elapsed);
        }
    }

    Ok(())
}

/// Read everything we understand from the clipboard.
fn read_clipboard(clipboard: &mut Clipboard) -> RawClipboard {
    let image = clipboard
        .get_image()
        .ok()
        .map(|data| ImageBuffer::new(data.width, data.height, data.bytes.into_owned()));

    let text = clipboard.get_text().ok();
    let file_uris = text.as_deref().and_then(split_file_uri_list);
    match file_uris {
        Some(uris) => RawClipboard {
            text: None,
            image,
            uris,
        },
        None => RawClipboard {
            text,
            image,
            uris: Vec::new(),
        },
    }
}

/// File managers put copied files on the clipboard as a `text/uri-list`
/// style block. Returns the URIs when `text` has more than one line and
/// every non-comment line is a local file URI.
pub fn split_file_uri_list(text: &str) -> Option<Vec<String>> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();

    if lines.len() < 2 {
        return None;
    }
    if !lines
        .iter()
        .all(|line| local_path_from_uri(line).is_some())
    {
        return None;
    }
    Some(lines.into_iter().map(str::to_string).collect())
}

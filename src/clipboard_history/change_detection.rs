//! Clipboard change detection
//!
//! The monitor polls the clipboard and must only forward real changes to the
//! engine. Change detection compares a SHA-256 fingerprint of the readable
//! content with the one seen on the previous poll.

use sha2::{Digest, Sha256};
use tracing::debug;

use super::classifier::RawClipboard;

/// Fingerprint of everything readable on the clipboard
pub fn fingerprint(raw: &RawClipboard) -> [u8; 32] {
    let mut hasher = Sha256::new();
    match &raw.text {
        Some(text) => {
            hasher.update([1u8]);
            hasher.update((text.len() as u64).to_le_bytes());
            hasher.update(text.as_bytes());
        }
        None => hasher.update([0u8]),
    }
    match &raw.image {
        Some(image) => {
            hasher.update([1u8]);
            hasher.update((image.width() as u64).to_le_bytes());
            hasher.update((image.height() as u64).to_le_bytes());
            hasher.update(image.bytes());
        }
        None => hasher.update([0u8]),
    }
    for uri in &raw.uris {
        hasher.update((uri.len() as u64).to_le_bytes());
        hasher.update(uri.as_bytes());
    }
    hasher.finalize().into()
}

/// Tracks the last seen clipboard content.
#[derive(Debug, Default)]
pub struct ClipboardChangeDetector {
    last: Option<[u8; 32]>,
}

impl ClipboardChangeDetector {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Check whether `raw` differs from the content seen on the previous call.
    ///
    /// The first call always reports a change. The monitor makes that call
    /// before polling, which primes the detector so content already on the
    /// clipboard at startup is not recorded.
    pub fn has_changed(&mut self, raw: &RawClipboard) -> bool {
        let current = fingerprint(raw);
        let changed = self.last != Some(current);
        if changed {
            debug!(
                fingerprint = %hex::encode(&current[..8]),
                "Clipboard change detected"
            );
        }
        self.last = Some(current);
        changed
    }

    /// Next call to `has_changed()` will return true.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

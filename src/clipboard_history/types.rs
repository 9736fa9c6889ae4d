//! Core clipboard history types
//!
//! `Content` is a closed tagged union: each kind carries its own payload type,
//! so the classifier, store and codec all match exhaustively.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Identifier of a history item. Strictly increasing in creation order.
pub type ItemId = u64;

/// Classification of an item's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Text,
    Url,
    File,
    Image,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Text => "text",
            Kind::Url => "url",
            Kind::File => "file",
            Kind::Image => "image",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded RGBA image taken from the clipboard.
///
/// Pixel data is shared, so cloning an item for a snapshot does not copy the
/// image. Equality is pixel-content equality.
#[derive(Clone)]
pub struct ImageBuffer {
    width: usize,
    height: usize,
    bytes: Arc<[u8]>,
    fingerprint: [u8; 32],
}

impl ImageBuffer {
    pub fn new(width: usize, height: usize, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        let fingerprint = compute_image_fingerprint(width, height, &bytes);
        Self {
            width,
            height,
            bytes,
            fingerprint,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// SHA-256 over dimensions and pixels, hex encoded (for logs)
    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint)
    }
}

impl PartialEq for ImageBuffer {
    fn eq(&self, other: &Self) -> bool {
        // Fingerprint first so unequal images are rejected without a full scan
        self.fingerprint == other.fingerprint
            && self.width == other.width
            && self.height == other.height
            && self.bytes == other.bytes
    }
}

impl Eq for ImageBuffer {}

impl fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("byte_len", &self.bytes.len())
            .field("fingerprint", &self.fingerprint_hex())
            .finish()
    }
}

fn compute_image_fingerprint(width: usize, height: usize, bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update((width as u64).to_le_bytes());
    hasher.update((height as u64).to_le_bytes());
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Typed content of one history entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Url(String),
    /// Local filesystem path
    File(String),
    Image(ImageBuffer),
}

impl Content {
    pub fn kind(&self) -> Kind {
        match self {
            Content::Text(_) => Kind::Text,
            Content::Url(_) => Kind::Url,
            Content::File(_) => Kind::File,
            Content::Image(_) => Kind::Image,
        }
    }

    /// String payload for Text/Url/File, None for images
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(s) | Content::Url(s) | Content::File(s) => Some(s),
            Content::Image(_) => None,
        }
    }

    /// Payload equality used for dedup.
    ///
    /// Ignores the kind tag: a File path and an identical Text string are the
    /// same payload.
    pub fn same_payload(&self, other: &Content) -> bool {
        match (self, other) {
            (Content::Image(a), Content::Image(b)) => a == b,
            (Content::Image(_), _) | (_, Content::Image(_)) => false,
            _ => self.as_text() == other.as_text(),
        }
    }
}

/// One clipboard history entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub content: Content,
    pub favorite: bool,
}

impl Item {
    pub fn kind(&self) -> Kind {
        self.content.kind()
    }

    /// Payload length in characters (0 for images)
    pub fn payload_len(&self) -> usize {
        self.content.as_text().map_or(0, |s| s.chars().count())
    }

    /// Text shown in a list row: the first `limit` characters, with `...`
    /// appended when the payload is longer. Images render as "Image".
    pub fn display_text(&self, limit: usize) -> String {
        match self.content.as_text() {
            Some(text) => {
                let mut shown: String = text.chars().take(limit).collect();
                if text.chars().nth(limit).is_some() {
                    shown.push_str("...");
                }
                shown
            }
            None => "Image".to_string(),
        }
    }

    /// Whether the UI should offer "save to file" for this item
    pub fn offers_export(&self, limit: usize) -> bool {
        self.content.as_text().is_some() && self.payload_len() > limit
    }
}

//! Content classification
//!
//! Turns a raw clipboard event into zero or more typed `Content` candidates.
//! Pure: no I/O, no store access.

use tracing::debug;
use url::Url;

use super::types::{Content, ImageBuffer};

/// One clipboard change as delivered by a clipboard source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawClipboard {
    pub text: Option<String>,
    pub image: Option<ImageBuffer>,
    /// URI list (local `file://` or remote)
    pub uris: Vec<String>,
}

impl RawClipboard {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn from_image(image: ImageBuffer) -> Self {
        Self {
            image: Some(image),
            ..Self::default()
        }
    }

    pub fn from_uris<I, S>(uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            uris: uris.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.image.is_none() && self.uris.is_empty()
    }
}

/// Classify a raw clipboard event.
///
/// Rules, first match wins:
/// 1. image present → one `Image`
/// 2. non-empty text → `Url` (http/https), `File` (file:// URI or absolute
///    path) or `Text`; empty text produces nothing
/// 3. URI list → one `File` per `file://` URI, other schemes dropped
///
/// Unrecognized content yields an empty vector.
pub fn classify(raw: &RawClipboard) -> Vec<Content> {
    if let Some(image) = &raw.image {
        return vec![Content::Image(image.clone())];
    }

    if let Some(text) = &raw.text {
        if text.is_empty() {
            debug!("Empty clipboard text, nothing to classify");
            return Vec::new();
        }
        return vec![classify_text(text)];
    }

    let files: Vec<Content> = raw
        .uris
        .iter()
        .filter_map(|uri| local_path_from_uri(uri))
        .map(Content::File)
        .collect();

    if files.is_empty() && !raw.uris.is_empty() {
        debug!(
            uri_count = raw.uris.len(),
            "No local file URIs in clipboard URI list"
        );
    }
    files
}

fn classify_text(text: &str) -> Content {
    if text.starts_with("http://") || text.starts_with("https://") {
        Content::Url(text.to_string())
    } else if text.starts_with("file://") {
        match local_path_from_uri(text) {
            Some(path) => Content::File(path),
            // Doesn't parse as a URI at all
            None => Content::Text(text.to_string()),
        }
    } else if text.starts_with('/') {
        Content::File(text.to_string())
    } else {
        Content::Text(text.to_string())
    }
}

/// Filesystem path for a `file://` URI, None for anything else.
///
/// A URI naming a host other than localhost maps to a network path of the
/// form `//host/path` when the platform has no native form for it.
pub fn local_path_from_uri(uri: &str) -> Option<String> {
    let url = Url::parse(uri.trim()).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    let path = match url.to_file_path() {
        Ok(path) => path.to_str()?.to_string(),
        Err(()) => network_path(&url)?,
    };
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

fn network_path(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|host| !host.is_empty())?;
    // Re-root the path without the host to get it percent-decoded
    let rooted = Url::parse(&format!("file://{}", url.path())).ok()?;
    let path = rooted.to_file_path().ok()?;
    Some(format!("//{}{}", host, path.to_str()?))
}

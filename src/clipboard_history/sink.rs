//! Clipboard sink and shell
//!
//! Carries out `ActivationEffect`s: writes content back to the system
//! clipboard and opens URLs or files with the default handler.

use std::path::Path;

use anyhow::{Context, Result};
use arboard::{Clipboard, ImageData};
use tracing::{debug, info};

use super::engine::{ActivationEffect, ClipboardWrite, OpenTarget};
use super::types::ImageBuffer;

pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<()>;
    fn set_image(&mut self, image: &ImageBuffer) -> Result<()>;
    /// Open a URL or local path with the system default handler
    fn open_external(&mut self, target: &OpenTarget) -> Result<()>;
}

/// Sink backed by the real system clipboard and `open`
#[derive(Debug, Default)]
pub struct SystemSink;

impl ClipboardSink for SystemSink {
    fn set_text(&mut self, text: &str) -> Result<()> {
        let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;
        clipboard
            .set_text(text)
            .context("Failed to set clipboard text")?;
        debug!(text_len = text.len(), "Set clipboard text");
        Ok(())
    }

    fn set_image(&mut self, image: &ImageBuffer) -> Result<()> {
        let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;
        clipboard
            .set_image(ImageData {
                width: image.width(),
                height: image.height(),
                bytes: image.bytes().to_vec().into(),
            })
            .context("Failed to set clipboard image")?;
        debug!(
            width = image.width(),
            height = image.height(),
            "Set clipboard image"
        );
        Ok(())
    }

    fn open_external(&mut self, target: &OpenTarget) -> Result<()> {
        match target {
            OpenTarget::Url(url) => {
                open::that(url).with_context(|| format!("Failed to open URL {}", url))?;
            }
            OpenTarget::Path(path) => open_path(path)?,
        }
        info!(open_target = ?target, "Opened externally");
        Ok(())
    }
}

fn open_path(path: &Path) -> Result<()> {
    open::that(path).with_context(|| format!("Failed to open {}", path.display()))
}

/// Perform an activation: clipboard write first, then the optional open.
pub fn apply_effect(sink: &mut dyn ClipboardSink, effect: &ActivationEffect) -> Result<()> {
    match &effect.write {
        ClipboardWrite::Text(text) => sink.set_text(text)?,
        ClipboardWrite::Image(image) => sink.set_image(image)?,
    }
    if let Some(target) = &effect.open {
        sink.open_external(target)?;
    }
    Ok(())
}

/// Sink that records calls instead of touching the OS
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub texts: Vec<String>,
    pub images: Vec<ImageBuffer>,
    pub opened: Vec<OpenTarget>,
}

#[cfg(test)]
impl ClipboardSink for RecordingSink {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.texts.push(text.to_string());
        Ok(())
    }

    fn set_image(&mut self, image: &ImageBuffer) -> Result<()> {
        self.images.push(image.clone());
        Ok(())
    }

    fn open_external(&mut self, target: &OpenTarget) -> Result<()> {
        self.opened.push(target.clone());
        Ok(())
    }
}

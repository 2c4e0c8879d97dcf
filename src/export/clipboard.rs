//! Clipboard Operations for Share Links
//!
//! This module provides cross-platform clipboard functionality for copying
//! share links to the system clipboard using the arboard crate. When no
//! clipboard is reachable (headless session, no display server) the text is
//! handed back so the caller can show it for manual copying.

use crate::error::{Error, Result};
use arboard::Clipboard;
use log::{info, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Clipboard Access
// ─────────────────────────────────────────────────────────────────────────────

/// Something text can be written to.
pub trait TextClipboard {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The platform clipboard, opened per write.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl TextClipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        copy_text_to_clipboard(text)
    }
}

/// Copy plain text to clipboard.
///
/// Uses arboard for cross-platform clipboard support.
pub fn copy_text_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard =
        Clipboard::new().map_err(|e| Error::Clipboard(format!("access failed: {}", e)))?;

    clipboard
        .set_text(text)
        .map_err(|e| Error::Clipboard(format!("write failed: {}", e)))?;

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Copy With Fallback
// ─────────────────────────────────────────────────────────────────────────────

/// How a copy request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The text is on the clipboard
    Copied,
    /// The clipboard was unavailable; show this text to the user instead
    Manual(String),
}

/// Copy a link, falling back to [`CopyOutcome::Manual`] when the clipboard
/// cannot be written.
pub fn copy_link(text: &str) -> CopyOutcome {
    copy_link_with(&mut SystemClipboard, text)
}

/// [`copy_link`] against an explicit clipboard.
pub fn copy_link_with(clipboard: &mut dyn TextClipboard, text: &str) -> CopyOutcome {
    match clipboard.set_text(text) {
        Ok(()) => {
            info!("Share link copied to clipboard");
            CopyOutcome::Copied
        }
        Err(e) => {
            warn!("{}; falling back to manual copy", e);
            CopyOutcome::Manual(text.to_string())
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

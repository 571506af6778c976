//! Clipboard capability backed by the `arboard` crate.
//!
//! [`SystemClipboard`] opens a short-lived `arboard::Clipboard` handle per
//! write rather than holding one, because the handle is not `Send` on all
//! platforms and is cheap to create.

use arboard::Clipboard as ArboardClipboard;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ClipboardError
// ---------------------------------------------------------------------------

/// Errors surfaced by a clipboard write.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// The OS clipboard could not be opened.
    #[error("cannot access clipboard: {0}")]
    Access(String),

    /// Writing text to the clipboard failed.
    #[error("cannot set clipboard text: {0}")]
    Write(String),
}

// ---------------------------------------------------------------------------
// Clipboard trait
// ---------------------------------------------------------------------------

/// Capability provider for one-shot text copies.
pub trait Clipboard {
    /// Replace the clipboard contents with `text`.
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

// ---------------------------------------------------------------------------
// SystemClipboard
// ---------------------------------------------------------------------------

/// Production [`Clipboard`] over the OS clipboard.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            ArboardClipboard::new().map_err(|e| ClipboardError::Access(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_carry_the_underlying_message() {
        let e = ClipboardError::Access("display unavailable".into());
        assert!(e.to_string().contains("display unavailable"));

        let e = ClipboardError::Write("denied".into());
        assert!(e.to_string().contains("denied"));
    }

    #[test]
    fn clipboard_is_object_safe() {
        fn _assert(_: Box<dyn Clipboard>) {}
    }
}

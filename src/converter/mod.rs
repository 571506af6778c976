//! The speech converter component — capture lifecycle, recognition relay,
//! and clipboard feedback in one state machine.
//!
//! [`SpeechConverter`] is deliberately UI-free: the egui shell in
//! [`crate::app`] renders it, test doubles drive it.  All timing flows
//! through explicit `Instant`s handed to [`SpeechConverter::tick`], so the
//! inactivity timeout and the copied-confirmation window are testable
//! without sleeping.

pub mod controller;

pub use controller::SpeechConverter;

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// RecordingState
// ---------------------------------------------------------------------------

/// Whether the microphone session is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
}

// ---------------------------------------------------------------------------
// CanvasLayout / WidgetOptions
// ---------------------------------------------------------------------------

/// Where the waveform is painted relative to the controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CanvasLayout {
    /// Across the whole widget, behind the controls.
    #[default]
    Overlay,
    /// In its own strip between the controls and the transcript box.
    Inline,
}

/// Per-instance behaviour knobs.
///
/// The two historical variants of this widget differed only here: one
/// auto-stopped after 15 s without a recognition result and drew its canvas
/// as an overlay, the other never auto-stopped and drew inline.
#[derive(Debug, Clone)]
pub struct WidgetOptions {
    /// Stop recording when no recognition result arrives for this long.
    /// `None` disables the inactivity timeout entirely.
    pub auto_stop: Option<Duration>,
    pub canvas_layout: CanvasLayout,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            auto_stop: Some(Duration::from_secs(15)),
            canvas_layout: CanvasLayout::Overlay,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        assert_eq!(RecordingState::default(), RecordingState::Idle);
    }

    #[test]
    fn default_options_match_the_timeout_variant() {
        let opts = WidgetOptions::default();
        assert_eq!(opts.auto_stop, Some(Duration::from_secs(15)));
        assert_eq!(opts.canvas_layout, CanvasLayout::Overlay);
    }
}

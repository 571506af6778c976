//! [`SpeechConverter`] — the component core.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──start_recording──▶ Recording ──stop_recording / timeout──▶ Idle
//! ```
//!
//! Starting acquires the microphone stream, builds the analysis window, and
//! opens a recognizer session — one atomic lifecycle.  Stopping tears all of
//! it down; every handle is an `Option` that is `take()`n, so stop is a safe
//! no-op at any time and dropping the converter mid-recording releases the
//! platform resources the same way.
//!
//! # Sessions and stale results
//!
//! Every start bumps a generation counter and passes it to the recognizer;
//! events are tagged with it.  A result that was in flight when the session
//! stopped (or was restarted) carries a stale generation and is discarded on
//! arrival, so a late recognizer can never write into the wrong session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audio::{Analyser, AudioBackend, CaptureConstraints, CaptureSink, CaptureStream};
use crate::clipboard::Clipboard;
use crate::recognize::Recognizer;

use super::{RecordingState, WidgetOptions};

/// How long the copied confirmation stays visible.
pub const COPIED_WINDOW: Duration = Duration::from_millis(2000);

// ---------------------------------------------------------------------------
// SpeechConverter
// ---------------------------------------------------------------------------

/// Speech-to-text widget core: owns the transcript, the recording lifecycle,
/// and the copy confirmation, with every platform capability injected.
pub struct SpeechConverter {
    state: RecordingState,
    transcript: String,
    /// Set on a successful copy; the confirmation shows until it expires.
    copied_at: Option<Instant>,
    /// Inactivity deadline; armed while recording when auto-stop is on.
    deadline: Option<Instant>,
    /// Session generation, bumped on every start.
    generation: u64,

    capture: Option<Box<dyn CaptureStream>>,
    analyser: Option<Arc<Analyser>>,

    backend: Arc<dyn AudioBackend>,
    recognizer: Option<Box<dyn Recognizer>>,
    clipboard: Box<dyn Clipboard>,

    constraints: CaptureConstraints,
    options: WidgetOptions,
}

impl SpeechConverter {
    /// Build a converter from its capability providers.
    ///
    /// `recognizer` is optional: without one, recording and the waveform
    /// work normally but the transcript only changes by typing.
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        recognizer: Option<Box<dyn Recognizer>>,
        clipboard: Box<dyn Clipboard>,
        constraints: CaptureConstraints,
        options: WidgetOptions,
    ) -> Self {
        Self {
            state: RecordingState::Idle,
            transcript: String::new(),
            copied_at: None,
            deadline: None,
            generation: 0,
            capture: None,
            analyser: None,
            backend,
            recognizer,
            clipboard,
            constraints,
            options,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Mutable transcript access for the text editor.  Edits land directly;
    /// the next applied recognition event replaces the whole field (last
    /// writer wins).
    pub fn transcript_mut(&mut self) -> &mut String {
        &mut self.transcript
    }

    /// True inside the confirmation window after a successful copy.
    pub fn copied(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|at| now.duration_since(at) < COPIED_WINDOW)
    }

    pub fn options(&self) -> &WidgetOptions {
        &self.options
    }

    /// Smoothed time-domain bytes for the visualizer, `None` while idle —
    /// the UI clears the waveform area in that case.
    pub fn waveform_bytes(&self) -> Option<Vec<u8>> {
        self.analyser.as_ref().map(|a| a.byte_time_domain())
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Toggle between recording and idle.
    pub fn toggle_recording(&mut self, now: Instant) {
        match self.state {
            RecordingState::Idle => self.start_recording(now),
            RecordingState::Recording => self.stop_recording(),
        }
    }

    /// Acquire the microphone, start the analyser and the recognizer
    /// session, and enter Recording.
    ///
    /// On acquisition failure the error is logged and the converter stays
    /// Idle with nothing constructed — there is no user-facing error
    /// surface.  A start while already recording is a no-op, which keeps
    /// the single-open-stream invariant.
    pub fn start_recording(&mut self, now: Instant) {
        if self.is_recording() {
            return;
        }

        self.generation += 1;
        let analyser = Arc::new(Analyser::new());

        let sink: CaptureSink = {
            let analyser = Arc::clone(&analyser);
            let feed = self.recognizer.as_ref().map(|r| r.audio_feed());
            Arc::new(move |chunk| {
                let mono = crate::audio::downmix(&chunk.samples, chunk.channels);
                analyser.push(&mono);
                if let Some(feed) = &feed {
                    feed.send(chunk);
                }
            })
        };

        match self.backend.open(&self.constraints, sink) {
            Ok(stream) => {
                if let Some(recognizer) = self.recognizer.as_mut() {
                    recognizer.start(self.generation);
                }
                self.capture = Some(stream);
                self.analyser = Some(analyser);
                self.deadline = self.options.auto_stop.map(|d| now + d);
                self.state = RecordingState::Recording;
                log::info!("recording started (session {})", self.generation);
            }
            Err(e) => {
                log::error!("microphone acquisition failed: {e}");
            }
        }
    }

    /// Stop the recognizer session and release every capture resource.
    /// Idempotent — calling it while idle changes nothing.
    pub fn stop_recording(&mut self) {
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.stop();
        }
        if self.capture.take().is_some() {
            log::info!("recording stopped (session {})", self.generation);
        }
        self.analyser.take();
        self.deadline = None;
        self.state = RecordingState::Idle;
    }

    // ── Per-frame tick ───────────────────────────────────────────────────

    /// Drive the converter: relay pending recognition events, fire the
    /// inactivity timeout, expire the copied confirmation.  Called once per
    /// UI frame with the current time.
    pub fn tick(&mut self, now: Instant) {
        let events = match self.recognizer.as_mut() {
            Some(recognizer) => recognizer.poll(),
            None => Vec::new(),
        };

        for event in events {
            // Stale sessions: results that were in flight across a stop or
            // restart are dropped, never applied.
            if !self.is_recording() || event.generation != self.generation {
                log::debug!(
                    "dropping recognition event for session {} (current {})",
                    event.generation,
                    self.generation
                );
                continue;
            }

            // Replacement semantics: the event carries everything heard so
            // far, so it overwrites the field wholesale.
            self.transcript = event.transcript();

            if let Some(auto_stop) = self.options.auto_stop {
                self.deadline = Some(now + auto_stop);
            }
        }

        if self.is_recording() {
            if let Some(deadline) = self.deadline {
                if now >= deadline {
                    log::info!("no recognition results — auto-stopping");
                    self.stop_recording();
                }
            }
        }

        if let Some(at) = self.copied_at {
            if now.duration_since(at) >= COPIED_WINDOW {
                self.copied_at = None;
            }
        }
    }

    // ── Clipboard ────────────────────────────────────────────────────────

    /// Copy the transcript to the clipboard.  Success opens the 2 s
    /// confirmation window; failure is logged and leaves it closed.
    pub fn copy_to_clipboard(&mut self, now: Instant) {
        match self.clipboard.write_text(&self.transcript) {
            Ok(()) => self.copied_at = Some(now),
            Err(e) => log::error!("clipboard write failed: {e}"),
        }
    }
}

impl Drop for SpeechConverter {
    /// Teardown releases the capture resources even mid-recording.
    fn drop(&mut self) {
        self.stop_recording();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

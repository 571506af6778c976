//! Speech recognition — continuous, interim-result sessions.
//!
//! # Model
//!
//! A [`Recognizer`] is a session-oriented capability: `start` begins a
//! listening session, `stop` ends it, and [`Recognizer::poll`] drains the
//! [`RecognitionEvent`]s produced so far, in delivery order.  Every event
//! carries **all** segments recognized since the session started, so a
//! consumer rebuilds its text wholesale from the latest event instead of
//! appending — earlier interim hypotheses are replaced, never merged.
//!
//! Sessions are identified by a caller-supplied generation number.  Events
//! are tagged with it, which lets the consumer discard results that were
//! still in flight when a session was stopped or restarted.
//!
//! The production implementation is [`WhisperRecognizer`]; the capability is
//! optional — a converter built without one still captures and visualizes
//! audio, it just never hears anything.

pub mod whisper;

pub use whisper::{DecodedSegment, Decoder, WhisperDecoder, WhisperRecognizer};

use crate::audio::AudioChunk;
use thiserror::Error;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Segment / RecognitionEvent
// ---------------------------------------------------------------------------

/// One recognized stretch of speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Top hypothesis text for this stretch.
    pub text: String,
    /// Finalized segments no longer change in later events; the trailing
    /// interim hypothesis may still be revised.
    pub is_final: bool,
}

/// An ordered snapshot of everything recognized in the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionEvent {
    /// Session generation this event belongs to.
    pub generation: u64,
    /// All segments so far, oldest first.
    pub segments: Vec<Segment>,
}

impl RecognitionEvent {
    /// Concatenation of the top hypothesis of every segment, in order —
    /// the full replacement text for the transcript field.
    pub fn transcript(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// AudioFeed
// ---------------------------------------------------------------------------

/// Clonable, thread-safe handle for pushing captured audio into a
/// recognizer.  Sends never block; audio delivered outside an active
/// session is discarded by the receiver.
#[derive(Debug, Clone)]
pub struct AudioFeed {
    tx: mpsc::UnboundedSender<AudioChunk>,
}

impl AudioFeed {
    pub fn new(tx: mpsc::UnboundedSender<AudioChunk>) -> Self {
        Self { tx }
    }

    /// Forward a chunk.  A closed receiver (recognizer dropped) is ignored —
    /// the capture callback must never fail.
    pub fn send(&self, chunk: AudioChunk) {
        let _ = self.tx.send(chunk);
    }
}

// ---------------------------------------------------------------------------
// Recognizer trait
// ---------------------------------------------------------------------------

/// Session-oriented speech recognition capability.
///
/// Semantics are continuous (listening spans pauses) with interim results
/// (events arrive before speech is finalized).
pub trait Recognizer: Send {
    /// Begin a session identified by `generation`.
    ///
    /// Any events still queued from an earlier session are flushed so the
    /// first `poll` of the new session can only observe its own results.
    fn start(&mut self, generation: u64);

    /// End the current session.  Idempotent; safe to call while idle.
    fn stop(&mut self);

    /// Handle the capture side uses to deliver raw audio.
    fn audio_feed(&self) -> AudioFeed;

    /// Drain pending events in delivery order.  Never blocks.
    fn poll(&mut self) -> Vec<RecognitionEvent>;
}

// ---------------------------------------------------------------------------
// RecognizeError
// ---------------------------------------------------------------------------

/// Errors from building or running a recognizer.
#[derive(Debug, Clone, Error)]
pub enum RecognizeError {
    /// The model file was not found at the given path.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The inference engine failed to initialize.
    #[error("engine initialisation failed: {0}")]
    EngineInit(String),

    /// A decode pass failed.
    #[error("decode error: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, is_final: bool) -> Segment {
        Segment {
            text: text.into(),
            is_final,
        }
    }

    #[test]
    fn transcript_concatenates_segments_in_order() {
        let ev = RecognitionEvent {
            generation: 1,
            segments: vec![seg("Hello ", true), seg("world", false)],
        };
        assert_eq!(ev.transcript(), "Hello world");
    }

    #[test]
    fn transcript_of_empty_event_is_empty() {
        let ev = RecognitionEvent {
            generation: 1,
            segments: Vec::new(),
        };
        assert_eq!(ev.transcript(), "");
    }

    #[test]
    fn audio_feed_survives_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let feed = AudioFeed::new(tx);
        drop(rx);
        // Must not panic
        feed.send(AudioChunk {
            samples: vec![0.0; 16],
            sample_rate: 16_000,
            channels: 1,
        });
    }

    #[test]
    fn recognizer_is_object_safe() {
        fn _assert(_: Box<dyn Recognizer>) {}
    }
}

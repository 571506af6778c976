//! Audio pipeline — capture, analysis window, waveform geometry, resampling.
//!
//! ```text
//! Microphone → AudioBackend (cpal) → CaptureSink ─┬─▶ Analyser → waveform::path → UI stroke
//!                                                 └─▶ downmix → resample_to_16k → recognizer
//! ```
//!
//! The capture side is a trait boundary ([`AudioBackend`]) so the recording
//! lifecycle can be tested without a microphone; everything else here is
//! plain data transformation.

pub mod analyser;
pub mod capture;
pub mod resample;
pub mod waveform;

pub use analyser::Analyser;
pub use capture::{
    AudioBackend, AudioChunk, CaptureConstraints, CaptureError, CaptureSink, CaptureStream,
    CpalBackend,
};
pub use resample::{downmix, resample_to_16k, RECOGNIZER_RATE};

//! SpeakPad — a floating speech-to-text scratch pad.
//!
//! One always-on-top widget with three affordances: a microphone toggle, a
//! live waveform of the input signal, and an editable transcript box with
//! copy-to-clipboard.
//!
//! # Architecture
//!
//! ```text
//! Microphone → AudioBackend (cpal) → CaptureSink ─┬─▶ Analyser → waveform path → egui painter
//!                                                 └─▶ Recognizer (whisper worker)
//!                                                         └─▶ RecognitionEvent → transcript
//! ```
//!
//! [`converter::SpeechConverter`] owns the whole recording lifecycle and is
//! driven once per frame by the egui shell in [`app`].  Every platform
//! capability it touches — microphone, recognizer, clipboard — sits behind a
//! trait so the core can be exercised with test doubles.

pub mod app;
pub mod audio;
pub mod clipboard;
pub mod config;
pub mod converter;
pub mod recognize;

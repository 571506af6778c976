//! Microphone acquisition behind the [`AudioBackend`] trait.
//!
//! The converter never talks to `cpal` directly.  It asks an injected
//! [`AudioBackend`] to open a stream for a set of [`CaptureConstraints`] and
//! gets back a boxed [`CaptureStream`] — a RAII guard whose drop stops every
//! hardware track.  While the stream lives, the backend invokes the supplied
//! [`CaptureSink`] with raw [`AudioChunk`]s from the audio thread.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// A single buffer of raw audio as delivered by the capture callback.
///
/// Samples are interleaved `f32` in `[-1.0, 1.0]` at the device's native
/// rate.  Downstream consumers use [`crate::audio::downmix`] and
/// [`crate::audio::resample_to_16k`] as needed.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Interleaved PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate of this chunk in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

// ---------------------------------------------------------------------------
// CaptureConstraints
// ---------------------------------------------------------------------------

/// Input-processing constraints requested when opening a stream.
///
/// These mirror the knobs a voice-capture source is expected to offer.
/// Backends that cannot reach the platform's processing chain treat them as
/// advisory and log what was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureSink / CaptureStream / AudioBackend
// ---------------------------------------------------------------------------

/// Callback invoked on the audio thread for every captured buffer.
///
/// Implementations must be cheap and non-blocking: push into a channel or a
/// briefly-locked window, nothing more.
pub type CaptureSink = Arc<dyn Fn(AudioChunk) + Send + Sync>;

/// RAII guard for an open capture stream.
///
/// Dropping the guard stops the underlying hardware stream; there is no
/// explicit close method.  Not `Send` — the platform stream types it wraps
/// are main-thread-bound on some OSes, and the converter only ever holds it
/// on the UI thread.
pub trait CaptureStream {}

/// Capability provider for microphone access.
///
/// `open` either yields a live stream feeding `sink` or a [`CaptureError`];
/// there is no partially-open state.  The converter guarantees at most one
/// stream per component instance.
pub trait AudioBackend: Send + Sync {
    fn open(
        &self,
        constraints: &CaptureConstraints,
        sink: CaptureSink,
    ) -> Result<Box<dyn CaptureStream>, CaptureError>;
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while acquiring the microphone.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// CpalBackend
// ---------------------------------------------------------------------------

/// Production [`AudioBackend`] on top of `cpal`.
///
/// The device is resolved on every `open` so a session started after the
/// user plugs in a headset picks it up.  cpal exposes no echo-cancellation /
/// noise-suppression / AGC toggles, so the constraints are advisory here.
#[derive(Debug, Default)]
pub struct CpalBackend;

struct CpalStream {
    _stream: cpal::Stream,
}

impl CaptureStream for CpalStream {}

impl AudioBackend for CpalBackend {
    fn open(
        &self,
        constraints: &CaptureConstraints,
        sink: CaptureSink,
    ) -> Result<Box<dyn CaptureStream>, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;

        let supported = device.default_input_config()?;
        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        log::debug!(
            "opening input stream ({sample_rate} Hz, {channels} ch); requested constraints \
             (advisory on this backend): {constraints:?}"
        );

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                sink(AudioChunk {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                });
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;
        Ok(Box::new(CpalStream { _stream: stream }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// `AudioChunk` must be `Send` so it can cross into the recognizer worker.
    #[test]
    fn audio_chunk_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<AudioChunk>();
    }

    #[test]
    fn default_constraints_enable_all_processing() {
        let c = CaptureConstraints::default();
        assert!(c.echo_cancellation);
        assert!(c.noise_suppression);
        assert!(c.auto_gain_control);
    }

    /// A sink is plain `Arc<dyn Fn>` — callable from any thread, clonable.
    #[test]
    fn sink_is_callable_and_clonable() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sink: CaptureSink = Arc::new(move |_chunk| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let sink2 = Arc::clone(&sink);
        sink(AudioChunk {
            samples: vec![0.0; 64],
            sample_rate: 48_000,
            channels: 1,
        });
        sink2(AudioChunk {
            samples: vec![0.0; 64],
            sample_rate: 48_000,
            channels: 1,
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

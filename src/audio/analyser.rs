//! Time-domain analysis node for the waveform visualization.
//!
//! [`Analyser`] sits between the capture callback and the UI.  The audio
//! thread pushes mono samples into a fixed-size ring window; the UI reads a
//! smoothed byte snapshot once per frame via [`Analyser::byte_time_domain`].
//!
//! The window holds the most recent [`WINDOW_SIZE`] samples.  On every read,
//! each bucket is blended with the previous read (`s' = k·s + (1−k)·x`,
//! `k =` [`SMOOTHING`]) so the rendered trace settles instead of flickering,
//! then mapped to bytes centered at 128 the way the renderer expects.

use std::sync::Mutex;

/// Number of samples exposed per read.
pub const WINDOW_SIZE: usize = 2048;

/// Exponential smoothing constant applied per bucket on read.
pub const SMOOTHING: f32 = 0.8;

// ---------------------------------------------------------------------------
// Analyser
// ---------------------------------------------------------------------------

/// Shared sample window.  Created per recording session and dropped with it;
/// the capture callback holds one `Arc` clone, the converter the other.
pub struct Analyser {
    inner: Mutex<Inner>,
}

struct Inner {
    /// Most recent samples, oldest first, at most `window_size` long.
    window: Vec<f32>,
    /// Smoothed value per bucket carried across reads.
    smoothed: Vec<f32>,
    window_size: usize,
    smoothing: f32,
}

impl Analyser {
    /// Analyser with the standard window and smoothing.
    pub fn new() -> Self {
        Self::with_config(WINDOW_SIZE, SMOOTHING)
    }

    /// Analyser with an explicit window size and smoothing constant.
    ///
    /// `smoothing` is clamped to `[0.0, 1.0)`; `1.0` would freeze the trace.
    pub fn with_config(window_size: usize, smoothing: f32) -> Self {
        let window_size = window_size.max(1);
        Self {
            inner: Mutex::new(Inner {
                window: Vec::with_capacity(window_size),
                smoothed: vec![0.0; window_size],
                window_size,
                smoothing: smoothing.clamp(0.0, 0.999),
            }),
        }
    }

    /// Append mono samples from the capture callback.
    ///
    /// Keeps only the newest `window_size` samples.  The lock is held just
    /// long enough to splice the slice in, so this is safe to call from the
    /// audio thread.
    pub fn push(&self, samples: &[f32]) {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let cap = inner.window_size;
        if samples.len() >= cap {
            inner.window.clear();
            inner.window.extend_from_slice(&samples[samples.len() - cap..]);
        } else {
            let overflow = (inner.window.len() + samples.len()).saturating_sub(cap);
            inner.window.drain(..overflow);
            inner.window.extend_from_slice(samples);
        }
    }

    /// Smoothed byte snapshot of the current window.
    ///
    /// Always returns exactly `window_size` bytes; a window that has not
    /// filled yet is padded with leading silence.  A byte of 128 is the zero
    /// line, 0/255 are full negative/positive swing.
    pub fn byte_time_domain(&self) -> Vec<u8> {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let size = inner.window_size;
        let k = inner.smoothing;
        let pad = size - inner.window.len();

        let mut out = Vec::with_capacity(size);
        for i in 0..size {
            let current = if i < pad { 0.0 } else { inner.window[i - pad] };
            let blended = k * inner.smoothed[i] + (1.0 - k) * current;
            inner.smoothed[i] = blended;
            out.push(sample_to_byte(blended));
        }
        out
    }
}

impl Default for Analyser {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a `[-1.0, 1.0]` sample to an unsigned byte centered at 128.
fn sample_to_byte(sample: f32) -> u8 {
    (sample * 128.0 + 128.0).round().clamp(0.0, 255.0) as u8
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

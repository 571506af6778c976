//! Channel downmix and resampling for the recognizer feed.
//!
//! The whisper decoder wants **16 kHz mono `f32`**; capture delivers
//! whatever the device natively produces.  The recognizer worker runs every
//! chunk through [`downmix`] then [`resample_to_16k`] before accumulating.
//! Linear interpolation is plenty for speech at these rates.

/// Recognizer input sample rate in Hz.
pub const RECOGNIZER_RATE: u32 = 16_000;

// ---------------------------------------------------------------------------
// downmix
// ---------------------------------------------------------------------------

/// Average interleaved multi-channel audio down to mono.
///
/// Output length is `samples.len() / channels`; a trailing partial frame is
/// dropped.  Mono input is returned as-is (owned), zero channels yields an
/// empty vector.
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = usize::from(n);
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample_to_16k
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `source_rate` Hz to 16 kHz by linear
/// interpolation.
///
/// Already-16 kHz input is cloned unchanged.  Output length is
/// `ceil(len · 16000 / source_rate)`.
pub fn resample_to_16k(samples: &[f32], source_rate: u32) -> Vec<f32> {
    if source_rate == RECOGNIZER_RATE {
        return samples.to_vec();
    }
    if samples.is_empty() || source_rate == 0 {
        return Vec::new();
    }

    let ratio = f64::from(RECOGNIZER_RATE) / f64::from(source_rate);
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let src_pos = i as f64 / ratio;
            let idx = src_pos as usize;
            let frac = (src_pos - idx as f64) as f32;

            match (samples.get(idx), samples.get(idx + 1)) {
                (Some(&a), Some(&b)) => a * (1.0 - frac) + b * frac,
                (Some(&a), None) => a,
                _ => 0.0,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

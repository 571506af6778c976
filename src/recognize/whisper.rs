//! Whisper-backed continuous recognizer.
//!
//! # How interim results come out of a batch decoder
//!
//! whisper has no native streaming callback, so the session is re-decoded on
//! a timer: a worker task accumulates 16 kHz mono audio and every interval
//! runs the decoder over the current session window, emitting one
//! [`RecognitionEvent`] carrying *all* segments so far.  Early passes over a
//! short window yield a coarse hypothesis that later passes refine — which
//! is exactly the interim-then-replace contract consumers expect.
//!
//! Long sessions stay bounded: once the window passes [`COMMIT_AFTER`]
//! samples, all but the trailing segment are committed as final, their text
//! is pinned, and the underlying audio is dropped.
//!
//! ```text
//! AudioFeed ─▶ downmix → resample_to_16k → SessionWindow
//!                                              │ every interim interval
//!                                              ▼
//!                                   spawn_blocking(decoder.decode)
//!                                              │
//!                           committed ++ fresh hypotheses → event channel
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::{downmix, resample_to_16k, AudioChunk};

use super::{AudioFeed, RecognitionEvent, RecognizeError, Recognizer, Segment};

/// Minimum window before the first decode pass (0.5 s at 16 kHz) — shorter
/// windows decode to garbage.
const MIN_DECODE_SAMPLES: usize = 8_000;

/// Minimum fresh audio between decode passes (0.2 s).  Skips ticks where
/// nothing new arrived, e.g. while a previous pass is still catching up.
const MIN_FRESH_SAMPLES: usize = 3_200;

/// Window length past which completed segments are committed and their
/// audio dropped (25 s at 16 kHz).
const COMMIT_AFTER: usize = 25 * 16_000;

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// One decoded stretch of the session window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSegment {
    pub text: String,
    /// End of the stretch in milliseconds, relative to the decoded window.
    pub end_ms: u64,
}

/// Batch speech decoder: 16 kHz mono in, ordered segments out.
///
/// `Send + Sync` so one instance can be shared with the blocking pool.
pub trait Decoder: Send + Sync {
    fn decode(&self, audio: &[f32]) -> Result<Vec<DecodedSegment>, RecognizeError>;
}

// ---------------------------------------------------------------------------
// WhisperDecoder
// ---------------------------------------------------------------------------

/// Production [`Decoder`] wrapping a `whisper_rs::WhisperContext`.
///
/// A fresh `WhisperState` is created per decode pass, so no locking is
/// needed to share the decoder across passes.
pub struct WhisperDecoder {
    ctx: WhisperContext,
    language: String,
}

impl std::fmt::Debug for WhisperDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperDecoder")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

// `WhisperContext` holds a raw pointer internally but declares
// `unsafe impl Send`/`Sync` in whisper-rs — the model weights are read-only
// after loading, and per-pass mutable state lives in `WhisperState`.
// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs.
unsafe impl Send for WhisperDecoder {}
unsafe impl Sync for WhisperDecoder {}

impl WhisperDecoder {
    /// Load a GGML model from `model_path`.
    ///
    /// `language` is an ISO-639-1 code, or `"auto"` for built-in detection.
    ///
    /// # Errors
    ///
    /// - [`RecognizeError::ModelNotFound`] — no file at `model_path`.
    /// - [`RecognizeError::EngineInit`] — whisper-rs rejected the file.
    pub fn load(
        model_path: impl AsRef<std::path::Path>,
        language: impl Into<String>,
    ) -> Result<Self, RecognizeError> {
        let path = model_path.as_ref();

        if !path.exists() {
            return Err(RecognizeError::ModelNotFound(path.display().to_string()));
        }

        let path_str = path.to_str().ok_or_else(|| {
            RecognizeError::ModelNotFound(format!(
                "model path contains non-UTF-8 characters: {}",
                path.display()
            ))
        })?;

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| RecognizeError::EngineInit(e.to_string()))?;

        Ok(Self {
            ctx,
            language: language.into(),
        })
    }
}

impl Decoder for WhisperDecoder {
    fn decode(&self, audio: &[f32]) -> Result<Vec<DecodedSegment>, RecognizeError> {
        if audio.len() < MIN_DECODE_SAMPLES {
            return Ok(Vec::new());
        }

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        let lang: Option<&str> = if self.language == "auto" {
            None
        } else {
            Some(self.language.as_str())
        };
        params.set_language(lang);
        params.set_n_threads(decode_threads());
        params.set_print_progress(false);
        params.set_print_realtime(false);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| RecognizeError::EngineInit(e.to_string()))?;

        state
            .full(params, audio)
            .map_err(|e| RecognizeError::Decode(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| RecognizeError::Decode(e.to_string()))?;

        let mut segments = Vec::with_capacity(n_segments as usize);
        for i in 0..n_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| RecognizeError::Decode(format!("segment {i}: {e}")))?;
            // Timestamps are centiseconds → ×10 for milliseconds.
            let end_ms = state.full_get_segment_t1(i).unwrap_or(0).max(0) as u64 * 10;
            segments.push(DecodedSegment { text, end_ms });
        }

        Ok(segments)
    }
}

/// Thread count for a decode pass: physical parallelism, capped at 8.
fn decode_threads() -> std::ffi::c_int {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8))
        .unwrap_or(4) as std::ffi::c_int
}

// ---------------------------------------------------------------------------
// SessionWindow — per-session accumulation and commit logic
// ---------------------------------------------------------------------------

/// Owns the audio window and segment state for one recognition session.
///
/// Pure bookkeeping, no I/O — the worker drives it and the tests exercise
/// it directly.
struct SessionWindow {
    generation: u64,
    active: bool,
    /// Segments whose text is pinned and whose audio has been dropped.
    committed: Vec<Segment>,
    /// 16 kHz mono samples not yet committed.
    buffer: Vec<f32>,
    /// Samples appended since the last snapshot.
    fresh: usize,
    /// Transcript of the last emitted event; identical re-decodes (silence,
    /// unchanged hypotheses) emit nothing, so an idle speaker stops
    /// producing events.
    last_transcript: String,
}

impl SessionWindow {
    fn new() -> Self {
        Self {
            generation: 0,
            active: false,
            committed: Vec::new(),
            buffer: Vec::new(),
            fresh: 0,
            last_transcript: String::new(),
        }
    }

    fn begin(&mut self, generation: u64) {
        self.generation = generation;
        self.active = true;
        self.committed.clear();
        self.buffer.clear();
        self.fresh = 0;
        self.last_transcript.clear();
    }

    fn end(&mut self) {
        self.active = false;
        self.buffer.clear();
        self.fresh = 0;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn push(&mut self, samples: &[f32]) {
        if !self.active {
            return;
        }
        self.buffer.extend_from_slice(samples);
        self.fresh += samples.len();
    }

    /// Enough audio for a (new) decode pass?
    fn ready(&self) -> bool {
        self.active && self.buffer.len() >= MIN_DECODE_SAMPLES && self.fresh >= MIN_FRESH_SAMPLES
    }

    /// Take a decode input: the session generation plus a copy of the
    /// uncommitted window.  Resets the fresh-sample counter.
    fn snapshot(&mut self) -> (u64, Vec<f32>) {
        self.fresh = 0;
        (self.generation, self.buffer.clone())
    }

    /// Fold a decode result back in and build the event to emit, if any.
    ///
    /// Results from a different generation (the session was restarted while
    /// the pass was in flight) or from an ended session are discarded.
    fn apply(
        &mut self,
        generation: u64,
        decoded: Vec<DecodedSegment>,
    ) -> Option<RecognitionEvent> {
        if !self.active || generation != self.generation {
            return None;
        }

        let mut segments = self.committed.clone();
        segments.extend(decoded.iter().map(|d| Segment {
            text: d.text.clone(),
            is_final: false,
        }));
        let event = RecognitionEvent {
            generation,
            segments,
        };

        // Bound the window: pin everything but the trailing hypothesis and
        // drop the audio underneath it.
        if self.buffer.len() > COMMIT_AFTER && decoded.len() > 1 {
            let cut_ms = decoded[decoded.len() - 2].end_ms;
            let cut_samples = (cut_ms as usize * 16).min(self.buffer.len());
            for d in &decoded[..decoded.len() - 1] {
                self.committed.push(Segment {
                    text: d.text.clone(),
                    is_final: true,
                });
            }
            self.buffer.drain(..cut_samples);
            self.fresh = self.fresh.min(self.buffer.len());
        }

        let transcript = event.transcript();
        if transcript == self.last_transcript {
            return None;
        }
        self.last_transcript = transcript;
        Some(event)
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

enum Command {
    Start(u64),
    Stop,
}

async fn run_worker(
    decoder: Arc<dyn Decoder>,
    interval: Duration,
    mut ctrl_rx: mpsc::UnboundedReceiver<Command>,
    mut feed_rx: mpsc::UnboundedReceiver<AudioChunk>,
    event_tx: mpsc::UnboundedSender<RecognitionEvent>,
) {
    let mut window = SessionWindow::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            cmd = ctrl_rx.recv() => match cmd {
                Some(Command::Start(generation)) => window.begin(generation),
                Some(Command::Stop) => window.end(),
                None => break,
            },
            chunk = feed_rx.recv() => match chunk {
                Some(chunk) => {
                    if window.is_active() {
                        let mono = downmix(&chunk.samples, chunk.channels);
                        window.push(&resample_to_16k(&mono, chunk.sample_rate));
                    }
                }
                None => break,
            },
            _ = ticker.tick() => {
                if !window.ready() {
                    continue;
                }
                let (generation, audio) = window.snapshot();
                let decoder = Arc::clone(&decoder);
                match tokio::task::spawn_blocking(move || decoder.decode(&audio)).await {
                    Ok(Ok(decoded)) => {
                        if let Some(event) = window.apply(generation, decoded) {
                            if event_tx.send(event).is_err() {
                                break;
                            }
                        }
                    }
                    Ok(Err(e)) => log::warn!("decode pass failed: {e}"),
                    Err(e) => log::warn!("decode task failed: {e}"),
                }
            }
        }
    }

    log::debug!("recognizer worker exiting");
}

// ---------------------------------------------------------------------------
// WhisperRecognizer
// ---------------------------------------------------------------------------

/// [`Recognizer`] running a [`Decoder`] on a background worker task.
///
/// Dropping the recognizer closes both channels, which ends the worker.
pub struct WhisperRecognizer {
    ctrl_tx: mpsc::UnboundedSender<Command>,
    feed_tx: mpsc::UnboundedSender<AudioChunk>,
    event_rx: mpsc::UnboundedReceiver<RecognitionEvent>,
    _worker: tokio::task::JoinHandle<()>,
}

impl WhisperRecognizer {
    /// Spawn the worker onto `runtime` with the given interim re-decode
    /// interval.
    pub fn spawn(
        decoder: Arc<dyn Decoder>,
        runtime: &tokio::runtime::Handle,
        interim_interval: Duration,
    ) -> Self {
        let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();
        let (feed_tx, feed_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let worker = runtime.spawn(run_worker(
            decoder,
            interim_interval,
            ctrl_rx,
            feed_rx,
            event_tx,
        ));

        Self {
            ctrl_tx,
            feed_tx,
            event_rx,
            _worker: worker,
        }
    }
}

impl Recognizer for WhisperRecognizer {
    fn start(&mut self, generation: u64) {
        // Flush events still queued from a previous session before the new
        // one can be observed.
        while self.event_rx.try_recv().is_ok() {}
        let _ = self.ctrl_tx.send(Command::Start(generation));
    }

    fn stop(&mut self) {
        let _ = self.ctrl_tx.send(Command::Stop);
    }

    fn audio_feed(&self) -> AudioFeed {
        AudioFeed::new(self.feed_tx.clone())
    }

    fn poll(&mut self) -> Vec<RecognitionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(text: &str, end_ms: u64) -> DecodedSegment {
        DecodedSegment {
            text: text.into(),
            end_ms,
        }
    }

    // ---- SessionWindow ----

    #[test]
    fn window_ignores_audio_before_begin() {
        let mut w = SessionWindow::new();
        w.push(&[0.0; 1_000]);
        assert!(!w.ready());
        w.begin(1);
        assert!(w.buffer.is_empty());
    }

    #[test]
    fn window_not_ready_until_minimums_met() {
        let mut w = SessionWindow::new();
        w.begin(1);
        w.push(&vec![0.0; MIN_DECODE_SAMPLES - 1]);
        assert!(!w.ready());
        w.push(&[0.0; 1]);
        assert!(w.ready());

        // After a snapshot, fresh audio is required again.
        let _ = w.snapshot();
        assert!(!w.ready());
        w.push(&vec![0.0; MIN_FRESH_SAMPLES]);
        assert!(w.ready());
    }

    #[test]
    fn apply_builds_event_from_all_segments_in_order() {
        let mut w = SessionWindow::new();
        w.begin(3);
        w.push(&vec![0.0; MIN_DECODE_SAMPLES]);
        let (generation, _) = w.snapshot();

        let ev = w
            .apply(generation, vec![decoded("Hello ", 500), decoded("world", 900)])
            .expect("event");
        assert_eq!(ev.generation, 3);
        assert_eq!(ev.transcript(), "Hello world");
        assert!(ev.segments.iter().all(|s| !s.is_final));
    }

    #[test]
    fn apply_discards_stale_generation() {
        let mut w = SessionWindow::new();
        w.begin(1);
        w.push(&vec![0.0; MIN_DECODE_SAMPLES]);
        let (old_generation, _) = w.snapshot();

        // Session restarted while the pass was in flight.
        w.begin(2);
        assert!(w.apply(old_generation, vec![decoded("late", 100)]).is_none());
    }

    #[test]
    fn apply_discards_results_after_end() {
        let mut w = SessionWindow::new();
        w.begin(1);
        w.push(&vec![0.0; MIN_DECODE_SAMPLES]);
        let (generation, _) = w.snapshot();
        w.end();
        assert!(w.apply(generation, vec![decoded("late", 100)]).is_none());
    }

    #[test]
    fn unchanged_transcript_emits_nothing() {
        let mut w = SessionWindow::new();
        w.begin(1);
        w.push(&vec![0.0; MIN_DECODE_SAMPLES]);
        let (generation, _) = w.snapshot();

        assert!(w.apply(generation, vec![decoded("same", 400)]).is_some());
        // Identical re-decode, e.g. the speaker went quiet.
        assert!(w.apply(generation, vec![decoded("same", 400)]).is_none());
        // A revision comes through again.
        assert!(w.apply(generation, vec![decoded("same but longer", 800)]).is_some());
    }

    #[test]
    fn long_window_commits_leading_segments_and_drops_audio() {
        let mut w = SessionWindow::new();
        w.begin(1);
        w.push(&vec![0.0; COMMIT_AFTER + 16_000]);
        let (generation, _) = w.snapshot();
        let before = w.buffer.len();

        let ev = w
            .apply(
                generation,
                vec![decoded("first. ", 10_000), decoded("second", 25_500)],
            )
            .expect("event");
        assert_eq!(ev.transcript(), "first. second");

        // "first. " is now pinned, its 10 s of audio gone.
        assert_eq!(w.committed.len(), 1);
        assert!(w.committed[0].is_final);
        assert_eq!(w.buffer.len(), before - 10_000 * 16);

        // The next event carries the committed prefix plus new hypotheses.
        w.push(&vec![0.0; MIN_FRESH_SAMPLES]);
        let (generation, _) = w.snapshot();
        let ev = w
            .apply(generation, vec![decoded("second thoughts", 16_000)])
            .expect("event");
        assert_eq!(ev.transcript(), "first. second thoughts");
        assert!(ev.segments[0].is_final);
        assert!(!ev.segments[1].is_final);
    }

    #[test]
    fn begin_resets_previous_session_state() {
        let mut w = SessionWindow::new();
        w.begin(1);
        w.push(&vec![0.0; MIN_DECODE_SAMPLES]);
        let (generation, _) = w.snapshot();
        let _ = w.apply(generation, vec![decoded("old session", 400)]);

        w.begin(2);
        assert!(w.buffer.is_empty());
        assert!(w.committed.is_empty());

        // The same transcript is re-emitted in a fresh session.
        w.push(&vec![0.0; MIN_DECODE_SAMPLES]);
        let (generation, _) = w.snapshot();
        assert!(w.apply(generation, vec![decoded("old session", 400)]).is_some());
    }

    // ---- Worker plumbing with a stub decoder ----

    struct StubDecoder;

    impl Decoder for StubDecoder {
        fn decode(&self, audio: &[f32]) -> Result<Vec<DecodedSegment>, RecognizeError> {
            Ok(vec![DecodedSegment {
                text: format!("{} samples", audio.len()),
                end_ms: (audio.len() / 16) as u64,
            }])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn worker_emits_tagged_events_for_fed_audio() {
        let mut rec = WhisperRecognizer::spawn(
            Arc::new(StubDecoder),
            &tokio::runtime::Handle::current(),
            Duration::from_millis(100),
        );

        rec.start(7);
        rec.audio_feed().send(AudioChunk {
            samples: vec![0.01; 16_000],
            sample_rate: 16_000,
            channels: 1,
        });

        let mut events = Vec::new();
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            events.extend(rec.poll());
            if !events.is_empty() {
                break;
            }
        }

        assert!(!events.is_empty(), "worker never emitted an event");
        assert_eq!(events[0].generation, 7);
        assert_eq!(events[0].transcript(), "16000 samples");
    }

    #[tokio::test(start_paused = true)]
    async fn start_flushes_stale_events_from_previous_session() {
        let mut rec = WhisperRecognizer::spawn(
            Arc::new(StubDecoder),
            &tokio::runtime::Handle::current(),
            Duration::from_millis(100),
        );

        rec.start(1);
        rec.audio_feed().send(AudioChunk {
            samples: vec![0.01; 16_000],
            sample_rate: 16_000,
            channels: 1,
        });
        // Let an event land in the queue, but do not poll it.
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        rec.stop();

        rec.start(2);
        // Whatever is pollable now must not be from generation 1.
        assert!(rec.poll().iter().all(|e| e.generation == 2));
    }
}

//! Application entry point — SpeakPad.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers) for the
//!    recognition worker.
//! 4. Build the recognizer — degrades to `None` when the model is missing,
//!    leaving capture and the waveform fully functional.
//! 5. Assemble the [`SpeechConverter`] from its providers.
//! 6. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use speakpad::{
    app::SpeakPadApp,
    audio::CpalBackend,
    clipboard::SystemClipboard,
    config::{AppConfig, AppPaths},
    converter::SpeechConverter,
    recognize::{Recognizer, WhisperDecoder, WhisperRecognizer},
};

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([380.0, 300.0])
        .with_min_inner_size([300.0, 200.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("SpeakPad starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime for the recognition worker
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Recognizer — optional capability; everything else works without it
    let recognizer: Option<Box<dyn Recognizer>> = if config.recognizer.enabled {
        let model_path = AppPaths::new()
            .models_dir
            .join(format!("{}.bin", config.recognizer.model));

        match WhisperDecoder::load(&model_path, config.recognizer.language.clone()) {
            Ok(decoder) => {
                log::info!("whisper model loaded: {}", model_path.display());
                Some(Box::new(WhisperRecognizer::spawn(
                    Arc::new(decoder),
                    rt.handle(),
                    Duration::from_millis(config.recognizer.interim_interval_ms),
                )))
            }
            Err(e) => {
                log::warn!(
                    "could not load whisper model ({}): {e}; voice transcription is off, \
                     recording and the waveform still work",
                    model_path.display()
                );
                None
            }
        }
    } else {
        log::info!("recognizer disabled in settings");
        None
    };

    // 5. Converter assembly
    let converter = SpeechConverter::new(
        Arc::new(CpalBackend),
        recognizer,
        Box::new(SystemClipboard),
        config.capture,
        config.widget.options(),
    );

    // 6. Run the widget (blocks until the window closes)
    let app = SpeakPadApp::new(converter, config.clone());
    let options = native_options(&config);

    eframe::run_native("SpeakPad", options, Box::new(move |_cc| Ok(Box::new(app))))
}

//! Settings structs, defaults, and TOML persistence.
//!
//! Everything here round-trips through `settings.toml`; missing files load
//! as defaults so first runs need no setup step.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::audio::CaptureConstraints;
use crate::converter::{CanvasLayout, WidgetOptions};

use super::AppPaths;

// ---------------------------------------------------------------------------
// WidgetConfig
// ---------------------------------------------------------------------------

/// Behaviour of the converter widget itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Auto-stop recording after this many seconds without a recognition
    /// result.  `None` disables the inactivity timeout.
    pub auto_stop_secs: Option<u64>,
    /// Waveform placement: across the widget or in its own strip.
    pub canvas_layout: CanvasLayout,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            auto_stop_secs: Some(15),
            canvas_layout: CanvasLayout::Overlay,
        }
    }
}

impl WidgetConfig {
    /// Runtime options for [`crate::converter::SpeechConverter`].
    pub fn options(&self) -> WidgetOptions {
        WidgetOptions {
            auto_stop: self.auto_stop_secs.map(Duration::from_secs),
            canvas_layout: self.canvas_layout,
        }
    }
}

// ---------------------------------------------------------------------------
// RecognizerConfig
// ---------------------------------------------------------------------------

/// Settings for the whisper recognizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Master switch; `false` skips loading the model entirely.
    pub enabled: bool,
    /// GGML model file stem under the models dir (e.g. `"ggml-base.en"`).
    pub model: String,
    /// Speech language as an ISO-639-1 code, or `"auto"`.
    pub language: String,
    /// Interim re-decode interval in milliseconds.
    pub interim_interval_ms: u64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "ggml-base.en".into(),
            language: "en".into(),
            interim_interval_ms: 1_200,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window appearance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Keep the widget floating above other windows.
    pub always_on_top: bool,
    /// Last saved window position `(x, y)`; `None` lets the window manager
    /// pick one on first launch.
    pub window_position: Option<(f32, f32)>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            always_on_top: true,
            window_position: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialized as `settings.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Widget behaviour (auto-stop, canvas layout).
    pub widget: WidgetConfig,
    /// Capture constraints passed to the audio backend.
    pub capture: CaptureConstraints,
    /// Whisper recognizer settings.
    pub recognizer: RecognizerConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load from the platform `settings.toml`; a missing file yields
    /// defaults so callers never special-case first runs.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save to the platform `settings.toml`, creating parent directories.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_the_documented_contract() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.widget.auto_stop_secs, Some(15));
        assert_eq!(cfg.widget.canvas_layout, CanvasLayout::Overlay);
        assert!(cfg.capture.echo_cancellation);
        assert!(cfg.capture.noise_suppression);
        assert!(cfg.capture.auto_gain_control);
        assert!(cfg.recognizer.enabled);
        assert_eq!(cfg.recognizer.model, "ggml-base.en");
        assert_eq!(cfg.recognizer.interim_interval_ms, 1_200);
        assert!(cfg.ui.always_on_top);
        assert!(cfg.ui.window_position.is_none());
    }

    #[test]
    fn round_trip_preserves_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.widget.auto_stop_secs, loaded.widget.auto_stop_secs);
        assert_eq!(original.widget.canvas_layout, loaded.widget.canvas_layout);
        assert_eq!(original.capture, loaded.capture);
        assert_eq!(original.recognizer.model, loaded.recognizer.model);
        assert_eq!(original.recognizer.language, loaded.recognizer.language);
        assert_eq!(original.ui.always_on_top, loaded.ui.always_on_top);
    }

    #[test]
    fn round_trip_preserves_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.widget.auto_stop_secs = None;
        cfg.widget.canvas_layout = CanvasLayout::Inline;
        cfg.capture.noise_suppression = false;
        cfg.recognizer.model = "ggml-small".into();
        cfg.recognizer.language = "auto".into();
        cfg.ui.window_position = Some((120.0, 340.0));

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.widget.auto_stop_secs, None);
        assert_eq!(loaded.widget.canvas_layout, CanvasLayout::Inline);
        assert!(!loaded.capture.noise_suppression);
        assert_eq!(loaded.recognizer.model, "ggml-small");
        assert_eq!(loaded.recognizer.language, "auto");
        assert_eq!(loaded.ui.window_position, Some((120.0, 340.0)));
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let cfg = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(cfg.widget.auto_stop_secs, Some(15));
        assert_eq!(cfg.recognizer.model, "ggml-base.en");
    }

    #[test]
    fn widget_options_conversion() {
        let mut cfg = WidgetConfig::default();
        assert_eq!(
            cfg.options().auto_stop,
            Some(Duration::from_secs(15))
        );

        cfg.auto_stop_secs = None;
        assert_eq!(cfg.options().auto_stop, None);
    }
}

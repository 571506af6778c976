//! Application paths resolved via the `dirs` crate.
//!
//! Config dir (settings.toml):
//!   Windows: %APPDATA%\speakpad\
//!   macOS:   ~/Library/Application Support/speakpad/
//!   Linux:   ~/.config/speakpad/
//!
//! Data dir (GGML models):
//!   Windows: %LOCALAPPDATA%\speakpad\models\
//!   macOS:   ~/Library/Application Support/speakpad/models/
//!   Linux:   ~/.local/share/speakpad/models/

use std::path::PathBuf;

/// Resolved application directories and files.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory for downloaded GGML model files.
    pub models_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "speakpad";

    /// Resolve all paths, falling back to the current directory when the
    /// platform cannot provide a standard location.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let models_dir = data_dir.join("models");

        Self {
            config_dir,
            settings_file,
            models_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_file_lives_under_the_config_dir() {
        let paths = AppPaths::new();
        assert!(paths.settings_file.starts_with(&paths.config_dir));
        assert_eq!(
            paths.settings_file.file_name().and_then(|n| n.to_str()),
            Some("settings.toml")
        );
    }

    #[test]
    fn models_dir_is_named_models() {
        let paths = AppPaths::new();
        assert_eq!(
            paths.models_dir.file_name().and_then(|n| n.to_str()),
            Some("models")
        );
    }
}

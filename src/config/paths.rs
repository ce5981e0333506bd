//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\recording-editor\
//!   macOS:   ~/Library/Application Support/recording-editor/
//!   Linux:   ~/.config/recording-editor/
//!
//! Data dir (rewritten audio):
//!   Windows: %LOCALAPPDATA%\recording-editor\edits\
//!   macOS:   ~/Library/Application Support/recording-editor/edits/
//!   Linux:   ~/.local/share/recording-editor/edits/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Default directory for files produced by trim / cut / silence removal.
    pub edits_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "recording-editor";

    /// Resolves all paths using the `dirs` crate, falling back to the
    /// current directory when the platform provides none.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self {
            settings_file: config_dir.join("settings.toml"),
            config_dir,
            edits_dir: data_dir.join("edits"),
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

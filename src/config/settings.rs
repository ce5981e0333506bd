//! Editor settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every section is `#[serde(default)]`, so a partial `settings.toml` only
//! overrides the keys it names.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// SilenceConfig
// ---------------------------------------------------------------------------

/// Silence detection thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceConfig {
    /// Generic detection threshold in dBFS.
    pub threshold_db: f64,
    /// Shortest silence reported by generic detection, in seconds.
    pub min_duration_secs: f64,
    /// Sharper threshold used by the editor's "highlight silent parts".
    pub highlight_threshold_db: f64,
    /// Shortest silence highlighted in the editor, in seconds.
    pub highlight_min_duration_secs: f64,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            threshold_db: -40.0,
            min_duration_secs: 0.25,
            highlight_threshold_db: -45.0,
            highlight_min_duration_secs: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// WaveformConfig
// ---------------------------------------------------------------------------

/// Waveform level selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    /// Stored points per screen point when picking a zoom level
    /// (`0.5` → roughly one point every two pixels).
    pub ideal_samples_per_point: f64,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            ideal_samples_per_point: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// EditingConfig
// ---------------------------------------------------------------------------

/// Edit guards, silence padding and undo depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditingConfig {
    /// Smallest meaningful edit in seconds; trims closer than this to the
    /// full length and cuts shorter than this are refused.
    pub min_edit_secs: f64,
    /// Seconds added on both sides of each silence before removal.
    pub silence_padding_secs: f64,
    /// Maximum number of undo snapshots kept; the oldest is dropped first.
    pub max_undo_depth: usize,
    /// Where rewritten files are written.  `None` → [`AppPaths::edits_dir`].
    pub output_dir: Option<PathBuf>,
}

impl Default for EditingConfig {
    fn default() -> Self {
        Self {
            min_edit_secs: 0.1,
            silence_padding_secs: 0.05,
            max_undo_depth: 50,
            output_dir: None,
        }
    }
}

impl EditingConfig {
    /// Output directory, resolved against the platform default.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().edits_dir)
    }
}

// ---------------------------------------------------------------------------
// EditorConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use recording_editor::config::EditorConfig;
///
/// // Load (returns Default when file is missing)
/// let config = EditorConfig::load().unwrap();
/// assert!(config.editing.max_undo_depth > 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub silence: SilenceConfig,
    pub waveform: WaveformConfig,
    pub editing: EditingConfig,
}

impl EditorConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(EditorConfig::default())` when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
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
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = EditorConfig::default();
        original.save_to(&path).expect("save");
        let loaded = EditorConfig::load_from(&path).expect("load");

        assert_eq!(original, loaded);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let config = EditorConfig::load_from(&dir.path().join("nonexistent.toml"))
            .expect("should not error");
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn default_values() {
        let cfg = EditorConfig::default();
        assert_eq!(cfg.silence.threshold_db, -40.0);
        assert_eq!(cfg.silence.min_duration_secs, 0.25);
        assert_eq!(cfg.silence.highlight_threshold_db, -45.0);
        assert_eq!(cfg.silence.highlight_min_duration_secs, 0.5);
        assert_eq!(cfg.waveform.ideal_samples_per_point, 0.5);
        assert_eq!(cfg.editing.min_edit_secs, 0.1);
        assert_eq!(cfg.editing.silence_padding_secs, 0.05);
        assert_eq!(cfg.editing.max_undo_depth, 50);
        assert!(cfg.editing.output_dir.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[editing]\nsilence_padding_secs = 0.1\n").unwrap();

        let cfg = EditorConfig::load_from(&path).expect("load");
        assert_eq!(cfg.editing.silence_padding_secs, 0.1);
        assert_eq!(cfg.editing.max_undo_depth, 50);
        assert_eq!(cfg.silence, SilenceConfig::default());
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = EditorConfig::default();
        cfg.silence.threshold_db = -50.0;
        cfg.editing.output_dir = Some(dir.path().join("edits"));
        cfg.editing.max_undo_depth = 5;
        cfg.save_to(&path).expect("save");

        let loaded = EditorConfig::load_from(&path).expect("load");
        assert_eq!(loaded.silence.threshold_db, -50.0);
        assert_eq!(loaded.editing.output_dir, Some(dir.path().join("edits")));
        assert_eq!(loaded.editing.max_undo_depth, 5);
        assert_eq!(loaded.editing.resolved_output_dir(), dir.path().join("edits"));
    }

    #[test]
    fn unset_output_dir_resolves_to_platform_edits_dir() {
        let cfg = EditingConfig::default();
        assert_eq!(cfg.resolved_output_dir(), AppPaths::new().edits_dir);
    }
}

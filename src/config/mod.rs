//! Configuration module.
//!
//! Provides `EditorConfig` (top-level settings), sub-configs for each
//! subsystem, `AppPaths` for cross-platform directories, and TOML
//! persistence via `EditorConfig::load` / `EditorConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{EditingConfig, EditorConfig, SilenceConfig, WaveformConfig};

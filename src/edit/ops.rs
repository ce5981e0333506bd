//! Trim, cut and batch silence removal.
//!
//! [`Editor`] validates a request, hands the file rewrite to the
//! [`AudioCodec`] on the blocking pool and reports the outcome as an
//! [`EditResult`].  Rewrite failures never surface as `Err`: they come back
//! as `success: false` with the original state untouched, so callers can
//! react without unwinding.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use recording_editor::audio::WavCodec;
//! use recording_editor::edit::Editor;
//!
//! # async fn example() {
//! let editor = Editor::new(Arc::new(WavCodec::new("/tmp/edits")));
//! let result = editor.trim(Path::new("memo.wav"), 1.0, 4.0, 10.0).await;
//! if result.success {
//!     println!("new file: {:?}", result.output_file);
//! }
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::ranges::{pad_and_merge, total_duration, TimeRange};
use crate::audio::{AudioCodec, CodecError};
use crate::config::EditingConfig;
use crate::silence::SilenceInterval;

/// Smallest edit, in seconds, that is not treated as a no-op.
pub const DEFAULT_MIN_EDIT_SECS: f64 = 0.1;

/// Seconds added around each silence before it is removed.
pub const DEFAULT_SILENCE_PADDING_SECS: f64 = 0.05;

// ---------------------------------------------------------------------------
// EditResult
// ---------------------------------------------------------------------------

/// Outcome of one edit.
///
/// On failure `output_file` is `None`, `new_duration` echoes the unchanged
/// input duration and `error` says why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditResult {
    pub success: bool,
    pub output_file: Option<PathBuf>,
    pub new_duration: f64,
    /// Seconds removed (batch silence removal only).
    pub removed_duration: Option<f64>,
    /// Number of merged ranges removed (batch silence removal only).
    pub removed_ranges_count: Option<usize>,
    pub error: Option<String>,
}

impl EditResult {
    fn succeeded(output_file: PathBuf, new_duration: f64) -> Self {
        Self {
            success: true,
            output_file: Some(output_file),
            new_duration,
            removed_duration: None,
            removed_ranges_count: None,
            error: None,
        }
    }

    fn failed(duration: f64, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output_file: None,
            new_duration: duration,
            removed_duration: None,
            removed_ranges_count: None,
            error: Some(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// Runs edit operations against an [`AudioCodec`].
#[derive(Clone)]
pub struct Editor {
    codec: Arc<dyn AudioCodec>,
    min_edit_secs: f64,
    silence_padding_secs: f64,
}

impl Editor {
    /// Editor with the default guard (0.1 s) and padding (0.05 s).
    pub fn new(codec: Arc<dyn AudioCodec>) -> Self {
        Self {
            codec,
            min_edit_secs: DEFAULT_MIN_EDIT_SECS,
            silence_padding_secs: DEFAULT_SILENCE_PADDING_SECS,
        }
    }

    pub fn from_config(codec: Arc<dyn AudioCodec>, config: &EditingConfig) -> Self {
        Self {
            codec,
            min_edit_secs: config.min_edit_secs.max(0.0),
            silence_padding_secs: config.silence_padding_secs.max(0.0),
        }
    }

    pub fn silence_padding_secs(&self) -> f64 {
        self.silence_padding_secs
    }

    pub fn min_edit_secs(&self) -> f64 {
        self.min_edit_secs
    }

    // -----------------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------------

    /// `true` when keeping `start..end` would actually shorten the file.
    pub fn can_trim(&self, start: f64, end: f64, duration: f64) -> bool {
        end > start && (start > self.min_edit_secs || end < duration - self.min_edit_secs)
    }

    /// `true` when removing `start..end` removes something but not everything.
    pub fn can_cut(&self, start: f64, end: f64, duration: f64) -> bool {
        let len = end - start;
        len > self.min_edit_secs && len < duration - self.min_edit_secs
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Keep only `start..end` of `file`.
    pub async fn trim(&self, file: &Path, start: f64, end: f64, duration: f64) -> EditResult {
        let (start, end) = clamp_selection(start, end, duration);
        if !self.can_trim(start, end, duration) {
            log::warn!("edit: trim {start:.3}..{end:.3} of {duration:.3}s rejected");
            return EditResult::failed(duration, "trim selection covers the whole recording");
        }

        let codec = Arc::clone(&self.codec);
        let source = file.to_path_buf();
        match run_rewrite(move || codec.write_trimmed(&source, start, end)).await {
            Ok(out) => {
                log::info!(
                    "edit: trimmed {} to {start:.3}..{end:.3} → {}",
                    file.display(),
                    out.display()
                );
                EditResult::succeeded(out, end - start)
            }
            Err(e) => {
                log::warn!("edit: trim of {} failed: {e}", file.display());
                EditResult::failed(duration, e)
            }
        }
    }

    /// Remove `start..end` from `file`, splicing the remainder together.
    pub async fn cut(&self, file: &Path, start: f64, end: f64, duration: f64) -> EditResult {
        let (start, end) = clamp_selection(start, end, duration);
        if !self.can_cut(start, end, duration) {
            log::warn!("edit: cut {start:.3}..{end:.3} of {duration:.3}s rejected");
            return EditResult::failed(
                duration,
                "cut must remove some, but not all, of the recording",
            );
        }

        let codec = Arc::clone(&self.codec);
        let source = file.to_path_buf();
        let ranges = [TimeRange::new(start, end)];
        match run_rewrite(move || codec.write_with_ranges_removed(&source, &ranges)).await {
            Ok(out) => {
                log::info!(
                    "edit: cut {start:.3}..{end:.3} from {} → {}",
                    file.display(),
                    out.display()
                );
                EditResult::succeeded(out, duration - (end - start))
            }
            Err(e) => {
                log::warn!("edit: cut from {} failed: {e}", file.display());
                EditResult::failed(duration, e)
            }
        }
    }

    /// Remove every range in `ranges`, each padded by the configured padding,
    /// in a single rewrite.
    pub async fn remove_silence(
        &self,
        file: &Path,
        ranges: &[SilenceInterval],
        duration: f64,
    ) -> EditResult {
        let merged = pad_and_merge(ranges, self.silence_padding_secs, duration);
        if merged.is_empty() {
            log::warn!("edit: silence removal on {} with nothing selected", file.display());
            return EditResult::failed(duration, "no silence ranges selected");
        }

        let removed = total_duration(&merged);
        if removed >= duration - self.min_edit_secs {
            log::warn!("edit: silence removal would empty {}", file.display());
            return EditResult::failed(duration, "silence removal would remove the whole recording");
        }

        let count = merged.len();
        let codec = Arc::clone(&self.codec);
        let source = file.to_path_buf();
        match run_rewrite(move || codec.write_with_ranges_removed(&source, &merged)).await {
            Ok(out) => {
                log::info!(
                    "edit: removed {count} silent ranges ({removed:.3}s) from {} → {}",
                    file.display(),
                    out.display()
                );
                EditResult {
                    removed_duration: Some(removed),
                    removed_ranges_count: Some(count),
                    ..EditResult::succeeded(out, duration - removed)
                }
            }
            Err(e) => {
                log::warn!("edit: silence removal on {} failed: {e}", file.display());
                EditResult::failed(duration, e)
            }
        }
    }
}

fn clamp_selection(start: f64, end: f64, duration: f64) -> (f64, f64) {
    let duration = duration.max(0.0);
    (start.clamp(0.0, duration), end.clamp(0.0, duration))
}

/// Run a blocking rewrite and flatten both failure layers into a message.
async fn run_rewrite<F>(rewrite: F) -> Result<PathBuf, String>
where
    F: FnOnce() -> Result<PathBuf, CodecError> + Send + 'static,
{
    match tokio::task::spawn_blocking(rewrite).await {
        Ok(Ok(path)) => Ok(path),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(format!("edit worker failed: {e}")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Which file currently backs an editing session.

use std::path::{Path, PathBuf};

/// The audio an edit operation should read from.
///
/// A session starts on the recording's `Original` file.  Every successful
/// edit produces a new file that is not yet committed to the recording's
/// stored metadata; that file and its duration travel together as
/// `Pending` until the session is committed or discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum CurrentAudio {
    Original(PathBuf),
    Pending { file: PathBuf, duration: f64 },
}

impl CurrentAudio {
    /// Path of the file to read from.
    pub fn path(&self) -> &Path {
        match self {
            CurrentAudio::Original(file) => file,
            CurrentAudio::Pending { file, .. } => file,
        }
    }

    /// Returns `true` once at least one edit has been applied.
    pub fn is_pending(&self) -> bool {
        matches!(self, CurrentAudio::Pending { .. })
    }

    /// Duration recorded alongside a pending file, if any.
    pub fn pending_duration(&self) -> Option<f64> {
        match self {
            CurrentAudio::Original(_) => None,
            CurrentAudio::Pending { duration, .. } => Some(*duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_resolves_path() {
        let audio = CurrentAudio::Original(PathBuf::from("/memos/a.wav"));
        assert_eq!(audio.path(), Path::new("/memos/a.wav"));
        assert!(!audio.is_pending());
        assert_eq!(audio.pending_duration(), None);
    }

    #[test]
    fn pending_carries_duration() {
        let audio = CurrentAudio::Pending {
            file: PathBuf::from("/edits/a-1.wav"),
            duration: 4.5,
        };
        assert_eq!(audio.path(), Path::new("/edits/a-1.wav"));
        assert!(audio.is_pending());
        assert_eq!(audio.pending_duration(), Some(4.5));
    }
}

//! Silence detection and the selectable intervals used to remove it.
//!
//! [`SilenceDetector`] finds runs of low-energy audio; [`SilenceSelection`]
//! lets the user opt individual runs out before they are handed to
//! [`Editor::remove_silence`](crate::edit::Editor::remove_silence).

pub mod detector;
pub mod selection;

pub use detector::{detect_silence, total_silence, SilenceDetector, SilenceInterval, WINDOW_SECS};
pub use selection::{SelectableSilenceInterval, SilenceSelection};

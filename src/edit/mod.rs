//! Editing: trim, cut, batch silence removal, marker remapping and
//! snapshot-based undo/redo.
//!
//! * [`Editor`]: stateless operations returning an [`EditResult`].
//! * [`markers`]: pure functions that move [`Marker`]s through an edit.
//! * [`UndoHistory`]: bounded undo/redo stacks of [`EditSnapshot`]s.
//! * [`EditSession`]: one recording's editing flow built from the above.

pub mod history;
pub mod markers;
pub mod ops;
pub mod ranges;
pub mod session;

pub use history::{EditSnapshot, UndoHistory};
pub use markers::{after_cut, after_removing_silence, after_trim, sort_markers, Marker};
pub use ops::{EditResult, Editor, DEFAULT_MIN_EDIT_SECS, DEFAULT_SILENCE_PADDING_SECS};
pub use ranges::{pad_and_merge, total_duration, TimeRange};
pub use session::{CommittedEdit, EditSession};

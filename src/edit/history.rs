//! Snapshot-based undo/redo.
//!
//! Every edit pushes a full copy of the editable state as it was *before*
//! the edit.  Undo pops it and hands the caller's current state to the redo
//! stack; redo does the reverse.  Any new edit wipes forward history.

use std::collections::VecDeque;

use super::markers::Marker;
use crate::audio::CurrentAudio;

// ---------------------------------------------------------------------------
// EditSnapshot
// ---------------------------------------------------------------------------

/// The full editable state of one recording at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSnapshot {
    pub audio: CurrentAudio,
    pub duration: f64,
    pub markers: Vec<Marker>,
    pub selection_start: f64,
    pub selection_end: f64,
    /// Label of the operation this snapshot precedes, e.g. `"Trim"`.
    pub description: String,
}

// ---------------------------------------------------------------------------
// UndoHistory
// ---------------------------------------------------------------------------

/// Two bounded stacks of [`EditSnapshot`]s.
///
/// ```rust
/// use std::path::PathBuf;
/// use recording_editor::audio::CurrentAudio;
/// use recording_editor::edit::{EditSnapshot, UndoHistory};
///
/// let snap = EditSnapshot {
///     audio: CurrentAudio::Original(PathBuf::from("memo.wav")),
///     duration: 10.0,
///     markers: Vec::new(),
///     selection_start: 0.0,
///     selection_end: 10.0,
///     description: "Trim".into(),
/// };
///
/// let mut history = UndoHistory::new(50);
/// history.push_undo(snap.clone());
/// assert!(history.can_undo());
/// assert_eq!(history.pop_undo(), Some(snap));
/// assert_eq!(history.pop_undo(), None);
/// ```
#[derive(Debug, Clone)]
pub struct UndoHistory {
    undo: VecDeque<EditSnapshot>,
    redo: VecDeque<EditSnapshot>,
    max_depth: usize,
}

impl UndoHistory {
    /// History keeping at most `max_depth` snapshots per stack (minimum 1).
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record the state before a new edit.  Clears the redo stack.
    pub fn push_undo(&mut self, snapshot: EditSnapshot) {
        self.redo.clear();
        Self::push_bounded(&mut self.undo, snapshot, self.max_depth);
    }

    pub fn pop_undo(&mut self) -> Option<EditSnapshot> {
        self.undo.pop_back()
    }

    /// Record the state being left by an undo.  Leaves the undo stack alone.
    ///
    /// Returns the oldest redo snapshot if the push evicted it.
    pub fn push_redo(&mut self, snapshot: EditSnapshot) -> Option<EditSnapshot> {
        Self::push_bounded(&mut self.redo, snapshot, self.max_depth)
    }

    pub fn pop_redo(&mut self) -> Option<EditSnapshot> {
        self.redo.pop_back()
    }

    /// Put a snapshot back on the undo stack without touching redo.
    ///
    /// Used by redo, which must not wipe the remaining forward history.
    pub(crate) fn restore_undo(&mut self, snapshot: EditSnapshot) -> Option<EditSnapshot> {
        Self::push_bounded(&mut self.undo, snapshot, self.max_depth)
    }

    /// [`push_undo`](Self::push_undo) that keeps what it displaced, so the
    /// push can be reverted with [`rollback`](Self::rollback).
    pub(crate) fn push_undo_reversible(&mut self, snapshot: EditSnapshot) -> Displaced {
        let redo = std::mem::take(&mut self.redo);
        let evicted = Self::push_bounded(&mut self.undo, snapshot, self.max_depth);
        Displaced { redo, evicted }
    }

    /// Undo a [`push_undo_reversible`](Self::push_undo_reversible).
    pub(crate) fn rollback(&mut self, displaced: Displaced) {
        self.undo.pop_back();
        if let Some(evicted) = displaced.evicted {
            self.undo.push_front(evicted);
        }
        self.redo = displaced.redo;
    }

    /// Every snapshot on either stack.
    pub(crate) fn snapshots(&self) -> impl Iterator<Item = &EditSnapshot> {
        self.undo.iter().chain(self.redo.iter())
    }

    /// Empty both stacks (session committed or discarded).
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Description of the edit the next undo would revert.
    pub fn next_undo_label(&self) -> Option<&str> {
        self.undo.back().map(|s| s.description.as_str())
    }

    fn push_bounded(
        stack: &mut VecDeque<EditSnapshot>,
        snapshot: EditSnapshot,
        max: usize,
    ) -> Option<EditSnapshot> {
        stack.push_back(snapshot);
        if stack.len() > max {
            stack.pop_front()
        } else {
            None
        }
    }
}

/// What [`UndoHistory::push_undo_reversible`] pushed out of the way.
#[derive(Debug)]
pub(crate) struct Displaced {
    pub(crate) redo: VecDeque<EditSnapshot>,
    pub(crate) evicted: Option<EditSnapshot>,
}

impl Displaced {
    /// Snapshots that leave the history for good if the edit is kept.
    pub(crate) fn dropped(&self) -> impl Iterator<Item = &EditSnapshot> {
        self.redo.iter().chain(self.evicted.iter())
    }
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(50)
    }
}

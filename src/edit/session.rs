//! One recording's editing session.
//!
//! [`EditSession`] ties the pieces together: it owns the current audio,
//! duration, markers, selection and undo history of a single recording,
//! runs edits through an [`Editor`], remaps markers on success and reads
//! waveform and silence data through the shared [`AnalysisCache`].
//!
//! ```text
//! open ──▶ edit* (trim / cut / remove silence) ──▶ commit │ discard
//!            ▲        │
//!            └─ undo / redo
//! ```
//!
//! Edits are issued one at a time (`&mut self`).  The undo snapshot is
//! pushed before the rewrite is dispatched; if the rewrite fails the
//! history is put back exactly as it was and nothing else changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use super::history::{Displaced, EditSnapshot, UndoHistory};
use super::markers::{after_cut, after_removing_silence, after_trim, sort_markers, Marker};
use super::ops::{EditResult, Editor};
use crate::audio::{AnalysisError, AudioCodec, CurrentAudio};
use crate::cache::AnalysisCache;
use crate::config::EditorConfig;
use crate::silence::{SilenceDetector, SilenceInterval, SilenceSelection};
use crate::waveform::WaveformPyramid;

/// What the caller stores on the recording after [`EditSession::commit`].
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedEdit {
    pub file: PathBuf,
    pub duration: f64,
    pub markers: Vec<Marker>,
    /// `false` when no edit was pending and `file` is the original.
    pub changed: bool,
}

pub struct EditSession {
    original_file: PathBuf,
    original_duration: f64,
    original_markers: Vec<Marker>,

    audio: CurrentAudio,
    duration: f64,
    markers: Vec<Marker>,
    selection_start: f64,
    selection_end: f64,

    history: UndoHistory,
    editor: Editor,
    cache: Arc<AnalysisCache>,
    highlight: SilenceDetector,
}

impl EditSession {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Open a session on `file` with the default editor, history depth and
    /// highlight detector.
    pub fn new(
        file: impl Into<PathBuf>,
        duration: f64,
        markers: Vec<Marker>,
        editor: Editor,
        cache: Arc<AnalysisCache>,
    ) -> Self {
        let file = file.into();
        let duration = duration.max(0.0);
        let mut markers: Vec<Marker> = markers
            .into_iter()
            .map(|m| Marker {
                time: m.time.clamp(0.0, duration),
                ..m
            })
            .collect();
        sort_markers(&mut markers);

        Self {
            audio: CurrentAudio::Original(file.clone()),
            original_file: file,
            original_duration: duration,
            original_markers: markers.clone(),
            duration,
            markers,
            selection_start: 0.0,
            selection_end: duration,
            history: UndoHistory::default(),
            editor,
            cache,
            highlight: SilenceDetector::highlight(),
        }
    }

    /// Open a session using every relevant setting from `config`.
    pub fn from_config(
        file: impl Into<PathBuf>,
        duration: f64,
        markers: Vec<Marker>,
        codec: Arc<dyn AudioCodec>,
        cache: Arc<AnalysisCache>,
        config: &EditorConfig,
    ) -> Self {
        let editor = Editor::from_config(codec, &config.editing);
        Self::new(file, duration, markers, editor, cache)
            .with_history_depth(config.editing.max_undo_depth)
            .with_highlight_detector(SilenceDetector::highlight_from_config(&config.silence))
    }

    pub fn with_history_depth(mut self, max_depth: usize) -> Self {
        self.history = UndoHistory::new(max_depth);
        self
    }

    pub fn with_highlight_detector(mut self, detector: SilenceDetector) -> Self {
        self.highlight = detector;
        self
    }

    // -----------------------------------------------------------------------
    // State
    // -----------------------------------------------------------------------

    pub fn audio(&self) -> &CurrentAudio {
        &self.audio
    }

    pub fn current_file(&self) -> &Path {
        self.audio.path()
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn selection(&self) -> (f64, f64) {
        (self.selection_start, self.selection_end)
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// `true` when the current selection would make a meaningful trim.
    pub fn can_trim(&self) -> bool {
        self.editor
            .can_trim(self.selection_start, self.selection_end, self.duration)
    }

    /// `true` when the current selection would make a meaningful cut.
    pub fn can_cut(&self) -> bool {
        self.editor
            .can_cut(self.selection_start, self.selection_end, self.duration)
    }

    /// Set the selection, ordered and clamped to the current duration.
    pub fn set_selection(&mut self, start: f64, end: f64) {
        let (a, b) = if start <= end { (start, end) } else { (end, start) };
        self.selection_start = a.clamp(0.0, self.duration);
        self.selection_end = b.clamp(0.0, self.duration);
    }

    /// Place a marker at `time` (clamped to the recording) and return its id.
    pub fn add_marker(&mut self, time: f64) -> Uuid {
        let marker = Marker::new(time.clamp(0.0, self.duration));
        self.markers.push(marker);
        sort_markers(&mut self.markers);
        marker.id
    }

    /// Remove the marker with `id`.  Returns `false` if there is none.
    pub fn remove_marker(&mut self, id: Uuid) -> bool {
        let before = self.markers.len();
        self.markers.retain(|m| m.id != id);
        self.markers.len() != before
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    /// Waveform of the current audio, built once and shared via the cache.
    pub async fn waveform(&self) -> Result<Arc<WaveformPyramid>, AnalysisError> {
        self.cache.get_pyramid(self.audio.path()).await
    }

    /// Silent parts of the current audio for the "highlight silence" view,
    /// all initially selected for removal.
    pub async fn highlight_silence(&self) -> Result<SilenceSelection, AnalysisError> {
        let intervals = self
            .cache
            .get_silence(self.audio.path(), self.highlight)
            .await?;
        Ok(SilenceSelection::from_intervals(&intervals))
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Keep only the selected part.
    pub async fn trim_selection(&mut self) -> EditResult {
        let (start, end) = self.selection();
        let saved = self.begin_edit("Trim");
        let result = self
            .editor
            .trim(self.audio.path(), start, end, self.duration)
            .await;
        let markers = after_trim(&self.markers, start, end);
        self.finish_edit(saved, &result, markers);
        result
    }

    /// Remove the selected part.
    pub async fn cut_selection(&mut self) -> EditResult {
        let (start, end) = self.selection();
        let saved = self.begin_edit("Cut");
        let result = self
            .editor
            .cut(self.audio.path(), start, end, self.duration)
            .await;
        let markers = after_cut(&self.markers, start, end);
        self.finish_edit(saved, &result, markers);
        result
    }

    /// Remove `selected` silences (usually [`SilenceSelection::selected_ranges`]).
    pub async fn remove_silence(&mut self, selected: &[SilenceInterval]) -> EditResult {
        let saved = self.begin_edit("Remove Silence");
        let result = self
            .editor
            .remove_silence(self.audio.path(), selected, self.duration)
            .await;
        let markers = after_removing_silence(
            &self.markers,
            selected,
            self.editor.silence_padding_secs(),
            self.duration,
        );
        self.finish_edit(saved, &result, markers);
        result
    }

    /// Step back one edit.  Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.pop_undo() else {
            return false;
        };
        log::debug!("session: undo {}", previous.description);
        let current = self.snapshot(&previous.description);
        if let Some(evicted) = self.history.push_redo(current) {
            self.release([&evicted]);
        }
        self.restore(previous);
        true
    }

    /// Re-apply the last undone edit.  Returns `false` when there is nothing
    /// to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.pop_redo() else {
            return false;
        };
        log::debug!("session: redo {}", next.description);
        let current = self.snapshot(&next.description);
        if let Some(evicted) = self.history.restore_undo(current) {
            self.release([&evicted]);
        }
        self.restore(next);
        true
    }

    /// Accept the current state.  History is cleared and the current file
    /// becomes the session's new original.
    pub fn commit(&mut self) -> CommittedEdit {
        let changed = self.audio.is_pending();
        let file = self.audio.path().to_path_buf();

        self.release(self.history.snapshots());
        self.history.clear();
        self.original_file = file.clone();
        self.original_duration = self.duration;
        self.original_markers = self.markers.clone();
        self.audio = CurrentAudio::Original(file.clone());

        log::info!("session: committed {} ({:.3}s)", file.display(), self.duration);
        CommittedEdit {
            file,
            duration: self.duration,
            markers: self.markers.clone(),
            changed,
        }
    }

    /// Throw away every pending edit and return to the original.
    pub fn discard(&mut self) {
        if let CurrentAudio::Pending { file, .. } = &self.audio {
            self.cache.invalidate(file);
        }
        self.audio = CurrentAudio::Original(self.original_file.clone());
        self.release(self.history.snapshots());
        self.history.clear();
        self.duration = self.original_duration;
        self.markers = self.original_markers.clone();
        self.selection_start = 0.0;
        self.selection_end = self.duration;
        log::info!("session: discarded edits to {}", self.original_file.display());
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn snapshot(&self, description: &str) -> EditSnapshot {
        EditSnapshot {
            audio: self.audio.clone(),
            duration: self.duration,
            markers: self.markers.clone(),
            selection_start: self.selection_start,
            selection_end: self.selection_end,
            description: description.to_string(),
        }
    }

    fn restore(&mut self, snapshot: EditSnapshot) {
        self.audio = snapshot.audio;
        self.duration = snapshot.duration;
        self.markers = snapshot.markers;
        self.selection_start = snapshot.selection_start;
        self.selection_end = snapshot.selection_end;
    }

    /// Drop cached analysis for every pending file in `snapshots` other
    /// than the one the session is on.
    fn release<'a>(&self, snapshots: impl IntoIterator<Item = &'a EditSnapshot>) {
        for snapshot in snapshots {
            if let CurrentAudio::Pending { file, .. } = &snapshot.audio {
                if file.as_path() != self.audio.path() {
                    self.cache.invalidate(file);
                }
            }
        }
    }

    /// Push the pre-edit snapshot, keeping what it displaced so a failed
    /// edit can put the history back.
    fn begin_edit(&mut self, description: &str) -> Displaced {
        let snapshot = self.snapshot(description);
        self.history.push_undo_reversible(snapshot)
    }

    fn finish_edit(&mut self, displaced: Displaced, result: &EditResult, markers: Vec<Marker>) {
        let Some(file) = result.output_file.clone().filter(|_| result.success) else {
            self.history.rollback(displaced);
            return;
        };

        if let CurrentAudio::Pending { file: replaced, .. } = &self.audio {
            self.cache.invalidate(replaced);
        }
        self.release(displaced.dropped());
        self.audio = CurrentAudio::Pending {
            file,
            duration: result.new_duration,
        };
        self.duration = result.new_duration;
        self.markers = markers
            .into_iter()
            .filter(|m| m.time <= self.duration + 1e-9)
            .map(|m| Marker {
                time: m.time.clamp(0.0, self.duration),
                ..m
            })
            .collect();
        self.selection_start = 0.0;
        self.selection_end = self.duration;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MockCodec;
    use crate::cache::EntryState;

    const RATE: u32 = 8_000;

    fn session_with(codec: MockCodec, markers: &[f64]) -> (EditSession, Arc<MockCodec>) {
        let codec = Arc::new(codec);
        let cache = Arc::new(AnalysisCache::new(codec.clone()));
        let editor = Editor::new(codec.clone());
        let markers = markers.iter().map(|&t| Marker::new(t)).collect();
        let session = EditSession::new("/memos/a.wav", 10.0, markers, editor, cache);
        (session, codec)
    }

    fn session_sharing_cache() -> (EditSession, Arc<AnalysisCache>) {
        let codec = Arc::new(MockCodec::tone(10.0, RATE));
        let cache = Arc::new(AnalysisCache::new(codec.clone()));
        let session =
            EditSession::new("/memos/a.wav", 10.0, Vec::new(), Editor::new(codec), cache.clone());
        (session, cache)
    }

    fn marker_times(session: &EditSession) -> Vec<f64> {
        session.markers().iter().map(|m| m.time).collect()
    }

    /// 10 s at `RATE` with silence at 2.0–3.0 and 6.0–6.6.
    fn gapped_signal() -> Vec<f32> {
        (0..10 * RATE as usize)
            .map(|i| {
                let t = i as f64 / RATE as f64;
                if (2.0..3.0).contains(&t) || (6.0..6.6).contains(&t) {
                    0.0
                } else {
                    0.5 * (2.0 * std::f64::consts::PI * 440.0 * t).sin() as f32
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn trim_adopts_new_file_and_remaps_markers() {
        let (mut session, _) = session_with(MockCodec::tone(10.0, RATE), &[0.5, 3.0, 9.0]);
        session.set_selection(2.0, 8.0);
        assert!(session.can_trim());

        let result = session.trim_selection().await;
        assert!(result.success);
        assert!(session.audio().is_pending());
        assert_eq!(session.current_file(), Path::new("/memos/a-edit0.wav"));
        assert!((session.duration() - 6.0).abs() < 1e-9);
        assert_eq!(marker_times(&session), vec![1.0]);
        assert_eq!(session.selection(), (0.0, session.duration()));
        assert_eq!(session.history().next_undo_label(), Some("Trim"));
    }

    #[tokio::test]
    async fn failed_edit_leaves_state_and_history_intact() {
        let (mut session, _) =
            session_with(MockCodec::tone(10.0, RATE).failing_writes(), &[4.0]);
        session.set_selection(1.0, 2.0);

        let result = session.cut_selection().await;
        assert!(!result.success);
        assert!(!session.audio().is_pending());
        assert_eq!(session.duration(), 10.0);
        assert_eq!(marker_times(&session), vec![4.0]);
        assert!(!session.can_undo());
    }

    #[tokio::test]
    async fn rejected_edit_keeps_redo() {
        let (mut session, _) = session_with(MockCodec::tone(10.0, RATE), &[]);
        session.set_selection(1.0, 2.0);
        assert!(session.cut_selection().await.success);
        assert!(session.undo());
        assert!(session.can_redo());

        session.set_selection(0.0, 10.0);
        assert!(!session.trim_selection().await.success);
        assert!(session.can_redo());
    }

    #[tokio::test]
    async fn undo_redo_round_trip() {
        let (mut session, _) = session_with(MockCodec::tone(10.0, RATE), &[5.0]);
        session.set_selection(1.0, 3.0);
        assert!(session.cut_selection().await.success);
        let after_cut = (session.current_file().to_path_buf(), session.duration());
        assert_eq!(marker_times(&session), vec![3.0]);

        assert!(session.undo());
        assert_eq!(session.current_file(), Path::new("/memos/a.wav"));
        assert_eq!(session.duration(), 10.0);
        assert_eq!(marker_times(&session), vec![5.0]);
        assert_eq!(session.selection(), (1.0, 3.0));

        assert!(session.redo());
        assert_eq!(session.current_file(), after_cut.0.as_path());
        assert_eq!(session.duration(), after_cut.1);
        assert_eq!(marker_times(&session), vec![3.0]);

        assert!(!session.redo());
        assert!(session.can_undo());
    }

    #[tokio::test]
    async fn new_edit_after_undo_clears_redo() {
        let (mut session, _) = session_with(MockCodec::tone(10.0, RATE), &[]);
        session.set_selection(1.0, 2.0);
        assert!(session.cut_selection().await.success);
        assert!(session.undo());
        session.set_selection(4.0, 5.0);
        assert!(session.cut_selection().await.success);
        assert!(!session.can_redo());
    }

    #[tokio::test]
    async fn highlight_then_remove_scenario() {
        let (mut session, codec) =
            session_with(MockCodec::new(gapped_signal(), RATE), &[1.0, 2.5, 4.0, 9.0]);
        session = session.with_highlight_detector(SilenceDetector::new(-40.0, 0.5));

        let selection = session.highlight_silence().await.expect("silence");
        assert_eq!(selection.len(), 2);
        let ranges = selection.selected_ranges();
        assert!((ranges[0].start - 2.0).abs() < 0.011);
        assert!((ranges[1].end - 6.6).abs() < 0.011);

        let result = session.remove_silence(&ranges).await;
        assert!(result.success);
        assert_eq!(result.removed_ranges_count, Some(2));
        assert!((session.duration() - 8.2).abs() < 0.03, "{}", session.duration());
        assert_eq!(session.markers().len(), 3);
        assert_eq!(codec.writes().len(), 1);
    }

    #[tokio::test]
    async fn deselected_silence_is_kept() {
        let (mut session, codec) = session_with(MockCodec::new(gapped_signal(), RATE), &[]);
        session = session.with_highlight_detector(SilenceDetector::new(-40.0, 0.5));

        let mut selection = session.highlight_silence().await.expect("silence");
        let second = selection.items()[1].id;
        assert!(selection.toggle(second));

        let result = session.remove_silence(&selection.selected_ranges()).await;
        assert!(result.success);
        assert_eq!(result.removed_ranges_count, Some(1));
        assert_eq!(codec.writes().len(), 1);
    }

    #[tokio::test]
    async fn waveform_is_cached_across_calls() {
        let (session, codec) = session_with(MockCodec::tone(2.0, RATE), &[]);
        let a = session.waveform().await.expect("pyramid");
        let b = session.waveform().await.expect("pyramid");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(codec.decode_calls(), 1);
    }

    #[tokio::test]
    async fn edit_after_undo_releases_abandoned_file() {
        let (mut session, cache) = session_sharing_cache();
        session.set_selection(1.0, 2.0);
        assert!(session.cut_selection().await.success);
        let abandoned = session.current_file().to_path_buf();
        session.waveform().await.expect("pyramid");
        assert_eq!(cache.entry_state(&abandoned), EntryState::Ready);

        assert!(session.undo());
        session.set_selection(4.0, 5.0);
        assert!(session.cut_selection().await.success);
        assert_eq!(cache.entry_state(&abandoned), EntryState::Empty);
    }

    #[tokio::test]
    async fn discard_after_undo_releases_redo_files() {
        let (mut session, cache) = session_sharing_cache();
        session.set_selection(1.0, 2.0);
        assert!(session.cut_selection().await.success);
        let undone = session.current_file().to_path_buf();
        session.waveform().await.expect("pyramid");
        session
            .highlight_silence()
            .await
            .expect("silence");

        assert!(session.undo());
        session.discard();
        assert_eq!(cache.entry_state(&undone), EntryState::Empty);
        assert_eq!(
            cache.silence_entry_state(&undone, &SilenceDetector::highlight()),
            EntryState::Empty
        );
    }

    #[tokio::test]
    async fn commit_keeps_current_file_and_releases_the_rest() {
        let (mut session, cache) = session_sharing_cache();
        session.set_selection(1.0, 2.0);
        assert!(session.cut_selection().await.success);
        let kept = session.current_file().to_path_buf();
        session.set_selection(1.0, 2.0);
        assert!(session.cut_selection().await.success);
        let undone = session.current_file().to_path_buf();
        session.waveform().await.expect("pyramid");

        assert!(session.undo());
        assert_eq!(session.current_file(), kept.as_path());
        session.waveform().await.expect("pyramid");

        let committed = session.commit();
        assert_eq!(committed.file, kept);
        assert_eq!(cache.entry_state(&kept), EntryState::Ready);
        assert_eq!(cache.entry_state(&undone), EntryState::Empty);
    }

    #[tokio::test]
    async fn evicted_undo_snapshot_is_released() {
        let (session, cache) = session_sharing_cache();
        let mut session = session.with_history_depth(1);
        session.set_selection(1.0, 2.0);
        assert!(session.cut_selection().await.success);
        let first = session.current_file().to_path_buf();
        session.set_selection(1.0, 2.0);
        assert!(session.cut_selection().await.success);

        assert!(session.undo());
        session.waveform().await.expect("pyramid");
        assert!(session.redo());
        assert_eq!(cache.entry_state(&first), EntryState::Ready);

        // Pushing the next snapshot evicts the one pointing at `first`.
        session.set_selection(1.0, 2.0);
        assert!(session.cut_selection().await.success);
        assert_eq!(session.history().undo_len(), 1);
        assert_eq!(cache.entry_state(&first), EntryState::Empty);
    }

    #[tokio::test]
    async fn commit_clears_history_and_reports_file() {
        let (mut session, _) = session_with(MockCodec::tone(10.0, RATE), &[7.0]);
        session.set_selection(0.0, 5.0);
        assert!(session.cut_selection().await.success);

        let committed = session.commit();
        assert!(committed.changed);
        assert_eq!(committed.file, PathBuf::from("/memos/a-edit0.wav"));
        assert!((committed.duration - 5.0).abs() < 1e-9);
        assert_eq!(committed.markers.len(), 1);
        assert!(!session.can_undo() && !session.can_redo());
        assert!(!session.audio().is_pending());
    }

    #[tokio::test]
    async fn discard_restores_original() {
        let (mut session, _) = session_with(MockCodec::tone(10.0, RATE), &[7.0]);
        session.set_selection(0.0, 5.0);
        assert!(session.trim_selection().await.success);

        session.discard();
        assert_eq!(session.current_file(), Path::new("/memos/a.wav"));
        assert_eq!(session.duration(), 10.0);
        assert_eq!(marker_times(&session), vec![7.0]);
        assert!(!session.can_undo());
    }

    #[test]
    fn markers_are_clamped_and_sorted() {
        let (mut session, _) = session_with(MockCodec::tone(1.0, RATE), &[12.0, 3.0]);
        assert_eq!(marker_times(&session), vec![3.0, 10.0]);

        let id = session.add_marker(-1.0);
        assert_eq!(marker_times(&session), vec![0.0, 3.0, 10.0]);
        assert!(session.remove_marker(id));
        assert!(!session.remove_marker(id));
    }

    #[test]
    fn selection_is_ordered_and_clamped() {
        let (mut session, _) = session_with(MockCodec::tone(1.0, RATE), &[]);
        session.set_selection(12.0, 4.0);
        assert_eq!(session.selection(), (4.0, 10.0));
    }
}

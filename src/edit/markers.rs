//! User markers and how they follow the timeline through edits.
//!
//! All remap functions are pure: they take the markers as they were before
//! the edit and return the surviving markers, shifted and sorted by time.
//! A marker exactly on a removed range's start is dropped; one exactly on
//! its end survives and lands on the splice point.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ranges::pad_and_merge;
use crate::silence::SilenceInterval;

/// A cue point placed by the user at `time` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: Uuid,
    pub time: f64,
}

impl Marker {
    /// A new marker with a fresh identifier.
    pub fn new(time: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            time,
        }
    }

    fn shifted(self, by: f64) -> Self {
        Self {
            time: self.time - by,
            ..self
        }
    }
}

/// Sort markers ascending by time.
pub fn sort_markers(markers: &mut [Marker]) {
    markers.sort_by(|a, b| a.time.total_cmp(&b.time));
}

/// Keep markers inside `[keep_start, keep_end]`, moved so `keep_start`
/// becomes zero.
pub fn after_trim(markers: &[Marker], keep_start: f64, keep_end: f64) -> Vec<Marker> {
    let mut out: Vec<Marker> = markers
        .iter()
        .filter(|m| m.time >= keep_start && m.time <= keep_end)
        .map(|m| m.shifted(keep_start))
        .collect();
    sort_markers(&mut out);
    out
}

/// Drop markers inside `[removed_start, removed_end)` and pull later
/// markers left by the removed length.
pub fn after_cut(markers: &[Marker], removed_start: f64, removed_end: f64) -> Vec<Marker> {
    let removed = (removed_end - removed_start).max(0.0);
    let mut out: Vec<Marker> = markers
        .iter()
        .filter(|m| removed == 0.0 || m.time < removed_start || m.time >= removed_end)
        .map(|m| {
            if removed > 0.0 && m.time >= removed_end {
                m.shifted(removed)
            } else {
                *m
            }
        })
        .collect();
    sort_markers(&mut out);
    out
}

/// Remap markers after batch silence removal.
///
/// `ranges` are padded, clamped to `[0, duration]` and merged exactly as
/// the edit itself does, then applied as successive cuts in ascending
/// order.  Each cut is expressed in the already-shortened timeline, so the
/// shift accumulates.
pub fn after_removing_silence(
    markers: &[Marker],
    ranges: &[SilenceInterval],
    padding: f64,
    duration: f64,
) -> Vec<Marker> {
    let mut out = markers.to_vec();
    let mut shift = 0.0;
    for range in pad_and_merge(ranges, padding, duration) {
        out = after_cut(&out, range.start - shift, range.end - shift);
        shift += range.duration();
    }
    sort_markers(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(markers: &[Marker]) -> Vec<f64> {
        markers.iter().map(|m| m.time).collect()
    }

    fn approx_times(markers: &[Marker], expected: &[f64]) {
        assert_eq!(markers.len(), expected.len(), "{:?}", times(markers));
        for (m, e) in markers.iter().zip(expected) {
            assert!((m.time - e).abs() < 1e-9, "{:?} vs {expected:?}", times(markers));
        }
    }

    fn at(ts: &[f64]) -> Vec<Marker> {
        ts.iter().map(|&t| Marker::new(t)).collect()
    }

    #[test]
    fn new_markers_have_distinct_ids() {
        assert_ne!(Marker::new(1.0).id, Marker::new(1.0).id);
    }

    #[test]
    fn sort_orders_by_time() {
        let mut m = at(&[3.0, 1.0, 2.0]);
        sort_markers(&mut m);
        assert_eq!(times(&m), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn trim_drops_outside_and_shifts() {
        let out = after_trim(&at(&[0.5, 1.0, 2.5, 4.0, 4.5]), 1.0, 4.0);
        approx_times(&out, &[0.0, 1.5, 3.0]);
        assert!(out.iter().all(|m| m.time >= 0.0 && m.time <= 3.0));
    }

    #[test]
    fn trim_keeps_identity() {
        let before = at(&[2.0]);
        let after = after_trim(&before, 1.0, 3.0);
        assert_eq!(after[0].id, before[0].id);
    }

    #[test]
    fn cut_drops_inside_and_shifts_later() {
        let out = after_cut(&at(&[1.0, 2.0, 2.5, 3.0, 5.0]), 2.0, 3.0);
        // 2.0 is on the start boundary → dropped; 3.0 lands on the splice.
        approx_times(&out, &[1.0, 2.0, 4.0]);
    }

    #[test]
    fn cut_preserves_relative_order() {
        let before = at(&[0.2, 0.4, 4.0, 6.0, 8.0]);
        let after = after_cut(&before, 1.0, 3.0);
        let ids: Vec<_> = after.iter().map(|m| m.id).collect();
        let expected: Vec<_> = before.iter().map(|m| m.id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn empty_cut_is_identity() {
        let before = at(&[1.0, 2.0]);
        assert_eq!(after_cut(&before, 1.5, 1.5), before);
    }

    #[test]
    fn removing_no_silence_is_identity() {
        let before = at(&[0.0, 3.3, 7.1]);
        assert_eq!(after_removing_silence(&before, &[], 0.05, 10.0), before);
    }

    #[test]
    fn removing_silence_accumulates_shift() {
        let ranges = [SilenceInterval::new(2.0, 3.0), SilenceInterval::new(6.0, 6.6)];
        let out = after_removing_silence(&at(&[1.0, 2.5, 4.0, 6.3, 9.0]), &ranges, 0.05, 10.0);
        // Removed [1.95, 3.05) and [5.95, 6.65): 1.1 s then 0.7 s.
        approx_times(&out, &[1.0, 2.9, 7.2]);
    }

    #[test]
    fn marker_at_end_survives_trailing_silence() {
        // Padding is clamped at the file end, so [8.95, 10.0) is removed
        // and the end marker lands on the new end.
        let ranges = [SilenceInterval::new(9.0, 10.0)];
        let out = after_removing_silence(&at(&[5.0, 9.5, 10.0]), &ranges, 0.05, 10.0);
        approx_times(&out, &[5.0, 8.95]);
    }

    #[test]
    fn removing_silence_merges_overlapping_padding() {
        let ranges = [SilenceInterval::new(1.0, 2.0), SilenceInterval::new(2.05, 3.0)];
        let out = after_removing_silence(&at(&[2.02, 5.0]), &ranges, 0.05, 10.0);
        // One merged cut [0.95, 3.05).
        approx_times(&out, &[2.9]);
    }
}

//! Time ranges and the padding/merging rule shared by silence removal and
//! marker remapping.

use serde::{Deserialize, Serialize};

use crate::silence::SilenceInterval;

/// A span of the timeline in seconds, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length in seconds; never negative.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }
}

impl From<SilenceInterval> for TimeRange {
    fn from(interval: SilenceInterval) -> Self {
        Self::new(interval.start, interval.end)
    }
}

/// Expand each range outward by `padding` seconds, clamp to `[0, duration]`
/// and merge whatever ends up overlapping or touching.
///
/// The result is sorted ascending and non-overlapping, which is what
/// [`AudioCodec::write_with_ranges_removed`](crate::audio::AudioCodec::write_with_ranges_removed)
/// expects.  Ranges that are empty after clamping are dropped.
///
/// Pass `f64::INFINITY` as `duration` when the upper bound is irrelevant.
///
/// ```rust
/// use recording_editor::edit::{pad_and_merge, TimeRange};
///
/// let merged = pad_and_merge(
///     &[TimeRange::new(1.0, 1.5), TimeRange::new(1.55, 2.0)],
///     0.05,
///     10.0,
/// );
/// assert_eq!(merged.len(), 1);
/// assert!((merged[0].start - 0.95).abs() < 1e-9);
/// assert!((merged[0].end - 2.05).abs() < 1e-9);
/// ```
pub fn pad_and_merge<R>(ranges: &[R], padding: f64, duration: f64) -> Vec<TimeRange>
where
    R: Copy + Into<TimeRange>,
{
    let padding = padding.max(0.0);
    let mut padded: Vec<TimeRange> = ranges
        .iter()
        .map(|&r| {
            let r: TimeRange = r.into();
            TimeRange::new((r.start - padding).max(0.0), (r.end + padding).min(duration))
        })
        .filter(|r| r.end > r.start)
        .collect();

    padded.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<TimeRange> = Vec::with_capacity(padded.len());
    for range in padded {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

/// Sum of the lengths of `ranges`.
pub fn total_duration(ranges: &[TimeRange]) -> f64 {
    ranges.iter().map(TimeRange::duration).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn pads_both_sides() {
        let out = pad_and_merge(&[SilenceInterval::new(2.0, 3.0)], 0.05, 10.0);
        assert_eq!(out.len(), 1);
        assert!(approx(out[0].start, 1.95));
        assert!(approx(out[0].end, 3.05));
    }

    #[test]
    fn clamps_to_file_bounds() {
        let out = pad_and_merge(
            &[TimeRange::new(0.0, 0.5), TimeRange::new(9.8, 10.0)],
            0.05,
            10.0,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].start, 0.0);
        assert!(approx(out[0].end, 0.55));
        assert!(approx(out[1].start, 9.75));
        assert_eq!(out[1].end, 10.0);
    }

    #[test]
    fn overlapping_after_padding_are_merged() {
        let out = pad_and_merge(
            &[TimeRange::new(4.0, 4.5), TimeRange::new(1.0, 2.0), TimeRange::new(2.08, 3.0)],
            0.05,
            10.0,
        );
        assert_eq!(out.len(), 2);
        assert!(approx(out[0].start, 0.95));
        assert!(approx(out[0].end, 3.05));
        assert!(approx(out[1].start, 3.95));
    }

    #[test]
    fn empty_and_degenerate_inputs() {
        assert!(pad_and_merge::<TimeRange>(&[], 0.05, 10.0).is_empty());
        // Entirely past the end of the file
        assert!(pad_and_merge(&[TimeRange::new(12.0, 13.0)], 0.05, 10.0).is_empty());
    }

    #[test]
    fn negative_padding_is_treated_as_zero() {
        let out = pad_and_merge(&[TimeRange::new(1.0, 2.0)], -1.0, 10.0);
        assert_eq!(out, vec![TimeRange::new(1.0, 2.0)]);
    }

    #[test]
    fn total_duration_sums() {
        let total = total_duration(&[TimeRange::new(0.0, 1.0), TimeRange::new(2.0, 2.5)]);
        assert!(approx(total, 1.5));
    }

    #[test]
    fn contains_is_half_open() {
        let r = TimeRange::new(1.0, 2.0);
        assert!(r.contains(1.0));
        assert!(!r.contains(2.0));
    }
}

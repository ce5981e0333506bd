//! Read-only queries against a [`WaveformPyramid`].
//!
//! Both query shapes pick the *cheapest sufficient* level: the coarsest
//! level whose stored rate still meets what the view needs.  When no level
//! is fine enough, level 0 is used.
//!
//! ```text
//! level_for_zoom(zoom, width) ──▶ (level index, stored points)
//! slice(start, end, count)    ──▶ exactly `count` points for start..end
//! ```

use super::pyramid::WaveformPyramid;
use crate::audio::resample;

/// Target of ~2 pixels per stored point when choosing a zoom level.
pub const IDEAL_SAMPLES_PER_POINT: f64 = 0.5;

impl WaveformPyramid {
    /// Choose the level to draw when the whole recording is shown at `zoom`
    /// in a view `view_width_points` wide.
    ///
    /// Uses [`IDEAL_SAMPLES_PER_POINT`]; see
    /// [`level_for_zoom_with`](Self::level_for_zoom_with).
    pub fn level_for_zoom(&self, zoom: f64, view_width_points: f64) -> (usize, &[f32]) {
        self.level_for_zoom_with(zoom, view_width_points, IDEAL_SAMPLES_PER_POINT)
    }

    /// Choose a zoom level with an explicit points-per-pixel target.
    ///
    /// `visible = duration / zoom`; the view needs
    /// `(view_width_points / ideal_samples_per_point) / visible` points per
    /// second.  A non-positive `zoom` is treated as `1.0`.
    pub fn level_for_zoom_with(
        &self,
        zoom: f64,
        view_width_points: f64,
        ideal_samples_per_point: f64,
    ) -> (usize, &[f32]) {
        let zoom = if zoom > 0.0 { zoom } else { 1.0 };
        let visible = self.duration_seconds() / zoom;
        let needed = if visible > 0.0 && ideal_samples_per_point > 0.0 {
            (view_width_points.max(0.0) / ideal_samples_per_point) / visible
        } else {
            0.0
        };

        let level = self.coarsest_level_meeting(needed);
        log::trace!("waveform: zoom {zoom:.2} needs {needed:.1} pts/s → level {level}");
        (level, self.level(level))
    }

    /// Exactly `target_count` points covering `start_time..end_time` seconds.
    ///
    /// The range is clamped to the recording.  Degenerate requests (no
    /// points wanted, zero duration, empty range) return an empty vector.
    pub fn slice(&self, start_time: f64, end_time: f64, target_count: usize) -> Vec<f32> {
        let duration = self.duration_seconds();
        if target_count == 0 || self.level_count() == 0 || !(duration > 0.0) {
            return Vec::new();
        }

        let start = start_time.clamp(0.0, duration);
        let end = end_time.clamp(0.0, duration);
        if end <= start {
            return Vec::new();
        }

        let level = self.coarsest_level_meeting(target_count as f64 / (end - start));
        let points = self.level(level);
        let rate = points.len() as f64 / duration;

        let first = ((start * rate).floor() as usize).min(points.len() - 1);
        let last = ((end * rate).ceil() as usize).clamp(first + 1, points.len());

        resample(&points[first..last], target_count)
    }

    /// Coarsest level storing at least `points_per_second`; level 0 if none.
    fn coarsest_level_meeting(&self, points_per_second: f64) -> usize {
        (0..self.level_count())
            .rev()
            .find(|&level| self.samples_per_second(level) >= points_per_second)
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn pyramid(secs: f64) -> WaveformPyramid {
        let rate = 2_000.0;
        let n = (secs * rate) as usize;
        let audio: Vec<f32> = (0..n).map(|i| ((i % 50) as f32 / 50.0) - 0.5).collect();
        WaveformPyramid::build(&audio, secs, rate).unwrap()
    }

    #[test]
    fn sixty_second_clip_at_unit_zoom_uses_coarsest_level() {
        // 300 pt view → (300 / 0.5) / 60 = 10 pts/s; level 5 stores 31/s.
        let p = pyramid(60.0);
        let (level, points) = p.level_for_zoom(1.0, 300.0);
        assert_eq!(level, 5);
        assert_eq!(points.len(), 1_860);
    }

    #[test]
    fn deep_zoom_moves_to_finer_levels() {
        let p = pyramid(60.0);
        // zoom 20 → 3 s visible → 200 pts/s → level 2 (250/s)
        assert_eq!(p.level_for_zoom(20.0, 300.0).0, 2);
        // zoom 100 → 0.6 s visible → 1000 pts/s → level 0
        assert_eq!(p.level_for_zoom(100.0, 300.0).0, 0);
    }

    #[test]
    fn zoom_beyond_finest_falls_back_to_level_zero() {
        let p = pyramid(10.0);
        assert_eq!(p.level_for_zoom(1_000.0, 1_200.0).0, 0);
    }

    #[test]
    fn non_positive_zoom_treated_as_unit() {
        let p = pyramid(60.0);
        assert_eq!(p.level_for_zoom(0.0, 300.0), p.level_for_zoom(1.0, 300.0));
    }

    #[test]
    fn slice_returns_exact_count() {
        let p = pyramid(60.0);
        for count in [1, 64, 100, 1_000, 2_500] {
            assert_eq!(p.slice(10.0, 20.0, count).len(), count);
        }
    }

    #[test]
    fn slice_clamps_to_recording() {
        let p = pyramid(5.0);
        let clamped = p.slice(-3.0, 50.0, 40);
        let whole = p.slice(0.0, 5.0, 40);
        assert_eq!(clamped, whole);
    }

    #[test]
    fn slice_values_in_unit_range() {
        let p = pyramid(8.0);
        assert!(p.slice(1.0, 7.5, 333).iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn degenerate_slices_are_empty() {
        let p = pyramid(5.0);
        assert!(p.slice(1.0, 2.0, 0).is_empty());
        assert!(p.slice(3.0, 3.0, 10).is_empty());
        assert!(p.slice(4.0, 2.0, 10).is_empty());
        assert!(p.slice(7.0, 9.0, 10).is_empty());
    }
}

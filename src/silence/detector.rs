//! Windowed RMS silence detection.
//!
//! ## Algorithm
//!
//! Audio is split into non-overlapping 10 ms windows.  A window is *silent*
//! when its RMS is strictly below the linear threshold
//! `10^(threshold_db / 20)`; a window exactly at the threshold is not
//! silent.  Consecutive silent windows form a run, and a run is reported
//! only if it lasts at least `min_duration_secs`.  A run still open when
//! the audio ends is closed at the end of the audio under the same rule.
//!
//! Output intervals are sorted and non-overlapping by construction.

use serde::{Deserialize, Serialize};

use crate::config::SilenceConfig;

/// Window length used for RMS analysis.
pub const WINDOW_SECS: f64 = 0.01;

// ---------------------------------------------------------------------------
// SilenceInterval
// ---------------------------------------------------------------------------

/// A stretch of silence, `start..end` seconds, `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilenceInterval {
    pub start: f64,
    pub end: f64,
}

impl SilenceInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Sum of the durations of `intervals`.
pub fn total_silence(intervals: &[SilenceInterval]) -> f64 {
    intervals.iter().map(SilenceInterval::duration).sum()
}

// ---------------------------------------------------------------------------
// SilenceDetector
// ---------------------------------------------------------------------------

/// RMS-threshold silence detector.
///
/// # Example
///
/// ```rust
/// use recording_editor::silence::SilenceDetector;
///
/// // 1 s of tone, 1 s of silence, 1 s of tone at 8 kHz
/// let mut audio: Vec<f32> = (0..8_000).map(|i| 0.5 * (i as f32 * 0.3).sin()).collect();
/// audio.extend(vec![0.0_f32; 8_000]);
/// audio.extend((0..8_000).map(|i| 0.5 * (i as f32 * 0.3).sin()));
///
/// let found = SilenceDetector::generic().detect(&audio, 8_000);
/// assert_eq!(found.len(), 1);
/// assert!((found[0].start - 1.0).abs() < 0.011);
/// assert!((found[0].end - 2.0).abs() < 0.011);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceDetector {
    threshold_db: f64,
    min_duration_secs: f64,
}

impl SilenceDetector {
    /// Threshold used for general-purpose detection.
    pub const GENERIC_THRESHOLD_DB: f64 = -40.0;
    /// Shortest silence reported by general-purpose detection.
    pub const GENERIC_MIN_DURATION_SECS: f64 = 0.25;
    /// Threshold used when highlighting silence in the editor.
    pub const HIGHLIGHT_THRESHOLD_DB: f64 = -45.0;
    /// Shortest silence highlighted in the editor.
    pub const HIGHLIGHT_MIN_DURATION_SECS: f64 = 0.5;

    pub fn new(threshold_db: f64, min_duration_secs: f64) -> Self {
        Self {
            threshold_db,
            min_duration_secs: min_duration_secs.max(0.0),
        }
    }

    /// −40 dBFS, 0.25 s.
    pub fn generic() -> Self {
        Self::new(Self::GENERIC_THRESHOLD_DB, Self::GENERIC_MIN_DURATION_SECS)
    }

    /// −45 dBFS, 0.5 s, the editor's "highlight silent parts" setting.
    pub fn highlight() -> Self {
        Self::new(
            Self::HIGHLIGHT_THRESHOLD_DB,
            Self::HIGHLIGHT_MIN_DURATION_SECS,
        )
    }

    /// Generic detector with thresholds taken from configuration.
    pub fn from_config(config: &SilenceConfig) -> Self {
        Self::new(config.threshold_db, config.min_duration_secs)
    }

    /// Highlighting detector with thresholds taken from configuration.
    pub fn highlight_from_config(config: &SilenceConfig) -> Self {
        Self::new(
            config.highlight_threshold_db,
            config.highlight_min_duration_secs,
        )
    }

    pub fn threshold_db(&self) -> f64 {
        self.threshold_db
    }

    pub fn min_duration_secs(&self) -> f64 {
        self.min_duration_secs
    }

    /// Threshold as a linear amplitude.
    pub fn threshold_linear(&self) -> f64 {
        10f64.powf(self.threshold_db / 20.0)
    }

    /// Find every silence of at least `min_duration_secs` in mono `samples`.
    ///
    /// Empty input or a zero sample rate yields no intervals.
    pub fn detect(&self, samples: &[f32], sample_rate: u32) -> Vec<SilenceInterval> {
        if samples.is_empty() || sample_rate == 0 {
            return Vec::new();
        }

        let rate = f64::from(sample_rate);
        let window = ((rate * WINDOW_SECS).round() as usize).max(1);
        let threshold = self.threshold_linear();

        let mut found = Vec::new();
        let mut run_start: Option<f64> = None;

        for (i, chunk) in samples.chunks(window).enumerate() {
            let time = (i * window) as f64 / rate;
            if rms(chunk) < threshold {
                run_start.get_or_insert(time);
            } else if let Some(start) = run_start.take() {
                self.close_run(&mut found, start, time);
            }
        }

        if let Some(start) = run_start {
            self.close_run(&mut found, start, samples.len() as f64 / rate);
        }

        log::debug!(
            "silence: {} interval(s) at {:.1} dB / {:.2} s over {:.2} s of audio",
            found.len(),
            self.threshold_db,
            self.min_duration_secs,
            samples.len() as f64 / rate
        );
        found
    }

    fn close_run(&self, found: &mut Vec<SilenceInterval>, start: f64, end: f64) {
        if end > start && end - start >= self.min_duration_secs {
            found.push(SilenceInterval::new(start, end));
        }
    }
}

impl Default for SilenceDetector {
    fn default() -> Self {
        Self::generic()
    }
}

/// One-shot form of [`SilenceDetector::detect`].
pub fn detect_silence(
    samples: &[f32],
    sample_rate: u32,
    threshold_db: f64,
    min_duration_secs: f64,
) -> Vec<SilenceInterval> {
    SilenceDetector::new(threshold_db, min_duration_secs).detect(samples, sample_rate)
}

fn rms(chunk: &[f32]) -> f64 {
    let mean_sq =
        chunk.iter().map(|&s| f64::from(s) * f64::from(s)).sum::<f64>() / chunk.len() as f64;
    mean_sq.sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16_000;

    /// `secs` of 440 Hz tone with the given silent gaps (amplitude 0).
    fn signal(secs: f64, gaps: &[(f64, f64)]) -> Vec<f32> {
        let n = (secs * RATE as f64).round() as usize;
        (0..n)
            .map(|i| {
                let t = i as f64 / RATE as f64;
                if gaps.iter().any(|&(s, e)| t >= s && t < e) {
                    0.0
                } else {
                    0.5 * (2.0 * std::f64::consts::PI * 440.0 * t).sin() as f32
                }
            })
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn two_gaps_at_highlight_length() {
        let audio = signal(10.0, &[(2.0, 3.0), (6.0, 6.6)]);
        let found = detect_silence(&audio, RATE, -40.0, 0.5);

        assert_eq!(found.len(), 2, "{found:?}");
        assert!(approx(found[0].start, 2.0) && approx(found[0].end, 3.0));
        assert!(approx(found[1].start, 6.0) && approx(found[1].end, 6.6));
    }

    #[test]
    fn short_gaps_are_filtered() {
        let audio = signal(4.0, &[(1.0, 1.2), (2.0, 2.5)]);
        let found = SilenceDetector::generic().detect(&audio, RATE);
        assert_eq!(found.len(), 1);
        assert!(approx(found[0].start, 2.0));
    }

    #[test]
    fn output_is_sorted_disjoint_and_long_enough() {
        let audio = signal(12.0, &[(0.5, 0.8), (1.0, 1.1), (3.0, 4.5), (7.0, 7.3), (9.0, 9.9)]);
        let min = 0.25;
        let found = detect_silence(&audio, RATE, -40.0, min);
        assert_eq!(found.len(), 4);
        for w in found.windows(2) {
            assert!(w[0].end <= w[1].start);
        }
        assert!(found.iter().all(|i| i.duration() >= min && i.end > i.start));
    }

    #[test]
    fn trailing_silence_closes_at_end_of_audio() {
        let audio = signal(3.0, &[(2.0, 3.0)]);
        let found = SilenceDetector::generic().detect(&audio, RATE);
        assert_eq!(found.len(), 1);
        assert!(approx(found[0].end, 3.0));
    }

    #[test]
    fn short_trailing_silence_is_dropped() {
        let audio = signal(3.0, &[(2.9, 3.0)]);
        assert!(SilenceDetector::generic().detect(&audio, RATE).is_empty());
    }

    #[test]
    fn window_exactly_at_threshold_is_not_silent() {
        // 0 dBFS → linear 1.0; a constant full-scale signal has RMS 1.0.
        let audio = vec![1.0_f32; RATE as usize];
        assert!(detect_silence(&audio, RATE, 0.0, 0.0).is_empty());

        let just_below = vec![0.999_f32; RATE as usize];
        assert_eq!(detect_silence(&just_below, RATE, 0.0, 0.0).len(), 1);
    }

    #[test]
    fn threshold_conversion() {
        let d = SilenceDetector::new(-40.0, 0.25);
        assert!((d.threshold_linear() - 0.01).abs() < 1e-12);
        assert!((SilenceDetector::new(0.0, 0.0).threshold_linear() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_input_is_empty_result() {
        assert!(SilenceDetector::generic().detect(&[], RATE).is_empty());
        assert!(SilenceDetector::generic().detect(&[0.0; 100], 0).is_empty());
    }

    #[test]
    fn presets() {
        assert_eq!(SilenceDetector::default(), SilenceDetector::new(-40.0, 0.25));
        let h = SilenceDetector::highlight();
        assert_eq!(h.threshold_db(), -45.0);
        assert_eq!(h.min_duration_secs(), 0.5);
    }

    #[test]
    fn total_silence_sums_durations() {
        let found = [SilenceInterval::new(1.0, 1.5), SilenceInterval::new(2.0, 4.0)];
        assert!(approx(total_silence(&found), 2.5));
    }
}

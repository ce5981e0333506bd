//! Multi-resolution peak pyramid for waveform rendering.
//!
//! A [`WaveformPyramid`] stores the same recording at six levels of detail.
//! Level 0 holds ~1000 peak points per second of audio; each following level
//! halves that rate:
//!
//! | Level | Points / second |
//! |-------|-----------------|
//! | 0     | 1000            |
//! | 1     | 500             |
//! | 2     | 250             |
//! | 3     | 125             |
//! | 4     | 62              |
//! | 5     | 31              |
//!
//! Each level is normalised on its own so its loudest bucket reads `1.0`.
//! Levels whose peak is below [`NORMALIZE_FLOOR`] are left raw so a silent
//! recording does not render as full-scale noise.
//!
//! # Example
//!
//! ```rust
//! use recording_editor::waveform::WaveformPyramid;
//!
//! // 2 seconds of a quiet ramp at 8 kHz
//! let audio: Vec<f32> = (0..16_000).map(|i| i as f32 / 16_000.0 * 0.3).collect();
//! let pyramid = WaveformPyramid::build(&audio, 2.0, 8_000.0).unwrap();
//!
//! assert_eq!(pyramid.level_count(), 6);
//! assert_eq!(pyramid.level(0).len(), 2_000);
//! assert_eq!(pyramid.level(5).len(), 62);
//! assert!(pyramid.level(0).iter().all(|&v| (0.0..=1.0).contains(&v)));
//! ```

use crate::audio::{peak_buckets, AnalysisError, DecodedAudio};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of detail levels in every pyramid.
pub const LEVEL_COUNT: usize = 6;

/// Points per second stored at level 0.
pub const FINEST_POINTS_PER_SECOND: u32 = 1_000;

/// Levels whose loudest bucket is below this are not normalised.
pub const NORMALIZE_FLOOR: f32 = 0.001;

/// Nominal points per second stored at `level` (`1000 >> level`).
pub fn level_points_per_second(level: usize) -> u32 {
    FINEST_POINTS_PER_SECOND >> level
}

// ---------------------------------------------------------------------------
// WaveformPyramid
// ---------------------------------------------------------------------------

/// Immutable stack of peak-amplitude levels for one audio file.
///
/// Built once per file; an edit that rewrites the file produces a new
/// pyramid rather than mutating this one.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformPyramid {
    levels: Vec<Vec<f32>>,
    duration_seconds: f64,
    source_sample_rate: f64,
}

impl WaveformPyramid {
    /// Build all levels from raw mono `samples`.
    ///
    /// Every level has `max(1, round(duration_seconds * points_per_second))`
    /// points; each point is the peak absolute amplitude of its bucket of
    /// raw samples.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::EmptyAudio`] when `duration_seconds <= 0` or
    /// `samples` is empty.
    pub fn build(
        samples: &[f32],
        duration_seconds: f64,
        source_sample_rate: f64,
    ) -> Result<Self, AnalysisError> {
        if samples.is_empty() || !(duration_seconds > 0.0) {
            return Err(AnalysisError::EmptyAudio);
        }

        let levels = (0..LEVEL_COUNT)
            .map(|level| {
                let pps = f64::from(level_points_per_second(level));
                let count = ((duration_seconds * pps).round() as usize).max(1);
                let mut peaks = peak_buckets(samples, count);
                normalize(&mut peaks);
                peaks
            })
            .collect();

        Ok(Self {
            levels,
            duration_seconds,
            source_sample_rate,
        })
    }

    /// Build from the output of an [`AudioCodec`](crate::audio::AudioCodec).
    pub fn from_decoded(audio: &DecodedAudio) -> Result<Self, AnalysisError> {
        Self::build(
            &audio.samples,
            audio.duration_seconds(),
            f64::from(audio.sample_rate),
        )
    }

    pub fn levels(&self) -> &[Vec<f32>] {
        &self.levels
    }

    /// Points stored at `level`.
    ///
    /// # Panics
    ///
    /// Panics if `level >= LEVEL_COUNT`.
    pub fn level(&self, level: usize) -> &[f32] {
        &self.levels[level]
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn source_sample_rate(&self) -> f64 {
        self.source_sample_rate
    }

    /// Actual points per second stored at `level` (count / duration).
    ///
    /// Differs slightly from [`level_points_per_second`] because of rounding
    /// the point count.
    pub fn samples_per_second(&self, level: usize) -> f64 {
        self.levels[level].len() as f64 / self.duration_seconds
    }
}

/// Scale `peaks` so the loudest is `1.0`, unless it is below the noise floor.
fn normalize(peaks: &mut [f32]) {
    let max = peaks.iter().cloned().fold(0.0_f32, f32::max);
    if max < NORMALIZE_FLOOR {
        return;
    }
    for p in peaks.iter_mut() {
        *p = (*p / max).min(1.0);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

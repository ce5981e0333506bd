//! Length resampling and channel mixing utilities.
//!
//! Waveform rendering never needs audio-rate resampling; it needs a sequence
//! of *N* values stretched or squeezed to exactly *M* display points.  This
//! module provides the two conversion steps used across the crate:
//!
//! 1. [`downmix_to_mono`]: average any number of interleaved channels.
//! 2. [`resample`]: change the length of a value sequence, interpolating
//!    when stretching and keeping per-bucket peaks when squeezing.
//!
//! ## Bucket boundaries
//!
//! [`peak_buckets`] splits its input on floating-point boundaries
//! (`i * len / count`) and the last bucket always ends at `len`.  Naive
//! `len / count` integer chunking silently drops the trailing remainder;
//! the waveform pyramid relies on the same helper so the tail of a
//! recording is always represented.

// ---------------------------------------------------------------------------
// downmix_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// The output length is `samples.len() / channels`.
///
/// * If `channels == 1` the input slice is returned as an owned `Vec`.
/// * If `channels == 0` an empty vector is returned.
///
/// # Example
///
/// ```rust
/// use recording_editor::audio::downmix_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, 0.4]; // L R L R
/// let mono = downmix_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[0] - 0.0).abs() < 1e-6);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// peak_buckets
// ---------------------------------------------------------------------------

/// Reduce `samples` to `count` values, each the peak absolute amplitude of a
/// contiguous bucket.
///
/// Bucket `i` spans `floor(i * len / count) .. floor((i + 1) * len / count)`,
/// and the final bucket is pinned to end at `len`.  When `count > len` some
/// buckets would be empty; those take the single sample at their start
/// position so every output point still reflects real audio.
///
/// Returns an empty vector when `samples` is empty or `count == 0`.
pub fn peak_buckets(samples: &[f32], count: usize) -> Vec<f32> {
    if samples.is_empty() || count == 0 {
        return Vec::new();
    }

    let len = samples.len();
    let bucket = len as f64 / count as f64;

    (0..count)
        .map(|i| {
            let start = ((i as f64 * bucket).floor() as usize).min(len - 1);
            let end = if i + 1 == count {
                len
            } else {
                (((i + 1) as f64 * bucket).floor() as usize).min(len)
            };
            let end = end.max(start + 1);

            samples[start..end]
                .iter()
                .fold(0.0_f32, |peak, s| peak.max(s.abs()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Resample `values` to exactly `target_count` points.
///
/// * Empty input, or `target_count == 0` → empty output.
/// * `target_count == values.len()` → the input, unchanged.
/// * Upsampling → linear interpolation at fractional source position
///   `i * (len - 1) / max(1, target_count - 1)`.
/// * Downsampling → peak absolute value per bucket (see [`peak_buckets`]),
///   so transients stay visible at low zoom.
///
/// # Example
///
/// ```rust
/// use recording_editor::audio::resample;
///
/// // Squeeze: the single spike survives
/// let mut spiky = vec![0.1_f32; 100];
/// spiky[57] = -0.9;
/// let out = resample(&spiky, 10);
/// assert_eq!(out.len(), 10);
/// assert!((out[5] - 0.9).abs() < 1e-6);
///
/// // Stretch: interpolated between neighbours
/// let up = resample(&[0.0, 1.0], 3);
/// assert_eq!(up, vec![0.0, 0.5, 1.0]);
/// ```
pub fn resample(values: &[f32], target_count: usize) -> Vec<f32> {
    if values.is_empty() || target_count == 0 {
        return Vec::new();
    }

    let len = values.len();
    if target_count == len {
        return values.to_vec();
    }

    if len > target_count {
        return peak_buckets(values, target_count);
    }

    let last = len - 1;
    let step = last as f64 / (target_count - 1).max(1) as f64;

    (0..target_count)
        .map(|i| {
            let pos = i as f64 * step;
            let lo = (pos.floor() as usize).min(last);
            let hi = (pos.ceil() as usize).min(last);
            let frac = (pos - lo as f64) as f32;
            values[lo] + (values[hi] - values[lo]) * frac
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

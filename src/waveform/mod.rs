//! Waveform level-of-detail pyramid and its query service.
//!
//! # Quick start
//!
//! ```rust
//! use recording_editor::waveform::WaveformPyramid;
//!
//! let audio = vec![0.25_f32; 8_000 * 60];
//! let pyramid = WaveformPyramid::build(&audio, 60.0, 8_000.0).unwrap();
//!
//! // Overview: whole clip in a 300 pt wide strip
//! let (level, points) = pyramid.level_for_zoom(1.0, 300.0);
//! assert_eq!(level, 5);
//! assert!(!points.is_empty());
//!
//! // Editing: 120 points for seconds 12..15
//! assert_eq!(pyramid.slice(12.0, 15.0, 120).len(), 120);
//! ```

pub mod pyramid;
pub mod query;

pub use pyramid::{
    level_points_per_second, WaveformPyramid, FINEST_POINTS_PER_SECOND, LEVEL_COUNT,
    NORMALIZE_FLOOR,
};
pub use query::IDEAL_SAMPLES_PER_POINT;

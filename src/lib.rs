//! Audio analysis and editing engine for recorded audio files.
//!
//! * [`audio`]: resampling, mono downmix and the codec boundary.
//! * [`waveform`]: multi-resolution waveform pyramid and its queries.
//! * [`silence`]: RMS silence detection and selectable results.
//! * [`edit`]: trim / cut / silence removal, marker remapping, undo/redo.
//! * [`cache`]: single-flight cache of analysis results.
//! * [`config`]: settings and platform paths.

pub mod audio;
pub mod cache;
pub mod config;
pub mod edit;
pub mod silence;
pub mod waveform;

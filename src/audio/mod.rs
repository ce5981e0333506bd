//! Audio plumbing: decoding, rewriting and length resampling.
//!
//! # Pipeline
//!
//! ```text
//! file ──AudioCodec::decode_mono──▶ DecodedAudio ──▶ waveform / silence analysis
//! file ──AudioCodec::write_*──────▶ new file      ──▶ CurrentAudio::Pending
//! ```
//!
//! [`resample`] and [`peak_buckets`] are the shared numeric kernels used by
//! the waveform pyramid and its query service.

pub mod codec;
pub mod resample;
pub mod source;

pub use codec::{AnalysisError, AudioCodec, CodecError, DecodedAudio, WavCodec};
pub use resample::{downmix_to_mono, peak_buckets, resample};
pub use source::CurrentAudio;

// test-only re-export so other modules' tests can share the codec double.
#[cfg(test)]
pub use codec::{MockCodec, MockWrite};

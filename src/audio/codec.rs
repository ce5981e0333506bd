//! Audio codec collaborator: decode for analysis, rewrite for edits.
//!
//! # Overview
//!
//! [`AudioCodec`] is the boundary between the analysis/editing core and the
//! container format.  It is object-safe and `Send + Sync` so it can be held
//! behind an `Arc<dyn AudioCodec>` and called from the blocking thread pool.
//!
//! [`WavCodec`] is the production implementation built on `hound`.  Rewrites
//! copy PCM frames verbatim into a fresh file, so no re-encoding takes place
//! and the source file is never touched.
//!
//! [`MockCodec`] (available under `#[cfg(test)]`) serves a synthetic signal
//! and records rewrite requests without touching the file system.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use thiserror::Error;
use uuid::Uuid;

use crate::audio::resample::downmix_to_mono;
use crate::edit::TimeRange;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures while turning a file into analysable samples.
///
/// These surface to whoever requested a waveform or silence scan; nothing
/// retries them internally.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    /// Zero duration or zero samples reached the analysis stage.
    #[error("audio is empty")]
    EmptyAudio,

    /// The file decoded but contained no sample frames.
    #[error("audio file contains no samples")]
    NoSamples,

    /// The file could not be opened or decoded.
    #[error("audio could not be decoded: {0}")]
    DecodeUnavailable(String),

    /// The blocking worker panicked or was cancelled.
    #[error("internal analysis error: {0}")]
    Internal(String),
}

/// Failures while writing an edited copy of a file.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// The requested time range does not select any frames.
    #[error("invalid range {start:.3}s..{end:.3}s for {duration:.3}s of audio")]
    InvalidRange { start: f64, end: f64, duration: f64 },

    /// Removing the requested ranges would leave no audio.
    #[error("edit would remove all audio")]
    NothingLeft,
}

// ---------------------------------------------------------------------------
// DecodedAudio
// ---------------------------------------------------------------------------

/// Mono samples decoded from a file, plus the rate they were recorded at.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

// ---------------------------------------------------------------------------
// AudioCodec trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to the audio container layer.
///
/// All methods block; async callers run them under
/// `tokio::task::spawn_blocking`.
///
/// # Contract
///
/// - `decode_mono` returns samples in `[-1.0, 1.0]`, reduced to one channel.
/// - Both rewrite methods leave `file` untouched and return the path of a
///   newly created file.  On error no output file is left behind.
/// - `ranges` passed to `write_with_ranges_removed` are sorted ascending and
///   non-overlapping.
pub trait AudioCodec: Send + Sync {
    fn decode_mono(&self, file: &Path) -> Result<DecodedAudio, AnalysisError>;

    /// Write a copy of `file` containing only `start..end` seconds.
    fn write_trimmed(&self, file: &Path, start: f64, end: f64) -> Result<PathBuf, CodecError>;

    /// Write a copy of `file` with every range in `ranges` spliced out.
    fn write_with_ranges_removed(
        &self,
        file: &Path,
        ranges: &[TimeRange],
    ) -> Result<PathBuf, CodecError>;
}

// Compile-time assertion: Box<dyn AudioCodec> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn AudioCodec>) {}
};

// ---------------------------------------------------------------------------
// WavCodec
// ---------------------------------------------------------------------------

/// `hound`-backed codec for PCM WAV files.
///
/// Edited copies are written to `output_dir` as `<stem>-<uuid>.wav`, keeping
/// the source's channel count, sample rate, bit depth and sample format.
#[derive(Debug, Clone)]
pub struct WavCodec {
    output_dir: PathBuf,
}

/// Half-open frame span `[start, end)`.
type FrameSpan = (u64, u64);

impl WavCodec {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn output_path(&self, source: &Path) -> Result<PathBuf, CodecError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("recording");
        Ok(self
            .output_dir
            .join(format!("{stem}-{}.wav", Uuid::new_v4().simple())))
    }

    /// Copy the frames inside `spans` (sorted, disjoint) into a new file.
    fn rewrite(
        &self,
        source: &Path,
        spans_for: impl FnOnce(u64, u32) -> Result<Vec<FrameSpan>, CodecError>,
    ) -> Result<PathBuf, CodecError> {
        let reader = WavReader::open(source)?;
        let spec = reader.spec();
        let spans = spans_for(u64::from(reader.duration()), spec.sample_rate)?;

        let out = self.output_path(source)?;
        let result = write_spans(reader, spec, &out, &spans);
        if result.is_err() {
            // Never leave a half-written file for a caller to adopt.
            let _ = std::fs::remove_file(&out);
        }
        result.map(|frames| {
            log::debug!(
                "wav: wrote {frames} frames from {} to {}",
                source.display(),
                out.display()
            );
            out
        })
    }
}

impl AudioCodec for WavCodec {
    fn decode_mono(&self, file: &Path) -> Result<DecodedAudio, AnalysisError> {
        let unavailable =
            |e: hound::Error| AnalysisError::DecodeUnavailable(format!("{}: {e}", file.display()));

        let reader = WavReader::open(file).map_err(unavailable)?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(unavailable)?,
            SampleFormat::Int => {
                if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                    return Err(AnalysisError::DecodeUnavailable(format!(
                        "{}: unsupported bit depth {}",
                        file.display(),
                        spec.bits_per_sample
                    )));
                }
                let max_val = (1u64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(unavailable)?
            }
        };

        let samples = downmix_to_mono(&interleaved, spec.channels);
        if samples.is_empty() {
            return Err(AnalysisError::NoSamples);
        }

        Ok(DecodedAudio {
            samples,
            sample_rate: spec.sample_rate,
        })
    }

    fn write_trimmed(&self, file: &Path, start: f64, end: f64) -> Result<PathBuf, CodecError> {
        self.rewrite(file, |total, rate| {
            let s = time_to_frame(start, rate, total);
            let e = time_to_frame(end, rate, total);
            if e <= s {
                return Err(CodecError::InvalidRange {
                    start,
                    end,
                    duration: total as f64 / rate.max(1) as f64,
                });
            }
            Ok(vec![(s, e)])
        })
    }

    fn write_with_ranges_removed(
        &self,
        file: &Path,
        ranges: &[TimeRange],
    ) -> Result<PathBuf, CodecError> {
        self.rewrite(file, |total, rate| {
            let mut kept = Vec::with_capacity(ranges.len() + 1);
            let mut cursor = 0u64;
            for range in ranges {
                let s = time_to_frame(range.start, rate, total);
                let e = time_to_frame(range.end, rate, total);
                if s > cursor {
                    kept.push((cursor, s));
                }
                cursor = cursor.max(e);
            }
            if cursor < total {
                kept.push((cursor, total));
            }
            if kept.is_empty() {
                return Err(CodecError::NothingLeft);
            }
            Ok(kept)
        })
    }
}

fn time_to_frame(seconds: f64, rate: u32, total: u64) -> u64 {
    let frame = (seconds.max(0.0) * rate as f64).round() as u64;
    frame.min(total)
}

fn write_spans<R: std::io::Read>(
    reader: WavReader<R>,
    spec: WavSpec,
    out: &Path,
    spans: &[FrameSpan],
) -> Result<u64, CodecError> {
    let mut writer = WavWriter::create(out, spec)?;
    let frames = match spec.sample_format {
        SampleFormat::Float => copy_spans::<f32, _>(reader, &mut writer, spec.channels, spans)?,
        SampleFormat::Int => copy_spans::<i32, _>(reader, &mut writer, spec.channels, spans)?,
    };
    writer.finalize()?;
    Ok(frames)
}

fn copy_spans<S: hound::Sample, R: std::io::Read>(
    reader: WavReader<R>,
    writer: &mut WavWriter<BufWriter<File>>,
    channels: u16,
    spans: &[FrameSpan],
) -> Result<u64, CodecError> {
    let channels = u64::from(channels.max(1));
    let mut span = 0usize;
    let mut written = 0u64;

    for (i, sample) in reader.into_samples::<S>().enumerate() {
        let sample = sample?;
        let frame = i as u64 / channels;
        while span < spans.len() && frame >= spans[span].1 {
            span += 1;
        }
        if span == spans.len() {
            break;
        }
        if frame >= spans[span].0 {
            writer.write_sample(sample)?;
            written += 1;
        }
    }

    Ok(written / channels)
}

// ---------------------------------------------------------------------------
// MockCodec  (test-only)
// ---------------------------------------------------------------------------

/// A test double serving a fixed mono signal for every path.
///
/// Rewrites return a fresh (non-existent) sibling path and are recorded so
/// tests can assert what the editor asked for.
#[cfg(test)]
pub struct MockCodec {
    audio: DecodedAudio,
    decode_delay: std::time::Duration,
    fail_decode: bool,
    fail_writes: bool,
    decode_calls: std::sync::atomic::AtomicUsize,
    active_decodes: std::sync::atomic::AtomicUsize,
    max_active_decodes: std::sync::atomic::AtomicUsize,
    writes: std::sync::Mutex<Vec<MockWrite>>,
}

/// One rewrite request seen by [`MockCodec`].
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum MockWrite {
    Trim { start: f64, end: f64 },
    Remove(Vec<TimeRange>),
}

#[cfg(test)]
impl MockCodec {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            audio: DecodedAudio {
                samples,
                sample_rate,
            },
            decode_delay: std::time::Duration::ZERO,
            fail_decode: false,
            fail_writes: false,
            decode_calls: std::sync::atomic::AtomicUsize::new(0),
            active_decodes: std::sync::atomic::AtomicUsize::new(0),
            max_active_decodes: std::sync::atomic::AtomicUsize::new(0),
            writes: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// `secs` seconds of a 440 Hz tone at amplitude 0.5.
    pub fn tone(secs: f64, sample_rate: u32) -> Self {
        let n = (secs * sample_rate as f64).round() as usize;
        let samples = (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                0.5 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
            })
            .collect();
        Self::new(samples, sample_rate)
    }

    pub fn with_decode_delay(mut self, delay: std::time::Duration) -> Self {
        self.decode_delay = delay;
        self
    }

    pub fn failing_decode(mut self) -> Self {
        self.fail_decode = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn decode_calls(&self) -> usize {
        self.decode_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Highest number of decodes that were running at the same time.
    pub fn max_concurrent_decodes(&self) -> usize {
        self.max_active_decodes
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<MockWrite> {
        self.writes.lock().unwrap().clone()
    }

    fn next_path(&self, file: &Path) -> Result<PathBuf, CodecError> {
        if self.fail_writes {
            return Err(CodecError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        let n = self.writes.lock().unwrap().len();
        let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("mock");
        Ok(file.with_file_name(format!("{stem}-edit{n}.wav")))
    }
}

#[cfg(test)]
impl AudioCodec for MockCodec {
    fn decode_mono(&self, _file: &Path) -> Result<DecodedAudio, AnalysisError> {
        use std::sync::atomic::Ordering;

        self.decode_calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active_decodes.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_decodes.fetch_max(active, Ordering::SeqCst);
        if !self.decode_delay.is_zero() {
            std::thread::sleep(self.decode_delay);
        }
        self.active_decodes.fetch_sub(1, Ordering::SeqCst);

        if self.fail_decode {
            return Err(AnalysisError::DecodeUnavailable("mock".into()));
        }
        if self.audio.samples.is_empty() {
            return Err(AnalysisError::NoSamples);
        }
        Ok(self.audio.clone())
    }

    fn write_trimmed(&self, file: &Path, start: f64, end: f64) -> Result<PathBuf, CodecError> {
        let path = self.next_path(file)?;
        self.writes
            .lock()
            .unwrap()
            .push(MockWrite::Trim { start, end });
        Ok(path)
    }

    fn write_with_ranges_removed(
        &self,
        file: &Path,
        ranges: &[TimeRange],
    ) -> Result<PathBuf, CodecError> {
        let path = self.next_path(file)?;
        self.writes
            .lock()
            .unwrap()
            .push(MockWrite::Remove(ranges.to_vec()));
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

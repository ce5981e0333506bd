//! Single-flight cache for waveform pyramids and silence scans.
//!
//! [`AnalysisCache`] is an explicit component: construct one at start-up,
//! wrap it in an `Arc` and hand it to every session that needs analysis
//! data.  Tests build their own isolated instances.
//!
//! # Per-key state machine
//!
//! ```text
//! Empty ──request──▶ Loading ──build ok──▶ Ready
//!                       │                    │
//!                       └──build failed──▶ Empty
//! Ready ──invalidate──▶ Empty ──request──▶ Loading …
//! ```
//!
//! While a key is `Loading`, further requests for it wait on the same build
//! instead of starting another.  Each key owns a `tokio::sync::OnceCell`
//! that outlives a failed build, so a retry (from a caller that was already
//! waiting or from a new one) also runs one at a time.  The std `Mutex`
//! around the key map is only held to look up or insert an entry and never
//! across an `.await`.
//!
//! Builds run as their own tokio task, so a caller that stops waiting does
//! not cancel the work: it finishes and fills the cache for the next caller.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OnceCell;

use crate::audio::{AnalysisError, AudioCodec};
use crate::silence::{SilenceDetector, SilenceInterval};
use crate::waveform::WaveformPyramid;

// ---------------------------------------------------------------------------
// EntryState
// ---------------------------------------------------------------------------

/// Observable state of one cache key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryState {
    /// Nothing cached and nothing in flight.
    #[default]
    Empty,
    /// A build is running; requests will join it.
    Loading,
    /// A finished result is cached.
    Ready,
}

impl EntryState {
    /// ```
    /// use recording_editor::cache::EntryState;
    ///
    /// assert!(EntryState::Ready.is_ready());
    /// assert!(!EntryState::Loading.is_ready());
    /// ```
    pub fn is_ready(&self) -> bool {
        matches!(self, EntryState::Ready)
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntryState::Empty => "Empty",
            EntryState::Loading => "Loading",
            EntryState::Ready => "Ready",
        }
    }
}

// ---------------------------------------------------------------------------
// Keys and slots
// ---------------------------------------------------------------------------

/// One key's build cell plus the number of requests currently inside it.
struct Entry<T> {
    cell: OnceCell<Arc<T>>,
    in_flight: AtomicUsize,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            cell: OnceCell::new(),
            in_flight: AtomicUsize::new(0),
        }
    }
}

type Slot<T> = Arc<Entry<T>>;
type SlotMap<K, T> = Mutex<HashMap<K, Slot<T>>>;

/// Silence results depend on the detection parameters as well as the file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SilenceKey {
    file: PathBuf,
    threshold_bits: u64,
    min_duration_bits: u64,
}

impl SilenceKey {
    fn new(file: &Path, detector: &SilenceDetector) -> Self {
        Self {
            file: file.to_path_buf(),
            threshold_bits: detector.threshold_db().to_bits(),
            min_duration_bits: detector.min_duration_secs().to_bits(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Entries are published whole, so a poisoned map is still consistent.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn state_of<T>(slot: Option<&Slot<T>>) -> EntryState {
    match slot {
        Some(entry) if entry.cell.initialized() => EntryState::Ready,
        Some(entry) if entry.in_flight.load(Ordering::SeqCst) > 0 => EntryState::Loading,
        _ => EntryState::Empty,
    }
}

// ---------------------------------------------------------------------------
// AnalysisCache
// ---------------------------------------------------------------------------

/// Get-or-build cache of analysis results keyed by file path.
///
/// ```rust,no_run
/// use std::path::Path;
/// use std::sync::Arc;
/// use recording_editor::audio::WavCodec;
/// use recording_editor::cache::AnalysisCache;
/// use recording_editor::silence::SilenceDetector;
///
/// # async fn example() -> Result<(), recording_editor::audio::AnalysisError> {
/// let cache = Arc::new(AnalysisCache::new(Arc::new(WavCodec::new("/tmp/edits"))));
/// let pyramid = cache.get_pyramid(Path::new("memo.wav")).await?;
/// let silences = cache
///     .get_silence(Path::new("memo.wav"), SilenceDetector::highlight())
///     .await?;
/// println!("{} levels, {} silent runs", pyramid.level_count(), silences.len());
/// # Ok(())
/// # }
/// ```
pub struct AnalysisCache {
    codec: Arc<dyn AudioCodec>,
    pyramids: SlotMap<PathBuf, WaveformPyramid>,
    silences: SlotMap<SilenceKey, Vec<SilenceInterval>>,
}

impl AnalysisCache {
    pub fn new(codec: Arc<dyn AudioCodec>) -> Self {
        Self {
            codec,
            pyramids: Mutex::new(HashMap::new()),
            silences: Mutex::new(HashMap::new()),
        }
    }

    // -----------------------------------------------------------------------
    // Get-or-build
    // -----------------------------------------------------------------------

    /// The waveform pyramid for `file`, decoding and building it on first
    /// use.  Concurrent callers share one build.
    pub async fn get_pyramid(&self, file: &Path) -> Result<Arc<WaveformPyramid>, AnalysisError> {
        let codec = Arc::clone(&self.codec);
        let path = file.to_path_buf();
        get_or_build(&self.pyramids, file.to_path_buf(), move || {
            let decoded = codec.decode_mono(&path)?;
            let pyramid = WaveformPyramid::from_decoded(&decoded)?;
            log::debug!(
                "cache: built {}-level pyramid for {} ({:.2}s)",
                pyramid.level_count(),
                path.display(),
                pyramid.duration_seconds()
            );
            Ok(pyramid)
        })
        .await
    }

    /// Silent intervals of `file` under `detector`'s parameters.
    pub async fn get_silence(
        &self,
        file: &Path,
        detector: SilenceDetector,
    ) -> Result<Arc<Vec<SilenceInterval>>, AnalysisError> {
        let codec = Arc::clone(&self.codec);
        let path = file.to_path_buf();
        get_or_build(&self.silences, SilenceKey::new(file, &detector), move || {
            let decoded = codec.decode_mono(&path)?;
            let found = detector.detect(&decoded.samples, decoded.sample_rate);
            log::debug!(
                "cache: {} silent runs in {} at {} dB",
                found.len(),
                path.display(),
                detector.threshold_db()
            );
            Ok(found)
        })
        .await
    }

    // -----------------------------------------------------------------------
    // State and invalidation
    // -----------------------------------------------------------------------

    /// State of the pyramid entry for `file`.
    pub fn entry_state(&self, file: &Path) -> EntryState {
        state_of(lock(&self.pyramids).get(file))
    }

    /// State of the silence entry for `file` under `detector`'s parameters.
    pub fn silence_entry_state(&self, file: &Path, detector: &SilenceDetector) -> EntryState {
        state_of(lock(&self.silences).get(&SilenceKey::new(file, detector)))
    }

    /// Forget everything cached for `file`.  The next request rebuilds.
    pub fn invalidate(&self, file: &Path) {
        let pyramid = lock(&self.pyramids).remove(file).is_some();
        let mut silences = lock(&self.silences);
        let before = silences.len();
        silences.retain(|key, _| key.file != file);
        let dropped = before - silences.len();
        if pyramid || dropped > 0 {
            log::debug!(
                "cache: invalidated {} (pyramid: {pyramid}, silence entries: {dropped})",
                file.display()
            );
        }
    }

    /// Forget everything.
    pub fn clear(&self) {
        lock(&self.pyramids).clear();
        lock(&self.silences).clear();
        log::debug!("cache: cleared");
    }
}

/// Shared get-or-build path for both maps.
///
/// A failed build leaves the key's cell empty but in place: the entry reads
/// as `Empty`, and the next attempt queues on the same cell.
async fn get_or_build<K, T, F>(
    map: &SlotMap<K, T>,
    key: K,
    build: F,
) -> Result<Arc<T>, AnalysisError>
where
    K: Eq + Hash,
    T: Send + Sync + 'static,
    F: FnOnce() -> Result<T, AnalysisError> + Send + 'static,
{
    let entry = Arc::clone(lock(map).entry(key).or_default());
    if let Some(ready) = entry.cell.get() {
        log::debug!("cache: hit");
        return Ok(Arc::clone(ready));
    }

    entry.in_flight.fetch_add(1, Ordering::SeqCst);
    let task = tokio::spawn(async move {
        let result = entry
            .cell
            .get_or_try_init(|| async move {
                match tokio::task::spawn_blocking(build).await {
                    Ok(built) => built.map(Arc::new),
                    Err(e) => Err(AnalysisError::Internal(format!("analysis worker failed: {e}"))),
                }
            })
            .await
            .map(Arc::clone);
        entry.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    });

    let result = match task.await {
        Ok(result) => result,
        Err(e) => Err(AnalysisError::Internal(format!("analysis task failed: {e}"))),
    };

    if let Err(e) = &result {
        log::error!("cache: build failed: {e}");
    }
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Shared analysis cache with single-flight builds.
//!
//! See [`AnalysisCache`] for the per-key state machine.

pub mod coordinator;

pub use coordinator::{AnalysisCache, EntryState};

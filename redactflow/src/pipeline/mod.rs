//! Pipeline configuration and execution.
//!
//! This module provides:
//! - The linear stage runner
//! - Runner configuration and start-marker policy
//! - The finalize step producing artifacts
//! - A tracker for many concurrent jobs

mod config;
mod finalize;
mod runner;
mod tracker;

pub use config::{RunnerConfig, StartMarkerPolicy};
pub use finalize::{Finalizer, FnFinalizer, NoArtifacts};
pub use runner::PipelineRunner;
pub use tracker::{JobTracker, TrackedJob, TrackedState, TrackerStats, TrackingObserver};

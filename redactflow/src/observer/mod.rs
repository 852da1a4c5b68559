//! Observers receive stage results and the terminal outcome of a job.
//!
//! The runner calls an observer synchronously, in stage order, and never
//! twice at the same time for one job. Observers should not panic; if one
//! does, the runner logs it and carries on.

mod channel;
mod sink;

pub use channel::{ChannelObserver, ProgressUpdate};
pub use sink::{CollectingObserver, FnObserver, LoggingObserver, NoOpObserver};

use crate::core::{JobOutcome, StageResult};

/// Trait for progress observers.
pub trait Observer: Send + Sync {
    /// Called at each stage boundary.
    fn on_stage_result(&self, result: &StageResult);

    /// Called once when the job terminates, with the outcome the runner is
    /// about to return.
    fn on_finished(&self, _outcome: &JobOutcome) {}
}

impl<T: Observer + ?Sized> Observer for std::sync::Arc<T> {
    fn on_stage_result(&self, result: &StageResult) {
        (**self).on_stage_result(result);
    }

    fn on_finished(&self, outcome: &JobOutcome) {
        (**self).on_finished(outcome);
    }
}

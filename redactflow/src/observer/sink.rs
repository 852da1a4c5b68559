//! Basic observer implementations.

use super::Observer;
use crate::core::{JobOutcome, JobStatus, StageResult};
use crate::errors::PipelineError;
use crate::utils::format_iso8601;
use parking_lot::RwLock;
use tracing::{debug, info, warn, Level};

/// An observer that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl Observer for NoOpObserver {
    fn on_stage_result(&self, _result: &StageResult) {}
}

/// An observer that logs progress using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingObserver {
    level: Level,
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingObserver {
    /// Creates a new logging observer with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging observer.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl Observer for LoggingObserver {
    fn on_stage_result(&self, result: &StageResult) {
        if self.level == Level::DEBUG {
            debug!(
                stage = %result.stage,
                kind = %result.kind,
                progress = result.progress,
                findings = result.findings.len(),
                "Stage progress"
            );
        } else {
            info!(
                stage = %result.stage,
                kind = %result.kind,
                progress = result.progress,
                findings = result.findings.len(),
                "Stage progress"
            );
        }
    }

    fn on_finished(&self, outcome: &JobOutcome) {
        match outcome.status {
            JobStatus::Completed => info!(
                job_id = %outcome.job_id,
                findings = outcome.findings.len(),
                elapsed_ms = outcome.elapsed_ms(),
                finished_at = %format_iso8601(&outcome.finished_at),
                "Job completed"
            ),
            JobStatus::Failed | JobStatus::Cancelled => warn!(
                job_id = %outcome.job_id,
                status = %outcome.status,
                finished_at = %format_iso8601(&outcome.finished_at),
                error_code = outcome.error.as_ref().map_or("", PipelineError::code),
                error = ?outcome.error.as_ref().map(PipelineError::to_dict),
                "Job stopped early"
            ),
        }
    }
}

/// An observer backed by a closure over stage results.
pub struct FnObserver<F>
where
    F: Fn(&StageResult) + Send + Sync,
{
    func: F,
}

impl<F> FnObserver<F>
where
    F: Fn(&StageResult) + Send + Sync,
{
    /// Creates a new closure observer.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Observer for FnObserver<F>
where
    F: Fn(&StageResult) + Send + Sync,
{
    fn on_stage_result(&self, result: &StageResult) {
        (self.func)(result);
    }
}

/// A collecting observer for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    results: RwLock<Vec<StageResult>>,
    outcome: RwLock<Option<JobOutcome>>,
}

impl CollectingObserver {
    /// Creates a new collecting observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected stage results.
    #[must_use]
    pub fn results(&self) -> Vec<StageResult> {
        self.results.read().clone()
    }

    /// Returns the progress fractions in the order they were reported.
    #[must_use]
    pub fn progress(&self) -> Vec<f64> {
        self.results.read().iter().map(|r| r.progress).collect()
    }

    /// Returns the stage names of completion results, in order.
    #[must_use]
    pub fn completed_stages(&self) -> Vec<String> {
        self.results
            .read()
            .iter()
            .filter(|r| r.kind == crate::core::StageResultKind::Completed)
            .map(|r| r.stage.clone())
            .collect()
    }

    /// Returns the terminal outcome, if one was reported.
    #[must_use]
    pub fn outcome(&self) -> Option<JobOutcome> {
        self.outcome.read().clone()
    }

    /// Returns the number of collected stage results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }
}

impl Observer for CollectingObserver {
    fn on_stage_result(&self, result: &StageResult) {
        self.results.write().push(result.clone());
    }

    fn on_finished(&self, outcome: &JobOutcome) {
        *self.outcome.write() = Some(outcome.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageResultKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_noop_and_logging_observers() {
        let result = StageResult::completed("ocr", 0, 5, Vec::new());
        NoOpObserver.on_stage_result(&result);
        LoggingObserver::default().on_stage_result(&result);
        LoggingObserver::debug().on_stage_result(&result);
    }

    #[test]
    fn test_collecting_observer() {
        let observer = CollectingObserver::new();
        assert!(observer.is_empty());

        observer.on_stage_result(&StageResult::started("ocr", 0, 2));
        observer.on_stage_result(&StageResult::completed("ocr", 0, 2, Vec::new()));

        assert_eq!(observer.len(), 2);
        assert_eq!(observer.progress(), vec![0.0, 0.5]);
        assert_eq!(observer.completed_stages(), vec!["ocr".to_string()]);
        assert_eq!(observer.results()[0].kind, StageResultKind::Started);
        assert!(observer.outcome().is_none());
    }

    #[test]
    fn test_fn_observer_through_arc() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let observer: Arc<dyn Observer> = Arc::new(FnObserver::new(move |_r: &StageResult| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        observer.on_stage_result(&StageResult::started("ocr", 0, 1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

//! Registry of submitted jobs and their live state.
//!
//! Backs a dashboard: one entry per uploaded document, its current stage
//! and progress, and aggregate counts across all jobs.

use super::PipelineRunner;
use crate::cancellation::CancellationToken;
use crate::core::{InputRef, Job, JobId, JobOutcome, JobStatus, StageResult};
use crate::errors::PipelineError;
use crate::observer::Observer;
use crate::stages::HandlerRegistry;
use crate::utils::Timestamp;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Where a tracked job currently is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrackedState {
    /// Registered, no stage reported yet.
    Pending,
    /// At least one stage boundary reported.
    Processing {
        /// The stage of the last boundary.
        stage: String,
        /// The last reported progress.
        progress: f64,
    },
    /// Terminated with this status.
    Finished {
        /// The terminal status.
        status: JobStatus,
    },
}

/// A snapshot of one tracked job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedJob {
    /// The job id.
    pub job_id: JobId,
    /// The document being processed.
    pub input: InputRef,
    /// Current state.
    pub state: TrackedState,
    /// Findings reported so far.
    pub findings: usize,
    /// Processing time, once finished.
    pub elapsed: Option<Duration>,
    /// When the job was submitted.
    pub submitted_at: Timestamp,
}

/// Aggregate counts over all tracked jobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerStats {
    /// All tracked jobs.
    pub total: usize,
    /// Jobs with no stage reported yet.
    pub pending: usize,
    /// Jobs in flight.
    pub processing: usize,
    /// Jobs that completed.
    pub completed: usize,
    /// Jobs that failed.
    pub failed: usize,
    /// Jobs that were cancelled.
    pub cancelled: usize,
    /// Findings across all jobs.
    pub findings: usize,
    /// Mean processing time of completed jobs.
    pub mean_elapsed: Option<Duration>,
}

#[derive(Debug)]
struct Slot {
    job: TrackedJob,
    cancel: CancellationToken,
}

/// Concurrent registry of jobs.
#[derive(Debug, Default)]
pub struct JobTracker {
    jobs: DashMap<JobId, Slot>,
}

impl JobTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a job and returns its cancellation token.
    ///
    /// A finished entry with the same id is replaced, so a job can be run
    /// again once its previous run is over.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::JobAlreadyActive` while an entry with the
    /// same id is still pending or processing.
    pub fn register(&self, job: &Job) -> Result<CancellationToken, PipelineError> {
        let job_id = job.id();
        let cancel = CancellationToken::new();
        let slot = Slot {
            job: TrackedJob {
                job_id,
                input: job.input().clone(),
                state: TrackedState::Pending,
                findings: 0,
                elapsed: None,
                submitted_at: job.submitted_at(),
            },
            cancel: cancel.clone(),
        };

        match self.jobs.entry(job_id) {
            Entry::Occupied(mut occupied) => {
                if !matches!(occupied.get().job.state, TrackedState::Finished { .. }) {
                    return Err(PipelineError::JobAlreadyActive { job_id });
                }
                occupied.insert(slot);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
            }
        }

        cancel.on_cancel(move |reason| debug!(job_id = %job_id, reason, "Tracked job cancelled"));
        debug!(job_id = %job_id, "Job registered");
        Ok(cancel)
    }

    /// Records a stage boundary.
    pub fn record_progress(&self, job_id: JobId, result: &StageResult) {
        if let Some(mut entry) = self.jobs.get_mut(&job_id) {
            entry.job.state = TrackedState::Processing {
                stage: result.stage.clone(),
                progress: result.progress,
            };
            entry.job.findings += result.findings.len();
        }
    }

    /// Records the terminal outcome of a job.
    pub fn finish(&self, outcome: &JobOutcome) {
        if let Some(mut entry) = self.jobs.get_mut(&outcome.job_id) {
            entry.job.state = TrackedState::Finished {
                status: outcome.status,
            };
            entry.job.findings = outcome.findings.len();
            entry.job.elapsed = Some(outcome.elapsed);
        }
    }

    /// Requests cancellation of a job.
    ///
    /// Returns false if the job is unknown.
    pub fn cancel(&self, job_id: JobId, reason: impl Into<String>) -> bool {
        match self.jobs.get(&job_id) {
            Some(slot) => {
                slot.cancel.cancel(reason);
                true
            }
            None => false,
        }
    }

    /// Returns a snapshot of one job.
    #[must_use]
    pub fn get(&self, job_id: JobId) -> Option<TrackedJob> {
        self.jobs.get(&job_id).map(|slot| slot.job.clone())
    }

    /// Returns snapshots of all jobs, oldest submission first.
    #[must_use]
    pub fn list(&self) -> Vec<TrackedJob> {
        let mut jobs: Vec<TrackedJob> = self.jobs.iter().map(|e| e.job.clone()).collect();
        jobs.sort_by_key(|j| j.submitted_at);
        jobs
    }

    /// Stops tracking a job.
    pub fn remove(&self, job_id: JobId) -> Option<TrackedJob> {
        self.jobs.remove(&job_id).map(|(_, slot)| slot.job)
    }

    /// Returns aggregate counts.
    #[must_use]
    pub fn stats(&self) -> TrackerStats {
        let mut stats = TrackerStats::default();
        let mut completed_time = Duration::ZERO;

        for entry in &self.jobs {
            let job = &entry.job;
            stats.total += 1;
            stats.findings += job.findings;
            match &job.state {
                TrackedState::Pending => stats.pending += 1,
                TrackedState::Processing { .. } => stats.processing += 1,
                TrackedState::Finished { status } => match status {
                    JobStatus::Completed => {
                        stats.completed += 1;
                        completed_time += job.elapsed.unwrap_or_default();
                    }
                    JobStatus::Failed => stats.failed += 1,
                    JobStatus::Cancelled => stats.cancelled += 1,
                },
            }
        }

        if stats.completed > 0 {
            let divisor = u32::try_from(stats.completed).unwrap_or(u32::MAX);
            stats.mean_elapsed = Some(completed_time / divisor);
        }
        stats
    }

    /// Returns an observer that feeds this tracker.
    #[must_use]
    pub fn observer(self: &Arc<Self>, job_id: JobId) -> TrackingObserver {
        TrackingObserver {
            tracker: Arc::clone(self),
            job_id,
            downstream: None,
        }
    }

    /// Registers a job and runs it in the background.
    ///
    /// Progress reaches both the tracker and `downstream`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::UnknownStage` if a stage has no handler
    /// and `PipelineError::JobAlreadyActive` if the same job is still
    /// running; the tracker is left untouched in both cases.
    pub fn submit(
        self: &Arc<Self>,
        runner: &PipelineRunner,
        job: Job,
        handlers: Arc<HandlerRegistry>,
        downstream: Option<Arc<dyn Observer>>,
    ) -> Result<JoinHandle<JobOutcome>, PipelineError> {
        runner.validate(&job, &handlers)?;
        let cancel = self.register(&job)?;
        let observer = TrackingObserver {
            tracker: Arc::clone(self),
            job_id: job.id(),
            downstream,
        };
        runner.spawn(job, handlers, Arc::new(observer), cancel)
    }
}

/// Observer that updates a [`JobTracker`] entry, then forwards to an
/// optional downstream observer.
pub struct TrackingObserver {
    tracker: Arc<JobTracker>,
    job_id: JobId,
    downstream: Option<Arc<dyn Observer>>,
}

impl TrackingObserver {
    /// Forwards every notification to `downstream` as well.
    #[must_use]
    pub fn with_downstream(mut self, downstream: Arc<dyn Observer>) -> Self {
        self.downstream = Some(downstream);
        self
    }
}

impl Observer for TrackingObserver {
    fn on_stage_result(&self, result: &StageResult) {
        self.tracker.record_progress(self.job_id, result);
        if let Some(downstream) = &self.downstream {
            downstream.on_stage_result(result);
        }
    }

    fn on_finished(&self, outcome: &JobOutcome) {
        self.tracker.finish(outcome);
        if let Some(downstream) = &self.downstream {
            downstream.on_finished(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Finding, FindingCategory, Region};
    use crate::observer::CollectingObserver;
    use crate::stages::{FnHandler, PassThroughHandler};
    use crate::testing::SlowHandler;

    fn job(uri: &str) -> Job {
        Job::new(InputRef::new(uri), ["ocr", "nlp"]).unwrap()
    }

    fn registry() -> Arc<HandlerRegistry> {
        Arc::new(
            HandlerRegistry::new()
                .with(
                    "ocr",
                    FnHandler::new("ocr", |_: &Job| {
                        Ok(vec![Finding::new(FindingCategory::Name, "Dr. Sarah Johnson", 0.97, Region::default())?])
                    }),
                )
                .with("nlp", PassThroughHandler),
        )
    }

    #[test]
    fn test_register_and_progress() {
        let tracker = JobTracker::new();
        let job = job("a.pdf");
        tracker.register(&job).unwrap();
        assert_eq!(tracker.get(job.id()).unwrap().state, TrackedState::Pending);

        tracker.record_progress(job.id(), &StageResult::completed("ocr", 0, 2, Vec::new()));
        assert_eq!(
            tracker.get(job.id()).unwrap().state,
            TrackedState::Processing { stage: "ocr".into(), progress: 0.5 }
        );
        assert_eq!(tracker.stats().processing, 1);
    }

    #[test]
    fn test_cancel_unknown_job() {
        let tracker = JobTracker::new();
        assert!(!tracker.cancel(JobId::new(), "nope"));
    }

    #[test]
    fn test_cancel_signals_token() {
        let tracker = JobTracker::new();
        let job = job("a.pdf");
        let token = tracker.register(&job).unwrap();

        assert!(tracker.cancel(job.id(), "user removed file"));
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_submit_tracks_to_completion() {
        let tracker = Arc::new(JobTracker::new());
        let runner = PipelineRunner::new();
        let downstream = Arc::new(CollectingObserver::new());

        let first = job("a.pdf");
        let second = job("b.pdf");
        let first_id = first.id();

        let h1 = tracker.submit(&runner, first, registry(), Some(downstream.clone())).unwrap();
        let h2 = tracker.submit(&runner, second, registry(), None).unwrap();
        let (o1, o2) = (h1.await.unwrap(), h2.await.unwrap());

        assert!(o1.is_completed() && o2.is_completed());
        assert_eq!(downstream.outcome().map(|o| o.job_id), Some(first_id));

        let stats = tracker.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.findings, 2);
        assert!(stats.mean_elapsed.is_some());
        assert_eq!(tracker.list().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_unknown_stage_not_tracked() {
        let tracker = Arc::new(JobTracker::new());
        let job = Job::new(InputRef::new("a.pdf"), ["vision"]).unwrap();
        let id = job.id();

        let result = tracker.submit(&PipelineRunner::new(), job, registry(), None);
        assert!(result.is_err());
        assert!(tracker.get(id).is_none());
    }

    #[test]
    fn test_finish_and_remove() {
        let tracker = Arc::new(JobTracker::new());
        let job = job("a.pdf");
        tracker.register(&job).unwrap();

        let observer = tracker.observer(job.id());
        observer.on_finished(&JobOutcome {
            job_id: job.id(),
            status: JobStatus::Failed,
            findings: Vec::new(),
            stages_completed: 0,
            elapsed: Duration::from_millis(5),
            artifacts: Vec::new(),
            error: None,
            finished_at: crate::utils::now_utc(),
        });

        let stats = tracker.stats();
        assert_eq!(stats.failed, 1);
        assert!(stats.mean_elapsed.is_none());

        let removed = tracker.remove(job.id()).unwrap();
        assert_eq!(removed.state, TrackedState::Finished { status: JobStatus::Failed });
        assert_eq!(tracker.stats().total, 0);
    }

    #[test]
    fn test_register_rejects_active_duplicate() {
        let tracker = JobTracker::new();
        let job = job("a.pdf");
        let first = tracker.register(&job).unwrap();

        let err = tracker.register(&job.clone()).unwrap_err();
        assert_eq!(err, PipelineError::JobAlreadyActive { job_id: job.id() });
        assert!(err.is_submission_error());

        tracker.record_progress(job.id(), &StageResult::started("ocr", 0, 2));
        assert!(tracker.register(&job).is_err());

        // The original token still controls the tracked run.
        assert!(tracker.cancel(job.id(), "user removed file"));
        assert!(first.is_cancelled());
    }

    #[test]
    fn test_register_again_after_finish() {
        let tracker = JobTracker::new();
        let job = job("a.pdf");
        let first = tracker.register(&job).unwrap();
        tracker.finish(&JobOutcome {
            job_id: job.id(),
            status: JobStatus::Completed,
            findings: Vec::new(),
            stages_completed: 2,
            elapsed: Duration::from_millis(3),
            artifacts: Vec::new(),
            error: None,
            finished_at: crate::utils::now_utc(),
        });

        let second = tracker.register(&job).unwrap();
        assert_eq!(tracker.get(job.id()).unwrap().state, TrackedState::Pending);
        assert_eq!(tracker.stats().total, 1);

        tracker.cancel(job.id(), "rerun aborted");
        assert!(second.is_cancelled());
        assert!(!first.is_cancelled());
    }

    #[tokio::test]
    async fn test_resubmitting_running_job_keeps_first_run_cancellable() {
        let tracker = Arc::new(JobTracker::new());
        let runner = PipelineRunner::new();
        let registry = Arc::new(
            HandlerRegistry::new()
                .with("ocr", SlowHandler::with_delay_ms(50))
                .with("nlp", PassThroughHandler),
        );
        let job = job("a.pdf");
        let id = job.id();

        let first = tracker.submit(&runner, job.clone(), registry.clone(), None).unwrap();
        let second = tracker.submit(&runner, job, registry, None);
        assert!(matches!(second, Err(PipelineError::JobAlreadyActive { .. })));

        assert!(tracker.cancel(id, "user removed file"));
        let outcome = first.await.unwrap();
        assert_eq!(outcome.status, JobStatus::Cancelled);

        let stats = tracker.stats();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.cancelled, 1);
    }
}

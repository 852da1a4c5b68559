//! Linear stage pipeline runner.
//!
//! Runs the stages of one job strictly in order, reports every stage
//! boundary to an observer, and returns exactly one [`JobOutcome`].

use super::{Finalizer, NoArtifacts, RunnerConfig};
use crate::cancellation::CancellationToken;
use crate::core::{ArtifactRef, Finding, Job, JobOutcome, JobStatus, StageResult};
use crate::errors::{CancelledError, PipelineError, StageExecutionError, UnknownStageError};
use crate::observer::Observer;
use crate::stages::{HandlerRegistry, StageHandler};
use crate::utils::{now_utc, Clock, SystemClock};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Executes jobs against a set of stage handlers.
///
/// The runner keeps no per-job state, so one instance can drive many jobs
/// at once; each run owns its own findings aggregate.
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    config: RunnerConfig,
    finalizer: Arc<dyn Finalizer>,
    clock: Arc<dyn Clock>,
}

impl Default for PipelineRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable state of one run.
struct RunState {
    started: Instant,
    findings: Vec<Finding>,
    stages_completed: usize,
}

impl PipelineRunner {
    /// Creates a runner with default configuration, no artifacts and the
    /// system clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RunnerConfig::default(),
            finalizer: Arc::new(NoArtifacts),
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the finalize step.
    #[must_use]
    pub fn with_finalizer(mut self, finalizer: impl Finalizer + 'static) -> Self {
        self.finalizer = Arc::new(finalizer);
        self
    }

    /// Sets the clock used to measure elapsed time.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Checks that every stage of the job has a handler.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::UnknownStage` naming every unresolved stage.
    pub fn validate(&self, job: &Job, handlers: &HandlerRegistry) -> Result<(), PipelineError> {
        resolve(job, handlers).map(|_| ())
    }

    /// Runs a job to completion.
    ///
    /// Validation happens before any handler is invoked or any observer
    /// callback is made. Failures and cancellation after that point are
    /// reported in the returned outcome, not as `Err`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::UnknownStage` if a stage has no handler.
    pub async fn run(
        &self,
        job: &Job,
        handlers: &HandlerRegistry,
        observer: &dyn Observer,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome, PipelineError> {
        let plan = resolve(job, handlers)?;
        Ok(self.execute(job, &plan, observer, cancel).await)
    }

    /// Validates a job and runs it on the tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::UnknownStage` if a stage has no handler;
    /// nothing is spawned in that case.
    pub fn spawn(
        &self,
        job: Job,
        handlers: Arc<HandlerRegistry>,
        observer: Arc<dyn Observer>,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<JobOutcome>, PipelineError> {
        let plan = resolve(&job, &handlers)?;
        let runner = self.clone();
        Ok(tokio::spawn(async move {
            runner
                .execute(&job, &plan, observer.as_ref(), &cancel)
                .await
        }))
    }

    async fn execute(
        &self,
        job: &Job,
        plan: &[Arc<dyn StageHandler>],
        observer: &dyn Observer,
        cancel: &CancellationToken,
    ) -> JobOutcome {
        let total = job.stage_count();
        let mut state = RunState {
            started: self.clock.now(),
            findings: Vec::new(),
            stages_completed: 0,
        };

        info!(job_id = %job.id(), stages = total, input = %job.input().uri, "Job started");

        for (index, (stage, handler)) in job.stages().iter().zip(plan).enumerate() {
            if cancel.is_cancelled() {
                let err = CancelledError::new(Some(stage.clone()), cancel.reason().unwrap_or_default());
                return self.finish(job, state, JobStatus::Cancelled, Vec::new(), Some(err.into()), observer);
            }

            if self.config.start_markers.emits(index) {
                notify(observer, &StageResult::started(stage.as_str(), index, total));
            }

            debug!(job_id = %job.id(), stage = %stage, index, "Stage started");
            let stage_start = self.clock.now();

            match invoke(handler.as_ref(), job).await {
                Ok(findings) => {
                    debug!(
                        job_id = %job.id(),
                        stage = %stage,
                        findings = findings.len(),
                        duration_ms = self.clock.elapsed_since(stage_start).as_secs_f64() * 1000.0,
                        "Stage completed"
                    );
                    let result = StageResult::completed(stage.as_str(), index, total, findings);
                    notify(observer, &result);
                    state.findings.extend(result.findings);
                    state.stages_completed += 1;
                }
                Err(message) => {
                    warn!(job_id = %job.id(), stage = %stage, error = %message, "Stage failed");
                    let err = StageExecutionError::new(stage.as_str(), index, message);
                    return self.finish(job, state, JobStatus::Failed, Vec::new(), Some(err.into()), observer);
                }
            }
        }

        if cancel.is_cancelled() {
            let err = CancelledError::new(None, cancel.reason().unwrap_or_default());
            return self.finish(job, state, JobStatus::Cancelled, Vec::new(), Some(err.into()), observer);
        }

        let finalized = AssertUnwindSafe(self.finalizer.finalize(job, &state.findings))
            .catch_unwind()
            .await;
        match finalized {
            Ok(Ok(artifacts)) => self.finish(job, state, JobStatus::Completed, artifacts, None, observer),
            Ok(Err(e)) => {
                let err = PipelineError::Finalize { message: format!("{e:#}") };
                self.finish(job, state, JobStatus::Failed, Vec::new(), Some(err), observer)
            }
            Err(payload) => {
                let err = PipelineError::Finalize {
                    message: format!("finalizer panicked: {}", panic_message(payload.as_ref())),
                };
                self.finish(job, state, JobStatus::Failed, Vec::new(), Some(err), observer)
            }
        }
    }

    fn finish(
        &self,
        job: &Job,
        state: RunState,
        status: JobStatus,
        artifacts: Vec<ArtifactRef>,
        error: Option<PipelineError>,
        observer: &dyn Observer,
    ) -> JobOutcome {
        let outcome = JobOutcome {
            job_id: job.id(),
            status,
            findings: state.findings,
            stages_completed: state.stages_completed,
            elapsed: self.clock.elapsed_since(state.started),
            artifacts,
            error,
            finished_at: now_utc(),
        };

        info!(
            job_id = %job.id(),
            status = %outcome.status,
            findings = outcome.findings.len(),
            stages_completed = outcome.stages_completed,
            elapsed_ms = outcome.elapsed_ms(),
            "Job finished"
        );

        if let Err(e) = std::panic::catch_unwind(AssertUnwindSafe(|| observer.on_finished(&outcome))) {
            warn!(job_id = %job.id(), "Observer panicked on finish: {}", panic_message(e.as_ref()));
        }
        outcome
    }
}

/// Looks up the handler of every stage, in job order.
///
/// Fails with every unresolved name, each listed once, before anything
/// runs.
fn resolve(
    job: &Job,
    handlers: &HandlerRegistry,
) -> Result<Vec<Arc<dyn StageHandler>>, PipelineError> {
    let mut plan = Vec::with_capacity(job.stage_count());
    let mut missing: Vec<String> = Vec::new();
    for stage in job.stages() {
        match handlers.get(stage) {
            Some(handler) => plan.push(Arc::clone(handler)),
            None if !missing.contains(stage) => missing.push(stage.clone()),
            None => {}
        }
    }
    if missing.is_empty() {
        Ok(plan)
    } else {
        Err(UnknownStageError::new(missing).into())
    }
}

/// Runs one handler, turning errors and panics into a message.
async fn invoke(handler: &dyn StageHandler, job: &Job) -> Result<Vec<Finding>, String> {
    match AssertUnwindSafe(handler.run(job)).catch_unwind().await {
        Ok(Ok(findings)) => Ok(findings),
        Ok(Err(e)) => Err(format!("{e:#}")),
        Err(payload) => Err(format!("handler panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn notify(observer: &dyn Observer, result: &StageResult) {
    if let Err(e) = std::panic::catch_unwind(AssertUnwindSafe(|| observer.on_stage_result(result))) {
        warn!(stage = %result.stage, "Observer panicked: {}", panic_message(e.as_ref()));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FindingCategory, InputRef, Region, StageResultKind};
    use crate::observer::{CollectingObserver, NoOpObserver};
    use crate::pipeline::{FnFinalizer, StartMarkerPolicy};
    use crate::stages::{FnHandler, PassThroughHandler};
    use crate::utils::ManualClock;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn finding(category: FindingCategory, value: &str) -> Finding {
        Finding::new(category, value, 0.9, Region::default()).unwrap()
    }

    fn job(stages: &[&str]) -> Job {
        Job::new(InputRef::new("uploads/record.pdf"), stages.iter().copied()).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_stage_fails_before_any_work() {
        let registry = HandlerRegistry::new().with("ocr", PassThroughHandler);
        let observer = CollectingObserver::new();

        let err = PipelineRunner::new()
            .run(&job(&["ocr", "vision"]), &registry, &observer, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err, PipelineError::UnknownStage(UnknownStageError::new(vec!["vision".into()])));
        assert!(observer.is_empty());
        assert!(observer.outcome().is_none());
    }

    #[tokio::test]
    async fn test_unknown_stages_reported_once_in_job_order() {
        let registry = HandlerRegistry::new().with("ocr", PassThroughHandler);
        let observer = CollectingObserver::new();
        let job = job(&["audit", "ocr", "vision", "audit"]);

        let err = PipelineRunner::new()
            .run(&job, &registry, &observer, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PipelineError::UnknownStage(UnknownStageError::new(vec!["audit".into(), "vision".into()]))
        );
        assert!(err.is_submission_error());
        assert!(observer.is_empty());
        assert!(observer.outcome().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_stage_runs_same_handler_twice() {
        let handler = Arc::new(crate::testing::StaticHandler::new(
            "ocr",
            vec![finding(FindingCategory::Name, "x")],
        ));
        let mut registry = HandlerRegistry::new();
        registry.register("ocr", handler.clone());

        let outcome = PipelineRunner::new()
            .run(&job(&["ocr", "ocr"]), &registry, &NoOpObserver, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.stages_completed, 2);
        assert_eq!(outcome.findings.len(), 2);
        assert_eq!(handler.call_count(), 2);
    }

    #[tokio::test]
    async fn test_every_stage_markers() {
        let registry = HandlerRegistry::new()
            .with("a", PassThroughHandler)
            .with("b", PassThroughHandler);
        let observer = CollectingObserver::new();
        let runner = PipelineRunner::new()
            .with_config(RunnerConfig::new().with_start_markers(StartMarkerPolicy::EveryStage));

        runner
            .run(&job(&["a", "b"]), &registry, &observer, &CancellationToken::new())
            .await
            .unwrap();

        let kinds: Vec<StageResultKind> = observer.results().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StageResultKind::Started,
                StageResultKind::Completed,
                StageResultKind::Started,
                StageResultKind::Completed,
            ]
        );
        assert_eq!(observer.progress(), vec![0.0, 0.5, 0.5, 1.0]);
    }

    #[tokio::test]
    async fn test_never_markers() {
        let registry = HandlerRegistry::new().with("a", PassThroughHandler);
        let observer = CollectingObserver::new();
        let runner = PipelineRunner::new()
            .with_config(RunnerConfig::new().with_start_markers(StartMarkerPolicy::Never));

        runner
            .run(&job(&["a"]), &registry, &observer, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(observer.progress(), vec![1.0]);
    }

    #[tokio::test]
    async fn test_elapsed_uses_injected_clock() {
        let clock = ManualClock::new();
        let ticker = clock.clone();
        let registry = HandlerRegistry::new().with(
            "ocr",
            FnHandler::new("ocr", move |_: &Job| {
                ticker.advance(Duration::from_millis(1500));
                Ok(Vec::new())
            }),
        );

        let outcome = PipelineRunner::new()
            .with_clock(clock)
            .run(&job(&["ocr"]), &registry, &NoOpObserver, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.elapsed, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_failure() {
        let registry = HandlerRegistry::new()
            .with("ocr", FnHandler::new("ocr", |_: &Job| Ok(vec![finding(FindingCategory::Name, "x")])))
            .with("nlp", FnHandler::new("nlp", |_: &Job| -> anyhow::Result<Vec<Finding>> {
                panic!("tokenizer crashed")
            }));

        let outcome = PipelineRunner::new()
            .run(&job(&["ocr", "nlp"]), &registry, &NoOpObserver, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, JobStatus::Failed);
        assert_eq!(outcome.findings.len(), 1);
        match outcome.error {
            Some(PipelineError::StageExecution(err)) => {
                assert_eq!(err.stage, "nlp");
                assert_eq!(err.index, 1);
                assert!(err.message.contains("tokenizer crashed"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_observer_panic_does_not_abort() {
        struct Exploding;
        impl Observer for Exploding {
            fn on_stage_result(&self, _result: &StageResult) {
                panic!("render failed");
            }
            fn on_finished(&self, _outcome: &JobOutcome) {
                panic!("render failed again");
            }
        }

        let registry = HandlerRegistry::new()
            .with("a", PassThroughHandler)
            .with("b", PassThroughHandler);

        let outcome = PipelineRunner::new()
            .run(&job(&["a", "b"]), &registry, &Exploding, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, JobStatus::Completed);
        assert_eq!(outcome.stages_completed, 2);
    }

    #[tokio::test]
    async fn test_finalizer_artifacts_and_failure() {
        let registry = HandlerRegistry::new().with("redaction", PassThroughHandler);

        let ok = PipelineRunner::new()
            .with_finalizer(FnFinalizer::new(|job: &Job, _: &[Finding]| {
                Ok(vec![
                    ArtifactRef::redacted(format!("{}.redacted", job.id())),
                    ArtifactRef::encrypted(format!("{}.enc", job.id())),
                ])
            }))
            .run(&job(&["redaction"]), &registry, &NoOpObserver, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(ok.artifacts.len(), 2);
        assert!(ok.error.is_none());

        let failed = PipelineRunner::new()
            .with_finalizer(FnFinalizer::new(|_: &Job, _: &[Finding]| {
                Err(anyhow::anyhow!("key vault unavailable"))
            }))
            .run(&job(&["redaction"]), &registry, &NoOpObserver, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert!(failed.artifacts.is_empty());
        assert_eq!(
            failed.error,
            Some(PipelineError::Finalize { message: "key vault unavailable".into() })
        );
    }

    #[tokio::test]
    async fn test_cancel_before_finalize() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let registry = HandlerRegistry::new().with(
            "ocr",
            FnHandler::new("ocr", move |_: &Job| {
                trigger.cancel("closed tab");
                Ok(vec![finding(FindingCategory::Email, "a@b.c")])
            }),
        );

        let outcome = PipelineRunner::new()
            .with_finalizer(FnFinalizer::new(|_: &Job, _: &[Finding]| {
                Ok(vec![ArtifactRef::redacted("never")])
            }))
            .run(&job(&["ocr"]), &registry, &NoOpObserver, &cancel)
            .await
            .unwrap();

        assert_eq!(outcome.status, JobStatus::Cancelled);
        assert_eq!(outcome.findings.len(), 1);
        assert!(outcome.artifacts.is_empty());
        assert_eq!(
            outcome.error,
            Some(PipelineError::Cancelled(CancelledError::new(None, "closed tab")))
        );
    }

    #[tokio::test]
    async fn test_spawn_runs_on_runtime() {
        let registry = Arc::new(HandlerRegistry::new().with("ocr", PassThroughHandler));
        let observer = Arc::new(CollectingObserver::new());

        let handle = PipelineRunner::new()
            .spawn(job(&["ocr"]), registry, observer.clone(), CancellationToken::new())
            .unwrap();
        let outcome = handle.await.unwrap();

        assert!(outcome.is_completed());
        assert_eq!(observer.outcome(), Some(outcome));
    }

    #[tokio::test]
    async fn test_spawn_rejects_unknown_stage() {
        let registry = Arc::new(HandlerRegistry::new());
        let result = PipelineRunner::new().spawn(
            job(&["ocr"]),
            registry,
            Arc::new(NoOpObserver),
            CancellationToken::new(),
        );
        assert!(matches!(result, Err(PipelineError::UnknownStage(_))));
    }
}

//! Test assertions for observed runs.

use crate::core::{Finding, JobOutcome, JobStatus};
use crate::observer::CollectingObserver;

/// Asserts that the observer saw exactly `0/n, 1/n, ..., n/n`.
pub fn assert_progress_sequence(observer: &CollectingObserver, n: usize) {
    #[allow(clippy::cast_precision_loss)]
    let expected: Vec<f64> = (0..=n).map(|i| i as f64 / n as f64).collect();
    assert_eq!(
        observer.progress(),
        expected,
        "Expected progress sequence for {n} stages"
    );
}

/// Asserts that progress never decreased.
pub fn assert_progress_monotonic(observer: &CollectingObserver) {
    let progress = observer.progress();
    assert!(
        progress.windows(2).all(|w| w[0] <= w[1]),
        "Progress went backwards: {progress:?}"
    );
}

/// Asserts the outcome holds exactly the concatenation of `per_stage`.
pub fn assert_stage_order(outcome: &JobOutcome, per_stage: &[Vec<Finding>]) {
    let expected: Vec<Finding> = per_stage.iter().flatten().cloned().collect();
    assert_eq!(
        outcome.findings, expected,
        "Findings are not in stage then emission order"
    );
}

/// Asserts the outcome has the expected status.
pub fn assert_status(outcome: &JobOutcome, expected: JobStatus) {
    assert_eq!(
        outcome.status, expected,
        "Expected status {expected}, got {} ({:?})",
        outcome.status, outcome.error
    );
}

/// Asserts that the observer's terminal notification matches `outcome`.
pub fn assert_finished_with(observer: &CollectingObserver, outcome: &JobOutcome) {
    assert_eq!(
        observer.outcome().as_ref(),
        Some(outcome),
        "Observer terminal notification does not match the returned outcome"
    );
}

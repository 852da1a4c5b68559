//! Per-stage results streamed to observers.

use super::{Finding, StageResultKind};
use serde::{Deserialize, Serialize};

/// Output emitted at a stage boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// The stage name.
    pub stage: String,
    /// Position of the stage in the job (0-based).
    pub index: usize,
    /// Total number of stages in the job.
    pub stage_count: usize,
    /// Start marker or completion.
    pub kind: StageResultKind,
    /// Cumulative progress fraction in [0, 1].
    pub progress: f64,
    /// Findings produced by the stage, in emission order.
    #[serde(default)]
    pub findings: Vec<Finding>,
}

impl StageResult {
    /// Creates a start marker for stage `index` of `stage_count`.
    #[must_use]
    pub fn started(stage: impl Into<String>, index: usize, stage_count: usize) -> Self {
        Self {
            stage: stage.into(),
            index,
            stage_count,
            kind: StageResultKind::Started,
            progress: progress_fraction(index, stage_count),
            findings: Vec::new(),
        }
    }

    /// Creates a completion result for stage `index` of `stage_count`.
    #[must_use]
    pub fn completed(
        stage: impl Into<String>,
        index: usize,
        stage_count: usize,
        findings: Vec<Finding>,
    ) -> Self {
        Self {
            stage: stage.into(),
            index,
            stage_count,
            kind: StageResultKind::Completed,
            progress: progress_fraction(index + 1, stage_count),
            findings,
        }
    }

    /// Returns the progress as a whole percentage.
    #[must_use]
    pub fn percent(&self) -> u8 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pct = (self.progress * 100.0).round().clamp(0.0, 100.0) as u8;
        pct
    }

    /// Returns true for the last completion of the job.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.kind == StageResultKind::Completed && self.index + 1 == self.stage_count
    }
}

/// Returns `done / total`, the cumulative progress after `done` stages.
///
/// A zero `total` is treated as already complete.
#[must_use]
pub fn progress_fraction(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let fraction = done as f64 / total as f64;
    fraction
}

//! Job status and stage-result kind enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Every stage and the finalize step succeeded.
    Completed,
    /// A stage handler or the finalize step failed.
    Failed,
    /// Cancellation was observed at a stage boundary.
    Cancelled,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl JobStatus {
    /// Returns true if the status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if the findings of the job are final.
    ///
    /// Partial findings of failed or cancelled jobs must not be presented
    /// as a complete scan.
    #[must_use]
    pub fn findings_are_final(&self) -> bool {
        self.is_success()
    }
}

/// Which boundary of a stage a [`StageResult`](super::StageResult) marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageResultKind {
    /// The stage is about to run; carries no findings.
    Started,
    /// The stage finished; carries its findings.
    Completed,
}

impl fmt::Display for StageResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

//! Error types for the redactflow runner.
//!
//! Every error is scoped to a single job. Submission-time problems
//! (unknown stages, malformed jobs) are returned as `Err` from the runner;
//! execution-time problems are carried inside the job's outcome.

use crate::core::JobId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for pipeline operations.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineError {
    /// The job references stages with no registered handler.
    #[error("{0}")]
    UnknownStage(#[from] UnknownStageError),

    /// The job has no stages.
    #[error("Job must name at least one stage")]
    EmptyJob,

    /// A stage name is empty or whitespace-only.
    #[error("Invalid stage name at position {index}: stage names cannot be blank")]
    InvalidStageName {
        /// Position of the offending name in the stage list.
        index: usize,
    },

    /// A stage handler failed.
    #[error("{0}")]
    StageExecution(#[from] StageExecutionError),

    /// Cancellation was observed at a stage boundary.
    #[error("{0}")]
    Cancelled(#[from] CancelledError),

    /// A job with this id is still pending or running.
    #[error("Job {job_id} is already running")]
    JobAlreadyActive {
        /// The id of the running job.
        job_id: JobId,
    },

    /// The finalize step failed after all stages succeeded.
    #[error("Finalize failed: {message}")]
    Finalize {
        /// The failure detail.
        message: String,
    },
}

impl PipelineError {
    /// Returns a stable code for the error kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownStage(_) => "PIPELINE-UNKNOWN-STAGE",
            Self::EmptyJob => "PIPELINE-EMPTY-JOB",
            Self::InvalidStageName { .. } => "PIPELINE-INVALID-STAGE-NAME",
            Self::StageExecution(_) => "PIPELINE-STAGE-FAILED",
            Self::Cancelled(_) => "PIPELINE-CANCELLED",
            Self::JobAlreadyActive { .. } => "PIPELINE-JOB-ACTIVE",
            Self::Finalize { .. } => "PIPELINE-FINALIZE-FAILED",
        }
    }

    /// Returns true if the error was raised before any stage executed.
    #[must_use]
    pub fn is_submission_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownStage(_)
                | Self::EmptyJob
                | Self::InvalidStageName { .. }
                | Self::JobAlreadyActive { .. }
        )
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        match self {
            Self::UnknownStage(err) => {
                map.insert("stages".to_string(), serde_json::json!(err.stages));
            }
            Self::StageExecution(err) => {
                map.insert("stage".to_string(), serde_json::json!(err.stage));
                map.insert("index".to_string(), serde_json::json!(err.index));
            }
            Self::Cancelled(err) => {
                map.insert("before_stage".to_string(), serde_json::json!(err.before_stage));
            }
            Self::InvalidStageName { index } => {
                map.insert("index".to_string(), serde_json::json!(index));
            }
            Self::JobAlreadyActive { job_id } => {
                map.insert("job_id".to_string(), serde_json::json!(job_id));
            }
            Self::EmptyJob | Self::Finalize { .. } => {}
        }
        map
    }
}

/// Error raised when a job names stages that have no handler.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("No handler registered for stage(s): {}", stages.join(", "))]
pub struct UnknownStageError {
    /// Every stage name that could not be resolved, in job order.
    pub stages: Vec<String>,
}

impl UnknownStageError {
    /// Creates a new unknown stage error.
    #[must_use]
    pub fn new(stages: Vec<String>) -> Self {
        Self { stages }
    }
}

/// Error raised when a stage handler returns an error or panics.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Stage '{stage}' (#{index}) failed: {message}")]
pub struct StageExecutionError {
    /// The failing stage.
    pub stage: String,
    /// Position of the stage in the job.
    pub index: usize,
    /// The failure detail.
    pub message: String,
}

impl StageExecutionError {
    /// Creates a new stage execution error.
    #[must_use]
    pub fn new(stage: impl Into<String>, index: usize, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            index,
            message: message.into(),
        }
    }
}

/// Error recorded when a job stops on a cancellation request.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Job cancelled before {}: {reason}", before_stage.as_deref().unwrap_or("finalize"))]
pub struct CancelledError {
    /// The stage that did not start. `None` when cancellation hit just
    /// before the finalize step.
    pub before_stage: Option<String>,
    /// The cancellation reason.
    pub reason: String,
}

impl CancelledError {
    /// Creates a new cancelled error.
    #[must_use]
    pub fn new(before_stage: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            before_stage,
            reason: reason.into(),
        }
    }
}

/// Error raised when a finding violates its value constraints.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidFindingError {
    /// Confidence outside [0, 1] or not a number.
    #[error("Confidence must be within [0, 1], got {0}")]
    Confidence(f64),

    /// A region component is negative or not finite.
    #[error("Invalid region: {0}")]
    Region(String),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value outside its allowed domain.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// The field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

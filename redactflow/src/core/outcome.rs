//! Terminal job outcome.

use super::{ArtifactRef, Finding, FindingCategory, JobId, JobStatus};
use crate::errors::PipelineError;
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;

/// The terminal result of a job, created exactly once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    /// The job this outcome belongs to.
    pub job_id: JobId,
    /// Final status.
    pub status: JobStatus,
    /// Findings of every successful stage, in stage then emission order.
    pub findings: Vec<Finding>,
    /// Number of stages that completed successfully.
    pub stages_completed: usize,
    /// Wall-clock time from the first stage boundary to termination.
    pub elapsed: Duration,
    /// Artifacts from the finalize step; empty unless `Completed`.
    #[serde(default)]
    pub artifacts: Vec<ArtifactRef>,
    /// Why the job stopped early; `None` when `Completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PipelineError>,
    /// When the outcome was produced.
    pub finished_at: Timestamp,
}

impl JobOutcome {
    /// Returns true if the job completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Returns the number of findings per category.
    #[must_use]
    pub fn count_by_category(&self) -> BTreeMap<FindingCategory, usize> {
        let mut counts = BTreeMap::new();
        for finding in &self.findings {
            *counts.entry(finding.category().clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Returns a SHA-256 hex digest over the findings content.
    ///
    /// Two runs with equal findings in equal order produce equal digests,
    /// independent of ids, timings and artifacts.
    #[must_use]
    pub fn findings_digest(&self) -> String {
        let mut hasher = Sha256::new();
        for finding in &self.findings {
            let encoded = serde_json::to_vec(finding).unwrap_or_default();
            hasher.update((encoded.len() as u64).to_le_bytes());
            hasher.update(&encoded);
        }
        hex::encode(hasher.finalize())
    }
}

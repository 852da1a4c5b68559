//! Handler wrappers that add behaviour around another handler.

use super::StageHandler;
use crate::core::{Finding, FindingCategory, Job};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Keeps only findings whose category is in an allowed set.
///
/// This is how the "personal data types to detect" setting reaches the
/// detectors without each detector knowing about it.
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    inner: Arc<dyn StageHandler>,
    allowed: HashSet<FindingCategory>,
}

impl CategoryFilter {
    /// Wraps `inner`, keeping only `allowed` categories.
    #[must_use]
    pub fn new(
        inner: Arc<dyn StageHandler>,
        allowed: impl IntoIterator<Item = FindingCategory>,
    ) -> Self {
        Self {
            inner,
            allowed: allowed.into_iter().map(FindingCategory::canonical).collect(),
        }
    }

    /// Returns true if the category passes the filter.
    ///
    /// Categories are compared in canonical form, so `Other("email")`
    /// passes wherever `Email` does.
    #[must_use]
    pub fn allows(&self, category: &FindingCategory) -> bool {
        self.allowed.contains(&category.clone().canonical())
    }
}

#[async_trait]
impl StageHandler for CategoryFilter {
    async fn run(&self, job: &Job) -> anyhow::Result<Vec<Finding>> {
        let findings = self.inner.run(job).await?;
        let before = findings.len();
        let kept: Vec<Finding> = findings
            .into_iter()
            .filter(|f| self.allows(f.category()))
            .collect();
        if kept.len() != before {
            debug!(
                job_id = %job.id(),
                dropped = before - kept.len(),
                "Filtered findings by category"
            );
        }
        Ok(kept)
    }
}

/// Fails the stage if the inner handler does not finish in time.
///
/// The runner imposes no timeout of its own; a stage that needs one wraps
/// its handler in this.
#[derive(Debug, Clone)]
pub struct DeadlineHandler {
    inner: Arc<dyn StageHandler>,
    deadline: Duration,
}

impl DeadlineHandler {
    /// Wraps `inner` with a deadline.
    #[must_use]
    pub fn new(inner: Arc<dyn StageHandler>, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    /// Returns the configured deadline.
    #[must_use]
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

#[async_trait]
impl StageHandler for DeadlineHandler {
    async fn run(&self, job: &Job) -> anyhow::Result<Vec<Finding>> {
        tokio::time::timeout(self.deadline, self.inner.run(job))
            .await
            .map_err(|_| anyhow!("stage exceeded its deadline of {:?}", self.deadline))?
    }
}

//! The post-processing step that turns a finished job into artifacts.

use crate::core::{ArtifactRef, Finding, Job};
use async_trait::async_trait;
use std::fmt::Debug;

/// Produces artifact references once every stage has succeeded.
///
/// Runs exactly once per completed job and never for failed or cancelled
/// ones. It reports no findings.
#[async_trait]
pub trait Finalizer: Send + Sync + Debug {
    /// Builds the output artifacts for a job.
    ///
    /// # Errors
    ///
    /// An error fails the job; no artifact is reported.
    async fn finalize(&self, job: &Job, findings: &[Finding]) -> anyhow::Result<Vec<ArtifactRef>>;
}

/// A finalizer that produces no artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArtifacts;

#[async_trait]
impl Finalizer for NoArtifacts {
    async fn finalize(&self, _job: &Job, _findings: &[Finding]) -> anyhow::Result<Vec<ArtifactRef>> {
        Ok(Vec::new())
    }
}

/// A finalizer backed by a synchronous closure.
pub struct FnFinalizer<F>
where
    F: Fn(&Job, &[Finding]) -> anyhow::Result<Vec<ArtifactRef>> + Send + Sync,
{
    func: F,
}

impl<F> FnFinalizer<F>
where
    F: Fn(&Job, &[Finding]) -> anyhow::Result<Vec<ArtifactRef>> + Send + Sync,
{
    /// Creates a new closure finalizer.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Debug for FnFinalizer<F>
where
    F: Fn(&Job, &[Finding]) -> anyhow::Result<Vec<ArtifactRef>> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnFinalizer").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> Finalizer for FnFinalizer<F>
where
    F: Fn(&Job, &[Finding]) -> anyhow::Result<Vec<ArtifactRef>> + Send + Sync,
{
    async fn finalize(&self, job: &Job, findings: &[Finding]) -> anyhow::Result<Vec<ArtifactRef>> {
        (self.func)(job, findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InputRef;

    #[tokio::test]
    async fn test_no_artifacts() {
        let job = Job::new(InputRef::new("a"), ["ocr"]).unwrap();
        assert!(NoArtifacts.finalize(&job, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fn_finalizer_sees_job() {
        let job = Job::new(InputRef::new("uploads/a.pdf"), ["ocr"]).unwrap();
        let finalizer = FnFinalizer::new(|job: &Job, _findings: &[Finding]| {
            Ok(vec![ArtifactRef::redacted(format!("{}#redacted", job.input().uri))])
        });

        let artifacts = finalizer.finalize(&job, &[]).await.unwrap();
        assert_eq!(artifacts[0].handle, "uploads/a.pdf#redacted");
    }
}

//! Jobs: one submitted document and the stages it must pass through.

use crate::errors::PipelineError;
use crate::utils::{now_utc, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for JobId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque reference to the document a job processes.
///
/// The runner never dereferences it; handlers decide what the uri means
/// (a path, an object-store key, an upload id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRef {
    /// Where the document lives.
    pub uri: String,
    /// MIME type reported at upload, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Size in bytes, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl InputRef {
    /// Creates an input reference from a uri.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            media_type: None,
            size_bytes: None,
        }
    }

    /// Sets the media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Sets the size in bytes.
    #[must_use]
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }
}

/// The unit of work submitted to the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    id: JobId,
    input: InputRef,
    stages: Vec<String>,
    submitted_at: Timestamp,
}

impl Job {
    /// Creates a job with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::EmptyJob` when `stages` is empty and
    /// `PipelineError::InvalidStageName` when a name is blank.
    pub fn new<S>(
        input: InputRef,
        stages: impl IntoIterator<Item = S>,
    ) -> Result<Self, PipelineError>
    where
        S: Into<String>,
    {
        Self::with_id(JobId::new(), input, stages)
    }

    /// Creates a job with a caller-chosen id.
    ///
    /// # Errors
    ///
    /// Same as [`Job::new`].
    pub fn with_id<S>(
        id: JobId,
        input: InputRef,
        stages: impl IntoIterator<Item = S>,
    ) -> Result<Self, PipelineError>
    where
        S: Into<String>,
    {
        let stages: Vec<String> = stages.into_iter().map(Into::into).collect();
        if stages.is_empty() {
            return Err(PipelineError::EmptyJob);
        }
        if let Some(index) = stages.iter().position(|s| s.trim().is_empty()) {
            return Err(PipelineError::InvalidStageName { index });
        }

        Ok(Self {
            id,
            input,
            stages,
            submitted_at: now_utc(),
        })
    }

    /// Returns the job id.
    #[must_use]
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Returns the input reference.
    #[must_use]
    pub fn input(&self) -> &InputRef {
        &self.input
    }

    /// Returns the ordered stage names.
    #[must_use]
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns when the job was created.
    #[must_use]
    pub fn submitted_at(&self) -> Timestamp {
        self.submitted_at
    }
}

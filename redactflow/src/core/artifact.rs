//! Artifact references produced by the finalize step.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What an artifact represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// The document with findings masked.
    Redacted,
    /// The encrypted export of the redacted document.
    Encrypted,
    /// Anything else a finalizer wants to hand back.
    Other(String),
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redacted => write!(f, "redacted"),
            Self::Encrypted => write!(f, "encrypted"),
            Self::Other(name) => write!(f, "other:{name}"),
        }
    }
}

/// An opaque handle to an output artifact.
///
/// The runner only carries these from the finalizer to the outcome; what
/// the handle points at (a path, a blob key) is the finalizer's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// The artifact kind.
    pub kind: ArtifactKind,
    /// Opaque handle.
    pub handle: String,
    /// MIME type of the artifact, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl ArtifactRef {
    /// Creates a new artifact reference.
    #[must_use]
    pub fn new(kind: ArtifactKind, handle: impl Into<String>) -> Self {
        Self {
            kind,
            handle: handle.into(),
            media_type: None,
        }
    }

    /// Creates a reference to a redacted document.
    #[must_use]
    pub fn redacted(handle: impl Into<String>) -> Self {
        Self::new(ArtifactKind::Redacted, handle)
    }

    /// Creates a reference to an encrypted export.
    #[must_use]
    pub fn encrypted(handle: impl Into<String>) -> Self {
        Self::new(ArtifactKind::Encrypted, handle)
            .with_media_type("application/octet-stream")
    }

    /// Sets the media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

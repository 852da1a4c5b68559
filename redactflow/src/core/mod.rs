//! Core domain model types for redactflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Jobs and their input references
//! - Findings with their categories and regions
//! - Stage results streamed during a run
//! - Job outcomes and artifact references

mod artifact;
mod finding;
mod job;
mod outcome;
mod result;
mod status;

pub use artifact::{ArtifactKind, ArtifactRef};
pub use finding::{Finding, FindingCategory, Region};
pub use job::{InputRef, Job, JobId};
pub use outcome::JobOutcome;
pub use result::{progress_fraction, StageResult};
pub use status::{JobStatus, StageResultKind};

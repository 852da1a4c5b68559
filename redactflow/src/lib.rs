//! # Redactflow
//!
//! A staged, cancellable runner for document de-identification jobs.
//!
//! A job names an ordered list of stages (text recognition, entity
//! detection, face detection, redaction, encryption). Redactflow runs the
//! registered handler for each stage in turn and provides:
//!
//! - **Strict ordering**: one stage at a time, in the order submitted
//! - **Progress reporting**: an observer sees every stage boundary and the
//!   terminal outcome
//! - **Fail-fast**: the first failing stage ends the job, keeping the
//!   findings gathered so far
//! - **Cooperative cancellation**: checked at every stage boundary
//! - **Finalization**: a pluggable step turns the findings into artifact
//!   references
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use redactflow::prelude::*;
//!
//! let handlers = HandlerRegistry::new()
//!     .with("ocr", OcrHandler::new())
//!     .with("nlp", NlpHandler::new());
//! let job = Job::new(InputRef::new("uploads/intake.pdf"), ["ocr", "nlp"])?;
//!
//! let outcome = PipelineRunner::new()
//!     .run(&job, &handlers, &LoggingObserver::default(), &CancellationToken::new())
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod core;
pub mod errors;
pub mod observability;
pub mod observer;
pub mod pipeline;
pub mod settings;
pub mod stages;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::core::{
        ArtifactKind, ArtifactRef, Finding, FindingCategory, InputRef, Job, JobId,
        JobOutcome, JobStatus, Region, StageResult, StageResultKind,
    };
    pub use crate::errors::{
        CancelledError, ConfigError, InvalidFindingError, PipelineError,
        StageExecutionError, UnknownStageError,
    };
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::observer::{
        ChannelObserver, CollectingObserver, FnObserver, LoggingObserver, NoOpObserver,
        Observer, ProgressUpdate,
    };
    pub use crate::pipeline::{
        Finalizer, FnFinalizer, JobTracker, NoArtifacts, PipelineRunner, RunnerConfig,
        StartMarkerPolicy,
    };
    pub use crate::settings::RedactionSettings;
    pub use crate::stages::{
        AsyncFnHandler, CategoryFilter, DeadlineHandler, FnHandler, HandlerRegistry,
        PassThroughHandler, StageHandler,
    };
    pub use crate::utils::{Clock, SystemClock, Timestamp};
}

//! Stage handler trait and implementations.
//!
//! A handler is the plug-in that does the real work of a named stage
//! (text extraction, entity detection, redaction) and reports what it
//! found. The runner only sequences handlers.

mod registry;
mod wrappers;

pub use registry::HandlerRegistry;
pub use wrappers::{CategoryFilter, DeadlineHandler};

use crate::core::{Finding, Job};
use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;
use std::marker::PhantomData;

/// Trait for stage handlers.
///
/// A call is treated as an atomic unit of work: the handler either returns
/// all of its findings or an error, never a partial list.
#[async_trait]
pub trait StageHandler: Send + Sync + Debug {
    /// Runs the stage against a job.
    ///
    /// # Errors
    ///
    /// Any error fails the job at this stage.
    async fn run(&self, job: &Job) -> anyhow::Result<Vec<Finding>>;
}

/// A handler backed by a synchronous closure.
pub struct FnHandler<F>
where
    F: Fn(&Job) -> anyhow::Result<Vec<Finding>> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&Job) -> anyhow::Result<Vec<Finding>> + Send + Sync,
{
    /// Creates a new function-based handler.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnHandler<F>
where
    F: Fn(&Job) -> anyhow::Result<Vec<Finding>> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> StageHandler for FnHandler<F>
where
    F: Fn(&Job) -> anyhow::Result<Vec<Finding>> + Send + Sync,
{
    async fn run(&self, job: &Job) -> anyhow::Result<Vec<Finding>> {
        (self.func)(job)
    }
}

/// A handler backed by a closure returning a future.
///
/// The closure receives its own clone of the job so the future can be
/// `'static` and do arbitrary I/O.
pub struct AsyncFnHandler<F, Fut>
where
    F: Fn(Job) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<Finding>>> + Send,
{
    name: String,
    func: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> AsyncFnHandler<F, Fut>
where
    F: Fn(Job) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<Finding>>> + Send,
{
    /// Creates a new async function-based handler.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            _phantom: PhantomData,
        }
    }
}

impl<F, Fut> Debug for AsyncFnHandler<F, Fut>
where
    F: Fn(Job) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<Finding>>> + Send,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnHandler")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F, Fut> StageHandler for AsyncFnHandler<F, Fut>
where
    F: Fn(Job) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<Finding>>> + Send,
{
    async fn run(&self, job: &Job) -> anyhow::Result<Vec<Finding>> {
        (self.func)(job.clone()).await
    }
}

/// A handler that finds nothing.
///
/// Useful for stages that only transform the document, such as
/// `redaction` or `encryption`, whose output comes from the finalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughHandler;

#[async_trait]
impl StageHandler for PassThroughHandler {
    async fn run(&self, _job: &Job) -> anyhow::Result<Vec<Finding>> {
        Ok(Vec::new())
    }
}

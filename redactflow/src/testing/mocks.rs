//! Mock stage handlers for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{Finding, Job};
use crate::stages::StageHandler;

/// A shared, ordered log of stage invocations.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Creates an empty call log.
#[must_use]
pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// A handler that returns a fixed list of findings and records calls.
#[derive(Debug)]
pub struct StaticHandler {
    name: String,
    findings: Vec<Finding>,
    call_count: Mutex<usize>,
    log: Option<CallLog>,
}

impl StaticHandler {
    /// Creates a handler returning `findings`.
    #[must_use]
    pub fn new(name: impl Into<String>, findings: Vec<Finding>) -> Self {
        Self {
            name: name.into(),
            findings,
            call_count: Mutex::new(0),
            log: None,
        }
    }

    /// Creates a handler that finds nothing.
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Appends the handler name to `log` on every call.
    #[must_use]
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Returns the number of times the handler was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }
}

#[async_trait]
impl StageHandler for StaticHandler {
    async fn run(&self, _job: &Job) -> anyhow::Result<Vec<Finding>> {
        *self.call_count.lock() += 1;
        if let Some(log) = &self.log {
            log.lock().push(self.name.clone());
        }
        Ok(self.findings.clone())
    }
}

/// A handler that always fails.
#[derive(Debug)]
pub struct FailingHandler {
    name: String,
    error: String,
    log: Option<CallLog>,
}

impl FailingHandler {
    /// Creates a new failing handler.
    #[must_use]
    pub fn new(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: error.into(),
            log: None,
        }
    }

    /// Appends the handler name to `log` on every call.
    #[must_use]
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }
}

#[async_trait]
impl StageHandler for FailingHandler {
    async fn run(&self, _job: &Job) -> anyhow::Result<Vec<Finding>> {
        if let Some(log) = &self.log {
            log.lock().push(self.name.clone());
        }
        Err(anyhow::anyhow!("{}", self.error))
    }
}

/// A handler that panics.
#[derive(Debug)]
pub struct PanickingHandler {
    message: String,
}

impl PanickingHandler {
    /// Creates a handler that panics with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl StageHandler for PanickingHandler {
    async fn run(&self, _job: &Job) -> anyhow::Result<Vec<Finding>> {
        panic!("{}", self.message)
    }
}

/// A handler that sleeps before returning its findings.
#[derive(Debug)]
pub struct SlowHandler {
    delay: Duration,
    findings: Vec<Finding>,
}

impl SlowHandler {
    /// Creates a new slow handler.
    #[must_use]
    pub fn new(delay: Duration, findings: Vec<Finding>) -> Self {
        Self { delay, findings }
    }

    /// Creates a slow handler with delay in milliseconds and no findings.
    #[must_use]
    pub fn with_delay_ms(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms), Vec::new())
    }
}

#[async_trait]
impl StageHandler for SlowHandler {
    async fn run(&self, _job: &Job) -> anyhow::Result<Vec<Finding>> {
        tokio::time::sleep(self.delay).await;
        Ok(self.findings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{finding, job};
    use crate::core::FindingCategory;

    #[tokio::test]
    async fn test_static_handler_counts_and_logs() {
        let log = call_log();
        let handler = StaticHandler::new("ocr", vec![finding(FindingCategory::Name, "x")])
            .with_log(log.clone());

        assert_eq!(handler.run(&job(&["ocr"])).await.unwrap().len(), 1);
        assert_eq!(handler.run(&job(&["ocr"])).await.unwrap().len(), 1);
        assert_eq!(handler.call_count(), 2);
        assert_eq!(*log.lock(), vec!["ocr".to_string(), "ocr".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_handler() {
        let err = FailingHandler::new("nlp", "model offline")
            .run(&job(&["nlp"]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "model offline");
    }

    #[tokio::test]
    async fn test_slow_handler() {
        let findings = SlowHandler::with_delay_ms(1).run(&job(&["a"])).await.unwrap();
        assert!(findings.is_empty());
    }
}

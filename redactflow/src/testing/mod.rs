//! Testing utilities for redactflow pipelines.
//!
//! This module provides:
//! - Mock stage handlers
//! - Fixtures for jobs and findings
//! - Assertions over observed progress and outcomes

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_finished_with, assert_progress_monotonic, assert_progress_sequence,
    assert_stage_order, assert_status,
};
pub use fixtures::{body_findings, finding, finding_at, id_card_findings, job, letterhead_findings};
pub use mocks::{call_log, CallLog, FailingHandler, PanickingHandler, SlowHandler, StaticHandler};

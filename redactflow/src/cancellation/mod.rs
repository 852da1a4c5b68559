//! Cooperative cancellation.
//!
//! A [`CancellationToken`] is shared between whoever may stop a job and the
//! runner executing it. The runner only looks at it on stage boundaries.

mod token;

pub use token::{CancelListener, CancelRequest, CancellationToken};

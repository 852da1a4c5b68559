//! Observer that streams progress over a tokio channel.

use super::Observer;
use crate::core::{JobOutcome, StageResult};
use tokio::sync::mpsc;
use tracing::debug;

/// A message sent by [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// A stage boundary was crossed.
    Stage(StageResult),
    /// The job terminated.
    Finished(Box<JobOutcome>),
}

/// Forwards every notification into an unbounded channel.
///
/// This is how a UI task follows a job running elsewhere. If the receiver
/// is gone the update is dropped; the job keeps running.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ChannelObserver {
    /// Creates an observer and the receiver that reads its updates.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, update: ProgressUpdate) {
        if self.tx.send(update).is_err() {
            debug!("Progress receiver dropped; discarding update");
        }
    }
}

impl Observer for ChannelObserver {
    fn on_stage_result(&self, result: &StageResult) {
        self.send(ProgressUpdate::Stage(result.clone()));
    }

    fn on_finished(&self, outcome: &JobOutcome) {
        self.send(ProgressUpdate::Finished(Box::new(outcome.clone())));
    }
}

//! Ordered progress events with best-effort delivery.
//!
//! The orchestrator produces [`StatusEvent`]s into an unbounded channel;
//! zero or more consumers drain it. Production never blocks on the absence
//! of a consumer: a run continues even when nobody is listening.

use lantern_common::{Stage, StatusEvent};
use tokio::sync::mpsc;
use tracing::debug;

/// Producer half of a run's progress channel.
#[derive(Clone)]
pub struct ProgressSender {
    tx: Option<mpsc::UnboundedSender<StatusEvent>>,
}

impl ProgressSender {
    /// A sender that discards every event, for runs without an attached
    /// consumer.
    pub fn noop() -> Self {
        Self { tx: None }
    }

    /// Emit an event. Delivery is best-effort: a dropped consumer is
    /// logged and ignored.
    pub fn send(&self, event: StatusEvent) {
        if let Some(ref tx) = self.tx {
            if tx.send(event).is_err() {
                debug!("Progress consumer disconnected; continuing without delivery");
            }
        }
    }

    pub fn emit(&self, stage: Stage, message: impl Into<String>) {
        self.send(StatusEvent::new(stage, message));
    }
}

/// Create a progress channel for one run.
pub fn progress_channel() -> (ProgressSender, mpsc::UnboundedReceiver<StatusEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender { tx: Some(tx) }, rx)
}

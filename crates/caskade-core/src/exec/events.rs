//! Event stream between the executor and its caller.
//!
//! Progress and log delivery is an explicit bounded channel rather than
//! callback fan-out: when the consumer lags, sends await, so a slow
//! consumer slows the run down instead of losing or reordering lines.

use tokio::sync::mpsc;

use crate::types::{ItemStatus, LogStream};

use super::RunReport;

/// Default capacity for the event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Events emitted during a queue run.
#[derive(Debug, Clone)]
pub enum ExecEvent {
    /// An item moved to a new status. `message` carries the failure or
    /// cancellation detail when there is one.
    Status {
        item_id: String,
        status: ItemStatus,
        message: Option<String>,
    },
    /// One line of child-process output.
    Log {
        item_id: String,
        line: String,
        stream: LogStream,
    },
    /// The run is over; no further events follow.
    Finished { report: RunReport },
}

/// Sending half handed to the executor. Delivery is fire-and-forget: a
/// dropped receiver never fails the run.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<ExecEvent>,
}

impl EventSink {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ExecEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub async fn status(&self, item_id: &str, status: ItemStatus, message: Option<String>) {
        let _ = self
            .tx
            .send(ExecEvent::Status {
                item_id: item_id.to_string(),
                status,
                message,
            })
            .await;
    }

    pub async fn log(&self, item_id: &str, line: String, stream: LogStream) {
        let _ = self
            .tx
            .send(ExecEvent::Log {
                item_id: item_id.to_string(),
                line,
                stream,
            })
            .await;
    }

    pub async fn finished(&self, report: RunReport) {
        let _ = self.tx.send(ExecEvent::Finished { report }).await;
    }
}

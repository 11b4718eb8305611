// ABOUTME: Per-request event queue carrying executor output to the request handler.
// ABOUTME: Unbounded so publishing never blocks an agent run on a slow consumer.

use crate::error::A2aError;
use crate::types::StreamResponse;
use tokio::sync::mpsc;

pub type EventReceiver = mpsc::UnboundedReceiver<StreamResponse>;

/// Sending half of a request's event channel. Cloning shares the channel.
#[derive(Clone, Debug)]
pub struct EventQueue {
    tx: mpsc::UnboundedSender<StreamResponse>,
}

impl EventQueue {
    pub fn new() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, event: StreamResponse) -> Result<(), A2aError> {
        self.tx
            .send(event)
            .map_err(|_| A2aError::Internal("Event queue is closed".to_string()))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

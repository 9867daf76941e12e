//! EventSink implementations.

use tokio::sync::mpsc;

use crate::domain::{ExecutionEvent, SinkError};
use crate::ports::EventSink;

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn publish(&self, _event: ExecutionEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes each event to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: ExecutionEvent) -> Result<(), SinkError> {
        let payload = serde_json::to_string(&event).map_err(|e| SinkError::Other(e.to_string()))?;
        tracing::info!(
            event = event.name(),
            execution_id = %event.execution_id(),
            execution_type = %event.execution_type(),
            payload = %payload,
            "lifecycle event"
        );
        Ok(())
    }
}

/// Forwards events to an unbounded channel; never blocks the publisher.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn publish(&self, event: ExecutionEvent) -> Result<(), SinkError> {
        self.tx.send(event).map_err(|_| SinkError::Closed)
    }
}

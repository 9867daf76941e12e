//! QueueProcessor - poll → dispatch → ack
//!
//! One call to `poll_once` processes at most one message. The message is
//! acked only after its handler returned `Ok`; any error leaves the lease to
//! expire so the queue redelivers it.

use std::sync::Arc;

use tracing::{Instrument, debug, error, info_span, trace, warn};

use crate::domain::{EngineError, MessageType};
use crate::ports::{Activation, Queue};
use crate::typed::HandlerRegistry;

/// What a single `poll_once` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// This instance is not active; the queue was not touched.
    Inactive,
    /// Nothing was due.
    Idle,
    Processed(MessageType),
    /// The handler failed with a retryable error; the message stays leased.
    Retrying(MessageType),
}

pub struct QueueProcessor {
    queue: Arc<dyn Queue>,
    handlers: Arc<HandlerRegistry>,
    activation: Arc<dyn Activation>,
}

impl QueueProcessor {
    pub fn new(
        queue: Arc<dyn Queue>,
        handlers: Arc<HandlerRegistry>,
        activation: Arc<dyn Activation>,
    ) -> Self {
        Self {
            queue,
            handlers,
            activation,
        }
    }

    /// Fatal errors are returned; retryable handler errors are logged and
    /// reported as `PollOutcome::Retrying`.
    pub async fn poll_once(&self) -> Result<PollOutcome, EngineError> {
        if !self.activation.is_active() {
            trace!("instance inactive, skipping poll");
            return Ok(PollOutcome::Inactive);
        }
        let Some(envelope) = self.queue.poll().await? else {
            return Ok(PollOutcome::Idle);
        };

        let message_type = envelope.message.message_type();
        let execution_id = envelope.message.execution().execution_id;
        let span = info_span!(
            "message",
            %message_type,
            message_id = %envelope.id,
            %execution_id,
        );
        debug!(parent: &span, deliveries = envelope.deliveries, "received message");

        match self
            .handlers
            .dispatch(envelope.message)
            .instrument(span.clone())
            .await
        {
            Ok(()) => {
                self.queue.ack(envelope.id).await?;
                Ok(PollOutcome::Processed(message_type))
            }
            Err(err) if err.is_fatal() => {
                error!(parent: &span, error = %err, "fatal error handling message");
                Err(err)
            }
            Err(err) => {
                warn!(parent: &span, error = %err, "error handling message, leaving for redelivery");
                Ok(PollOutcome::Retrying(message_type))
            }
        }
    }
}

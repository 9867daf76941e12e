//! Queue port - 配送キュー（at-least-once）
//!
//! # 契約
//! - `push`: deliver no earlier than `now + delay`; safe from many producers.
//! - `poll`: hand out at most one due message and lease it. A leased message
//!   is never handed to a second consumer until its lease expires.
//! - `ack`: release the lease permanently; the message is never redelivered.
//!
//! Messages delayed into the future never block `poll` from returning other
//! due messages.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Message, MessageId, QueueError};

/// A leased message.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub id: MessageId,
    pub message: Message,

    /// How many times this message has been handed out, this one included.
    pub deliveries: u32,
}

#[async_trait]
pub trait Queue: Send + Sync {
    async fn push(&self, message: Message, delay: Duration) -> Result<MessageId, QueueError>;

    /// Non-blocking: `Ok(None)` when nothing is due.
    async fn poll(&self) -> Result<Option<Envelope>, QueueError>;

    async fn ack(&self, id: MessageId) -> Result<(), QueueError>;

    async fn push_now(&self, message: Message) -> Result<MessageId, QueueError> {
        self.push(message, Duration::ZERO).await
    }
}

//! EventSink port - ライフサイクルイベントの通知先
//!
//! Fire-and-forget: `publish` must not block, and callers only log an `Err`.
//! A failed publication never fails the state transition already persisted.

use crate::domain::{ExecutionEvent, SinkError};

pub trait EventSink: Send + Sync {
    fn publish(&self, event: ExecutionEvent) -> Result<(), SinkError>;
}

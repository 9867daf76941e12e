//! In-memory queue implementation.
//!
//! Design:
//! - `records` is the single source of truth for every un-acked message.
//! - `ready` (FIFO) and `scheduled` (min-heap by due time) hold MessageIds only.
//! - Delayed pushes and lease expiries both go through `scheduled`; a heap
//!   entry whose record has moved on since it was pushed is simply dropped.
//! - Time is `tokio::time::Instant`, so tests can pause and advance it.

use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::domain::{Message, MessageId, QueueError};
use crate::observability::QueueCounts;
use crate::ports::{Envelope, Queue};

/// Default visibility window of a lease.
pub const DEFAULT_LEASE_DURATION: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordState {
    /// Waiting for its delivery time.
    Delayed { until: Instant },
    Ready,
    Leased { until: Instant },
}

#[derive(Debug)]
struct Record {
    message: Message,
    state: RecordState,
    deliveries: u32,
}

/// Heap entry. Reverse ordering so BinaryHeap pops the earliest first;
/// `seq` keeps equal due times in push order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScheduledEntry {
    due: Instant,
    seq: u64,
    id: MessageId,
}

impl PartialOrd for ScheduledEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct QueueState {
    records: HashMap<MessageId, Record>,
    ready: VecDeque<MessageId>,
    scheduled: BinaryHeap<ScheduledEntry>,
    next_seq: u64,
}

impl QueueState {
    fn new() -> Self {
        Self {
            records: HashMap::new(),
            ready: VecDeque::new(),
            scheduled: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    fn schedule(&mut self, id: MessageId, due: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.scheduled.push(ScheduledEntry { due, seq, id });
    }

    /// Move due delayed messages and expired leases to `ready`.
    fn promote_due(&mut self, now: Instant) {
        while let Some(entry) = self.scheduled.peek() {
            if entry.due > now {
                break;
            }
            let Some(entry) = self.scheduled.pop() else {
                break;
            };
            let Some(record) = self.records.get_mut(&entry.id) else {
                continue; // acked
            };
            let due = match record.state {
                RecordState::Delayed { until } | RecordState::Leased { until } => until,
                RecordState::Ready => continue,
            };
            if due == entry.due {
                if matches!(record.state, RecordState::Leased { .. }) {
                    tracing::debug!(message_id = %entry.id, "lease expired, redelivering");
                }
                record.state = RecordState::Ready;
                self.ready.push_back(entry.id);
            }
        }
    }

    fn counts(&self) -> QueueCounts {
        let mut counts = QueueCounts::default();
        for record in self.records.values() {
            match record.state {
                RecordState::Delayed { .. } => counts.scheduled += 1,
                RecordState::Ready => counts.ready += 1,
                RecordState::Leased { .. } => counts.leased += 1,
            }
        }
        counts
    }
}

/// Single-process queue. Shared across workers through `Arc`.
pub struct InMemoryQueue {
    state: Mutex<QueueState>,
    lease_duration: Duration,
}

impl InMemoryQueue {
    pub fn new(lease_duration: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::new()),
            lease_duration,
        }
    }

    pub async fn counts(&self) -> QueueCounts {
        self.state.lock().await.counts()
    }

    /// True when nothing is ready, delayed or leased.
    pub async fn is_drained(&self) -> bool {
        self.state.lock().await.records.is_empty()
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new(DEFAULT_LEASE_DURATION)
    }
}

#[async_trait]
impl Queue for InMemoryQueue {
    async fn push(&self, message: Message, delay: Duration) -> Result<MessageId, QueueError> {
        let id = MessageId::generate();
        let mut state = self.state.lock().await;
        if delay.is_zero() {
            state.records.insert(
                id,
                Record {
                    message,
                    state: RecordState::Ready,
                    deliveries: 0,
                },
            );
            state.ready.push_back(id);
        } else {
            let until = Instant::now() + delay;
            state.records.insert(
                id,
                Record {
                    message,
                    state: RecordState::Delayed { until },
                    deliveries: 0,
                },
            );
            state.schedule(id, until);
        }
        Ok(id)
    }

    async fn poll(&self) -> Result<Option<Envelope>, QueueError> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        state.promote_due(now);

        while let Some(id) = state.ready.pop_front() {
            let until = now + self.lease_duration;
            let Some(record) = state.records.get_mut(&id) else {
                continue;
            };
            if record.state != RecordState::Ready {
                continue;
            }
            record.state = RecordState::Leased { until };
            record.deliveries += 1;
            let envelope = Envelope {
                id,
                message: record.message.clone(),
                deliveries: record.deliveries,
            };
            state.schedule(id, until);
            return Ok(Some(envelope));
        }
        Ok(None)
    }

    async fn ack(&self, id: MessageId) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        match state.records.remove(&id) {
            Some(_) => Ok(()),
            None => Err(QueueError::UnknownMessage(id)),
        }
    }
}

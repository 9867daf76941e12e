//! Impls - ports の実装（開発・テスト用）
//!
//! - InMemoryQueue: lease 付きの at-least-once キュー
//! - InMemoryExecutionRepository: 実行状態ストア
//! - event sinks: Noop / Tracing / Channel

pub mod event_sinks;
pub mod inmem_queue;
pub mod inmem_repository;

pub use self::event_sinks::{ChannelEventSink, NoopEventSink, TracingEventSink};
pub use self::inmem_queue::{DEFAULT_LEASE_DURATION, InMemoryQueue};
pub use self::inmem_repository::InMemoryExecutionRepository;

//! App - アプリケーション層
//!
//! ports を組み合わせて実行エンジンを組み立てます。
//!
//! # 主要コンポーネント
//! - **EngineBuilder / Engine**: 構築とワイヤリング（起動時検証つき）
//! - **handlers**: メッセージ型ごとの状態遷移
//! - **TaskWorker**: RunTask の実行と再スケジュール
//! - **QueueProcessor**: poll → dispatch → ack
//! - **WorkerGroup**: 固定間隔の poll ループ群

pub mod builder;
pub mod config;
pub mod handlers;
pub mod processor;
pub mod task_worker;
pub mod worker_group;

pub use self::builder::{BuildError, Engine, EngineBuilder};
pub use self::config::{ConfigError, EngineConfig};
pub use self::handlers::HandlerDeps;
pub use self::processor::{PollOutcome, QueueProcessor};
pub use self::task_worker::TaskWorker;
pub use self::worker_group::WorkerGroup;

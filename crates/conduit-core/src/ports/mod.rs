//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。外部コラボレータ（永続化、キュー、
//! discovery、UI 向け通知）への境界をここで定義し、実装は `impls` に置きます。

pub mod activation;
pub mod clock;
pub mod event_sink;
pub mod queue;
pub mod repository;

pub use self::activation::{Activation, ActivationFlag};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::EventSink;
pub use self::queue::{Envelope, Queue};
pub use self::repository::ExecutionRepository;

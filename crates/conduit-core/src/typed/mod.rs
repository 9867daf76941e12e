//! Typed - 型付き Task / MessageHandler API
//!
//! # 二層構造
//! - **表層（Typed）**: `Task` trait, `MessageHandler<M>` trait - 型安全
//! - **内部（Dyn）**: `DynMessageHandler` trait - object-safe, type erasure

pub mod handler;
pub mod registry;
pub mod task;

pub use self::handler::{DynMessageHandler, MessageHandler, TypedMessageHandler};
pub use self::registry::{HandlerRegistry, RegistryError};
pub use self::task::{Task, TaskRegistry};

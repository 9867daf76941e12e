//! HandlerRegistry - メッセージ型 → ハンドラの登録と管理
//!
//! # 学習ポイント
//! - HashMap での型消去された trait object の管理
//! - Generic methods での登録と型安全性
//! - 起動時検証（登録漏れは wiring の欠陥として fail-fast）

use std::collections::HashMap;
use std::sync::Arc;

use super::handler::{DynMessageHandler, MessageHandler, TypedMessageHandler};
use crate::domain::{EngineError, Message, MessagePayload, MessageType, TaskType};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("handler for message type '{0}' is already registered")]
    HandlerAlreadyRegistered(MessageType),

    #[error("task type '{0}' is already registered")]
    TaskAlreadyRegistered(TaskType),
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<MessageType, Arc<dyn DynMessageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M: MessagePayload, H: MessageHandler<M> + 'static>(
        &mut self,
        handler: H,
    ) -> Result<(), RegistryError> {
        if self.handlers.contains_key(&M::TYPE) {
            return Err(RegistryError::HandlerAlreadyRegistered(M::TYPE));
        }
        let typed = TypedMessageHandler::<M, H>::new(handler);
        self.handlers.insert(M::TYPE, Arc::new(typed));
        Ok(())
    }

    pub fn get(&self, message_type: MessageType) -> Option<Arc<dyn DynMessageHandler>> {
        self.handlers.get(&message_type).cloned()
    }

    /// Message types that have no handler yet.
    pub fn missing_types(&self) -> Vec<MessageType> {
        MessageType::ALL
            .into_iter()
            .filter(|t| !self.handlers.contains_key(t))
            .collect()
    }

    /// Route one message to the handler registered for its runtime type.
    pub async fn dispatch(&self, message: Message) -> Result<(), EngineError> {
        let message_type = message.message_type();
        let handler = self
            .get(message_type)
            .ok_or(EngineError::NoHandler(message_type))?;
        handler.handle_dyn(message).await
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

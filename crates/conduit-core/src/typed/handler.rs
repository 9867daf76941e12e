//! MessageHandler trait - メッセージ型ごとのハンドラ定義
//!
//! # 学習ポイント
//! - ジェネリック trait (`MessageHandler<M>`)
//! - Object-safe trait (`DynMessageHandler`)
//! - Type erasure パターン (`TypedMessageHandler<M, H>` → `DynMessageHandler`)

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::domain::{EngineError, Message, MessagePayload, MessageType};

/// Handles exactly one message type.
///
/// `MessageHandler<TaskStarting>` can only ever be given a `TaskStarting`;
/// the pairing is checked at compile time.
#[async_trait]
pub trait MessageHandler<M: MessagePayload>: Send + Sync {
    async fn handle(&self, message: M) -> Result<(), EngineError>;
}

/// Object-safe form stored in the `HandlerRegistry`.
#[async_trait]
pub trait DynMessageHandler: Send + Sync {
    async fn handle_dyn(&self, message: Message) -> Result<(), EngineError>;
    fn message_type(&self) -> MessageType;
}

pub struct TypedMessageHandler<M: MessagePayload, H: MessageHandler<M>> {
    handler: H,
    _marker: PhantomData<fn(M)>,
}

impl<M: MessagePayload, H: MessageHandler<M>> TypedMessageHandler<M, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<M: MessagePayload, H: MessageHandler<M>> DynMessageHandler for TypedMessageHandler<M, H> {
    async fn handle_dyn(&self, message: Message) -> Result<(), EngineError> {
        let actual = message.message_type();
        let payload = M::from_message(message).ok_or(EngineError::MismatchedMessage {
            expected: M::TYPE,
            actual,
        })?;
        self.handler.handle(payload).await
    }

    fn message_type(&self) -> MessageType {
        M::TYPE
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::{
        ExecutionId, ExecutionRef, ExecutionType, StartExecution, StartStage, StageId,
    };

    #[derive(Default)]
    struct Collect(Mutex<Vec<StartExecution>>);

    #[async_trait]
    impl MessageHandler<StartExecution> for Collect {
        async fn handle(&self, message: StartExecution) -> Result<(), EngineError> {
            self.0.lock().unwrap().push(message);
            Ok(())
        }
    }

    fn execution_ref() -> ExecutionRef {
        ExecutionRef::new(ExecutionType::Pipeline, ExecutionId::generate(), "foo")
    }

    #[tokio::test]
    async fn typed_handler_unwraps_its_payload() {
        let typed = TypedMessageHandler::<StartExecution, _>::new(Collect::default());
        assert_eq!(typed.message_type(), MessageType::StartExecution);

        let message = StartExecution {
            execution: execution_ref(),
        };
        typed.handle_dyn(message.clone().into()).await.unwrap();
        assert_eq!(typed.handler.0.lock().unwrap().as_slice(), &[message]);
    }

    #[tokio::test]
    async fn typed_handler_rejects_other_types() {
        let typed = TypedMessageHandler::<StartExecution, _>::new(Collect::default());
        let other: Message = StartStage {
            stage: execution_ref().stage(StageId::generate()),
        }
        .into();

        let err = typed.handle_dyn(other).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::MismatchedMessage {
                expected: MessageType::StartExecution,
                actual: MessageType::StartStage,
            }
        ));
    }
}

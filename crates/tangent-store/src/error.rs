use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Thread not found: {0}")]
    ThreadNotFound(Uuid),

    #[error("Message not found: {0}")]
    MessageNotFound(Uuid),

    #[error("Swipe index {index} out of range (message has {len} swipes)")]
    InvalidSwipeIndex { index: usize, len: usize },

    #[error("Message {0} is not an assistant message")]
    NotAssistantMessage(Uuid),
}

pub type Result<T> = std::result::Result<T, StoreError>;

pub mod error;
pub mod migrate;
pub mod models;
pub mod persistence;
pub mod store;

pub use error::StoreError;
pub use migrate::migrate_threads;
pub use models::{
    ContextSettings, HistoryRange, Message, MessageRole, MessageStatus, SwipeSet, Thread,
};
pub use persistence::{NullPersistence, ThreadPersistence};
pub use store::{BranchView, SwipeDeletion, ThreadStore};

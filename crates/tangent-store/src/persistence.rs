use async_trait::async_trait;

use crate::models::Thread;

/// Durable storage boundary. The host implements this; the engine awaits
/// `persist` after each mutation batch before reporting success, so the
/// in-memory store and durable state stay crash-consistent.
#[async_trait]
pub trait ThreadPersistence: Send + Sync {
    async fn persist(&self, threads: &[Thread]) -> anyhow::Result<()>;
}

/// No-op sink for hosts without durable storage and for tests
#[derive(Debug, Default)]
pub struct NullPersistence;

#[async_trait]
impl ThreadPersistence for NullPersistence {
    async fn persist(&self, _threads: &[Thread]) -> anyhow::Result<()> {
        Ok(())
    }
}

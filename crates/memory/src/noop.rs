//! No-op storage — disables persistence entirely.

use async_trait::async_trait;
use ctxkeeper_core::error::MemoryError;
use ctxkeeper_core::message::{GroupId, Message, SessionKey};
use ctxkeeper_core::storage::{SessionStorage, StorageLoad};

/// A storage backend that keeps nothing and loads nothing.
pub struct NoopStorage;

#[async_trait]
impl SessionStorage for NoopStorage {
    fn name(&self) -> &str {
        "none"
    }

    async fn load_all(&self) -> Result<StorageLoad, MemoryError> {
        Ok(StorageLoad::default())
    }

    async fn save(&self, _key: SessionKey, _history: &[Message]) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn remove(&self, _key: SessionKey) -> Result<bool, MemoryError> {
        Ok(false)
    }

    async fn remove_group(&self, _group: GroupId) -> Result<bool, MemoryError> {
        Ok(false)
    }

    async fn remove_all(&self) -> Result<usize, MemoryError> {
        Ok(0)
    }
}

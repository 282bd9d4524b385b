//! SessionStorage trait — durable per-participant history records.
//!
//! One record per [`SessionKey`], holding the full ordered history as of
//! the last save. Saves overwrite the whole record.
//!
//! Implementations: JSON files on disk, no-op (ephemeral runs).

use crate::error::MemoryError;
use crate::message::{GroupId, Message, SessionKey};
use async_trait::async_trait;

/// A history restored from durable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSession {
    pub key: SessionKey,
    pub history: Vec<Message>,
}

/// Everything a bulk load found: the sessions that parsed, and the
/// records that did not.
#[derive(Debug, Default)]
pub struct StorageLoad {
    pub sessions: Vec<PersistedSession>,
    pub skipped: Vec<MemoryError>,
}

#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// The backend name (e.g., "file", "none").
    fn name(&self) -> &str;

    /// Read every record. Malformed records are reported in
    /// [`StorageLoad::skipped`] rather than failing the load.
    async fn load_all(&self) -> Result<StorageLoad, MemoryError>;

    /// Overwrite the record for `key` with `history`.
    async fn save(&self, key: SessionKey, history: &[Message]) -> Result<(), MemoryError>;

    /// Delete the record for `key`. Returns whether one existed.
    async fn remove(&self, key: SessionKey) -> Result<bool, MemoryError>;

    /// Delete every record in `group`. Returns whether any existed.
    async fn remove_group(&self, group: GroupId) -> Result<bool, MemoryError>;

    /// Delete every group's records, including groups whose records were
    /// skipped on load. Returns how many groups were removed.
    async fn remove_all(&self) -> Result<usize, MemoryError>;
}

//! Bridge between the in-memory [`ContextStore`] and durable storage.
//!
//! Startup bulk-loads every record into the store; after each turn the
//! touched participant's full history is flushed back. A failed flush
//! never touches the in-memory state.

use crate::store::ContextStore;
use ctxkeeper_core::error::MemoryError;
use ctxkeeper_core::message::{GroupId, SessionKey};
use ctxkeeper_core::storage::SessionStorage;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of a bulk load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct Persistence {
    storage: Arc<dyn SessionStorage>,
}

impl Persistence {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    pub fn backend_name(&self) -> &str {
        self.storage.name()
    }

    /// Register every durable record into `store`, replacing whatever the
    /// store held for those keys. Malformed records are skipped.
    pub async fn load_all(&self, store: &ContextStore) -> Result<LoadReport, MemoryError> {
        let load = self.storage.load_all().await?;

        for err in &load.skipped {
            warn!(error = %err, "Session record not loaded");
        }

        let report = LoadReport {
            loaded: load.sessions.len(),
            skipped: load.skipped.len(),
        };
        for session in load.sessions {
            store.replace(session.key, session.history).await;
        }

        info!(
            backend = self.storage.name(),
            loaded = report.loaded,
            skipped = report.skipped,
            "Conversation histories restored"
        );
        Ok(report)
    }

    /// Overwrite the durable record for `key` with its current history.
    pub async fn flush(&self, store: &ContextStore, key: SessionKey) -> Result<(), MemoryError> {
        let history = store.get(key).await;
        self.storage.save(key, &history).await
    }

    /// Clear one participant in memory and on disk.
    pub async fn forget(&self, store: &ContextStore, key: SessionKey) -> Result<bool, MemoryError> {
        store.clear_participant(key).await;
        self.storage.remove(key).await
    }

    /// Clear one group in memory and on disk.
    pub async fn forget_group(
        &self,
        store: &ContextStore,
        group: GroupId,
    ) -> Result<bool, MemoryError> {
        store.clear_group(group).await;
        self.storage.remove_group(group).await
    }

    /// Clear every group in memory and every group record on disk,
    /// including groups the store never loaded. Returns the number of
    /// groups removed from storage.
    pub async fn forget_all(&self, store: &ContextStore) -> Result<usize, MemoryError> {
        store.clear_all().await;
        self.storage.remove_all().await
    }
}

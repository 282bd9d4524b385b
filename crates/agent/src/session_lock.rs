//! Per-session mutual exclusion.
//!
//! Turns for the same `(group, participant)` pair run one at a time; turns
//! for different pairs never wait on each other. The guard is an owned
//! tokio mutex guard, so it is released on every exit path, including a
//! failed or cancelled inference call.

use ctxkeeper_core::message::SessionKey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

/// Held for the duration of one turn.
pub type SessionGuard = OwnedMutexGuard<()>;

#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<SessionKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other turn holds `key`, then hold it.
    pub async fn acquire(&self, key: SessionKey) -> SessionGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries only the map references are idle.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(key).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of sessions currently held or waited on.
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}

//! In-memory context store — the sole owner of every conversation history.
//!
//! Histories live in a nested `group → participant → messages` map behind a
//! single async `RwLock`. Every operation holds the lock for one in-memory
//! step only; nothing here awaits I/O. Reads hand out owned copies, so no
//! caller keeps a reference into the map across calls.

use ctxkeeper_core::message::{GroupId, Message, ParticipantId, SessionKey};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

type Histories = HashMap<GroupId, HashMap<ParticipantId, Vec<Message>>>;

/// Cheap to clone: clones share the same underlying map.
#[derive(Clone, Default)]
pub struct ContextStore {
    groups: Arc<RwLock<Histories>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty participant map for `group` if absent.
    pub async fn ensure_group(&self, group: GroupId) {
        self.groups.write().await.entry(group).or_default();
    }

    /// Create an empty history for `key` (and its group) if absent.
    pub async fn ensure_participant(&self, key: SessionKey) {
        self.groups
            .write()
            .await
            .entry(key.group)
            .or_default()
            .entry(key.participant)
            .or_default();
    }

    /// Append `messages` to the end of the history, in order.
    pub async fn append(&self, key: SessionKey, messages: Vec<Message>) {
        let mut groups = self.groups.write().await;
        let history = groups
            .entry(key.group)
            .or_default()
            .entry(key.participant)
            .or_default();
        history.extend(messages);
        debug!(
            group = key.group,
            participant = key.participant,
            len = history.len(),
            "History appended"
        );
    }

    /// Replace the whole history for `key`. Used when restoring from storage.
    pub async fn replace(&self, key: SessionKey, history: Vec<Message>) {
        self.groups
            .write()
            .await
            .entry(key.group)
            .or_default()
            .insert(key.participant, history);
    }

    /// The current history, or an empty one if the group or participant is
    /// unknown. Does not create entries.
    pub async fn get(&self, key: SessionKey) -> Vec<Message> {
        self.groups
            .read()
            .await
            .get(&key.group)
            .and_then(|participants| participants.get(&key.participant))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of messages stored for `key`.
    pub async fn len(&self, key: SessionKey) -> usize {
        self.groups
            .read()
            .await
            .get(&key.group)
            .and_then(|participants| participants.get(&key.participant))
            .map_or(0, Vec::len)
    }

    /// Remove the two oldest entries if at least two exist.
    ///
    /// Returns `false` (and changes nothing) on a history shorter than two.
    pub async fn trim_oldest_exchange(&self, key: SessionKey) -> bool {
        let mut groups = self.groups.write().await;
        let Some(history) = groups
            .get_mut(&key.group)
            .and_then(|participants| participants.get_mut(&key.participant))
        else {
            return false;
        };

        if history.len() < 2 {
            return false;
        }
        history.drain(..2);
        debug!(
            group = key.group,
            participant = key.participant,
            remaining = history.len(),
            "Trimmed oldest exchange"
        );
        true
    }

    pub async fn clear_participant(&self, key: SessionKey) {
        if let Some(participants) = self.groups.write().await.get_mut(&key.group) {
            participants.remove(&key.participant);
        }
    }

    pub async fn clear_group(&self, group: GroupId) {
        self.groups.write().await.remove(&group);
    }

    pub async fn clear_all(&self) {
        self.groups.write().await.clear();
    }

    pub async fn contains_group(&self, group: GroupId) -> bool {
        self.groups.read().await.contains_key(&group)
    }

    /// Known group ids, ascending.
    pub async fn groups(&self) -> Vec<GroupId> {
        let mut ids: Vec<GroupId> = self.groups.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Known participant ids in `group`, ascending.
    pub async fn participants(&self, group: GroupId) -> Vec<ParticipantId> {
        let mut ids: Vec<ParticipantId> = self
            .groups
            .read()
            .await
            .get(&group)
            .map(|participants| participants.keys().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// Total number of participant histories across all groups.
    pub async fn session_count(&self) -> usize {
        self.groups.read().await.values().map(HashMap::len).sum()
    }
}

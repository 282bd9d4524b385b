//! File-based session storage — one JSON document per participant.
//!
//! Layout under the storage root:
//!
//! ```text
//! database/
//!   DO_NOT_TOUCH            storage-root marker, never loaded
//!   <group_id>/
//!     <participant_id>.json [{"role": "user", "content": "..."}, ...]
//! ```
//!
//! Saves rewrite the whole file through a temporary sibling and a rename,
//! so a reader never observes a half-written record.

use async_trait::async_trait;
use ctxkeeper_core::error::MemoryError;
use ctxkeeper_core::message::{GroupId, Message, ParticipantId, SessionKey};
use ctxkeeper_core::storage::{PersistedSession, SessionStorage, StorageLoad};
use std::io::ErrorKind;
use tokio::io::AsyncWriteExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Entries at the storage root whose name contains this are skipped.
pub const ROOT_SENTINEL: &str = "DO_NOT_TOUCH";

const RECORD_EXT: &str = ".json";
const TEMP_EXT: &str = ".tmp";

/// A directory tree of per-participant JSON records.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage root and its marker file if missing.
    pub async fn init(&self) -> Result<(), MemoryError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            MemoryError::Storage(format!(
                "Failed to create storage root {}: {e}",
                self.root.display()
            ))
        })?;

        let marker = self.root.join(ROOT_SENTINEL);
        if !tokio::fs::try_exists(&marker).await.unwrap_or(false) {
            tokio::fs::write(&marker, b"").await.map_err(|e| {
                MemoryError::Storage(format!("Failed to write {}: {e}", marker.display()))
            })?;
        }
        Ok(())
    }

    fn group_dir(&self, group: GroupId) -> PathBuf {
        self.root.join(group.to_string())
    }

    fn record_path(&self, key: SessionKey) -> PathBuf {
        self.group_dir(key.group)
            .join(format!("{}{RECORD_EXT}", key.participant))
    }

    /// Load every participant record in one group directory. A directory
    /// that cannot be listed is reported as skipped.
    async fn load_group(&self, group: GroupId, dir: &Path, out: &mut StorageLoad) {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                skip(out, dir, format!("cannot list group directory: {e}"));
                return;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    skip(out, dir, format!("listing interrupted: {e}"));
                    break;
                }
            };
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            if name.ends_with(TEMP_EXT) {
                debug!(path = %path.display(), "Ignoring leftover temporary record");
                continue;
            }

            let participant = match parse_record_name(&name) {
                Some(id) => id,
                None => {
                    skip(out, &path, "not a <participant_id>.json record".into());
                    continue;
                }
            };

            let content = match tokio::fs::read_to_string(&path).await {
                Ok(c) => c,
                Err(e) => {
                    skip(out, &path, e.to_string());
                    continue;
                }
            };

            match serde_json::from_str::<Vec<Message>>(&content) {
                Ok(history) => out.sessions.push(PersistedSession {
                    key: SessionKey::new(group, participant),
                    history,
                }),
                Err(e) => skip(out, &path, e.to_string()),
            }
        }
    }
}

fn parse_record_name(name: &str) -> Option<ParticipantId> {
    name.strip_suffix(RECORD_EXT)?.parse().ok()
}

fn skip(out: &mut StorageLoad, path: &Path, reason: String) {
    warn!(path = %path.display(), reason = %reason, "Skipping malformed session record");
    out.skipped.push(MemoryError::Malformed {
        location: path.display().to_string(),
        reason,
    });
}

#[async_trait]
impl SessionStorage for FileStorage {
    fn name(&self) -> &str {
        "file"
    }

    async fn load_all(&self) -> Result<StorageLoad, MemoryError> {
        let mut out = StorageLoad::default();

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(root = %self.root.display(), "Storage root missing, nothing to load");
                return Ok(out);
            }
            Err(e) => {
                return Err(MemoryError::Storage(format!(
                    "Failed to list {}: {e}",
                    self.root.display()
                )));
            }
        };

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            MemoryError::Storage(format!("Failed to list {}: {e}", self.root.display()))
        })? {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            if name.contains(ROOT_SENTINEL) {
                continue;
            }

            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            let group = match name.parse::<GroupId>() {
                Ok(id) if is_dir => id,
                _ => {
                    skip(&mut out, &path, "not a <group_id> directory".into());
                    continue;
                }
            };

            self.load_group(group, &path, &mut out).await;
        }

        out.sessions.sort_by_key(|s| s.key);
        debug!(
            root = %self.root.display(),
            loaded = out.sessions.len(),
            skipped = out.skipped.len(),
            "Session records read"
        );
        Ok(out)
    }

    async fn save(&self, key: SessionKey, history: &[Message]) -> Result<(), MemoryError> {
        let dir = self.group_dir(key.group);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            MemoryError::Storage(format!("Failed to create {}: {e}", dir.display()))
        })?;

        let body = serde_json::to_string_pretty(history).map_err(|e| MemoryError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        let path = self.record_path(key);
        let tmp = path.with_file_name(format!("{}{RECORD_EXT}{TEMP_EXT}", key.participant));

        let write_err = |e: std::io::Error| {
            MemoryError::Storage(format!("Failed to write {}: {e}", tmp.display()))
        };
        let mut file = tokio::fs::File::create(&tmp).await.map_err(write_err)?;
        file.write_all(body.as_bytes()).await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            MemoryError::Storage(format!("Failed to replace {}: {e}", path.display()))
        })?;

        debug!(path = %path.display(), messages = history.len(), "Session record written");
        Ok(())
    }

    async fn remove(&self, key: SessionKey) -> Result<bool, MemoryError> {
        let path = self.record_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(MemoryError::Storage(format!(
                "Failed to delete {}: {e}",
                path.display()
            ))),
        }
    }

    async fn remove_group(&self, group: GroupId) -> Result<bool, MemoryError> {
        let dir = self.group_dir(group);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(MemoryError::Storage(format!(
                "Failed to delete {}: {e}",
                dir.display()
            ))),
        }
    }

    async fn remove_all(&self) -> Result<usize, MemoryError> {
        let list_err = |e: std::io::Error| {
            MemoryError::Storage(format!("Failed to list {}: {e}", self.root.display()))
        };
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(list_err(e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            let Ok(group) = entry.file_name().to_string_lossy().parse::<GroupId>() else {
                continue;
            };
            if is_dir && self.remove_group(group).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

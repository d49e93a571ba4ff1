//! Durable recovery storage for the active booking.
//!
//! One JSON document on disk holds the [`RecoverySnapshot`]; the booking id
//! and the last status the client observed. It is rewritten on every
//! non-terminal status transition and removed on cancellation/completion, so
//! at most one snapshot exists per session. Reads fail soft: a missing,
//! unreadable, or corrupt file is simply "no snapshot", because recovery
//! must never block startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::SessionError;
use sakay_core::booking::BookingStatus;

/// Minimal persisted state to resume tracking an in-flight booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverySnapshot {
    pub booking_id: i64,
    pub last_status: BookingStatus,
}

/// File-backed key/value store for the recovery snapshot.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored snapshot, if a valid one exists.
    ///
    /// Any failure (missing file, I/O error, corrupt JSON) reads as `None`
    /// and is logged at debug.
    pub async fn load(&self) -> Option<RecoverySnapshot> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(path = %self.path.display(), error = %err, "session file unreadable");
                }
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::debug!(path = %self.path.display(), error = %err, "session file corrupt; ignoring");
                None
            }
        }
    }

    /// Persists the snapshot atomically (temp file + rename), so a crash
    /// mid-write can never leave a truncated document behind.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] on filesystem failure.
    pub async fn save(&self, snapshot: &RecoverySnapshot) -> Result<(), SessionError> {
        let body = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(
            path = %self.path.display(),
            booking_id = snapshot.booking_id,
            status = %snapshot.last_status,
            "recovery snapshot saved"
        );
        Ok(())
    }

    /// Removes the stored snapshot. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] on filesystem failure other than
    /// not-found.
    pub async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SessionError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_store(tag: &str) -> SessionStore {
        let path = std::env::temp_dir().join(format!("sakay-session-{tag}-{}.json", uuid::Uuid::new_v4()));
        SessionStore::new(path)
    }

    #[tokio::test]
    async fn load_without_file_is_none() {
        let store = scratch_store("missing");
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = scratch_store("roundtrip");
        let snapshot = RecoverySnapshot {
            booking_id: 42,
            last_status: BookingStatus::Pending,
        };
        store.save(&snapshot).await.unwrap();
        assert_eq!(store.load().await, Some(snapshot));
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn save_overwrites_previous_snapshot() {
        let store = scratch_store("overwrite");
        store
            .save(&RecoverySnapshot {
                booking_id: 1,
                last_status: BookingStatus::Pending,
            })
            .await
            .unwrap();
        store
            .save(&RecoverySnapshot {
                booking_id: 1,
                last_status: BookingStatus::Accepted,
            })
            .await
            .unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.last_status, BookingStatus::Accepted);
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_none() {
        let store = scratch_store("corrupt");
        tokio::fs::write(store.path(), b"{ not json").await.unwrap();
        assert!(store.load().await.is_none());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = scratch_store("clear");
        store.clear().await.unwrap();
        store.clear().await.unwrap();
    }
}

//! File-backed [`SessionStore`].
//!
//! On-disk format: a CBOR envelope
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `schema_version` | bumped on incompatible layout changes |
//! | `fingerprint` | hex SHA-256 of the CBOR-encoded session |
//! | `session` | the [`VotingSession`] itself |

use crate::serialization::{fingerprint, from_cbor, to_cbor};
use crate::voting::{SessionStore, StoreError, StoreResult, VotingSession};
use async_trait::async_trait;
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Envelope written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub schema_version: u32,
    pub fingerprint: String,
    pub session: VotingSession,
}

impl StoredSession {
    /// Wrap `session` with its current fingerprint.
    pub fn seal(session: &VotingSession) -> StoreResult<Self> {
        let fingerprint =
            fingerprint(session).map_err(|e| StoreError::Encode(e.to_string()))?;
        Ok(Self {
            schema_version: SCHEMA_VERSION,
            fingerprint,
            session: session.clone(),
        })
    }

    /// Verify version, fingerprint and invariants, returning the session.
    pub fn open(self) -> StoreResult<VotingSession> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion {
                found: self.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        let computed =
            fingerprint(&self.session).map_err(|e| StoreError::Encode(e.to_string()))?;
        if computed != self.fingerprint {
            return Err(StoreError::Integrity {
                stored: self.fingerprint,
                computed,
            });
        }
        self.session.validate().map_err(StoreError::Corrupt)?;
        Ok(self.session)
    }
}

/// Session stored in one file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a session file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the raw envelope without verifying it.
    pub async fn read_envelope(&self) -> StoreResult<Option<StoredSession>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "Failed to read '{}': {}",
                    self.path.display(),
                    e
                )))
            }
        };
        let envelope = from_cbor(&bytes).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Some(envelope))
    }

    /// Path of the advisory lock file guarding this session.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Take the exclusive cross-process lock, waiting for other holders.
    ///
    /// Hold the returned guard across the whole load, mutate, save sequence.
    /// The lock is released when the guard is dropped.
    pub async fn lock(&self) -> StoreResult<SessionLock> {
        let lock_path = self.lock_path();
        let file = tokio::task::spawn_blocking(move || -> StoreResult<File> {
            create_parent_dir(&lock_path)?;
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)
                .map_err(|e| {
                    StoreError::Io(format!("Failed to open '{}': {}", lock_path.display(), e))
                })?;
            file.lock_exclusive().map_err(|e| {
                StoreError::Io(format!("Failed to lock '{}': {}", lock_path.display(), e))
            })?;
            Ok(file)
        })
        .await
        .map_err(|e| StoreError::Io(format!("Lock task failed: {}", e)))??;

        debug!(path = %self.path.display(), "session lock acquired");
        Ok(SessionLock { _file: file })
    }
}

/// Exclusive hold on a session file. Dropping it releases the lock.
#[derive(Debug)]
pub struct SessionLock {
    _file: File,
}

fn create_parent_dir(path: &Path) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            StoreError::Io(format!(
                "Failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

/// Write `bytes` to a fresh temp file beside `path`, then rename it over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    create_parent_dir(path)?;
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    let io_err = |what: &str, e: std::io::Error| {
        StoreError::Io(format!("Failed to {} '{}': {}", what, path.display(), e))
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_err("stage", e))?;
    tmp.write_all(bytes).map_err(|e| io_err("write", e))?;
    tmp.as_file().sync_all().map_err(|e| io_err("sync", e))?;
    tmp.persist(path).map_err(|e| io_err("replace", e.error))?;
    Ok(())
}

#[async_trait]
impl SessionStore for FileStore {
    async fn load(&self) -> StoreResult<Option<VotingSession>> {
        let Some(envelope) = self.read_envelope().await? else {
            debug!(path = %self.path.display(), "no session file");
            return Ok(None);
        };
        envelope.open().map(Some)
    }

    async fn save(&self, session: &VotingSession) -> StoreResult<()> {
        let envelope = StoredSession::seal(session)?;
        let bytes = to_cbor(&envelope).map_err(|e| StoreError::Encode(e.to_string()))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| StoreError::Io(format!("Write task failed: {}", e)))??;

        info!(
            path = %self.path.display(),
            fingerprint = %envelope.fingerprint,
            phase = %session.workflow_status(),
            "session saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Principal;
    use tempfile::TempDir;

    fn p(id: &str) -> Principal {
        Principal::new(id).unwrap()
    }

    fn sample_session() -> VotingSession {
        let mut session = VotingSession::new(p("owner"));
        session.add_voter(&p("owner"), p("alice")).unwrap();
        session.add_voter(&p("owner"), p("bob")).unwrap();
        session.start_proposals_registering(&p("owner")).unwrap();
        session.add_proposal(&p("alice"), "Demo proposal").unwrap();
        session
    }

    #[tokio::test]
    async fn test_missing_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("session.cbor"));
        assert!(!store.exists());
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("session.cbor"));
        let session = sample_session();

        store.save(&session).await.unwrap();
        assert!(store.exists());
        assert_eq!(store.load().await.unwrap(), Some(session));

        // No staging files are left next to the session.
        let entries = std::fs::read_dir(store.path().parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_tampered_session_fails_integrity() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("session.cbor"));
        store.save(&sample_session()).await.unwrap();

        // Swap in a different session but keep the old fingerprint.
        let mut envelope = store.read_envelope().await.unwrap().unwrap();
        envelope.session = VotingSession::new(p("mallory"));
        tokio::fs::write(store.path(), to_cbor(&envelope).unwrap())
            .await
            .unwrap();

        assert!(matches!(
            store.load().await,
            Err(StoreError::Integrity { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_schema_version_rejected() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("session.cbor"));
        let mut envelope = StoredSession::seal(&sample_session()).unwrap();
        envelope.schema_version = 99;
        tokio::fs::write(store.path(), to_cbor(&envelope).unwrap())
            .await
            .unwrap();

        assert_eq!(
            store.load().await,
            Err(StoreError::SchemaVersion {
                found: 99,
                expected: SCHEMA_VERSION
            })
        );
    }

    #[tokio::test]
    async fn test_garbage_file_fails_decode() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("session.cbor"));
        tokio::fs::write(store.path(), b"not cbor at all")
            .await
            .unwrap();
        assert!(matches!(store.load().await, Err(StoreError::Decode(_))));
    }

    #[tokio::test]
    async fn test_concurrent_saves_never_tear() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.cbor");
        let session = sample_session();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = FileStore::new(&path);
            let session = session.clone();
            handles.push(tokio::spawn(async move { store.save(&session).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(FileStore::new(&path).load().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn test_lock_serializes_holders() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.cbor");
        let store = FileStore::new(&path);

        let guard = store.lock().await.unwrap();
        assert!(store.lock_path().exists());

        let (tx, mut rx) = tokio::sync::oneshot::channel();
        let contender = FileStore::new(&path);
        let waiter = tokio::spawn(async move {
            let _guard = contender.lock().await.unwrap();
            tx.send(()).unwrap();
        });

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err(), "second holder got the lock early");

        drop(guard);
        waiter.await.unwrap();
    }
}

//! Atomic JSON file store.
//!
//! Persists the whole keyspace as a single JSON object document. Writes go
//! through a temporary file, an explicit fsync, and an atomic rename, under
//! an exclusive advisory file lock, so a committed batch is either fully on
//! disk or not at all.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use till_core::error::{Result, TillError};

use super::{StateStore, WriteBatch, WriteOp};

/// A file-backed state store with atomic batch commits.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store handle for the given document path.
    ///
    /// The file is created lazily on first commit.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the keyspace document. A missing or empty file is an empty map.
    fn load_map(path: &Path) -> Result<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        Ok(serde_json::from_str(&content)?)
    }

    /// Saves the keyspace document atomically (temp file + fsync + rename).
    fn save_map(path: &Path, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(map)?;

        let tmp_path = Self::temp_path(path)?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;

        // Ensure data is on disk before the rename makes it visible
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, path)?;

        Ok(())
    }

    fn temp_path(path: &Path) -> Result<PathBuf> {
        let parent = path
            .parent()
            .ok_or_else(|| TillError::io("store path has no parent directory"))?;
        let file_name = path
            .file_name()
            .ok_or_else(|| TillError::io("store path has no file name"))?;

        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(parent.join(tmp_name))
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || {
            let map = Self::load_map(&path)?;
            Ok(map.get(&key).cloned())
        })
        .await
        .map_err(|e| TillError::internal(format!("store read task failed: {e}")))?
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            let map = Self::load_map(&path)?;
            Ok(map.into_keys().collect())
        })
        .await
        .map_err(|e| TillError::internal(format!("store read task failed: {e}")))?
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            // Exclusive lock for the whole load-modify-rename cycle
            let _lock = FileLock::acquire(&path)?;

            let mut map = Self::load_map(&path)?;
            for op in batch.ops() {
                match op {
                    WriteOp::Put { key, value } => {
                        map.insert(key.clone(), value.clone());
                    }
                    WriteOp::Remove { key } => {
                        map.remove(key);
                    }
                }
            }

            Self::save_map(&path, &map)?;
            tracing::debug!("committed {} op(s) to {}", batch.ops().len(), path.display());

            Ok(())
        })
        .await
        .map_err(|e| TillError::internal(format!("store commit task failed: {e}")))?
    }
}

/// A file lock guard that releases the lock when dropped.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    /// Acquires an exclusive lock beside the given path.
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| TillError::io(format!("failed to acquire store lock: {e}")))?;
        }

        #[cfg(not(unix))]
        {
            // No advisory locking off Unix; acceptable for a single-register host
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock is automatic when the file handle drops; removing the
        // lock file is best effort
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_from_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));

        assert_eq!(store.get("anything").await.unwrap(), None);
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_and_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonFileStore::new(path.clone());
        let mut batch = WriteBatch::new();
        batch.put("sessions", "[]");
        batch.put("current-session", "{}");
        store.commit(batch).await.unwrap();

        // A fresh handle over the same file sees the committed state
        let reopened = JsonFileStore::new(path);
        assert_eq!(
            reopened.get("sessions").await.unwrap(),
            Some("[]".to_string())
        );
        assert_eq!(reopened.keys().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonFileStore::new(path.clone());
        store.put("k", "v").await.unwrap();

        assert!(path.exists());
        assert!(!dir.path().join(".state.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_remove_persists() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));

        store.put("k", "v").await.unwrap();
        store.remove("k").await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), None);
    }
}

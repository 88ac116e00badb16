//! Key-value store interface and backends.
//!
//! Values are JSON documents. Writes are last-write-wins and deleting an
//! absent key succeeds.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};

const MAX_KEY_LEN: usize = 200;
const FILE_EXT: &str = "json";

/// Persistence interface.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    async fn put(&self, key: &str, value: Value) -> StorageResult<()>;

    /// Remove `key`. Returns whether a value was present.
    async fn delete(&self, key: &str) -> StorageResult<bool>;

    /// All entries whose key starts with `prefix`, ordered by key.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<(String, Value)>>;
}

/// Keys are 1-200 chars of `[A-Za-z0-9_.:-]` and may not start with a dot.
pub fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::invalid_key(key))
    }
}

/// In-memory backend. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        validate_key(key)?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> StorageResult<()> {
        validate_key(key)?;
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<(String, Value)>> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// One JSON file per key under a root directory.
///
/// Writes go to a temporary file that is renamed into place, so readers
/// never see a partial document.
pub struct FileStore {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "Opened file store");
        Ok(Self {
            root,
            tmp_counter: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{FILE_EXT}"))
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        validate_key(key)?;
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: Value) -> StorageResult<()> {
        validate_key(key)?;
        let bytes = serde_json::to_vec(&value)?;

        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .root
            .join(format!(".{key}.{}.{n}.tmp", std::process::id()));
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, self.path_for(key)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<(String, Value)>> {
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        let mut keys = Vec::new();

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FILE_EXT) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if key.starts_with(prefix) && validate_key(key).is_ok() {
                keys.push(key.to_string());
            }
        }
        keys.sort();

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            // A concurrent delete between read_dir and read is not an error.
            match self.get(&key).await {
                Ok(Some(value)) => out.push((key, value)),
                Ok(None) => {}
                Err(StorageError::Json(e)) => {
                    warn!(key = %key, error = %e, "Skipping unreadable record");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn exercise(store: &dyn KvStore) {
        assert_eq!(store.get("a:1").await.unwrap(), None);

        store.put("a:1", json!({"v": 1})).await.unwrap();
        store.put("a:2", json!({"v": 2})).await.unwrap();
        store.put("b:1", json!({"v": 3})).await.unwrap();
        assert_eq!(store.get("a:1").await.unwrap(), Some(json!({"v": 1})));

        // Last write wins
        store.put("a:1", json!({"v": 10})).await.unwrap();
        assert_eq!(store.get("a:1").await.unwrap(), Some(json!({"v": 10})));

        let listed: Vec<String> = store
            .list("a:")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(listed, vec!["a:1".to_string(), "a:2".to_string()]);

        assert!(store.delete("a:1").await.unwrap());
        assert!(!store.delete("a:1").await.unwrap());
        assert_eq!(store.get("a:1").await.unwrap(), None);
        assert_eq!(store.list("").await.unwrap().len(), 2);
    }

    #[test]
    fn test_key_validation() {
        assert!(validate_key("history:5f0c-11").is_ok());
        assert!(validate_key("a_b.c-d").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("with space").is_err());
        assert!(validate_key(&"x".repeat(MAX_KEY_LEN + 1)).is_err());
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        exercise(&store).await;
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).await.unwrap();
            store.put("k", json!("persisted")).await.unwrap();
        }
        let store = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!("persisted")));
    }

    #[tokio::test]
    async fn test_file_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested")).await.unwrap();
        let err = store.put("../escape", json!(1)).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_concurrent_puts_keep_one_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let writes = (0..8).map(|i| store.put("same", json!(i)));
        for r in futures_util::future::join_all(writes).await {
            r.unwrap();
        }
        let value = store.get("same").await.unwrap().unwrap();
        assert!(value.as_i64().is_some());
        assert_eq!(store.list("").await.unwrap().len(), 1);
    }
}

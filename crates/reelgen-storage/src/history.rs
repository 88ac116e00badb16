//! Generation history repository.

use std::sync::Arc;

use tracing::info;

use reelgen_models::{HistoryEntry, HistoryId};

use crate::error::StorageResult;
use crate::kv::KvStore;

const PREFIX: &str = "history:";

fn key(id: &HistoryId) -> String {
    format!("{PREFIX}{id}")
}

/// Typed access to history entries stored under `history:{id}`.
#[derive(Clone)]
pub struct HistoryRepository {
    store: Arc<dyn KvStore>,
}

impl HistoryRepository {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Insert or replace an entry.
    pub async fn record(&self, entry: &HistoryEntry) -> StorageResult<()> {
        self.store
            .put(&key(&entry.id), serde_json::to_value(entry)?)
            .await
    }

    pub async fn get(&self, id: &HistoryId) -> StorageResult<Option<HistoryEntry>> {
        match self.store.get(&key(id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Entries newest first, at most `limit` of them.
    pub async fn list(&self, limit: usize) -> StorageResult<Vec<HistoryEntry>> {
        let mut entries = self
            .store
            .list(PREFIX)
            .await?
            .into_iter()
            .map(|(_, v)| serde_json::from_value::<HistoryEntry>(v))
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }

    /// Returns whether the entry existed.
    pub async fn delete(&self, id: &HistoryId) -> StorageResult<bool> {
        self.store.delete(&key(id)).await
    }

    /// Remove every entry. Returns how many were removed.
    pub async fn clear(&self) -> StorageResult<usize> {
        let keys: Vec<String> = self
            .store
            .list(PREFIX)
            .await?
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        let mut removed = 0;
        for k in &keys {
            if self.store.delete(k).await? {
                removed += 1;
            }
        }
        info!(removed, "Cleared history");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use chrono::{Duration, Utc};
    use reelgen_models::{JobId, ProviderId};

    fn repo() -> HistoryRepository {
        HistoryRepository::new(Arc::new(MemoryStore::new()))
    }

    fn entry(prompt: &str, age_secs: i64) -> HistoryEntry {
        let mut e = HistoryEntry::new(JobId::from("job"), ProviderId::sandbox(), prompt);
        e.created_at = Utc::now() - Duration::seconds(age_secs);
        e
    }

    #[tokio::test]
    async fn test_list_newest_first_with_limit() {
        let repo = repo();
        repo.record(&entry("old", 30)).await.unwrap();
        repo.record(&entry("new", 1)).await.unwrap();
        repo.record(&entry("mid", 10)).await.unwrap();

        let prompts: Vec<String> = repo
            .list(2)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.prompt)
            .collect();
        assert_eq!(prompts, vec!["new", "mid"]);
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let repo = repo();
        let e = entry("x", 0);
        repo.record(&e).await.unwrap();

        assert!(repo.delete(&e.id).await.unwrap());
        assert!(!repo.delete(&e.id).await.unwrap());
        assert!(repo.get(&e.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let repo = repo();
        repo.record(&entry("a", 0)).await.unwrap();
        repo.record(&entry("b", 0)).await.unwrap();
        assert_eq!(repo.clear().await.unwrap(), 2);
        assert!(repo.list(10).await.unwrap().is_empty());
    }
}

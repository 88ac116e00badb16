//! Collection repository.

use std::sync::Arc;

use reelgen_models::{Collection, CollectionId, HistoryId};

use crate::error::{StorageError, StorageResult};
use crate::kv::KvStore;

const PREFIX: &str = "collection:";
pub const MAX_NAME_LEN: usize = 100;

fn key(id: &CollectionId) -> String {
    format!("{PREFIX}{id}")
}

fn check_name(name: &str) -> StorageResult<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(StorageError::invalid_value(format!(
            "collection name must be 1-{MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

#[derive(Clone)]
pub struct CollectionRepository {
    store: Arc<dyn KvStore>,
}

impl CollectionRepository {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, name: &str) -> StorageResult<Collection> {
        let collection = Collection::new(check_name(name)?);
        self.save(&collection).await?;
        Ok(collection)
    }

    /// Collections ordered by name.
    pub async fn list(&self) -> StorageResult<Vec<Collection>> {
        let mut all = self
            .store
            .list(PREFIX)
            .await?
            .into_iter()
            .map(|(_, v)| serde_json::from_value::<Collection>(v))
            .collect::<Result<Vec<_>, _>>()?;
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        Ok(all)
    }

    pub async fn get(&self, id: &CollectionId) -> StorageResult<Option<Collection>> {
        match self.store.get(&key(id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn rename(&self, id: &CollectionId, name: &str) -> StorageResult<Collection> {
        let name = check_name(name)?;
        self.modify(id, |c| c.rename(name)).await
    }

    /// Adding an entry that is already present keeps a single copy.
    pub async fn add_entry(&self, id: &CollectionId, entry: HistoryId) -> StorageResult<Collection> {
        self.modify(id, |c| {
            c.add_entry(entry);
        })
        .await
    }

    pub async fn remove_entry(
        &self,
        id: &CollectionId,
        entry: &HistoryId,
    ) -> StorageResult<Collection> {
        self.modify(id, |c| {
            c.remove_entry(entry);
        })
        .await
    }

    /// Returns whether the collection existed.
    pub async fn delete(&self, id: &CollectionId) -> StorageResult<bool> {
        self.store.delete(&key(id)).await
    }

    async fn modify(
        &self,
        id: &CollectionId,
        f: impl FnOnce(&mut Collection),
    ) -> StorageResult<Collection> {
        let mut collection = self
            .get(id)
            .await?
            .ok_or_else(|| StorageError::not_found(format!("collection {id}")))?;
        f(&mut collection);
        self.save(&collection).await?;
        Ok(collection)
    }

    async fn save(&self, collection: &Collection) -> StorageResult<()> {
        self.store
            .put(&key(&collection.id), serde_json::to_value(collection)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::FileStore;

    async fn repo(dir: &tempfile::TempDir) -> CollectionRepository {
        CollectionRepository::new(Arc::new(FileStore::open(dir.path()).await.unwrap()))
    }

    #[tokio::test]
    async fn test_collection_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir).await;

        let c = repo.create("  Favorites ").await.unwrap();
        assert_eq!(c.name, "Favorites");

        let entry = HistoryId::from_string("h1");
        repo.add_entry(&c.id, entry.clone()).await.unwrap();
        let c2 = repo.add_entry(&c.id, entry.clone()).await.unwrap();
        assert_eq!(c2.entry_ids, vec![entry.clone()]);

        let renamed = repo.rename(&c.id, "Best").await.unwrap();
        assert_eq!(renamed.name, "Best");
        assert_eq!(renamed.entry_ids.len(), 1);

        let emptied = repo.remove_entry(&c.id, &entry).await.unwrap();
        assert!(emptied.entry_ids.is_empty());

        assert!(repo.delete(&c.id).await.unwrap());
        assert!(repo.get(&c.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir).await;
        let err = repo
            .rename(&CollectionId::from_string("nope"), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_name_rules() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir).await;
        assert!(matches!(
            repo.create("   ").await.unwrap_err(),
            StorageError::InvalidValue(_)
        ));
        assert!(repo.create(&"n".repeat(MAX_NAME_LEN + 1)).await.is_err());

        repo.create("b").await.unwrap();
        repo.create("a").await.unwrap();
        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}

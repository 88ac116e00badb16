//! Generation history and user collections.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{JobId, JobStatus, ProviderId};

/// Unique identifier for a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct HistoryId(pub String);

impl HistoryId {
    /// Generate a new random history ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for HistoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct CollectionId(pub String);

impl CollectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CollectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One generated clip remembered for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: HistoryId,
    pub job_id: JobId,
    pub provider: ProviderId,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default)]
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(job_id: JobId, provider: ProviderId, prompt: impl Into<String>) -> Self {
        Self {
            id: HistoryId::new(),
            job_id,
            provider,
            prompt: prompt.into(),
            media_ref: None,
            result: None,
            status: JobStatus::Starting,
            created_at: Utc::now(),
        }
    }
}

/// Named group of history entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub entry_ids: Vec<HistoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CollectionId::new(),
            name: name.into(),
            entry_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add an entry. Returns false if it was already present.
    pub fn add_entry(&mut self, entry: HistoryId) -> bool {
        if self.entry_ids.contains(&entry) {
            return false;
        }
        self.entry_ids.push(entry);
        self.updated_at = Utc::now();
        true
    }

    /// Remove an entry. Returns false if it was not present.
    pub fn remove_entry(&mut self, entry: &HistoryId) -> bool {
        let before = self.entry_ids.len();
        self.entry_ids.retain(|e| e != entry);
        let removed = self.entry_ids.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_deduplicates_entries() {
        let mut c = Collection::new("favorites");
        let id = HistoryId::from_string("h1");
        assert!(c.add_entry(id.clone()));
        assert!(!c.add_entry(id.clone()));
        assert_eq!(c.entry_ids.len(), 1);

        assert!(c.remove_entry(&id));
        assert!(!c.remove_entry(&id));
        assert!(c.entry_ids.is_empty());
    }

    #[test]
    fn test_history_entry_wire_format() {
        let entry = HistoryEntry::new(JobId::from("j1"), ProviderId::sandbox(), "hello");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["jobId"], "j1");
        assert_eq!(json["provider"], "sandbox");
        assert_eq!(json["status"], "starting");
        assert!(json.get("mediaRef").is_none());
    }
}

//! Persistence for the reelgen backend.
//!
//! This crate provides:
//! - The [`KvStore`] interface (`get`/`put`/`delete`/`list`)
//! - An in-memory backend and a one-file-per-key backend
//! - Typed repositories for generation history and collections

pub mod collections;
pub mod error;
pub mod history;
pub mod kv;

pub use collections::CollectionRepository;
pub use error::{StorageError, StorageResult};
pub use history::HistoryRepository;
pub use kv::{validate_key, FileStore, KvStore, MemoryStore};

//! Application state.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use reelgen_jobs::{JobService, PollConfig};
use reelgen_providers::{EnvCredentials, ProviderConfig, ProviderError, ProviderRegistry};
use reelgen_storage::{CollectionRepository, FileStore, HistoryRepository, KvStore, MemoryStore, StorageError};

use crate::config::{ApiConfig, StorageBackend};
use crate::middleware::RateLimiterCache;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to build provider registry: {0}")]
    Providers(#[from] ProviderError),

    #[error("Failed to open storage: {0}")]
    Storage(#[from] StorageError),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub jobs: JobService,
    pub poll_config: PollConfig,
    pub history: HistoryRepository,
    pub collections: CollectionRepository,
    pub rate_limiter: Arc<RateLimiterCache>,
}

impl AppState {
    /// Create application state from environment configuration.
    pub async fn new(config: ApiConfig) -> Result<Self, StateError> {
        let registry =
            ProviderRegistry::with_defaults(&ProviderConfig::from_env(), Arc::new(EnvCredentials))?;

        let store: Arc<dyn KvStore> = match &config.storage {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::File(dir) => Arc::new(FileStore::open(dir).await?),
        };
        info!(storage = ?config.storage, "Storage backend ready");

        Ok(Self::from_parts(
            config,
            JobService::new(registry),
            PollConfig::from_env(),
            store,
        ))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        config: ApiConfig,
        jobs: JobService,
        poll_config: PollConfig,
        store: Arc<dyn KvStore>,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiterCache::new(
            config.rate_limit_rps,
            config.rate_limit_burst,
        ));
        Self {
            config,
            jobs,
            poll_config,
            history: HistoryRepository::new(Arc::clone(&store)),
            collections: CollectionRepository::new(store),
            rate_limiter,
        }
    }
}

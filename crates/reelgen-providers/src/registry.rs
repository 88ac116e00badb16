//! Provider lookup table and credential gate.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use reelgen_models::ProviderId;

use crate::config::ProviderConfig;
use crate::credentials::CredentialStore;
use crate::error::{ProviderError, ProviderResult};
use crate::predictions::PredictionsProvider;
use crate::provider::VideoProvider;
use crate::sandbox::SandboxProvider;
use crate::tasks::TasksProvider;

/// Availability of one provider, as reported to clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAvailability {
    pub id: ProviderId,
    pub available: bool,
    pub requires_credential: bool,
    pub requires_media_ref: bool,
}

/// Registered providers plus the credential source used to gate them.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<ProviderId, Arc<dyn VideoProvider>>,
    credentials: Arc<dyn CredentialStore>,
}

impl ProviderRegistry {
    /// Empty registry.
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            providers: BTreeMap::new(),
            credentials,
        }
    }

    /// Registry with the built-in providers.
    pub fn with_defaults(
        config: &ProviderConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> ProviderResult<Self> {
        let http = config.http_client()?;
        let mut registry = Self::new(credentials);
        registry.register(Arc::new(PredictionsProvider::new(
            http.clone(),
            config.predictions_url.clone(),
        )));
        registry.register(Arc::new(TasksProvider::new(http, config.tasks_url.clone())));
        registry.register(Arc::new(SandboxProvider::new(
            config.sandbox_startup,
            config.sandbox_duration,
        )));
        info!(
            providers = ?registry.ids().iter().map(|p| p.as_str()).collect::<Vec<_>>(),
            "Provider registry initialized"
        );
        Ok(registry)
    }

    /// Register a provider, replacing any with the same id.
    pub fn register(&mut self, provider: Arc<dyn VideoProvider>) {
        self.providers.insert(provider.id(), provider);
    }

    /// Look up a provider. Unknown ids are a validation failure.
    pub fn get(&self, id: &ProviderId) -> ProviderResult<Arc<dyn VideoProvider>> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::validation(format!("unknown provider: {}", id)))
    }

    pub fn ids(&self) -> Vec<ProviderId> {
        self.providers.keys().cloned().collect()
    }

    /// Whether `id` can be used right now.
    ///
    /// Re-reads the credential on every call. Unknown providers are never
    /// available; credential-free providers always are.
    pub fn available(&self, id: &ProviderId) -> bool {
        match self.providers.get(id) {
            Some(provider) => match provider.credential_name() {
                Some(name) => self.credentials.get_non_empty(name).is_some(),
                None => true,
            },
            None => false,
        }
    }

    /// Credential for `provider`, or `CredentialMissing` if it needs one
    /// that is not configured.
    pub fn credential_for(&self, provider: &dyn VideoProvider) -> ProviderResult<Option<String>> {
        match provider.credential_name() {
            Some(name) => self
                .credentials
                .get_non_empty(name)
                .map(Some)
                .ok_or_else(|| ProviderError::credential_missing(provider.id().as_str(), name)),
            None => Ok(None),
        }
    }

    pub fn availability(&self) -> Vec<ProviderAvailability> {
        self.providers
            .values()
            .map(|p| ProviderAvailability {
                id: p.id(),
                available: self.available(&p.id()),
                requires_credential: p.credential_name().is_some(),
                requires_media_ref: p.requires_media_ref(),
            })
            .collect()
    }
}

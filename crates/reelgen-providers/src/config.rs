//! Provider client configuration.

use std::time::Duration;

use reqwest::Client;

use crate::error::ProviderResult;

/// Configuration shared by the HTTP provider adapters.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the prediction-style provider
    pub predictions_url: String,
    /// Base URL of the task-style provider
    pub tasks_url: String,
    /// Whole-request timeout
    pub timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
    /// Time a sandbox job spends in `starting`
    pub sandbox_startup: Duration,
    /// Total time until a sandbox job succeeds
    pub sandbox_duration: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            predictions_url: "https://api.predictions.invalid/v1".to_string(),
            tasks_url: "https://api.tasks.invalid/v1".to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("reelgen/{}", env!("CARGO_PKG_VERSION")),
            sandbox_startup: Duration::from_secs(2),
            sandbox_duration: Duration::from_secs(12),
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            predictions_url: std::env::var("PREDICTIONS_API_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.predictions_url),
            tasks_url: std::env::var("TASKS_API_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.tasks_url),
            timeout: Duration::from_secs(
                std::env::var("PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            connect_timeout: Duration::from_secs(
                std::env::var("PROVIDER_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            user_agent: defaults.user_agent,
            sandbox_startup: Duration::from_secs(
                std::env::var("SANDBOX_STARTUP_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            ),
            sandbox_duration: Duration::from_secs(
                std::env::var("SANDBOX_JOB_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(12),
            ),
        }
    }

    /// Build the pooled HTTP client used by all adapters.
    pub fn http_client(&self) -> ProviderResult<Client> {
        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.clone())
            .build()?;
        Ok(client)
    }
}

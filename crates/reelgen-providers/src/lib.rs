//! Generation provider adapters.
//!
//! This crate provides:
//! - The [`VideoProvider`] trait implemented once per provider
//! - A registry keyed by [`reelgen_models::ProviderId`]
//! - The credential gate deciding whether a provider can be used
//! - Status normalization from each provider's native vocabulary

pub mod config;
pub mod credentials;
pub mod error;
mod http;
pub mod predictions;
pub mod provider;
pub mod registry;
pub mod sandbox;
pub mod tasks;

pub use config::ProviderConfig;
pub use credentials::{CredentialStore, EnvCredentials, StaticCredentials};
pub use error::{ProviderError, ProviderResult};
pub use predictions::PredictionsProvider;
pub use provider::VideoProvider;
pub use registry::{ProviderAvailability, ProviderRegistry};
pub use sandbox::SandboxProvider;
pub use tasks::TasksProvider;

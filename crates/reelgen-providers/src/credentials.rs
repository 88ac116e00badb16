//! Credential lookup for providers.
//!
//! Credentials are read on every call and never cached, so a deployment can
//! inject them after startup.

use std::collections::HashMap;
use std::sync::RwLock;

/// Source of provider credentials.
pub trait CredentialStore: Send + Sync {
    /// Raw value for `name`, if set.
    fn get(&self, name: &str) -> Option<String>;

    /// Value for `name` with blank values treated as absent.
    fn get_non_empty(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Reads credentials from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialStore for EnvCredentials {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// In-memory credentials that can be changed at runtime.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    values: RwLock<HashMap<String, String>>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut values) = self.values.write() {
            values.insert(name.into(), value.into());
        }
    }

    pub fn remove(&self, name: &str) {
        if let Ok(mut values) = self.values.write() {
            values.remove(name);
        }
    }
}

impl CredentialStore for StaticCredentials {
    fn get(&self, name: &str) -> Option<String> {
        self.values.read().ok()?.get(name).cloned()
    }
}

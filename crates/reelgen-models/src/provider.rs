//! Provider identifiers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a generation provider.
///
/// Kept as an open string so new providers can be registered without
/// touching this type. Identifiers are lowercased on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    /// Prediction-resource style provider.
    pub const PREDICTIONS: &'static str = "predictions";
    /// Task-resource style provider.
    pub const TASKS: &'static str = "tasks";
    /// In-process simulator, needs no credential.
    pub const SANDBOX: &'static str = "sandbox";

    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_ascii_lowercase())
    }

    pub fn predictions() -> Self {
        Self::new(Self::PREDICTIONS)
    }

    pub fn tasks() -> Self {
        Self::new(Self::TASKS)
    }

    pub fn sandbox() -> Self {
        Self::new(Self::SANDBOX)
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ProviderId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_and_whitespace() {
        assert_eq!(ProviderId::new(" Sandbox "), ProviderId::sandbox());
        assert_eq!(ProviderId::from("TASKS").as_str(), "tasks");
    }
}

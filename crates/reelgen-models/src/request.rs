//! Job submission request.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

use crate::ProviderId;

/// Maximum prompt length in characters.
pub const MAX_PROMPT_LEN: u64 = 4000;

/// Maximum reference media URI length in characters.
pub const MAX_MEDIA_REF_LEN: u64 = 2048;

/// Body of `POST /api/jobs`.
///
/// Missing fields deserialize to empty values so that validation, not
/// deserialization, reports them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Provider identifier, e.g. `predictions`
    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "provider is required"))]
    pub provider: String,

    /// Text prompt driving the generation
    #[serde(default)]
    pub prompt: String,

    /// Reference media (image or video) URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,

    /// Provider-specific options, forwarded untouched
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl GenerationRequest {
    pub fn new(provider: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_media_ref(mut self, media_ref: impl Into<String>) -> Self {
        self.media_ref = Some(media_ref.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn provider_id(&self) -> ProviderId {
        ProviderId::new(&self.provider)
    }

    /// Trimmed prompt.
    pub fn prompt(&self) -> &str {
        self.prompt.trim()
    }

    /// Trimmed media reference, `None` when absent or blank.
    pub fn media_ref(&self) -> Option<&str> {
        self.media_ref
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Check shape constraints common to every provider.
    ///
    /// Returns a human-readable message on the first class of failure.
    pub fn check(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())?;

        if self.provider.trim().is_empty() {
            return Err("provider is required".to_string());
        }
        if self.prompt().is_empty() {
            return Err("prompt must not be blank".to_string());
        }
        if self.prompt().chars().count() as u64 > MAX_PROMPT_LEN {
            return Err(format!("prompt must be at most {MAX_PROMPT_LEN} characters"));
        }
        if let Some(media_ref) = self.media_ref() {
            if media_ref.chars().count() as u64 > MAX_MEDIA_REF_LEN {
                return Err(format!("mediaRef must be at most {MAX_MEDIA_REF_LEN} characters"));
            }
            if !is_supported_media_ref(media_ref) {
                return Err("mediaRef must be an http(s) or data URI".to_string());
            }
        }
        Ok(())
    }
}

/// Accept absolute http(s) URLs and inline data URIs.
pub fn is_supported_media_ref(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => match url.scheme() {
            "http" | "https" => url.host_str().is_some(),
            "data" => true,
            _ => false,
        },
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        let req = GenerationRequest::new("predictions", "a cat dancing")
            .with_media_ref("https://cdn.example.com/cat.png");
        assert!(req.check().is_ok());
        assert_eq!(req.provider_id(), ProviderId::predictions());
    }

    #[test]
    fn test_missing_fields_deserialize_then_fail_validation() {
        let req: GenerationRequest = serde_json::from_str(r#"{"provider":"sandbox"}"#).unwrap();
        assert!(req.check().is_err());
    }

    #[test]
    fn test_blank_prompt_rejected() {
        let req = GenerationRequest::new("sandbox", "   ");
        assert_eq!(req.check().unwrap_err(), "prompt must not be blank");
    }

    #[test]
    fn test_prompt_length_counts_trimmed_chars() {
        let padded = format!("  {}  ", "é".repeat(MAX_PROMPT_LEN as usize));
        assert!(GenerationRequest::new("sandbox", padded).check().is_ok());

        let over = format!(" {} ", "x".repeat(MAX_PROMPT_LEN as usize + 1));
        assert_eq!(
            GenerationRequest::new("sandbox", over).check().unwrap_err(),
            "prompt must be at most 4000 characters"
        );
    }

    #[test]
    fn test_media_ref_too_long_rejected() {
        let long = format!("https://cdn.example.com/{}", "a".repeat(MAX_MEDIA_REF_LEN as usize));
        let req = GenerationRequest::new("predictions", "hi").with_media_ref(long);
        assert!(req.check().unwrap_err().starts_with("mediaRef must be at most"));
    }

    #[test]
    fn test_prompt_too_long_rejected() {
        let req = GenerationRequest::new("sandbox", "x".repeat(MAX_PROMPT_LEN as usize + 1));
        assert!(req.check().is_err());
    }

    #[test]
    fn test_media_ref_schemes() {
        assert!(is_supported_media_ref("https://example.com/a.png"));
        assert!(is_supported_media_ref("data:image/png;base64,AAAA"));
        assert!(!is_supported_media_ref("file:///etc/passwd"));
        assert!(!is_supported_media_ref("not a url"));

        let req = GenerationRequest::new("sandbox", "hi").with_media_ref("ftp://x/y");
        assert!(req.check().is_err());
    }

    #[test]
    fn test_camel_case_wire_format() {
        let req: GenerationRequest = serde_json::from_str(
            r#"{"provider":"tasks","prompt":"p","mediaRef":"https://x.io/a.mp4","options":{"duration":5}}"#,
        )
        .unwrap();
        assert_eq!(req.media_ref(), Some("https://x.io/a.mp4"));
        assert_eq!(req.options["duration"], 5);
    }
}

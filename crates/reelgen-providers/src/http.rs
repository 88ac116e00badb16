//! Response handling shared by the HTTP adapters.

use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use reelgen_models::ProviderId;

use crate::error::{ProviderError, ProviderResult};

/// Upstream messages longer than this are truncated.
const MAX_MESSAGE_LEN: usize = 500;

/// Map non-2xx responses onto the error taxonomy.
pub(crate) async fn ensure_success(
    provider: &ProviderId,
    response: Response,
) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        return Err(ProviderError::RateLimited {
            provider: provider.to_string(),
            retry_after_secs,
        });
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());

    Err(ProviderError::Upstream {
        provider: provider.to_string(),
        status: status.as_u16(),
        message: extract_message(&body).unwrap_or_else(|| status.to_string()),
    })
}

/// Check status and decode a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &ProviderId,
    response: Response,
) -> ProviderResult<T> {
    let response = ensure_success(provider, response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ProviderError::invalid_response(provider.as_str(), e.to_string()))
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"detail": ..}`, `{"error": ..}`, `{"error": {"message": ..}}`
/// and `{"message": ..}`; falls back to the raw text.
pub(crate) fn extract_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let message = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => ["detail", "error", "message", "title"]
            .iter()
            .find_map(|key| match json.get(key) {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(serde_json::Value::Object(o)) => o
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string),
                _ => None,
            })
            .unwrap_or_else(|| body.to_string()),
        Err(_) => body.to_string(),
    };

    Some(truncate(message))
}

fn truncate(mut s: String) -> String {
    if s.len() > MAX_MESSAGE_LEN {
        let mut cut = MAX_MESSAGE_LEN;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_shapes() {
        assert_eq!(extract_message(r#"{"detail":"bad input"}"#).as_deref(), Some("bad input"));
        assert_eq!(
            extract_message(r#"{"error":{"message":"quota"}}"#).as_deref(),
            Some("quota")
        );
        assert_eq!(extract_message("plain failure").as_deref(), Some("plain failure"));
        assert_eq!(extract_message("  "), None);
    }

    #[test]
    fn test_long_messages_truncated() {
        let msg = extract_message(&"é".repeat(MAX_MESSAGE_LEN)).unwrap();
        assert!(msg.len() <= MAX_MESSAGE_LEN + '…'.len_utf8());
        assert!(msg.ends_with('…'));
    }
}

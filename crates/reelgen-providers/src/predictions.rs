//! Prediction-resource style provider.
//!
//! `POST {base}/predictions` creates a prediction, `GET {base}/predictions/{id}`
//! reads it back. Native statuses already match the shared vocabulary.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use reelgen_models::{GenerationRequest, JobId, JobSnapshot, JobStatus, ProviderId};

use crate::error::{ProviderError, ProviderResult};
use crate::http::read_json;
use crate::provider::{require_credential, VideoProvider};

/// Environment variable holding the bearer token.
pub const CREDENTIAL_NAME: &str = "PREDICTIONS_API_TOKEN";

#[derive(Debug, Serialize)]
struct CreatePrediction<'a> {
    input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    #[serde(flatten)]
    options: &'a serde_json::Map<String, serde_json::Value>,
}

/// Prediction resource as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub logs: Option<String>,
}

pub struct PredictionsProvider {
    http: Client,
    base_url: String,
}

impl PredictionsProvider {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl VideoProvider for PredictionsProvider {
    fn id(&self) -> ProviderId {
        ProviderId::predictions()
    }

    fn credential_name(&self) -> Option<&'static str> {
        Some(CREDENTIAL_NAME)
    }

    fn requires_media_ref(&self) -> bool {
        true
    }

    async fn create_job(
        &self,
        request: &GenerationRequest,
        credential: Option<&str>,
    ) -> ProviderResult<JobId> {
        let token = require_credential(self, credential)?;
        let url = format!("{}/predictions", self.base_url);
        let body = CreatePrediction {
            input: PredictionInput {
                prompt: request.prompt(),
                image: request.media_ref(),
                options: &request.options,
            },
        };

        debug!("Creating prediction at {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let prediction: Prediction = read_json(&self.id(), response).await?;
        if prediction.id.trim().is_empty() {
            return Err(ProviderError::invalid_response(
                self.id().as_str(),
                "prediction without id",
            ));
        }
        Ok(JobId::from(prediction.id))
    }

    async fn get_status(
        &self,
        job_id: &JobId,
        credential: Option<&str>,
    ) -> ProviderResult<JobSnapshot> {
        let token = require_credential(self, credential)?;
        let url = format!(
            "{}/predictions/{}",
            self.base_url,
            urlencoding::encode(job_id.as_str())
        );

        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let prediction: Prediction = read_json(&self.id(), response)
            .await
            .map_err(|e| e.not_found_for(job_id.as_str()))?;

        Ok(normalize(&prediction))
    }
}

/// Map a prediction onto the shared state machine.
pub fn normalize(prediction: &Prediction) -> JobSnapshot {
    let status = match prediction.status.trim().to_ascii_lowercase().as_str() {
        "starting" | "queued" => JobStatus::Starting,
        "processing" => JobStatus::Processing,
        "succeeded" => JobStatus::Succeeded,
        "failed" => JobStatus::Failed,
        "canceled" | "cancelled" => JobStatus::Canceled,
        other => {
            warn!(status = other, id = %prediction.id, "Unknown prediction status, treating as processing");
            JobStatus::Processing
        }
    };

    let mut snapshot = JobSnapshot::new(status);
    if let Some(error) = prediction.error.as_ref().and_then(error_text) {
        snapshot = snapshot.with_error(error);
    }
    if status == JobStatus::Succeeded {
        if let Some(uri) = prediction.output.as_ref().and_then(first_uri) {
            snapshot = snapshot.with_result(uri);
        }
        snapshot = snapshot.with_progress(100);
    } else if let Some(progress) = prediction.logs.as_deref().and_then(progress_from_logs) {
        snapshot = snapshot.with_progress(progress);
    }

    snapshot.resolve_error_precedence()
}

fn error_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(o) => o
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .or_else(|| Some(value.to_string())),
        other => Some(other.to_string()),
    }
}

/// Output is either a URI or a list of URIs; the first one wins.
fn first_uri(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => items.iter().find_map(first_uri),
        serde_json::Value::Object(o) => o.get("url").and_then(first_uri),
        _ => None,
    }
}

/// Last `NN%` figure in the log tail, if any.
fn progress_from_logs(logs: &str) -> Option<u8> {
    logs.lines().rev().find_map(|line| {
        let idx = line.find('%')?;
        let digits: String = line[..idx]
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        digits.parse::<u16>().ok().map(|p| p.min(100) as u8)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prediction(status: &str) -> Prediction {
        Prediction {
            id: "p1".into(),
            status: status.into(),
            output: None,
            error: None,
            logs: None,
        }
    }

    #[test]
    fn test_normalize_vocabulary() {
        assert_eq!(normalize(&prediction("starting")).status, JobStatus::Starting);
        assert_eq!(normalize(&prediction("processing")).status, JobStatus::Processing);
        assert_eq!(normalize(&prediction("failed")).status, JobStatus::Failed);
        assert_eq!(normalize(&prediction("canceled")).status, JobStatus::Canceled);
        assert_eq!(normalize(&prediction("weird")).status, JobStatus::Processing);
    }

    #[test]
    fn test_normalize_success_takes_first_output() {
        let mut p = prediction("succeeded");
        p.output = Some(json!(["https://cdn.example.com/a.mp4", "https://cdn.example.com/b.mp4"]));
        let snap = normalize(&p);
        assert_eq!(snap.status, JobStatus::Succeeded);
        assert_eq!(snap.result.as_deref(), Some("https://cdn.example.com/a.mp4"));
        assert_eq!(snap.progress, Some(100));
    }

    #[test]
    fn test_error_with_processing_status_is_failed() {
        let mut p = prediction("processing");
        p.error = Some(json!("CUDA out of memory"));
        let snap = normalize(&p);
        assert_eq!(snap.status, JobStatus::Failed);
        assert_eq!(snap.error.as_deref(), Some("CUDA out of memory"));
    }

    #[test]
    fn test_progress_from_logs() {
        assert_eq!(progress_from_logs("step 1\n 42%|████ | 21/50"), Some(42));
        assert_eq!(progress_from_logs("no numbers"), None);
    }

    #[tokio::test]
    async fn test_create_and_poll() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predictions"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "pred-123",
                "status": "starting"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/predictions/pred-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pred-123",
                "status": "processing",
                "logs": "10%"
            })))
            .mount(&server)
            .await;

        let provider = PredictionsProvider::new(Client::new(), server.uri());
        let req = GenerationRequest::new("predictions", "a dancing cat")
            .with_media_ref("https://cdn.example.com/cat.png");

        let id = provider.create_job(&req, Some("tok")).await.unwrap();
        assert_eq!(id.as_str(), "pred-123");

        let snap = provider.get_status(&id, Some("tok")).await.unwrap();
        assert_eq!(snap.status, JobStatus::Processing);
        assert_eq!(snap.progress, Some(10));
    }

    #[tokio::test]
    async fn test_create_rejected_wraps_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predictions"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"detail": "invalid image"})),
            )
            .mount(&server)
            .await;

        let provider = PredictionsProvider::new(Client::new(), server.uri());
        let req = GenerationRequest::new("predictions", "x").with_media_ref("https://x.io/a.png");
        let err = provider.create_job(&req, Some("tok")).await.unwrap_err();
        match err {
            ProviderError::Upstream { status, message, .. } => {
                assert_eq!(status, 422);
                assert_eq!(message, "invalid image");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_poll_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/predictions/p1"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let provider = PredictionsProvider::new(Client::new(), server.uri());
        let err = provider
            .get_status(&JobId::from("p1"), Some("tok"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::RateLimited { retry_after_secs: Some(7), .. }
        ));
    }

    #[tokio::test]
    async fn test_poll_unknown_job() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/predictions/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let provider = PredictionsProvider::new(Client::new(), server.uri());
        let err = provider
            .get_status(&JobId::from("gone"), Some("tok"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::JobNotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let provider = PredictionsProvider::new(Client::new(), server.uri());
        let req = GenerationRequest::new("predictions", "x").with_media_ref("https://x.io/a.png");
        let err = provider.create_job(&req, None).await.unwrap_err();
        assert!(matches!(err, ProviderError::CredentialMissing { .. }));
    }
}

//! Task-resource style provider.
//!
//! `POST {base}/tasks` returns `{id}`; `GET {base}/tasks/{id}` returns an
//! upper-case status, a fractional progress and an output list.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use reelgen_models::{GenerationRequest, JobId, JobSnapshot, JobStatus, ProviderId};

use crate::error::{ProviderError, ProviderResult};
use crate::http::read_json;
use crate::provider::{require_credential, VideoProvider};

/// Environment variable holding the API key.
pub const CREDENTIAL_NAME: &str = "TASKS_API_KEY";

const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTask<'a> {
    prompt_text: &'a str,
    prompt_media: &'a str,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    options: &'a serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CreatedTask {
    id: String,
}

/// Task resource as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub status: String,
    /// Fraction complete, 0.0 to 1.0
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub output: Vec<String>,
    #[serde(default)]
    pub failure: Option<String>,
    #[serde(default)]
    pub failure_code: Option<String>,
}

pub struct TasksProvider {
    http: Client,
    base_url: String,
}

impl TasksProvider {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl VideoProvider for TasksProvider {
    fn id(&self) -> ProviderId {
        ProviderId::tasks()
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
        let key = require_credential(self, credential)?;
        let media = request
            .media_ref()
            .ok_or_else(|| ProviderError::validation("mediaRef is required for provider tasks"))?;
        let url = format!("{}/tasks", self.base_url);

        debug!("Creating task at {}", url);

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, key)
            .json(&CreateTask {
                prompt_text: request.prompt(),
                prompt_media: media,
                options: &request.options,
            })
            .send()
            .await?;

        let created: CreatedTask = read_json(&self.id(), response).await?;
        if created.id.trim().is_empty() {
            return Err(ProviderError::invalid_response(self.id().as_str(), "task without id"));
        }
        Ok(JobId::from(created.id))
    }

    async fn get_status(
        &self,
        job_id: &JobId,
        credential: Option<&str>,
    ) -> ProviderResult<JobSnapshot> {
        let key = require_credential(self, credential)?;
        let url = format!("{}/tasks/{}", self.base_url, urlencoding::encode(job_id.as_str()));

        let response = self.http.get(&url).header(API_KEY_HEADER, key).send().await?;
        let task: Task = read_json(&self.id(), response)
            .await
            .map_err(|e| e.not_found_for(job_id.as_str()))?;

        Ok(normalize(&task))
    }
}

/// Map a task onto the shared state machine.
pub fn normalize(task: &Task) -> JobSnapshot {
    let status = match task.status.trim().to_ascii_uppercase().as_str() {
        "PENDING" | "QUEUED" => JobStatus::Starting,
        "RUNNING" | "THROTTLED" | "IN_PROGRESS" => JobStatus::Processing,
        "SUCCEEDED" | "COMPLETED" => JobStatus::Succeeded,
        "FAILED" | "ERROR" => JobStatus::Failed,
        "CANCELLED" | "CANCELED" | "ABORTED" => JobStatus::Canceled,
        other => {
            warn!(status = other, id = %task.id, "Unknown task status, treating as processing");
            JobStatus::Processing
        }
    };

    let mut snapshot = JobSnapshot::new(status);

    let failure = task
        .failure
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .map(|f| match task.failure_code.as_deref() {
            Some(code) if !code.is_empty() => format!("{f} ({code})"),
            _ => f.to_string(),
        });
    if let Some(failure) = failure {
        snapshot = snapshot.with_error(failure);
    }

    match status {
        JobStatus::Succeeded => {
            if let Some(uri) = task.output.iter().find(|u| !u.is_empty()) {
                snapshot = snapshot.with_result(uri.clone());
            }
            snapshot = snapshot.with_progress(100);
        }
        _ => {
            if let Some(fraction) = task.progress {
                snapshot = snapshot.with_progress(fraction_to_percent(fraction));
            }
        }
    }

    snapshot.resolve_error_precedence()
}

fn fraction_to_percent(fraction: f64) -> u8 {
    if !fraction.is_finite() {
        return 0;
    }
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn task(status: &str) -> Task {
        Task {
            id: "t1".into(),
            status: status.into(),
            progress: None,
            output: Vec::new(),
            failure: None,
            failure_code: None,
        }
    }

    #[test]
    fn test_normalize_vocabulary() {
        assert_eq!(normalize(&task("PENDING")).status, JobStatus::Starting);
        assert_eq!(normalize(&task("THROTTLED")).status, JobStatus::Processing);
        assert_eq!(normalize(&task("SUCCEEDED")).status, JobStatus::Succeeded);
        assert_eq!(normalize(&task("FAILED")).status, JobStatus::Failed);
        assert_eq!(normalize(&task("CANCELLED")).status, JobStatus::Canceled);
    }

    #[test]
    fn test_progress_fraction_mapping() {
        let mut t = task("RUNNING");
        t.progress = Some(0.456);
        assert_eq!(normalize(&t).progress, Some(46));
        t.progress = Some(7.0);
        assert_eq!(normalize(&t).progress, Some(100));
        assert_eq!(fraction_to_percent(f64::NAN), 0);
    }

    #[test]
    fn test_failure_on_running_task_wins() {
        let mut t = task("RUNNING");
        t.failure = Some("content moderation".into());
        t.failure_code = Some("SAFETY".into());
        let snap = normalize(&t);
        assert_eq!(snap.status, JobStatus::Failed);
        assert_eq!(snap.error.as_deref(), Some("content moderation (SAFETY)"));
    }

    #[tokio::test]
    async fn test_create_and_poll_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .and(header("x-api-key", "key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "task-9"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tasks/task-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "task-9",
                "status": "SUCCEEDED",
                "output": ["https://cdn.example.com/clip.mp4"]
            })))
            .mount(&server)
            .await;

        let provider = TasksProvider::new(Client::new(), server.uri());
        let req = GenerationRequest::new("tasks", "talking head")
            .with_media_ref("https://cdn.example.com/face.jpg");

        let id = provider.create_job(&req, Some("key")).await.unwrap();
        let snap = provider.get_status(&id, Some("key")).await.unwrap();
        assert_eq!(snap.status, JobStatus::Succeeded);
        assert_eq!(snap.result.as_deref(), Some("https://cdn.example.com/clip.mp4"));
    }

    #[tokio::test]
    async fn test_server_error_is_upstream_not_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/t1"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let provider = TasksProvider::new(Client::new(), server.uri());
        let err = provider.get_status(&JobId::from("t1"), Some("key")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Upstream { status: 503, .. }));
        assert!(!err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let provider = TasksProvider::new(Client::new(), server.uri());
        let err = provider.get_status(&JobId::from("t1"), Some("key")).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transient() {
        // Nothing listens on port 9 of localhost in test environments.
        let provider = TasksProvider::new(Client::new(), "http://127.0.0.1:9");
        let err = provider.get_status(&JobId::from("t1"), Some("key")).await.unwrap_err();
        assert!(err.is_transient());
    }
}

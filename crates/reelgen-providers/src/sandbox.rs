//! In-process provider for local development and tests.
//!
//! Needs no credential and makes no network calls. The job handle encodes the
//! creation time and the simulated outcome, so status queries stay stateless:
//! the status is a function of the handle and the current time only.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use reelgen_models::{GenerationRequest, JobId, JobSnapshot, JobStatus, ProviderId};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::VideoProvider;

const PREFIX: &str = "sbx";
const RESULT_BASE: &str = "https://sandbox.reelgen.local/clips";

/// Outcome a sandbox job settles on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Succeed,
    Fail,
    Cancel,
}

impl Outcome {
    fn code(self) -> char {
        match self {
            Outcome::Succeed => 's',
            Outcome::Fail => 'f',
            Outcome::Cancel => 'c',
        }
    }

    fn from_code(c: &str) -> Option<Self> {
        match c {
            "s" => Some(Outcome::Succeed),
            "f" => Some(Outcome::Fail),
            "c" => Some(Outcome::Cancel),
            _ => None,
        }
    }

    /// Read `options.simulate`: `"fail"` or `"cancel"`, anything else succeeds.
    fn from_request(request: &GenerationRequest) -> Self {
        match request.options.get("simulate").and_then(|v| v.as_str()) {
            Some("fail") => Outcome::Fail,
            Some("cancel") => Outcome::Cancel,
            _ => Outcome::Succeed,
        }
    }
}

struct Handle {
    created_ms: i64,
    outcome: Outcome,
    token: String,
}

impl Handle {
    fn encode(&self) -> String {
        format!("{PREFIX}_{}_{}_{}", self.created_ms, self.outcome.code(), self.token)
    }

    fn decode(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(4, '_');
        if parts.next()? != PREFIX {
            return None;
        }
        let created_ms: i64 = parts.next()?.parse().ok()?;
        if created_ms < 0 {
            return None;
        }
        let outcome = Outcome::from_code(parts.next()?)?;
        let token = parts.next()?.to_string();
        if token.is_empty() {
            return None;
        }
        Some(Self {
            created_ms,
            outcome,
            token,
        })
    }
}

pub struct SandboxProvider {
    startup: Duration,
    duration: Duration,
}

impl SandboxProvider {
    /// `startup` is the time spent in `starting`; `duration` the total time
    /// until the job settles. `duration` is raised to `startup` if shorter.
    pub fn new(startup: Duration, duration: Duration) -> Self {
        Self {
            startup,
            duration: duration.max(startup),
        }
    }

    /// Status of `job_id` at wall-clock time `now_ms`.
    pub fn status_at(&self, job_id: &JobId, now_ms: i64) -> ProviderResult<JobSnapshot> {
        let handle = Handle::decode(job_id.as_str())
            .ok_or_else(|| ProviderError::JobNotFound(job_id.to_string()))?;

        let elapsed_ms = now_ms.saturating_sub(handle.created_ms).max(0) as u128;
        let startup_ms = self.startup.as_millis();
        let total_ms = self.duration.as_millis();

        if elapsed_ms < startup_ms {
            return Ok(JobSnapshot::new(JobStatus::Starting).with_progress(0));
        }
        if elapsed_ms < total_ms {
            let span = (total_ms - startup_ms).max(1);
            let pct = ((elapsed_ms - startup_ms) * 100 / span).min(99) as u8;
            return Ok(JobSnapshot::new(JobStatus::Processing).with_progress(pct));
        }

        Ok(match handle.outcome {
            Outcome::Succeed => JobSnapshot::new(JobStatus::Succeeded)
                .with_result(format!("{RESULT_BASE}/{}.mp4", handle.token))
                .with_progress(100),
            Outcome::Fail => {
                JobSnapshot::new(JobStatus::Failed).with_error("simulated generation failure")
            }
            Outcome::Cancel => JobSnapshot::new(JobStatus::Canceled),
        })
    }
}

impl Default for SandboxProvider {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(12))
    }
}

#[async_trait]
impl VideoProvider for SandboxProvider {
    fn id(&self) -> ProviderId {
        ProviderId::sandbox()
    }

    async fn create_job(
        &self,
        request: &GenerationRequest,
        _credential: Option<&str>,
    ) -> ProviderResult<JobId> {
        let handle = Handle {
            created_ms: Utc::now().timestamp_millis(),
            outcome: Outcome::from_request(request),
            token: Uuid::new_v4().simple().to_string(),
        };
        Ok(JobId::from(handle.encode()))
    }

    async fn get_status(
        &self,
        job_id: &JobId,
        _credential: Option<&str>,
    ) -> ProviderResult<JobSnapshot> {
        self.status_at(job_id, Utc::now().timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SandboxProvider {
        SandboxProvider::new(Duration::from_secs(2), Duration::from_secs(10))
    }

    fn handle(created_ms: i64, outcome: Outcome) -> JobId {
        JobId::from(
            Handle {
                created_ms,
                outcome,
                token: "abc".into(),
            }
            .encode(),
        )
    }

    #[test]
    fn test_lifecycle_over_time() {
        let p = provider();
        let id = handle(1_000, Outcome::Succeed);

        assert_eq!(p.status_at(&id, 1_500).unwrap().status, JobStatus::Starting);

        let mid = p.status_at(&id, 7_000).unwrap();
        assert_eq!(mid.status, JobStatus::Processing);
        assert_eq!(mid.progress, Some(50));

        let done = p.status_at(&id, 11_000).unwrap();
        assert_eq!(done.status, JobStatus::Succeeded);
        assert_eq!(
            done.result.as_deref(),
            Some("https://sandbox.reelgen.local/clips/abc.mp4")
        );
    }

    #[test]
    fn test_simulated_outcomes() {
        let p = provider();
        let failed = p.status_at(&handle(0, Outcome::Fail), 60_000).unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert!(failed.error.is_some());

        let canceled = p.status_at(&handle(0, Outcome::Cancel), 60_000).unwrap();
        assert_eq!(canceled.status, JobStatus::Canceled);
    }

    #[test]
    fn test_repeated_polls_are_identical() {
        let p = provider();
        let id = handle(0, Outcome::Succeed);
        assert_eq!(p.status_at(&id, 4_000).unwrap(), p.status_at(&id, 4_000).unwrap());
    }

    #[test]
    fn test_foreign_handle_not_found() {
        let p = provider();
        let err = p.status_at(&JobId::from("pred-123"), 0).unwrap_err();
        assert!(matches!(err, ProviderError::JobNotFound(_)));
        assert!(p.status_at(&JobId::from("sbx_1_x_abc"), 0).is_err());
    }

    #[test]
    fn test_out_of_range_timestamps() {
        let p = provider();
        let now = 1_700_000_000_000;
        let err = p
            .status_at(&JobId::from("sbx_-9223372036854775808_s_abc"), now)
            .unwrap_err();
        assert!(matches!(err, ProviderError::JobNotFound(_)));
        assert!(p.status_at(&JobId::from("sbx_-1_s_abc"), now).is_err());

        // Created in the future: still starting, no overflow
        let future = p
            .status_at(&JobId::from("sbx_9223372036854775807_s_abc"), i64::MIN)
            .unwrap();
        assert_eq!(future.status, JobStatus::Starting);
        assert!(p.status_at(&JobId::from("sbx_99999999999999999999_s_abc"), now).is_err());
    }

    #[tokio::test]
    async fn test_submit_then_poll_is_in_flight() {
        let p = provider();
        let req = GenerationRequest::new("sandbox", "hello");
        let id = p.create_job(&req, None).await.unwrap();
        assert!(!id.is_empty());

        let snap = p.get_status(&id, None).await.unwrap();
        assert!(matches!(snap.status, JobStatus::Starting | JobStatus::Processing));
    }

    #[tokio::test]
    async fn test_identical_submits_yield_distinct_ids() {
        let p = provider();
        let req = GenerationRequest::new("sandbox", "same");
        let (a, b) = futures_util::future::join(p.create_job(&req, None), p.create_job(&req, None)).await;
        assert_ne!(a.unwrap(), b.unwrap());
    }
}

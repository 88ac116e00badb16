//! Caller-side polling loop.
//!
//! The server never polls on its own; this is the client half of the
//! protocol, used by tooling and tests that need to wait for a job. All
//! timing policy lives in [`PollConfig`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use reelgen_models::{JobId, JobSnapshot, ProviderId};
use reelgen_providers::{ProviderError, ProviderResult};

use crate::error::{JobError, JobResult};

/// Anything that can answer a status query.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn status(&self, job_id: &JobId, provider: &ProviderId) -> ProviderResult<JobSnapshot>;
}

#[async_trait]
impl<T: StatusSource + ?Sized> StatusSource for Arc<T> {
    async fn status(&self, job_id: &JobId, provider: &ProviderId) -> ProviderResult<JobSnapshot> {
        self.as_ref().status(job_id, provider).await
    }
}

/// Polling policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollConfig {
    /// Delay between polls
    #[serde(rename = "intervalMs", serialize_with = "as_millis")]
    pub interval: Duration,
    /// Upper bound for the doubling rate-limit backoff. An upstream
    /// `Retry-After` is honoured as given, bounded only by `timeout`.
    #[serde(rename = "maxBackoffMs", serialize_with = "as_millis")]
    pub max_backoff: Duration,
    /// Maximum number of status queries
    pub max_attempts: u32,
    /// Give up after this long, regardless of attempts left
    #[serde(rename = "timeoutMs", serialize_with = "as_millis")]
    pub timeout: Duration,
    /// Consecutive network errors tolerated before giving up; any answer
    /// from the provider, a rate limit included, resets the count
    pub max_consecutive_transient: u32,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_backoff: Duration::from_secs(60),
            max_attempts: 200,
            timeout: Duration::from_secs(600),
            max_consecutive_transient: 5,
        }
    }
}

impl PollConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval: std::env::var("POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.interval),
            max_backoff: std::env::var("POLL_MAX_BACKOFF_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_backoff),
            max_attempts: std::env::var("POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.max_attempts),
            timeout: std::env::var("POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_consecutive_transient: std::env::var("POLL_MAX_TRANSIENT_ERRORS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_consecutive_transient),
        }
    }
}

/// How a wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A terminal state was observed
    Finished(JobSnapshot),
    /// The caller signalled cancellation; the remote job keeps running
    Cancelled { last: Option<JobSnapshot> },
    /// The overall timeout elapsed
    TimedOut { last: Option<JobSnapshot> },
    /// `max_attempts` queries returned only non-terminal states
    AttemptsExhausted { last: Option<JobSnapshot> },
}

impl PollOutcome {
    pub fn snapshot(&self) -> Option<&JobSnapshot> {
        match self {
            PollOutcome::Finished(s) => Some(s),
            PollOutcome::Cancelled { last }
            | PollOutcome::TimedOut { last }
            | PollOutcome::AttemptsExhausted { last } => last.as_ref(),
        }
    }
}

pub struct Poller<S> {
    source: S,
    config: PollConfig,
}

impl<S: StatusSource> Poller<S> {
    pub fn new(source: S, config: PollConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll until the job is terminal or the policy says stop.
    ///
    /// Network errors are retried up to `max_consecutive_transient`; rate
    /// limits double the interval up to `max_backoff` (or honour
    /// `Retry-After`); any other error ends the wait. The loop returns on the
    /// first terminal snapshot, so it never reports a state after one.
    pub async fn wait(
        &self,
        job_id: &JobId,
        provider: &ProviderId,
        mut cancel: watch::Receiver<bool>,
    ) -> JobResult<PollOutcome> {
        let deadline = Instant::now() + self.config.timeout;
        let mut interval = self.config.interval;
        let mut last: Option<JobSnapshot> = None;
        let mut transient = 0u32;

        for attempt in 1..=self.config.max_attempts {
            if *cancel.borrow() {
                return Ok(PollOutcome::Cancelled { last });
            }

            match self.source.status(job_id, provider).await {
                Ok(snapshot) => {
                    transient = 0;
                    interval = self.config.interval;

                    let regressed = last
                        .as_ref()
                        .map(|prev| !prev.status.can_transition_to(snapshot.status))
                        .unwrap_or(false);
                    if regressed {
                        warn!(
                            job_id = %job_id,
                            provider = %provider,
                            to = %snapshot.status,
                            "Provider reported a backwards transition, ignoring"
                        );
                    } else {
                        debug!(job_id = %job_id, attempt, status = %snapshot.status, "Polled job");
                        if snapshot.is_terminal() {
                            return Ok(PollOutcome::Finished(snapshot));
                        }
                        last = Some(snapshot);
                    }
                }
                Err(ProviderError::RateLimited { retry_after_secs, .. }) => {
                    // The provider answered, so the network is fine again.
                    transient = 0;
                    interval = match retry_after_secs {
                        Some(secs) => Duration::from_secs(secs),
                        None => interval.saturating_mul(2).min(self.config.max_backoff),
                    };
                    warn!(job_id = %job_id, provider = %provider, ?interval, "Rate limited while polling, backing off");
                }
                Err(e) if e.is_transient() => {
                    transient += 1;
                    warn!(job_id = %job_id, attempt, transient, error = %e, "Transient error while polling");
                    if transient > self.config.max_consecutive_transient {
                        return Err(JobError::TooManyTransientErrors {
                            count: transient,
                            last: e,
                        });
                    }
                }
                Err(e) => return Err(e.into()),
            }

            if attempt == self.config.max_attempts {
                break;
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(PollOutcome::TimedOut { last });
            }
            let pause = interval.min(deadline - now);
            if sleep_or_cancel(pause, &mut cancel).await {
                return Ok(PollOutcome::Cancelled { last });
            }
            if Instant::now() >= deadline {
                return Ok(PollOutcome::TimedOut { last });
            }
        }

        Ok(PollOutcome::AttemptsExhausted { last })
    }
}

/// Sleep for `pause`; returns true if cancellation fired first.
async fn sleep_or_cancel(pause: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    let sleep = tokio::time::sleep(pause);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            changed = cancel.changed() => match changed {
                Ok(()) if *cancel.borrow() => return true,
                Ok(()) => continue,
                Err(_) => {
                    // Sender dropped: nobody can cancel any more.
                    (&mut sleep).await;
                    return false;
                }
            }
        }
    }
}

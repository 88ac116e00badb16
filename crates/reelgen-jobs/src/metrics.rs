//! Job metrics.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_SUBMITTED_TOTAL: &str = "reelgen_jobs_submitted_total";
    pub const JOB_POLLS_TOTAL: &str = "reelgen_job_polls_total";
    pub const PROVIDER_CALL_DURATION_SECONDS: &str = "reelgen_provider_call_duration_seconds";
}

/// Record a submission attempt. `outcome` is `ok` or an error kind.
pub fn record_submission(provider: &str, outcome: &str, duration_secs: f64) {
    let labels = [
        ("provider", provider.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::JOBS_SUBMITTED_TOTAL, &labels).increment(1);

    let call_labels = [
        ("provider", provider.to_string()),
        ("call", "create".to_string()),
    ];
    histogram!(names::PROVIDER_CALL_DURATION_SECONDS, &call_labels).record(duration_secs);
}

/// Record a status query. `outcome` is the normalized status or an error kind.
pub fn record_poll(provider: &str, outcome: &str, duration_secs: f64) {
    let labels = [
        ("provider", provider.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::JOB_POLLS_TOTAL, &labels).increment(1);

    let call_labels = [
        ("provider", provider.to_string()),
        ("call", "status".to_string()),
    ];
    histogram!(names::PROVIDER_CALL_DURATION_SECONDS, &call_labels).record(duration_secs);
}

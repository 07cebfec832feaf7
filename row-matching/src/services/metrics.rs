//! Prometheus metrics for row-matching.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

/// Counter for candidate lookups by outcome.
pub static CANDIDATE_QUERIES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "row_matching_candidate_queries_total",
        "Total number of candidate order lookups",
        &["status"]
    )
    .expect("Failed to register CANDIDATE_QUERIES")
});

/// Counter for commits by path (confirm, link) and outcome.
pub static COMMITS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "row_matching_commits_total",
        "Total number of row reconciliation commits",
        &["path", "status"]
    )
    .expect("Failed to register COMMITS")
});

/// Histogram for upstream API call duration by operation.
pub static API_CALL_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "row_matching_api_call_duration_seconds",
        "Upstream API call duration in seconds",
        &["operation"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register API_CALL_DURATION")
});

/// Counter for errors.
pub static ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "row_matching_errors_total",
        "Total number of errors",
        &["error_type"]
    )
    .expect("Failed to register ERRORS")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&CANDIDATE_QUERIES);
    Lazy::force(&COMMITS);
    Lazy::force(&API_CALL_DURATION);
    Lazy::force(&ERRORS);
}

pub fn record_candidate_query(status: &str) {
    CANDIDATE_QUERIES.with_label_values(&[status]).inc();
}

pub fn record_commit(path: &str, status: &str) {
    COMMITS.with_label_values(&[path, status]).inc();
}

/// Count a failure under its error kind.
pub fn record_error(error_type: &str) {
    ERRORS.with_label_values(&[error_type]).inc();
}

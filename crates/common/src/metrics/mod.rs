//! Metrics and observability utilities
//!
//! Prometheus metrics for the intake pipeline with standardized naming.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all LeadForge metrics
pub const METRICS_PREFIX: &str = "leadforge";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s, persistence and email timeouts
    10.00,  // 10s
    30.00,  // 30s, request timeout
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Lead metrics
    describe_counter!(
        format!("{}_leads_total", METRICS_PREFIX),
        Unit::Count,
        "Lead submissions by kind and outcome"
    );

    describe_counter!(
        format!("{}_rate_limited_total", METRICS_PREFIX),
        Unit::Count,
        "Requests rejected by a rate limiter"
    );

    // Persistence metrics
    describe_histogram!(
        format!("{}_persistence_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Application persistence latency in seconds"
    );

    // Notification metrics
    describe_counter!(
        format!("{}_emails_total", METRICS_PREFIX),
        Unit::Count,
        "Outgoing emails by template and delivery status"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record the outcome of a contact or application submission
pub fn record_lead(kind: &'static str, outcome: &'static str) {
    counter!(
        format!("{}_leads_total", METRICS_PREFIX),
        "kind" => kind,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_rate_limited(scope: &'static str) {
    counter!(
        format!("{}_rate_limited_total", METRICS_PREFIX),
        "scope" => scope
    )
    .increment(1);
}

pub fn record_persistence(duration_secs: f64, backend: &'static str, success: bool) {
    histogram!(
        format!("{}_persistence_duration_seconds", METRICS_PREFIX),
        "backend" => backend,
        "status" => if success { "success" } else { "error" }
    )
    .record(duration_secs);
}

pub fn record_email(template: &'static str, status: &'static str) {
    counter!(
        format!("{}_emails_total", METRICS_PREFIX),
        "template" => template,
        "status" => status
    )
    .increment(1);
}

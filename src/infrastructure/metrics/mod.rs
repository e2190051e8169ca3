//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Domain events (applications submitted, withdrawn, ...)
//! - Outbound email attempts by template and outcome
//! - Database pool gauges

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

const NAMESPACE: &str = "volunteer_match";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Business events such as "application_submitted" or "opportunity_created"
pub static DOMAIN_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("domain_events_total", "Total number of domain events").namespace(NAMESPACE),
        &["event"],
    )
    .expect("Failed to create DOMAIN_EVENTS_TOTAL metric")
});

/// Outbound emails by template and outcome ("sent" / "failed")
pub static EMAILS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("emails_total", "Total number of outbound emails").namespace(NAMESPACE),
        &["template", "outcome"],
    )
    .expect("Failed to create EMAILS_TOTAL metric")
});

/// Database connection pool stats
pub static DB_POOL_CONNECTIONS: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new("db_pool_connections", "Database connection pool statistics")
            .namespace(NAMESPACE),
        &["state"], // "idle", "active"
    )
    .expect("Failed to create DB_POOL_CONNECTIONS metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(DOMAIN_EVENTS_TOTAL.clone()))
        .expect("Failed to register DOMAIN_EVENTS_TOTAL");
    registry
        .register(Box::new(EMAILS_TOTAL.clone()))
        .expect("Failed to register EMAILS_TOTAL");
    registry
        .register(Box::new(DB_POOL_CONNECTIONS.clone()))
        .expect("Failed to register DB_POOL_CONNECTIONS");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, status.as_str()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Helper to record a domain event
pub fn record_domain_event(event: &str) {
    DOMAIN_EVENTS_TOTAL.with_label_values(&[event]).inc();
}

/// Helper to record an email attempt
pub fn record_email(template: &str, sent: bool) {
    let outcome = if sent { "sent" } else { "failed" };
    EMAILS_TOTAL.with_label_values(&[template, outcome]).inc();
}

/// Helper to update database pool stats
pub fn update_db_pool_stats(idle: u32, active: u32) {
    DB_POOL_CONNECTIONS
        .with_label_values(&["idle"])
        .set(idle as f64);
    DB_POOL_CONNECTIONS
        .with_label_values(&["active"])
        .set(active as f64);
}

//! Prometheus metrics for companion-service.

use once_cell::sync::Lazy;
use service_core::observability::{init_http_metrics, render_http_metrics};
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, HistogramVec, IntCounterVec, IntGauge, TextEncoder,
};

/// Chat model calls by status (`ok`, `error`).
pub static LLM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "companion_llm_requests_total",
        "Total number of chat model requests",
        &["status"]
    )
    .expect("Failed to register LLM_REQUESTS")
});

pub static LLM_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "companion_llm_latency_seconds",
        "Chat model request latency in seconds",
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("Failed to register LLM_LATENCY")
});

/// Extraction worker runs by outcome (`ok`, `failed`, `timeout`).
pub static EXTRACTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "companion_extraction_total",
        "Total number of keyword extraction worker runs",
        &["outcome"]
    )
    .expect("Failed to register EXTRACTIONS")
});

pub static EXTRACTION_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "companion_extraction_duration_seconds",
        "Keyword extraction worker duration in seconds",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to register EXTRACTION_DURATION")
});

pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "companion_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

pub static SESSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "companion_sessions_active",
        "Number of conversation sessions held in memory"
    )
    .expect("Failed to register SESSIONS_ACTIVE")
});

/// Initialize all metrics (forces lazy initialization) and the recorder
/// behind the HTTP request middleware.
pub fn init_metrics() {
    init_http_metrics();
    Lazy::force(&LLM_REQUESTS);
    Lazy::force(&LLM_LATENCY);
    Lazy::force(&EXTRACTIONS);
    Lazy::force(&EXTRACTION_DURATION);
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&SESSIONS_ACTIVE);
}

/// Render the default registry followed by the HTTP request metrics, in the
/// Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        buffer.clear();
    }

    let mut body = String::from_utf8(buffer).unwrap_or_default();
    body.push_str(&render_http_metrics());
    body
}

/// Record a chat model call.
pub fn record_llm_request(status: &str, duration_secs: f64) {
    LLM_REQUESTS.with_label_values(&[status]).inc();
    LLM_LATENCY.observe(duration_secs);
}

/// Record one extraction worker run.
pub fn record_extraction(outcome: &str, duration_secs: f64) {
    EXTRACTIONS.with_label_values(&[outcome]).inc();
    EXTRACTION_DURATION.observe(duration_secs);
}

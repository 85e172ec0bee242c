use crate::location_store::LocationType;
use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all location server metrics
const PREFIX: &str = "location_server";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Enrichment Metrics
    pub static ref ENRICHMENT_FAILURES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_enrichment_failures_total"),
            "Third-party lookups that failed and were skipped"
        ),
        &["adapter"]
    ).expect("Failed to create enrichment_failures_total metric");

    pub static ref IMAGES_STORED_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_images_stored_total"), "Images written to disk"),
        &["source"]
    ).expect("Failed to create images_stored_total metric");

    // Location Metrics
    pub static ref LOCATIONS_TOTAL: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_locations_total"), "Stored locations by type"),
        &["type"]
    ).expect("Failed to create locations_total metric");
}

/// Initialize all metrics and register them with the global registry
pub fn init_metrics() {
    // Ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(ENRICHMENT_FAILURES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(IMAGES_STORED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(LOCATIONS_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Collapses numeric path segments so ids don't explode label cardinality:
/// `/api/locations/42` becomes `/api/locations/{id}`.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with("/src/data/images") {
        return "/src/data/images/*".to_string();
    }
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let path = normalize_path(path);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, &path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, &path])
        .observe(duration.as_secs_f64());
}

/// Record a third-party lookup that failed
pub fn record_enrichment_failure(adapter: &str) {
    ENRICHMENT_FAILURES_TOTAL.with_label_values(&[adapter]).inc();
}

/// Record images written for a location
pub fn record_images_stored(source: &str, count: usize) {
    IMAGES_STORED_TOTAL
        .with_label_values(&[source])
        .inc_by(count as f64);
}

/// Publish the current number of stored locations per type
pub fn set_location_counts(counts: &[(LocationType, usize)]) {
    for (location_type, count) in counts {
        LOCATIONS_TOTAL
            .with_label_values(&[location_type.as_str()])
            .set(*count as f64);
    }
}

/// Handler for /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

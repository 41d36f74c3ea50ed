//! Prometheus metrics: HTTP traffic plus auth-flow outcomes.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

static REGISTRY: OnceLock<Registry> = OnceLock::new();
static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
static AUTH_OUTCOMES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

pub fn init_metrics() {
    let registry = Registry::new();

    let requests = IntCounterVec::new(
        Opts::new("http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("metric definition is static");

    let duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ),
        &["method", "path"],
    )
    .expect("metric definition is static");

    let outcomes = IntCounterVec::new(
        Opts::new(
            "auth_outcomes_total",
            "Auth flow outcomes by operation and result",
        ),
        &["operation", "outcome"],
    )
    .expect("metric definition is static");

    registry
        .register(Box::new(requests.clone()))
        .expect("first registration cannot collide");
    registry
        .register(Box::new(duration.clone()))
        .expect("first registration cannot collide");
    registry
        .register(Box::new(outcomes.clone()))
        .expect("first registration cannot collide");

    // Repeat initialization (tests) keeps the first registry.
    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(requests);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(duration);
    let _ = AUTH_OUTCOMES_TOTAL.set(outcomes);
}

pub fn observe_request(method: &str, path: &str, status: u16, seconds: f64) {
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter
            .with_label_values(&[method, path, &status.to_string()])
            .inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram.with_label_values(&[method, path]).observe(seconds);
    }
}

pub fn record_auth_outcome(operation: &str, outcome: &str) {
    if let Some(counter) = AUTH_OUTCOMES_TOTAL.get() {
        counter.with_label_values(&[operation, outcome]).inc();
    }
}

/// Render the registry in the Prometheus text format.
pub fn gather() -> String {
    let Some(registry) = REGISTRY.get() else {
        return String::new();
    };
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if encoder.encode(&registry.gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_show_up_in_the_exposition() {
        init_metrics();
        record_auth_outcome("login", "success");
        observe_request("POST", "/auth/login", 200, 0.01);

        let text = gather();
        assert!(text.contains("auth_outcomes_total"));
        assert!(text.contains("http_requests_total"));
    }
}

//! Prometheus metrics for social-api.
//!
//! Collectors register with the default registry; `/metrics` renders it.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    /// HTTP requests (labels: method, status)
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "status"]
    )
    .expect("http_requests_total registers once");

    /// HTTP request latency (labels: method)
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "Time spent serving HTTP requests",
        &["method"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("http_request_duration_seconds registers once");

    /// Post operations (labels: op=list|search|creator|get|create|update|delete|like|comment, result)
    pub static ref POST_OPERATIONS_TOTAL: CounterVec = register_counter_vec!(
        "post_operations_total",
        "Total number of post operations",
        &["op", "result"]
    )
    .expect("post_operations_total registers once");

    /// Authentication attempts (labels: op=signin|signup, result)
    pub static ref AUTH_ATTEMPTS_TOTAL: CounterVec = register_counter_vec!(
        "auth_attempts_total",
        "Total number of signin and signup attempts",
        &["op", "result"]
    )
    .expect("auth_attempts_total registers once");
}

/// Record the outcome of a post operation
pub fn record_post_op<T, E>(op: &str, outcome: &Result<T, E>) {
    let result = if outcome.is_ok() { "success" } else { "error" };
    POST_OPERATIONS_TOTAL.with_label_values(&[op, result]).inc();
}

/// Record the outcome of a signin or signup
pub fn record_auth_attempt<T, E>(op: &str, outcome: &Result<T, E>) {
    let result = if outcome.is_ok() { "success" } else { "failure" };
    AUTH_ATTEMPTS_TOTAL.with_label_values(&[op, result]).inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_post_outcomes() {
        let before = POST_OPERATIONS_TOTAL
            .with_label_values(&["get", "error"])
            .get();
        record_post_op::<(), &str>("get", &Err("missing"));
        let after = POST_OPERATIONS_TOTAL
            .with_label_values(&["get", "error"])
            .get();
        assert!(after >= before + 1.0);
    }

    #[actix_web::test]
    async fn renders_text_exposition() {
        record_auth_attempt::<(), ()>("signin", &Ok(()));
        let resp = serve_metrics().await;
        assert!(resp.status().is_success());
    }
}

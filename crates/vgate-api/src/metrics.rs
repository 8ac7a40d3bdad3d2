//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vgate_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vgate_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vgate_http_requests_in_flight";

    // Upload metrics
    pub const UPLOADS_RECEIVED_TOTAL: &str = "vgate_uploads_received_total";
    pub const UPLOAD_BYTES_TOTAL: &str = "vgate_upload_bytes_total";
    pub const UPLOADS_REJECTED_TOTAL: &str = "vgate_uploads_rejected_total";

    // Job metrics
    pub const JOBS_SUCCEEDED_TOTAL: &str = "vgate_jobs_succeeded_total";
    pub const JOBS_FAILED_TOTAL: &str = "vgate_jobs_failed_total";
    pub const JOB_DURATION_SECONDS: &str = "vgate_job_duration_seconds";
    pub const CLEANUP_FAILURES_TOTAL: &str = "vgate_cleanup_failures_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", route_label(path).to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record an accepted upload.
pub fn record_upload_received(bytes: u64) {
    counter!(names::UPLOADS_RECEIVED_TOTAL).increment(1);
    counter!(names::UPLOAD_BYTES_TOTAL).increment(bytes);
}

/// Record an upload rejected before the job ran.
pub fn record_upload_rejected(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::UPLOADS_REJECTED_TOTAL, &labels).increment(1);
}

/// Record a job that exited zero.
pub fn record_job_succeeded(duration_secs: f64) {
    counter!(names::JOBS_SUCCEEDED_TOTAL).increment(1);
    histogram!(names::JOB_DURATION_SECONDS).record(duration_secs);
}

/// Record a failed job.
pub fn record_job_failed(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

/// Record a temp file that could not be deleted.
pub fn record_cleanup_failure() {
    counter!(names::CLEANUP_FAILURES_TOTAL).increment(1);
}

/// Bounded label for a request path.
fn route_label(path: &str) -> &'static str {
    match path {
        "/uploads" => "/uploads",
        "/tch" => "/tch",
        "/health" | "/healthz" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        _ => "other",
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    // Increment in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    // Decrement in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label() {
        assert_eq!(route_label("/uploads"), "/uploads");
        assert_eq!(route_label("/healthz"), "/health");
        assert_eq!(route_label("/wp-admin/setup.php"), "other");
    }
}

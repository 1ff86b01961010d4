//! # Prometheus Metrics
//!
//! Request counters go through the `metrics` facade. The binary installs a
//! Prometheus recorder and [`render`] serves its text exposition at
//! `/metrics`; without a recorder the counters are no-ops and the endpoint
//! returns an empty body.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

/// Install the global Prometheus recorder.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}

/// Middleware that counts responses by status code.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    metrics::counter!(
        "rosca_http_requests_total",
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    response
}

/// GET /metrics — Prometheus text exposition.
pub async fn render(State(state): State<AppState>) -> impl IntoResponse {
    let body = state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

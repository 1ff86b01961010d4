//! # rosca-api — Axum API Services for the ROSCA Stack
//!
//! HTTP surface over the verification gateway and the circle ledger.
//!
//! ## API Surface
//!
//! | Prefix | Module | Domain |
//! |--------|--------|--------|
//! | `/api/verify` | [`routes::verify`] | Attestation submission |
//! | `/v1/circles/*`, `/v1/payouts` | [`routes::circles`] | Circle lifecycle |
//! | `/v1/users/*` | [`routes::users`] | Verification and eligibility |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Generated via utoipa derive macros, served at `/openapi.json`.

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use rosca_ledger::RotationScheduler;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::verify::router())
        .merge(routes::circles::router())
        .merge(routes::users::router())
        .merge(openapi::router())
        .route("/metrics", get(middleware::metrics::render))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}

/// Sweep rotating circles every `every` until the task is dropped.
pub async fn run_auto_advance(scheduler: RotationScheduler, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let report = scheduler.run_pending();
        if !report.paid.is_empty() || !report.failed.is_empty() {
            tracing::info!(
                paid = report.paid.len(),
                failed = report.failed.len(),
                "rotation sweep"
            );
        }
        for (circle, code) in &report.failed {
            tracing::warn!(circle = %circle, code = %code, "circle not advanced");
        }
    }
}

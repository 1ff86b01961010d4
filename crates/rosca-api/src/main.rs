//! # rosca-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the ROSCA API.
//! Binds to the configured port (default 8080).

use rosca_api::state::{AppConfig, AppState, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize structured tracing.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let metrics = rosca_api::middleware::metrics::install_recorder().map_err(|e| {
        tracing::error!("Prometheus recorder installation failed: {e}");
        e
    })?;

    tracing::info!(
        scope = %config.verifier.scope,
        endpoint = %config.verifier.endpoint,
        backend = ?config.backend,
        ordering = %config.ordering,
        staleness = ?config.staleness,
        "configuration loaded"
    );
    if matches!(config.backend, rosca_attest::ProofBackend::Mock) {
        tracing::warn!("mock proofs enabled: attestations carry no privacy or issuer guarantee");
    }

    let port = config.port;
    let auto_advance = config.auto_advance;
    let state = AppState::with_config(config)
        .map_err(|e| {
            tracing::error!("Proof backend initialization failed: {e}");
            e
        })?
        .with_metrics(metrics);

    if let Some(every) = auto_advance {
        tracing::info!(seconds = every.as_secs(), "automatic rotation enabled");
        tokio::spawn(rosca_api::run_auto_advance(state.scheduler.clone(), every));
    }

    let app = rosca_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("ROSCA API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Observation HTTP endpoint: Prometheus metrics and health.
//!
//! Installs the global `metrics-exporter-prometheus` recorder and serves
//! two routes on the configured address:
//!
//! * `GET /metrics` - Prometheus text exposition
//! * `GET /health`  - `200 OK` with body `OK` while the daemon runs
//!
//! The recorder can only be installed once per process.

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use logpost_core::{MetricsConfig, metrics as m};

/// Install the metrics recorder and start the observation endpoint.
///
/// Returns the server task handle; the server shuts down when the
/// cancellation token fires.
///
/// # Errors
///
/// - Socket binding fails
/// - The global recorder is already installed
pub async fn start_observation_endpoint(
    config: &MetricsConfig,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>> {
    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(m::PROCESSING_LATENCY_SECONDS.to_owned()),
            &m::PROCESSING_LATENCY_BUCKETS,
        )
        .map_err(|e| anyhow::anyhow!("invalid histogram buckets: {}", e))?;
    let handle = builder
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {}", e))?;

    m::describe_all();

    let app = Router::new()
        .route(
            "/metrics",
            get(move || {
                let handle = handle.clone();
                async move { handle.render() }
            }),
        )
        .route("/health", get(|| async { "OK" }));

    let listener = tokio::net::TcpListener::bind(&config.address)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", config.address, e))?;

    if let Ok(addr) = listener.local_addr() {
        if addr.ip().is_unspecified() {
            tracing::warn!(
                listen_addr = %addr,
                "observation endpoint is exposed on all interfaces; restrict address in untrusted networks"
            );
        }
        tracing::info!(listen_addr = %addr, "observation endpoint active");
    }

    let server = axum::serve(listener, app).with_graceful_shutdown(cancel.cancelled_owned());
    Ok(tokio::spawn(async move {
        if let Err(e) = server.await {
            tracing::error!(error = %e, "observation endpoint failed");
        }
    }))
}

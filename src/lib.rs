//! pool-exerciser: keeps a MySQL connection pool under steady, parameterized
//! query traffic and exposes pool and query metrics for scraping.
//!
//! The binary wires three pieces together:
//! - [`config`]: YAML file plus `MYSQLTESTER_*` environment overrides
//! - [`exerciser_core::Orchestrator`]: pools, warm-up, workers, reporters
//! - [`exerciser_metrics::serve_metrics`]: the `/metrics` endpoint

pub mod config;
pub mod testing;

use anyhow::Context;
use exerciser_core::{ExerciserMetrics, MySqlConnector, Orchestrator, PoolConnector, RunReport};
use exerciser_metrics::serve_metrics;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

pub use config::{load_config, ConfigError, FileConfig, Settings};

/// Run against MySQL with metrics served on `settings.metrics_port` until
/// `shutdown` resolves.
pub async fn run_exerciser<F>(settings: &Settings, shutdown: F) -> anyhow::Result<RunReport>
where
    F: Future<Output = ()>,
{
    let listener = TcpListener::bind(("0.0.0.0", settings.metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", settings.metrics_port))?;
    let metrics = Arc::new(ExerciserMetrics::new());
    run_exerciser_with(settings, MySqlConnector, listener, metrics, shutdown).await
}

/// Same as [`run_exerciser`] with an explicit connector and metrics listener.
pub async fn run_exerciser_with<C, F>(
    settings: &Settings,
    connector: C,
    listener: TcpListener,
    metrics: Arc<ExerciserMetrics>,
    shutdown: F,
) -> anyhow::Result<RunReport>
where
    C: PoolConnector,
    F: Future<Output = ()>,
{
    let server = tokio::spawn(serve_metrics(listener, Arc::clone(&metrics)));

    let result = Orchestrator::new(settings.exerciser.clone(), connector, metrics)
        .run(shutdown)
        .await;

    if server.is_finished() {
        match server.await {
            Ok(Err(e)) => error!("Metrics server stopped: {:#}", e),
            Err(e) => error!("Metrics server task failed: {}", e),
            Ok(Ok(())) => {}
        }
    } else {
        server.abort();
    }

    let report = result.context("Exerciser failed to start")?;
    info!(
        "Stopped {} worker lanes across pools {:?} ({} had terminated early)",
        report.lanes_started, report.pools, report.lanes_terminated
    );
    Ok(report)
}

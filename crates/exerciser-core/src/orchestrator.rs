//! Startup and shutdown of pools and worker tasks.

use crate::config::{ExerciserConfig, PoolMode};
use crate::error::{ExerciserError, SeedError};
use crate::pool::{PoolConnector, PoolHandle};
use crate::reporter::PoolReporter;
use crate::warmer::warm_pool;
use crate::worker::Worker;
use exerciser_metrics::ExerciserMetrics;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Pool identity used when every worker shares one pool.
pub const SHARED_POOL_ID: &str = "shared";

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Pool identities, in connection order.
    pub pools: Vec<String>,
    /// Worker lanes spawned (`concurrent_workers * queries_per_worker`).
    pub lanes_started: usize,
    /// Lanes that had already stopped when shutdown arrived.
    pub lanes_terminated: usize,
}

struct PoolGroup<P> {
    pool_id: String,
    pool: Arc<P>,
    workers: Vec<usize>,
}

/// Owns the resolved configuration and drives one run.
pub struct Orchestrator<C: PoolConnector> {
    config: ExerciserConfig,
    connector: C,
    metrics: Arc<ExerciserMetrics>,
}

impl<C: PoolConnector> Orchestrator<C> {
    pub fn new(config: ExerciserConfig, connector: C, metrics: Arc<ExerciserMetrics>) -> Self {
        Self {
            config,
            connector,
            metrics,
        }
    }

    /// Worker ids per pool identity for the configured pool mode.
    fn group_layout(&self) -> Vec<(String, Vec<usize>)> {
        let workers = 0..self.config.concurrent_workers;
        match self.config.pool_mode {
            PoolMode::Shared => vec![(SHARED_POOL_ID.to_string(), workers.collect())],
            PoolMode::PerWorker => workers.map(|w| (w.to_string(), vec![w])).collect(),
        }
    }

    async fn connect_all(&self) -> Result<Vec<PoolGroup<C::Pool>>, ExerciserError> {
        let mut groups: Vec<PoolGroup<C::Pool>> = Vec::new();
        for (pool_id, workers) in self.group_layout() {
            match self
                .connector
                .connect(&pool_id, &self.config.dsn, &self.config.limits)
                .await
            {
                Ok(pool) => groups.push(PoolGroup {
                    pool_id,
                    pool,
                    workers,
                }),
                Err(e) => {
                    for group in &groups {
                        group.pool.close().await;
                    }
                    return Err(e);
                }
            }
        }
        Ok(groups)
    }

    /// Start every pool and worker, then block until `shutdown` resolves.
    ///
    /// Configuration and connection failures abort startup before any worker
    /// runs. After shutdown the pools are closed first and worker tasks are
    /// aborted without being joined.
    pub async fn run<F>(self, shutdown: F) -> Result<RunReport, ExerciserError>
    where
        F: Future<Output = ()>,
    {
        self.config.validate()?;
        let config = &self.config;
        let workload = Arc::new(config.effective_workload());

        let groups = self.connect_all().await?;
        info!(
            "Starting {} workers with {} queries each across {} pools ({:?} mode)",
            config.concurrent_workers,
            config.queries_per_worker,
            groups.len(),
            config.pool_mode
        );

        let mut reporters: Vec<JoinHandle<()>> = Vec::new();
        let mut lanes: Vec<JoinHandle<Result<Infallible, SeedError>>> = Vec::new();

        for group in &groups {
            reporters.push(
                PoolReporter::new(
                    group.pool_id.clone(),
                    Arc::clone(&group.pool),
                    Arc::clone(&self.metrics),
                    config.metrics_interval,
                )
                .spawn(),
            );

            // Fire-and-forget; the handles are not tracked.
            drop(warm_pool(
                &group.pool_id,
                Arc::clone(&group.pool),
                config.limits.warm_idle,
                &config.test_query,
                Arc::clone(&self.metrics),
            ));

            for &worker_id in &group.workers {
                for lane in 0..config.queries_per_worker {
                    let worker = Worker::new(
                        worker_id,
                        lane,
                        Arc::clone(&group.pool),
                        Arc::clone(&self.metrics),
                        Arc::clone(&workload),
                    )
                    .with_traversal(config.traversal)
                    .with_interval(config.query_interval);
                    lanes.push(tokio::spawn(worker.run()));
                }
            }
        }

        shutdown.await;
        info!("Shutting down gracefully...");

        let lanes_terminated = lanes.iter().filter(|h| h.is_finished()).count();
        if lanes_terminated > 0 {
            warn!(
                "{} of {} worker lanes had stopped before shutdown",
                lanes_terminated,
                lanes.len()
            );
        }

        for group in &groups {
            group.pool.close().await;
        }
        for handle in &lanes {
            handle.abort();
        }
        for handle in &reporters {
            handle.abort();
        }

        Ok(RunReport {
            pools: groups.into_iter().map(|g| g.pool_id).collect(),
            lanes_started: lanes.len(),
            lanes_terminated,
        })
    }
}

//! Worker lanes: seed once, then execute on every pacer tick.
//!
//! A [`Worker`] is the *Starting* state of one lane. [`Worker::seed`] moves it
//! through *Seeding* into a [`RunningWorker`], which loops until its task is
//! aborted. Seed failures end the lane permanently; query failures never do.

use crate::config::{Traversal, Workload};
use crate::error::{QueryError, SeedError};
use crate::executor::execute_query;
use crate::pacer::Pacer;
use crate::pool::PoolHandle;
use crate::seed::resolve_seed_rows;
use exerciser_metrics::ExerciserMetrics;
use mysql_seed_types::{SeedRow, SeedValue};
use rand::Rng;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Position in a non-empty seed set.
#[derive(Debug, Clone)]
pub struct Cursor {
    len: usize,
    next: usize,
    traversal: Traversal,
}

impl Cursor {
    /// Returns `None` for an empty set.
    pub fn new(len: usize, traversal: Traversal) -> Option<Self> {
        (len > 0).then_some(Self {
            len,
            next: 0,
            traversal,
        })
    }

    pub fn next_index(&mut self) -> usize {
        match self.traversal {
            Traversal::RoundRobin => {
                let index = self.next;
                self.next = (self.next + 1) % self.len;
                index
            }
            Traversal::Random => rand::rng().random_range(0..self.len),
        }
    }
}

/// What a running lane cycles through.
#[derive(Debug, Clone)]
pub enum Statements {
    /// One template, bound with each seed row in turn.
    Template { sql: String, rows: Vec<SeedRow> },
    /// Fixed statements, executed without parameters.
    Static(Vec<String>),
}

impl Statements {
    pub fn len(&self) -> usize {
        match self {
            Statements::Template { rows, .. } => rows.len(),
            Statements::Static(queries) => queries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Option<(&str, &[SeedValue])> {
        match self {
            Statements::Template { sql, rows } => {
                rows.get(index).map(|row| (sql.as_str(), row.values()))
            }
            Statements::Static(queries) => queries.get(index).map(|sql| (sql.as_str(), &[][..])),
        }
    }
}

/// One query lane of a worker, before seeding.
pub struct Worker<P: PoolHandle> {
    worker_id: usize,
    lane: usize,
    pool: Arc<P>,
    metrics: Arc<ExerciserMetrics>,
    workload: Arc<Workload>,
    traversal: Traversal,
    interval: Duration,
}

impl<P: PoolHandle> Worker<P> {
    pub fn new(
        worker_id: usize,
        lane: usize,
        pool: Arc<P>,
        metrics: Arc<ExerciserMetrics>,
        workload: Arc<Workload>,
    ) -> Self {
        Self {
            worker_id,
            lane,
            pool,
            metrics,
            workload,
            traversal: Traversal::RoundRobin,
            interval: Duration::from_secs(1),
        }
    }

    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    fn log_prefix(&self) -> String {
        format!("[Worker {} - Query {}]", self.worker_id, self.lane)
    }

    /// Resolve the seed set. On failure the error counter is incremented once,
    /// labeled with the seed query.
    pub async fn seed(self) -> Result<RunningWorker<P>, SeedError> {
        let prefix = self.log_prefix();
        let worker_id = self.worker_id.to_string();

        let statements = match self.workload.as_ref() {
            Workload::Seeded {
                seed_query,
                query_template,
            } => {
                let rows = match resolve_seed_rows(self.pool.as_ref(), seed_query).await {
                    Ok(rows) if rows.is_empty() => Err(SeedError::Empty),
                    Ok(rows) => Ok(rows),
                    Err(e) => Err(SeedError::Query(e)),
                };
                match rows {
                    Ok(rows) => {
                        info!("{} Fetched {} seed rows", prefix, rows.len());
                        Statements::Template {
                            sql: query_template.clone(),
                            rows,
                        }
                    }
                    Err(e) => {
                        self.metrics.record_query_error(&worker_id, seed_query);
                        error!("{} {}", prefix, e);
                        return Err(e);
                    }
                }
            }
            Workload::Static { queries } => {
                if queries.is_empty() {
                    self.metrics.record_query_error(&worker_id, "");
                    error!("{} {}", prefix, SeedError::NoStaticQueries);
                    return Err(SeedError::NoStaticQueries);
                }
                debug!("{} Cycling {} static queries", prefix, queries.len());
                Statements::Static(queries.clone())
            }
        };

        let cursor = match Cursor::new(statements.len(), self.traversal) {
            Some(cursor) => cursor,
            None => return Err(SeedError::Empty),
        };

        Ok(RunningWorker {
            worker_id,
            prefix,
            pool: self.pool,
            metrics: self.metrics,
            statements,
            cursor,
            pacer: Pacer::new(self.interval),
        })
    }

    /// Seed, then run until aborted. Returns only on seed failure.
    pub async fn run(self) -> Result<Infallible, SeedError> {
        let running = self.seed().await?;
        Ok(running.run().await)
    }
}

/// A seeded lane.
pub struct RunningWorker<P: PoolHandle> {
    worker_id: String,
    prefix: String,
    pool: Arc<P>,
    metrics: Arc<ExerciserMetrics>,
    statements: Statements,
    cursor: Cursor,
    pacer: Pacer,
}

impl<P: PoolHandle> RunningWorker<P> {
    /// Execute the next statement immediately, recording latency and errors.
    pub async fn step(&mut self) -> Result<SeedRow, QueryError> {
        let index = self.cursor.next_index();
        let Some((sql, params)) = self.statements.get(index) else {
            return Err(QueryError::NoRows);
        };

        let started = Instant::now();
        let result = execute_query(self.pool.as_ref(), sql, params).await;
        self.metrics
            .observe_query_duration(&self.worker_id, sql, started.elapsed());

        match &result {
            Ok(row) => debug!("{} Query result: {}", self.prefix, row),
            Err(QueryError::NoRows) => debug!(
                "{} No rows returned for params {}",
                self.prefix,
                SeedRow::from(params.to_vec())
            ),
            Err(e) => {
                self.metrics.record_query_error(&self.worker_id, sql);
                warn!("{} {}", self.prefix, e);
            }
        }
        result
    }

    /// Wait for each tick and execute. Never returns.
    pub async fn run(mut self) -> Infallible {
        info!(
            "{} Running every {:?}",
            self.prefix,
            self.pacer.period()
        );
        loop {
            self.pacer.tick().await;
            // Failures are already recorded; the next tick retries.
            let _ = self.step().await;
        }
    }
}

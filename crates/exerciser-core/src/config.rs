//! Resolved exerciser configuration.
//!
//! This is the validated, type-correct form the orchestrator consumes. File
//! and environment loading live in the binary crate and convert into it.

use crate::error::ExerciserError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `max_open` used when the configured limit is 0 ("unlimited").
pub const UNBOUNDED_MAX_OPEN: u32 = 1024;

/// Default statement for warm-up and static mode.
pub const DEFAULT_TEST_QUERY: &str = "SELECT 1";

/// How pools are assigned to workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolMode {
    /// One pool shared by every worker.
    #[default]
    Shared,
    /// One pool per worker, labeled by worker id.
    PerWorker,
}

/// Order in which a worker walks its seed set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Traversal {
    #[default]
    RoundRobin,
    Random,
}

/// Connection pool limits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolLimits {
    /// Maximum open connections; 0 means unbounded.
    pub max_open: u32,
    /// Idle connection cap, reported in logs only. The sqlx pool has no idle
    /// cap, so idle connections are bounded by `max_open` and `max_idle_time`.
    pub max_idle: u32,
    /// Warm-up pings issued at worker-group startup, used as given.
    pub warm_idle: u32,
    /// Maximum lifetime of a connection; `None` keeps connections forever.
    pub max_lifetime: Option<Duration>,
    /// Maximum time a connection may sit idle; `None` disables the limit.
    pub max_idle_time: Option<Duration>,
}

impl PoolLimits {
    pub fn effective_max_open(&self) -> u32 {
        if self.max_open == 0 {
            UNBOUNDED_MAX_OPEN
        } else {
            self.max_open
        }
    }
}

/// What each worker executes on every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workload {
    /// Fetch rows with `seed_query` once, then run `query_template` with each
    /// row bound positionally.
    Seeded {
        seed_query: String,
        query_template: String,
    },
    /// Cycle through fixed statements, executed without parameters.
    Static { queries: Vec<String> },
}

/// Validated configuration for one exerciser run.
#[derive(Debug, Clone)]
pub struct ExerciserConfig {
    pub dsn: String,
    pub limits: PoolLimits,
    pub pool_mode: PoolMode,
    pub test_query: String,
    pub workload: Workload,
    pub traversal: Traversal,
    pub query_interval: Duration,
    pub concurrent_workers: usize,
    pub queries_per_worker: usize,
    pub metrics_interval: Duration,
}

impl ExerciserConfig {
    /// Create a configuration with one worker, a one second interval and a
    /// shared pool.
    pub fn new(dsn: impl Into<String>, workload: Workload) -> Self {
        Self {
            dsn: dsn.into(),
            limits: PoolLimits::default(),
            pool_mode: PoolMode::Shared,
            test_query: DEFAULT_TEST_QUERY.to_string(),
            workload,
            traversal: Traversal::RoundRobin,
            query_interval: Duration::from_secs(1),
            concurrent_workers: 1,
            queries_per_worker: 1,
            metrics_interval: Duration::from_secs(15),
        }
    }

    pub fn with_limits(mut self, limits: PoolLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_pool_mode(mut self, pool_mode: PoolMode) -> Self {
        self.pool_mode = pool_mode;
        self
    }

    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn with_query_interval(mut self, interval: Duration) -> Self {
        self.query_interval = interval;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.concurrent_workers = workers;
        self
    }

    pub fn with_queries_per_worker(mut self, lanes: usize) -> Self {
        self.queries_per_worker = lanes;
        self
    }

    pub fn with_metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = interval;
        self
    }

    pub fn with_test_query(mut self, test_query: impl Into<String>) -> Self {
        self.test_query = test_query.into();
        self
    }

    /// Workload as executed: an empty static list falls back to `test_query`.
    pub fn effective_workload(&self) -> Workload {
        match &self.workload {
            Workload::Static { queries } if queries.is_empty() => Workload::Static {
                queries: vec![self.test_query.clone()],
            },
            other => other.clone(),
        }
    }

    /// Check the invariants the orchestrator relies on.
    pub fn validate(&self) -> Result<(), ExerciserError> {
        if self.dsn.trim().is_empty() {
            return Err(ExerciserError::config("dsn must not be empty"));
        }
        if self.query_interval.is_zero() {
            return Err(ExerciserError::config("query_interval must be greater than 0"));
        }
        if self.metrics_interval.is_zero() {
            return Err(ExerciserError::config(
                "metrics_interval must be greater than 0",
            ));
        }
        if self.queries_per_worker == 0 {
            return Err(ExerciserError::config(
                "queries_per_worker must be at least 1",
            ));
        }
        if self.limits.warm_idle > 0 && self.test_query.trim().is_empty() {
            return Err(ExerciserError::config(
                "test_query is required when warm_idle_conns is set",
            ));
        }
        if let Workload::Seeded {
            seed_query,
            query_template,
        } = &self.workload
        {
            if seed_query.trim().is_empty() {
                return Err(ExerciserError::config("seed_query must not be empty"));
            }
            if query_template.trim().is_empty() {
                return Err(ExerciserError::config(
                    "query_template is required with seed_query",
                ));
            }
        }
        Ok(())
    }
}

//! Connection pool handle.
//!
//! The pool is the only object touched concurrently by workers, the warmer
//! and the reporter. Its concurrency guarantees come from the pool
//! implementation; callers share it through an `Arc` with no extra locking.

use crate::config::PoolLimits;
use crate::error::{ExerciserError, QueryError};
use async_trait::async_trait;
use exerciser_metrics::PoolSnapshot;
use mysql_seed_types::{bind_values, row_to_seed_row, SeedRow, SeedValue};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::sync::Arc;
use tracing::{debug, info};

/// Operations the exerciser needs from a connection pool.
#[async_trait]
pub trait PoolHandle: Send + Sync + 'static {
    /// Run `sql` without parameters and decode every row.
    async fn fetch_all(&self, sql: &str) -> Result<Vec<SeedRow>, QueryError>;

    /// Run `sql` with `params` bound positionally; decode the first row, if any.
    async fn fetch_one(&self, sql: &str, params: &[SeedValue])
        -> Result<Option<SeedRow>, QueryError>;

    /// Run `sql` and discard its result.
    async fn ping(&self, sql: &str) -> Result<(), QueryError>;

    /// Snapshot of open/idle/in-use connection counts.
    fn stats(&self) -> PoolSnapshot;

    /// Close the pool. In-flight statements may fail afterwards.
    async fn close(&self);
}

/// Opens pool handles for worker groups.
#[async_trait]
pub trait PoolConnector: Send + Sync {
    type Pool: PoolHandle;

    async fn connect(
        &self,
        pool_id: &str,
        dsn: &str,
        limits: &PoolLimits,
    ) -> Result<Arc<Self::Pool>, ExerciserError>;
}

#[async_trait]
impl<T: PoolConnector + ?Sized> PoolConnector for Arc<T> {
    type Pool = T::Pool;

    async fn connect(
        &self,
        pool_id: &str,
        dsn: &str,
        limits: &PoolLimits,
    ) -> Result<Arc<Self::Pool>, ExerciserError> {
        (**self).connect(pool_id, dsn, limits).await
    }
}

/// `PoolHandle` backed by a `sqlx` MySQL pool.
#[derive(Debug, Clone)]
pub struct MySqlPoolHandle {
    pool: MySqlPool,
}

impl MySqlPoolHandle {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn inner(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl PoolHandle for MySqlPoolHandle {
    async fn fetch_all(&self, sql: &str) -> Result<Vec<SeedRow>, QueryError> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row_to_seed_row(row).map_err(QueryError::from))
            .collect()
    }

    async fn fetch_one(
        &self,
        sql: &str,
        params: &[SeedValue],
    ) -> Result<Option<SeedRow>, QueryError> {
        let row = bind_values(sqlx::query(sql), params)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref()
            .map(row_to_seed_row)
            .transpose()
            .map_err(QueryError::from)
    }

    async fn ping(&self, sql: &str) -> Result<(), QueryError> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }

    fn stats(&self) -> PoolSnapshot {
        let open = self.pool.size() as i64;
        let idle = self.pool.num_idle() as i64;
        PoolSnapshot {
            open,
            idle,
            in_use: (open - idle).max(0),
        }
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Connects `MySqlPoolHandle`s with the configured limits applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

impl MySqlConnector {
    /// Pool options for `limits`. The idle-time limit is applied before the
    /// lifetime limit. `max_idle` has no sqlx counterpart and is not applied.
    pub fn pool_options(limits: &PoolLimits) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(limits.effective_max_open())
            .min_connections(0)
            .idle_timeout(limits.max_idle_time)
            .max_lifetime(limits.max_lifetime)
    }
}

#[async_trait]
impl PoolConnector for MySqlConnector {
    type Pool = MySqlPoolHandle;

    async fn connect(
        &self,
        pool_id: &str,
        dsn: &str,
        limits: &PoolLimits,
    ) -> Result<Arc<Self::Pool>, ExerciserError> {
        debug!(
            "[Pool {}] Connecting (max_open={}, max_idle={}, idle_timeout={:?}, max_lifetime={:?})",
            pool_id,
            limits.effective_max_open(),
            limits.max_idle,
            limits.max_idle_time,
            limits.max_lifetime
        );

        let pool = Self::pool_options(limits)
            .connect(dsn)
            .await
            .map_err(|source| ExerciserError::Connection {
                pool: pool_id.to_string(),
                source,
            })?;

        info!("[Pool {}] Connected to the database successfully", pool_id);
        Ok(Arc::new(MySqlPoolHandle::new(pool)))
    }
}

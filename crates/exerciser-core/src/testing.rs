//! In-memory pool and connector for exercising workers without a database.

use crate::config::PoolLimits;
use crate::error::{ExerciserError, QueryError};
use crate::pool::{PoolConnector, PoolHandle};
use async_trait::async_trait;
use exerciser_metrics::PoolSnapshot;
use mysql_seed_types::{SeedRow, SeedValue};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Scripted outcome of one `fetch_one` call.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeResponse {
    Row(SeedRow),
    NoRows,
    Error(String),
}

impl FakeResponse {
    pub fn row(values: Vec<SeedValue>) -> Self {
        FakeResponse::Row(SeedRow::new(values))
    }

    pub fn error(message: impl Into<String>) -> Self {
        FakeResponse::Error(message.into())
    }
}

/// A statement executed through `fetch_one`.
#[derive(Debug, Clone, PartialEq)]
pub struct FakeCall {
    pub sql: String,
    pub params: Vec<SeedValue>,
}

#[derive(Debug, Default)]
struct FakeState {
    seed_rows: Vec<SeedRow>,
    seed_failure: Option<String>,
    seed_calls: Vec<String>,
    responses: VecDeque<FakeResponse>,
    calls: Vec<FakeCall>,
    pings: Vec<String>,
    ping_failures: usize,
    ping_delay: Option<Duration>,
    stats: PoolSnapshot,
    closed: bool,
}

/// `PoolHandle` backed by scripted responses.
///
/// `fetch_one` pops queued responses; once the queue is empty it echoes the
/// bound parameters back as the result row.
#[derive(Debug, Default)]
pub struct FakePool {
    state: Mutex<FakeState>,
}

impl FakePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed_rows(self, rows: Vec<SeedRow>) -> Self {
        self.lock().seed_rows = rows;
        self
    }

    /// Seed rows with one integer column each.
    pub fn with_int_seeds(self, ids: impl IntoIterator<Item = i64>) -> Self {
        let rows = ids
            .into_iter()
            .map(|id| SeedRow::from(vec![SeedValue::Int(id)]))
            .collect();
        self.with_seed_rows(rows)
    }

    pub fn with_seed_failure(self, message: impl Into<String>) -> Self {
        self.lock().seed_failure = Some(message.into());
        self
    }

    /// Fail the first `count` pings.
    pub fn with_ping_failures(self, count: usize) -> Self {
        self.lock().ping_failures = count;
        self
    }

    /// Hold every ping for `delay` after it is recorded.
    pub fn with_ping_delay(self, delay: Duration) -> Self {
        self.lock().ping_delay = Some(delay);
        self
    }

    pub fn with_stats(self, stats: PoolSnapshot) -> Self {
        self.set_stats(stats);
        self
    }

    pub fn set_stats(&self, stats: PoolSnapshot) {
        self.lock().stats = stats;
    }

    pub fn push_response(&self, response: FakeResponse) {
        self.lock().responses.push_back(response);
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.lock().calls.clone()
    }

    /// Bound parameters of each executed statement, in order.
    pub fn bound_params(&self) -> Vec<Vec<SeedValue>> {
        self.lock().calls.iter().map(|c| c.params.clone()).collect()
    }

    pub fn seed_calls(&self) -> Vec<String> {
        self.lock().seed_calls.clone()
    }

    pub fn pings(&self) -> Vec<String> {
        self.lock().pings.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn protocol_error(message: &str) -> QueryError {
    QueryError::Execution(sqlx::Error::Protocol(message.to_string()))
}

#[async_trait]
impl PoolHandle for FakePool {
    async fn fetch_all(&self, sql: &str) -> Result<Vec<SeedRow>, QueryError> {
        let mut state = self.lock();
        state.seed_calls.push(sql.to_string());
        if state.closed {
            return Err(QueryError::Execution(sqlx::Error::PoolClosed));
        }
        match &state.seed_failure {
            Some(message) => Err(protocol_error(message)),
            None => Ok(state.seed_rows.clone()),
        }
    }

    async fn fetch_one(
        &self,
        sql: &str,
        params: &[SeedValue],
    ) -> Result<Option<SeedRow>, QueryError> {
        let mut state = self.lock();
        state.calls.push(FakeCall {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        if state.closed {
            return Err(QueryError::Execution(sqlx::Error::PoolClosed));
        }
        match state.responses.pop_front() {
            Some(FakeResponse::Row(row)) => Ok(Some(row)),
            Some(FakeResponse::NoRows) => Ok(None),
            Some(FakeResponse::Error(message)) => Err(protocol_error(&message)),
            None => Ok(Some(SeedRow::new(params.to_vec()))),
        }
    }

    async fn ping(&self, sql: &str) -> Result<(), QueryError> {
        let delay = {
            let mut state = self.lock();
            state.pings.push(sql.to_string());
            state.ping_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if state.closed {
            return Err(QueryError::Execution(sqlx::Error::PoolClosed));
        }
        if state.ping_failures > 0 {
            state.ping_failures -= 1;
            return Err(protocol_error("warm-up connection refused"));
        }
        Ok(())
    }

    fn stats(&self) -> PoolSnapshot {
        self.lock().stats
    }

    async fn close(&self) {
        self.lock().closed = true;
    }
}

type PoolFactory = Box<dyn Fn(&str) -> FakePool + Send + Sync>;

/// `PoolConnector` handing out `FakePool`s and remembering them by pool id.
pub struct FakeConnector {
    factory: PoolFactory,
    fail_on: Option<String>,
    pools: Mutex<Vec<(String, Arc<FakePool>)>>,
    limits: Mutex<Vec<PoolLimits>>,
}

impl Default for FakeConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::with_factory(|_| FakePool::new())
    }

    /// Build each pool with `factory`, which receives the pool id.
    pub fn with_factory(factory: impl Fn(&str) -> FakePool + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            fail_on: None,
            pools: Mutex::new(Vec::new()),
            limits: Mutex::new(Vec::new()),
        }
    }

    /// Refuse to connect the pool with this id.
    pub fn failing_on(mut self, pool_id: impl Into<String>) -> Self {
        self.fail_on = Some(pool_id.into());
        self
    }

    /// Pools connected so far, in connection order.
    pub fn pools(&self) -> Vec<(String, Arc<FakePool>)> {
        self.pools
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn pool(&self, pool_id: &str) -> Option<Arc<FakePool>> {
        self.pools()
            .into_iter()
            .find(|(id, _)| id == pool_id)
            .map(|(_, pool)| pool)
    }

    /// Limits passed to each successful connect.
    pub fn limits(&self) -> Vec<PoolLimits> {
        self.limits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for FakeConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeConnector")
            .field("fail_on", &self.fail_on)
            .field("pools", &self.pools())
            .finish()
    }
}

#[async_trait]
impl PoolConnector for FakeConnector {
    type Pool = FakePool;

    async fn connect(
        &self,
        pool_id: &str,
        _dsn: &str,
        limits: &PoolLimits,
    ) -> Result<Arc<FakePool>, ExerciserError> {
        if self.fail_on.as_deref() == Some(pool_id) {
            return Err(ExerciserError::Connection {
                pool: pool_id.to_string(),
                source: sqlx::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )),
            });
        }

        let pool = Arc::new((self.factory)(pool_id));
        self.pools
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((pool_id.to_string(), Arc::clone(&pool)));
        self.limits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(limits.clone());
        Ok(pool)
    }
}

//! Metric families and the registry that owns them.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;
use std::fmt;
use std::time::Duration;

/// Smallest latency bucket upper bound, in seconds (0.5 ms).
const LATENCY_BUCKET_START: f64 = 0.0005;
/// Number of latency buckets; each doubles the previous bound (last is ~4.1 s).
const LATENCY_BUCKET_COUNT: u16 = 14;

/// Histogram bucket upper bounds for query latency, in seconds.
pub fn latency_buckets() -> Vec<f64> {
    exponential_buckets(LATENCY_BUCKET_START, 2.0, LATENCY_BUCKET_COUNT).collect()
}

fn latency_histogram() -> Histogram {
    Histogram::new(latency_buckets().into_iter())
}

/// Labels for per-worker query series.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct QueryLabels {
    pub worker_id: String,
    pub query: String,
}

impl QueryLabels {
    pub fn new(worker_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            query: query.into(),
        }
    }
}

/// Labels for connection-pool gauges.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct PoolLabels {
    pub pool: String,
}

/// Labels for warm-up outcomes.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct WarmupLabels {
    pub pool: String,
    pub outcome: String,
}

/// Result of a single warm-up query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmupOutcome {
    Ok,
    Error,
}

impl WarmupOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarmupOutcome::Ok => "ok",
            WarmupOutcome::Error => "error",
        }
    }
}

impl fmt::Display for WarmupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time connection counts of one pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub open: i64,
    pub idle: i64,
    pub in_use: i64,
}

/// Process-wide metrics state.
///
/// All families are internally synchronized, so recording needs only `&self`.
#[derive(Debug)]
pub struct ExerciserMetrics {
    registry: Registry,
    query_errors: Family<QueryLabels, Counter>,
    query_duration: Family<QueryLabels, Histogram, fn() -> Histogram>,
    open_connections: Family<PoolLabels, Gauge>,
    idle_connections: Family<PoolLabels, Gauge>,
    in_use_connections: Family<PoolLabels, Gauge>,
    warmup: Family<WarmupLabels, Counter>,
}

impl Default for ExerciserMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ExerciserMetrics {
    /// Create the metric families and register them.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let query_errors = Family::<QueryLabels, Counter>::default();
        registry.register(
            "db_query_errors",
            "Total number of SQL query errors",
            query_errors.clone(),
        );

        let query_duration =
            Family::<QueryLabels, Histogram, fn() -> Histogram>::new_with_constructor(
                latency_histogram,
            );
        registry.register(
            "db_query_duration_seconds",
            "Histogram of SQL query execution times",
            query_duration.clone(),
        );

        let open_connections = Family::<PoolLabels, Gauge>::default();
        registry.register(
            "db_open_connections",
            "Number of open connections in the DB connection pool",
            open_connections.clone(),
        );

        let idle_connections = Family::<PoolLabels, Gauge>::default();
        registry.register(
            "db_idle_connections",
            "Number of idle connections in the DB connection pool",
            idle_connections.clone(),
        );

        let in_use_connections = Family::<PoolLabels, Gauge>::default();
        registry.register(
            "db_in_use_connections",
            "Number of in-use connections in the DB connection pool",
            in_use_connections.clone(),
        );

        let warmup = Family::<WarmupLabels, Counter>::default();
        registry.register(
            "db_pool_warmup",
            "Warm-up queries issued against the DB connection pool, by outcome",
            warmup.clone(),
        );

        Self {
            registry,
            query_errors,
            query_duration,
            open_connections,
            idle_connections,
            in_use_connections,
            warmup,
        }
    }

    pub fn record_query_error(&self, worker_id: &str, query: &str) {
        self.query_errors
            .get_or_create(&QueryLabels::new(worker_id, query))
            .inc();
    }

    pub fn observe_query_duration(&self, worker_id: &str, query: &str, elapsed: Duration) {
        self.query_duration
            .get_or_create(&QueryLabels::new(worker_id, query))
            .observe(elapsed.as_secs_f64());
    }

    pub fn set_pool_snapshot(&self, pool: &str, snapshot: PoolSnapshot) {
        let labels = PoolLabels {
            pool: pool.to_string(),
        };
        self.open_connections
            .get_or_create(&labels)
            .set(snapshot.open);
        self.idle_connections
            .get_or_create(&labels)
            .set(snapshot.idle);
        self.in_use_connections
            .get_or_create(&labels)
            .set(snapshot.in_use);
    }

    pub fn record_warmup(&self, pool: &str, outcome: WarmupOutcome) {
        self.warmup
            .get_or_create(&WarmupLabels {
                pool: pool.to_string(),
                outcome: outcome.as_str().to_string(),
            })
            .inc();
    }

    /// Current error count for a worker/query pair.
    pub fn query_errors(&self, worker_id: &str, query: &str) -> u64 {
        self.query_errors
            .get_or_create(&QueryLabels::new(worker_id, query))
            .get()
    }

    /// Current gauge values published for `pool`.
    pub fn pool_snapshot(&self, pool: &str) -> PoolSnapshot {
        let labels = PoolLabels {
            pool: pool.to_string(),
        };
        PoolSnapshot {
            open: self.open_connections.get_or_create(&labels).get(),
            idle: self.idle_connections.get_or_create(&labels).get(),
            in_use: self.in_use_connections.get_or_create(&labels).get(),
        }
    }

    pub fn warmups(&self, pool: &str, outcome: WarmupOutcome) -> u64 {
        self.warmup
            .get_or_create(&WarmupLabels {
                pool: pool.to_string(),
                outcome: outcome.as_str().to_string(),
            })
            .get()
    }

    /// Render the registry in the OpenMetrics text format.
    pub fn encode(&self) -> Result<String, fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_errors_metric() {
        let metrics = ExerciserMetrics::new();
        metrics.record_query_error("1", "test_query");

        assert_eq!(metrics.query_errors("1", "test_query"), 1);
        assert_eq!(metrics.query_errors("2", "test_query"), 0);
    }

    #[test]
    fn test_query_duration_metric() {
        let metrics = ExerciserMetrics::new();
        metrics.observe_query_duration("2", "test_duration_query", Duration::from_millis(2500));

        let text = metrics.encode().unwrap();
        assert!(text.contains(
            r#"db_query_duration_seconds_count{worker_id="2",query="test_duration_query"} 1"#
        ));
    }

    #[test]
    fn test_latency_buckets_cover_sub_millisecond_to_seconds() {
        let buckets = latency_buckets();
        assert_eq!(buckets.len(), LATENCY_BUCKET_COUNT as usize);
        assert!(buckets[0] < 0.001);
        assert!(*buckets.last().unwrap() > 4.0);
        assert!(buckets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_pool_snapshot_round_trip() {
        let metrics = ExerciserMetrics::new();
        let snapshot = PoolSnapshot {
            open: 10,
            idle: 4,
            in_use: 6,
        };
        metrics.set_pool_snapshot("shared", snapshot);

        assert_eq!(metrics.pool_snapshot("shared"), snapshot);
        assert_eq!(metrics.pool_snapshot("other"), PoolSnapshot::default());
    }

    #[test]
    fn test_encode_contains_all_families() {
        let metrics = ExerciserMetrics::new();
        metrics.record_query_error("0", "SELECT 1");
        metrics.set_pool_snapshot("0", PoolSnapshot::default());
        metrics.record_warmup("0", WarmupOutcome::Ok);

        let text = metrics.encode().unwrap();
        assert!(text.contains(r#"db_query_errors_total{worker_id="0",query="SELECT 1"} 1"#));
        assert!(text.contains(r#"db_open_connections{pool="0"} 0"#));
        assert!(text.contains(r#"db_idle_connections{pool="0"} 0"#));
        assert!(text.contains(r#"db_in_use_connections{pool="0"} 0"#));
        assert!(text.contains(r#"db_pool_warmup_total{pool="0",outcome="ok"} 1"#));
    }
}

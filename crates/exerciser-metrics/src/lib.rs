//! Metrics for pool-exerciser.
//!
//! The registry is an explicitly constructed object shared through an `Arc`
//! with every component that records into it; there are no process globals.
//!
//! ## Exposed series
//!
//! | Name | Type | Labels |
//! |------|------|--------|
//! | `db_query_errors_total` | counter | `worker_id`, `query` |
//! | `db_query_duration_seconds` | histogram | `worker_id`, `query` |
//! | `db_open_connections` | gauge | `pool` |
//! | `db_idle_connections` | gauge | `pool` |
//! | `db_in_use_connections` | gauge | `pool` |
//! | `db_pool_warmup_total` | counter | `pool`, `outcome` |
//!
//! The text exposition is served by [`serve_metrics`] on `GET /metrics`.

pub mod registry;
pub mod server;

pub use registry::{
    latency_buckets, ExerciserMetrics, PoolLabels, PoolSnapshot, QueryLabels, WarmupLabels,
    WarmupOutcome,
};
pub use server::{serve_metrics, METRICS_PATH};

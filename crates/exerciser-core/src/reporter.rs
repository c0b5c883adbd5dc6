//! Periodic pool statistics sampling.

use crate::pool::PoolHandle;
use exerciser_metrics::{ExerciserMetrics, PoolSnapshot};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Publishes open/idle/in-use gauges for one pool.
pub struct PoolReporter<P: PoolHandle> {
    pool_id: String,
    pool: Arc<P>,
    metrics: Arc<ExerciserMetrics>,
    interval: Duration,
}

impl<P: PoolHandle> PoolReporter<P> {
    pub fn new(
        pool_id: impl Into<String>,
        pool: Arc<P>,
        metrics: Arc<ExerciserMetrics>,
        interval: Duration,
    ) -> Self {
        Self {
            pool_id: pool_id.into(),
            pool,
            metrics,
            interval,
        }
    }

    /// Take one snapshot and publish it.
    pub fn sample(&self) -> PoolSnapshot {
        let snapshot = self.pool.stats();
        self.metrics.set_pool_snapshot(&self.pool_id, snapshot);
        debug!(
            "[Pool {}] open={} idle={} in_use={}",
            self.pool_id, snapshot.open, snapshot.idle, snapshot.in_use
        );
        snapshot
    }

    /// Sample immediately, then once per interval. Never returns.
    pub async fn run(self) -> Infallible {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.sample();
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            match self.run().await {}
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePool;

    fn snapshot(open: i64, idle: i64) -> PoolSnapshot {
        PoolSnapshot {
            open,
            idle,
            in_use: open - idle,
        }
    }

    #[test]
    fn test_sampling_without_traffic_is_stable() {
        let pool = Arc::new(FakePool::new().with_stats(snapshot(4, 3)));
        let metrics = Arc::new(ExerciserMetrics::new());
        let reporter = PoolReporter::new("shared", pool, Arc::clone(&metrics), Duration::from_secs(15));

        let first = reporter.sample();
        let second = reporter.sample();

        assert_eq!(first, second);
        assert_eq!(metrics.pool_snapshot("shared"), snapshot(4, 3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_on_interval() {
        let pool = Arc::new(FakePool::new().with_stats(snapshot(2, 2)));
        let metrics = Arc::new(ExerciserMetrics::new());

        let handle = PoolReporter::new(
            "1",
            Arc::clone(&pool),
            Arc::clone(&metrics),
            Duration::from_secs(15),
        )
        .spawn();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(metrics.pool_snapshot("1"), snapshot(2, 2));

        pool.set_stats(snapshot(5, 1));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(metrics.pool_snapshot("1"), snapshot(2, 2));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(metrics.pool_snapshot("1"), snapshot(5, 1));

        handle.abort();
    }
}

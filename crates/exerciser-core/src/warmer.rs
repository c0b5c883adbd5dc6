//! Pool warm-up: open idle connections ahead of the first worker ticks.

use crate::pool::PoolHandle;
use exerciser_metrics::{ExerciserMetrics, WarmupOutcome};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Issue `count` concurrent executions of `test_query` on `pool`.
///
/// Each runs on its own task and records its outcome in the warm-up counter.
/// Nothing waits on the returned handles during a normal run.
pub fn warm_pool<P: PoolHandle>(
    pool_id: &str,
    pool: Arc<P>,
    count: u32,
    test_query: &str,
    metrics: Arc<ExerciserMetrics>,
) -> Vec<JoinHandle<()>> {
    if count == 0 {
        return Vec::new();
    }
    info!("[Pool {}] Warming up {} idle connections", pool_id, count);

    (0..count)
        .map(|n| {
            let pool = Arc::clone(&pool);
            let metrics = Arc::clone(&metrics);
            let pool_id = pool_id.to_string();
            let test_query = test_query.to_string();
            tokio::spawn(async move {
                match pool.ping(&test_query).await {
                    Ok(()) => {
                        debug!("[Pool {}] Warm-up connection {} ready", pool_id, n);
                        metrics.record_warmup(&pool_id, WarmupOutcome::Ok);
                    }
                    Err(e) => {
                        warn!("[Pool {}] Error warming connection {}: {}", pool_id, n, e);
                        metrics.record_warmup(&pool_id, WarmupOutcome::Error);
                    }
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePool;

    #[tokio::test]
    async fn test_spawns_one_task_per_connection() {
        let pool = Arc::new(FakePool::new().with_ping_failures(2));
        let metrics = Arc::new(ExerciserMetrics::new());

        let handles = warm_pool("shared", Arc::clone(&pool), 5, "SELECT 1", Arc::clone(&metrics));
        assert_eq!(handles.len(), 5);
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(pool.pings(), vec!["SELECT 1"; 5]);
        assert_eq!(metrics.warmups("shared", WarmupOutcome::Ok), 3);
        assert_eq!(metrics.warmups("shared", WarmupOutcome::Error), 2);
    }

    #[tokio::test]
    async fn test_zero_count_spawns_nothing() {
        let pool = Arc::new(FakePool::new());
        let metrics = Arc::new(ExerciserMetrics::new());

        let handles = warm_pool("0", Arc::clone(&pool), 0, "SELECT 1", metrics);
        assert!(handles.is_empty());
        assert!(pool.pings().is_empty());
    }
}

//! Seed resolution: fetch candidate parameter rows once per worker.

use crate::error::QueryError;
use crate::pool::PoolHandle;
use mysql_seed_types::SeedRow;
use tracing::debug;

/// Run `seed_query` without parameters and return every row in result order.
///
/// An empty result is returned as an empty vector; deciding whether that is
/// fatal belongs to the caller.
pub async fn resolve_seed_rows<P: PoolHandle + ?Sized>(
    pool: &P,
    seed_query: &str,
) -> Result<Vec<SeedRow>, QueryError> {
    let rows = pool.fetch_all(seed_query).await?;
    debug!("Seed query returned {} rows: {}", rows.len(), seed_query);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePool;
    use mysql_seed_types::SeedValue;

    #[tokio::test]
    async fn test_returns_rows_in_order() {
        let pool = FakePool::new().with_seed_rows(vec![
            SeedRow::from(vec![SeedValue::Int(1), SeedValue::Text("foobar".into())]),
            SeedRow::from(vec![SeedValue::Int(2), SeedValue::Null]),
        ]);

        let rows = resolve_seed_rows(&pool, "SELECT id, name FROM users")
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].to_string(), "[1, foobar]");
        assert_eq!(rows[1].to_string(), "[2, NULL]");
        assert_eq!(pool.seed_calls(), vec!["SELECT id, name FROM users"]);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let pool = FakePool::new();
        let rows = resolve_seed_rows(&pool, "SELECT id FROM empty").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_failure_propagates() {
        let pool = FakePool::new().with_seed_failure("table users doesn't exist");
        let err = resolve_seed_rows(&pool, "SELECT id FROM users")
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Execution(_)));
        assert!(err.to_string().contains("doesn't exist"));
    }
}

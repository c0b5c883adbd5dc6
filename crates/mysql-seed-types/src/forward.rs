//! Forward conversion: `SeedValue` → bound query parameters

use crate::value::SeedValue;
use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::Query;

/// Bind `values` positionally onto `query`, one `?` per value.
pub fn bind_values<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    values: &[SeedValue],
) -> Query<'q, MySql, MySqlArguments> {
    values.iter().fold(query, |query, value| match value {
        SeedValue::Null => query.bind(None::<String>),
        SeedValue::Int(v) => query.bind(*v),
        SeedValue::UInt(v) => query.bind(*v),
        SeedValue::Float(v) => query.bind(*v),
        SeedValue::Bool(v) => query.bind(*v),
        SeedValue::Text(v) => query.bind(v.clone()),
        SeedValue::Binary(v) => query.bind(v.clone()),
    })
}

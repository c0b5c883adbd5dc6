//! Error types for the exerciser core.

use mysql_seed_types::DecodeError;
use thiserror::Error;

/// Failure of a single statement execution.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The statement ran but produced no row. Not a failure; never counted.
    #[error("query returned no rows")]
    NoRows,

    /// Placeholder count does not match the number of bind values.
    #[error("malformed query template: {expected} placeholders, {actual} bind values")]
    MalformedTemplate { expected: usize, actual: usize },

    /// The driver or pool rejected the statement.
    #[error("error executing query: {0}")]
    Execution(#[from] sqlx::Error),

    /// A result row could not be decoded.
    #[error("error decoding query result: {0}")]
    Decode(#[from] DecodeError),
}

impl QueryError {
    pub fn is_no_rows(&self) -> bool {
        matches!(self, QueryError::NoRows)
    }
}

/// Reasons a worker cannot obtain its seed set.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("error executing seed query: {0}")]
    Query(#[source] QueryError),

    #[error("seed query returned no rows")]
    Empty,

    #[error("no static queries configured")]
    NoStaticQueries,
}

/// Errors that stop the exerciser from starting.
#[derive(Error, Debug)]
pub enum ExerciserError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to connect pool '{pool}': {source}")]
    Connection {
        pool: String,
        #[source]
        source: sqlx::Error,
    },
}

impl ExerciserError {
    pub fn config(message: impl Into<String>) -> Self {
        ExerciserError::Config(message.into())
    }
}

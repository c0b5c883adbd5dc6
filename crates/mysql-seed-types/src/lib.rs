//! Seed value types for pool-exerciser.
//!
//! Rows returned by a seed query are held by a worker for its entire lifetime
//! and replayed as positional parameters of the query template. This crate
//! owns that representation.
//!
//! # Structure
//!
//! - `value`: `SeedValue` / `SeedRow`, the sum type over the SQL scalar kinds
//!   a seed query can produce
//! - `reverse`: MySQL rows (`sqlx::mysql::MySqlRow`) → `SeedRow`
//! - `forward`: `SeedValue` → bound parameters of a `sqlx` query
//!
//! # Example
//!
//! ```rust,ignore
//! use mysql_seed_types::{bind_values, row_to_seed_row, SeedValue};
//!
//! let row = sqlx::query("SELECT id FROM users LIMIT 1").fetch_one(&pool).await?;
//! let seed = row_to_seed_row(&row)?;
//!
//! let query = bind_values(sqlx::query("SELECT * FROM users WHERE id = ?"), seed.values());
//! let found = query.fetch_optional(&pool).await?;
//! ```

pub mod forward;
pub mod reverse;
pub mod value;

pub use forward::bind_values;
pub use reverse::{row_to_seed_row, ColumnKind, DecodeError};
pub use value::{SeedRow, SeedValue, NULL_SENTINEL};

//! Worker and scheduling core of pool-exerciser.
//!
//! pool-exerciser keeps a MySQL connection pool under steady, parameterized
//! point-lookup traffic so that pool sizing, idle timeout and connection
//! lifetime can be observed from the outside.
//!
//! ## Architecture
//!
//! ```text
//!                     ┌──────────────────────────┐
//!                     │       Orchestrator        │
//!                     │ config → pools → tasks    │
//!                     └────────────┬─────────────┘
//!                                  │ Arc<PoolHandle>
//!          ┌───────────────┬───────┴───────┬────────────────┐
//!          ▼               ▼               ▼                ▼
//!   ┌────────────┐  ┌────────────┐  ┌────────────┐  ┌──────────────┐
//!   │ Worker 0   │  │ Worker N-1 │  │ PoolWarmer │  │ PoolReporter │
//!   │ seed once  │  │ seed once  │  │ N × SELECT1│  │ open/idle/   │
//!   │ loop{tick →│  │ loop{tick →│  │ fire&forget│  │ in-use gauges│
//!   │  execute}  │  │  execute}  │  └────────────┘  └──────────────┘
//!   └────────────┘  └────────────┘
//! ```
//!
//! Every component records into a shared [`exerciser_metrics::ExerciserMetrics`].

pub mod config;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod pacer;
pub mod pool;
pub mod reporter;
pub mod seed;
pub mod testing;
pub mod warmer;
pub mod worker;

pub use config::{ExerciserConfig, PoolLimits, PoolMode, Traversal, Workload};
pub use error::{ExerciserError, QueryError, SeedError};
pub use executor::{count_placeholders, execute_query};
pub use orchestrator::{Orchestrator, RunReport, SHARED_POOL_ID};
pub use pacer::Pacer;
pub use pool::{MySqlConnector, MySqlPoolHandle, PoolConnector, PoolHandle};
pub use reporter::PoolReporter;
pub use seed::resolve_seed_rows;
pub use warmer::warm_pool;
pub use worker::{Cursor, RunningWorker, Statements, Worker};

pub use exerciser_metrics::{ExerciserMetrics, PoolSnapshot};
pub use mysql_seed_types::{SeedRow, SeedValue};

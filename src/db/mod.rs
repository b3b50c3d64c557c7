//! Database layer
//!
//! SQLite is the default backend (a single file next to the binary); MySQL
//! is available for larger deployments. Both sit behind the `DatabasePool`
//! trait and the driver is picked from configuration.
//!
//! # Usage
//!
//! ```ignore
//! use jeevika::config::DatabaseConfig;
//! use jeevika::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};

//! Database layer
//!
//! Persistence for the snipbin service:
//! - SQLite (default, single-binary deployment)
//! - MySQL (larger deployments)
//!
//! The backend is selected from configuration behind the `DatabasePool`
//! trait; repositories in `repositories/` implement the storage ports the
//! services consume.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};

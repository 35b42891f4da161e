//! Connection management, schema inspection and query execution for the
//! databases askdb talks to.
//!
//! # Architecture
//!
//! - **`manager`** — [`ConnectionManager`] lazily opens and caches one
//!   connection per (dialect, database, host).
//! - **`driver`** — the [`Database`] trait every dialect implements, and
//!   [`open`] which selects the implementation for a [`DbConfig`].
//! - **`sqlite`**, **`postgres`**, **`mysql`** — per-dialect catalog queries
//!   and statement execution.
//!
//! # Quick start
//!
//! ```
//! use askdb_core::DbConfig;
//! use askdb_db::ConnectionManager;
//!
//! let manager = ConnectionManager::default();
//! let config = DbConfig::sqlite(":memory:");
//!
//! manager.execute(&config, "CREATE TABLE student (id INTEGER, name TEXT)").unwrap();
//! manager.execute(&config, "INSERT INTO student VALUES (1, 'Ada')").unwrap();
//!
//! let schema = manager.schema(&config).unwrap();
//! assert_eq!(schema.to_text(), "\n  Table: student\n    - id (INTEGER)\n    - name (TEXT)");
//!
//! let result = manager.execute(&config, "SELECT name FROM student").unwrap();
//! assert_eq!(result.records()[0]["name"], "Ada");
//! ```
//!
//! [`DbConfig`]: askdb_core::DbConfig

mod driver;
mod error;
mod manager;
mod mysql;
mod postgres;
mod sqlite;

pub use crate::driver::{ConnectOptions, DEFAULT_CONNECT_TIMEOUT, Database, open};
pub use crate::error::{DbError, Result};
pub use crate::manager::{ConnectionManager, SharedDatabase};
pub use crate::mysql::MysqlDatabase;
pub use crate::postgres::PostgresDatabase;
pub use crate::sqlite::SqliteDatabase;

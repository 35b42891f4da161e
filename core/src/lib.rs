//! Core types shared by the askdb crates.
//!
//! - [`Dialect`] — the supported database engines.
//! - [`DbConfig`] — caller-supplied connection settings, and the
//!   [`ConnectionKey`] that identifies a cached connection.
//! - [`DatabaseSchema`] / [`TableSchema`] / [`ColumnSchema`] — catalog
//!   information normalized across dialects, rendered into the schema text
//!   block used in generation prompts.
//! - [`QueryResult`] / [`Value`] — tabular results of executed statements.
//!
//! # Example
//!
//! ```
//! use askdb_core::*;
//!
//! let config = DbConfig::sqlite("school.db");
//! assert!(config.validate().is_ok());
//! assert_eq!(config.key().dialect, Dialect::Sqlite);
//!
//! let schema = DatabaseSchema::new(
//!     Dialect::Sqlite,
//!     vec![TableSchema::new("student").with_column(ColumnSchema::new("name", "TEXT"))],
//! );
//! assert!(schema.to_text().contains("Table: student"));
//! ```

mod config;
mod dialect;
mod error;
mod schema;
mod value;

pub use config::{ConnectionKey, DEFAULT_HOST, DbConfig};
pub use dialect::Dialect;
pub use error::{CoreError, Result};
pub use schema::{ColumnSchema, DatabaseSchema, TableSchema};
pub use value::{ColumnKind, QueryResult, Value};

//! Error types for connection management, schema inspection and execution.
//!
//! Driver errors are kept per dialect so callers can report the engine's own
//! message. Connection failures are reported separately from statement
//! failures because the HTTP surface maps them to different statuses.

use askdb_core::{CoreError, Dialect};
use thiserror::Error;

/// Errors that can occur while talking to a user database.
#[derive(Debug, Error)]
pub enum DbError {
    /// The connection settings are incomplete or malformed.
    #[error("invalid connection settings: {0}")]
    Config(#[from] CoreError),

    /// A connection to the database could not be established.
    #[error("could not connect to {dialect} database: {message}")]
    Connection { dialect: Dialect, message: String },

    /// SQLite statement failure.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL statement failure.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] postgres::Error),

    /// MySQL statement failure.
    #[error("MySQL error: {0}")]
    Mysql(#[from] mysql::Error),

    /// A catalog query returned rows in an unexpected shape.
    #[error("unexpected catalog data: {0}")]
    Catalog(String),
}

impl DbError {
    pub(crate) fn connection(dialect: Dialect, err: impl std::fmt::Display) -> Self {
        DbError::Connection {
            dialect,
            message: err.to_string(),
        }
    }

    /// Returns `true` if the error happened while establishing a connection.
    pub fn is_connection(&self) -> bool {
        matches!(self, DbError::Connection { .. })
    }

    /// Returns `true` if the error came from invalid connection settings.
    pub fn is_config(&self) -> bool {
        matches!(self, DbError::Config(_))
    }
}

/// Convenience alias for results with [`DbError`].
pub type Result<T> = std::result::Result<T, DbError>;

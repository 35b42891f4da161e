//! The per-dialect driver seam.
//!
//! Every supported engine implements [`Database`]: a live connection that can
//! be pinged, inspected for its user tables, and asked to run arbitrary SQL.
//! [`open`] picks the implementation for a [`DbConfig`].

use std::time::Duration;

use askdb_core::{DbConfig, Dialect, QueryResult, TableSchema};

use crate::error::{DbError, Result};
use crate::mysql::MysqlDatabase;
use crate::postgres::PostgresDatabase;
use crate::sqlite::SqliteDatabase;

/// Default timeout for establishing TCP connections.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Options applied when opening new connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Upper bound on establishing a connection to a networked dialect.
    pub connect_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// A live connection to one user database.
pub trait Database: Send {
    /// The engine behind this connection.
    fn dialect(&self) -> Dialect;

    /// Runs a trivial statement to check the connection is usable.
    fn ping(&mut self) -> Result<()> {
        self.execute("SELECT 1").map(|_| ())
    }

    /// Reads the user tables and their columns from the catalog.
    fn inspect(&mut self) -> Result<Vec<TableSchema>>;

    /// Runs one SQL statement and collects its result set.
    fn execute(&mut self, sql: &str) -> Result<QueryResult>;
}

/// Opens a new connection for the given settings.
///
/// Driver failures while connecting are reported as
/// [`DbError::Connection`].
///
/// # Errors
///
/// Returns [`DbError::Config`] if the settings fail validation.
pub fn open(config: &DbConfig, options: &ConnectOptions) -> Result<Box<dyn Database>> {
    config.validate()?;
    let database: Box<dyn Database> = match config.dialect {
        Dialect::Sqlite => Box::new(
            SqliteDatabase::open(&config.database)
                .map_err(|e| DbError::connection(Dialect::Sqlite, e))?,
        ),
        Dialect::Postgres => Box::new(PostgresDatabase::connect(config, options)?),
        Dialect::Mysql => Box::new(
            MysqlDatabase::connect(config, options)
                .map_err(|e| DbError::connection(Dialect::Mysql, e))?,
        ),
    };
    Ok(database)
}

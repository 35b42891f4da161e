//! Lazily opened, cached connections keyed by target database.
//!
//! [`ConnectionManager`] keeps at most one live connection per
//! [`ConnectionKey`] (dialect, database name, host). The first operation
//! against a target opens the connection; later operations reuse it. Failed
//! attempts are not cached, so the next call tries again.
//!
//! The map lock is never held while a connection is being opened. When two
//! callers race to open the same target, the first to insert wins and the
//! other connection is dropped.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use askdb_core::{ConnectionKey, DatabaseSchema, DbConfig, QueryResult};
use tracing::{debug, info};

use crate::driver::{self, ConnectOptions, Database};
use crate::error::Result;

/// A cached connection shared between callers. Callers serialize on the
/// inner mutex.
pub type SharedDatabase = Arc<Mutex<Box<dyn Database>>>;

type Opener = dyn Fn(&DbConfig, &ConnectOptions) -> Result<Box<dyn Database>> + Send + Sync;

/// Opens and caches one connection per target database.
///
/// # Examples
///
/// ```no_run
/// use askdb_core::DbConfig;
/// use askdb_db::ConnectionManager;
///
/// let manager = ConnectionManager::default();
/// let config = DbConfig::sqlite("school.db");
///
/// let schema = manager.schema(&config).unwrap();
/// println!("{schema}");
///
/// let result = manager.execute(&config, "SELECT name FROM student").unwrap();
/// println!("{} rows", result.row_count());
/// assert!(manager.is_cached(&config.key()));
/// ```
pub struct ConnectionManager {
    options: ConnectOptions,
    connections: Mutex<HashMap<ConnectionKey, SharedDatabase>>,
    opener: Box<Opener>,
}

impl ConnectionManager {
    /// Creates a manager that opens connections with the real drivers.
    pub fn new(options: ConnectOptions) -> Self {
        Self::with_opener(options, driver::open)
    }

    /// Creates a manager with a custom connection factory.
    pub fn with_opener<F>(options: ConnectOptions, opener: F) -> Self
    where
        F: Fn(&DbConfig, &ConnectOptions) -> Result<Box<dyn Database>> + Send + Sync + 'static,
    {
        Self {
            options,
            connections: Mutex::new(HashMap::new()),
            opener: Box::new(opener),
        }
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    /// Returns the cached connection for `config`, opening it if needed.
    ///
    /// # Errors
    ///
    /// - [`DbError::Config`](crate::DbError::Config) if the settings are invalid.
    /// - [`DbError::Connection`](crate::DbError::Connection) if opening fails.
    pub fn connect(&self, config: &DbConfig) -> Result<SharedDatabase> {
        config.validate()?;
        let key = config.key();

        if let Some(existing) = self.lock_connections().get(&key) {
            debug!(key = %key, "reusing cached connection");
            return Ok(Arc::clone(existing));
        }

        let database = (self.opener)(config, &self.options)?;

        let mut connections = self.lock_connections();
        let shared = match connections.entry(key) {
            Entry::Occupied(entry) => {
                debug!(key = %entry.key(), "connection opened concurrently, dropping ours");
                Arc::clone(entry.get())
            }
            Entry::Vacant(entry) => {
                info!(
                    dialect = %config.dialect,
                    database = %config.database,
                    host = ?config.host,
                    "opened database connection"
                );
                Arc::clone(entry.insert(Arc::new(Mutex::new(database))))
            }
        };
        Ok(shared)
    }

    /// Pings the target and returns the round-trip time of the ping.
    pub fn test_connection(&self, config: &DbConfig) -> Result<Duration> {
        self.with_database(config, |db| {
            let started = Instant::now();
            db.ping()?;
            Ok(started.elapsed())
        })
    }

    /// Reads the user tables of the target database.
    pub fn schema(&self, config: &DbConfig) -> Result<DatabaseSchema> {
        self.with_database(config, |db| {
            let tables = db.inspect()?;
            debug!(dialect = %config.dialect, tables = tables.len(), "inspected schema");
            Ok(DatabaseSchema::new(config.dialect, tables))
        })
    }

    /// Runs one SQL statement against the target database.
    pub fn execute(&self, config: &DbConfig, sql: &str) -> Result<QueryResult> {
        self.with_database(config, |db| {
            debug!(dialect = %config.dialect, sql, "executing statement");
            db.execute(sql)
        })
    }

    /// Returns `true` if a connection for `key` is cached.
    pub fn is_cached(&self, key: &ConnectionKey) -> bool {
        self.lock_connections().contains_key(key)
    }

    /// Number of cached connections.
    pub fn len(&self) -> usize {
        self.lock_connections().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_database<T>(
        &self,
        config: &DbConfig,
        f: impl FnOnce(&mut dyn Database) -> Result<T>,
    ) -> Result<T> {
        let shared = self.connect(config)?;
        let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut **guard)
    }

    fn lock_connections(&self) -> MutexGuard<'_, HashMap<ConnectionKey, SharedDatabase>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(ConnectOptions::default())
    }
}

//! Connection settings supplied by API callers.
//!
//! [`DbConfig`] mirrors the `db_data` JSON object accepted by the HTTP
//! surface. Field names on the wire keep their `db_` prefixes.
//!
//! # Example JSON
//!
//! ```json
//! {
//!   "db_type": "PostgreSQL",
//!   "db_host": "db.internal",
//!   "db_port": "5432",
//!   "db_name": "sales",
//!   "db_user": "analyst",
//!   "db_password": "secret"
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::dialect::Dialect;
use crate::error::{CoreError, Result};

/// Host used for networked dialects when `db_host` is omitted.
pub const DEFAULT_HOST: &str = "localhost";

/// Identity of a cached connection.
///
/// Two configurations with the same dialect, database name and host resolve to
/// the same key, even when their credentials or ports differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub dialect: Dialect,
    pub database: String,
    pub host: Option<String>,
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.dialect,
            self.database,
            self.host.as_deref().unwrap_or("None")
        )
    }
}

/// Connection settings for one target database.
///
/// # Examples
///
/// ```
/// use askdb_core::{DbConfig, Dialect};
///
/// let config: DbConfig = serde_json::from_str(
///     r#"{"db_type": "MySQL", "db_name": "shop", "db_port": 3307, "db_user": "root"}"#,
/// ).unwrap();
/// assert_eq!(config.dialect, Dialect::Mysql);
/// assert_eq!(config.port().unwrap(), Some(3307));
/// assert_eq!(config.host_or_default(), "localhost");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Database engine.
    #[serde(rename = "db_type")]
    pub dialect: Dialect,
    /// Server hostname (networked dialects only).
    #[serde(rename = "db_host", default)]
    pub host: Option<String>,
    /// Server port, kept as text because callers send either strings or numbers.
    #[serde(
        rename = "db_port",
        default,
        deserialize_with = "deserialize_port"
    )]
    pub port: Option<String>,
    /// Database name, or file path for SQLite.
    #[serde(rename = "db_name")]
    pub database: String,
    /// Login user.
    #[serde(rename = "db_user", default)]
    pub user: Option<String>,
    /// Login password.
    #[serde(rename = "db_password", default, skip_serializing)]
    pub password: Option<String>,
}

impl DbConfig {
    /// Creates settings for a SQLite database file.
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            dialect: Dialect::Sqlite,
            host: None,
            port: None,
            database: path.into(),
            user: None,
            password: None,
        }
    }

    /// Checks that the settings are complete for the selected dialect.
    ///
    /// # Errors
    ///
    /// - [`CoreError::MissingField`] when `db_name` is blank, or when a
    ///   PostgreSQL target has no `db_user`.
    /// - [`CoreError::InvalidPort`] when `db_port` is not a valid port.
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(CoreError::MissingField("db_name"));
        }
        if self.dialect == Dialect::Postgres && non_blank(&self.user).is_none() {
            return Err(CoreError::MissingField("db_user"));
        }
        self.port()?;
        Ok(())
    }

    /// Returns the explicit port, or the dialect default when none was given.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPort`] if `db_port` does not parse.
    pub fn port(&self) -> Result<Option<u16>> {
        match non_blank(&self.port) {
            Some(raw) => raw
                .parse::<u16>()
                .map(Some)
                .map_err(|_| CoreError::InvalidPort(raw.to_string())),
            None => Ok(self.dialect.default_port()),
        }
    }

    /// Returns the configured host, falling back to [`DEFAULT_HOST`].
    pub fn host_or_default(&self) -> &str {
        non_blank(&self.host).unwrap_or(DEFAULT_HOST)
    }

    /// Returns the user, treating a blank string as absent.
    pub fn user(&self) -> Option<&str> {
        non_blank(&self.user)
    }

    /// Returns the cache identity of these settings.
    pub fn key(&self) -> ConnectionKey {
        ConnectionKey {
            dialect: self.dialect,
            database: self.database.clone(),
            host: self.host.clone(),
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("dialect", &self.dialect)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortRepr {
        Number(u64),
        Text(String),
    }

    Ok(Option::<PortRepr>::deserialize(deserializer)?.map(|port| match port {
        PortRepr::Number(n) => n.to_string(),
        PortRepr::Text(s) => s,
    }))
}

//! Error types for connection settings and dialect parsing.

use thiserror::Error;

/// Errors raised while interpreting user-supplied connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The `db_type` value does not name a supported dialect.
    #[error("unsupported database type: {0}")]
    UnknownDialect(String),

    /// A field required by the selected dialect is missing or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The `db_port` value is not a valid TCP port.
    #[error("invalid port '{0}': must be an integer between 0 and 65535")]
    InvalidPort(String),
}

/// Convenience alias for results with [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

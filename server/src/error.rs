//! Error types for the HTTP server.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use askdb_db::DbError;
use askdb_generator::GeneratorError;
use serde_json::json;
use thiserror::Error;

/// Errors that can stop the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Filesystem or socket failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid YAML.
    #[error("invalid configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The configured bind address cannot be parsed.
    #[error("invalid bind address '{0}'")]
    InvalidBind(String),

    /// The text model could not be set up.
    #[error("generator setup failed: {0}")]
    Generator(#[from] GeneratorError),
}

/// Convenience alias for results with [`ServerError`].
pub type Result<T> = std::result::Result<T, ServerError>;

/// An error answered to an HTTP client as `{"detail": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, detail)
    }

    /// Maps a database error raised while doing `action`.
    ///
    /// Invalid settings answer 400 and unreachable databases 503. Anything
    /// else answers `status` with the message prefixed by `action`.
    pub fn from_db(err: DbError, status: StatusCode, action: &str) -> Self {
        if err.is_config() {
            Self::bad_request(err.to_string())
        } else if err.is_connection() {
            Self::unavailable(format!("Database connection failed: {err}"))
        } else {
            Self::new(status, format!("{action}: {err}"))
        }
    }

    /// Maps a generation error. Caller mistakes and blank replies answer 400.
    pub fn from_generator(err: GeneratorError) -> Self {
        match err {
            GeneratorError::EmptyQuestion | GeneratorError::EmptyResponse => {
                Self::bad_request(err.to_string())
            }
            other => Self::internal(format!("Query generation failed: {other}")),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

//! Error types for SQL generation.

use thiserror::Error;

/// Errors that can occur while asking a text model for SQL.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The natural-language question is blank.
    #[error("question cannot be empty")]
    EmptyQuestion,

    /// No API key was configured for the model provider.
    #[error("no API key configured for the generative model")]
    MissingApiKey,

    /// The model answered with no usable text.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The provider refused the prompt.
    #[error("prompt was blocked by the model provider: {0}")]
    Blocked(String),

    /// The provider answered with a non-success HTTP status.
    #[error("model API returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("could not reach model API: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("invalid model API response: {0}")]
    InvalidResponse(String),
}

/// Convenience alias for results with [`GeneratorError`].
pub type Result<T> = std::result::Result<T, GeneratorError>;

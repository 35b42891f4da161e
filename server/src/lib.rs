//! # askdb-server
//!
//! HTTP API that answers natural-language questions about SQLite, PostgreSQL
//! and MySQL databases. Callers send connection settings with every request;
//! connections are cached per target by an
//! [`askdb_db::ConnectionManager`].
//!
//! ## Embedding
//!
//! ```no_run
//! use askdb_server::{ServerConfig, build_state, router};
//!
//! # async fn run() -> askdb_server::Result<()> {
//! let config = ServerConfig::default();
//! let app = router(build_state(&config)?);
//! let listener = tokio::net::TcpListener::bind(config.bind_addr()?).await?;
//! askdb_server::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;

use askdb_db::ConnectionManager;
use askdb_generator::{GeminiModel, GeneratorError, QueryGenerator};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

pub use config::{DEFAULT_BIND, ServerConfig};
pub use error::{ApiError, Result, ServerError};
pub use routes::{AppState, RawQueryParams, UserQuery, router};

/// Builds handler state backed by the real drivers and the Gemini API.
///
/// # Errors
///
/// Returns [`ServerError::Generator`] if no API key is configured.
pub fn build_state(config: &ServerConfig) -> Result<AppState> {
    let api_key = config
        .generator
        .resolve_api_key()
        .ok_or(GeneratorError::MissingApiKey)?;
    let model = GeminiModel::new(config.generator.gemini_config(api_key))?;
    let manager = ConnectionManager::new(config.database.connect_options());
    Ok(AppState::new(manager, QueryGenerator::new(Arc::new(model))))
}

/// Serves `app` until Ctrl-C.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
}

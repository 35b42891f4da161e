//! HTTP handlers.
//!
//! Every handler parses its JSON body itself so malformed input answers 422
//! with a `{"detail": ...}` body. Database and model calls are blocking and
//! run on tokio's blocking pool.

use std::sync::Arc;

use askdb_core::{DbConfig, Dialect};
use askdb_db::ConnectionManager;
use askdb_generator::QueryGenerator;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::ApiError;

const API_VERSION: &str = "1.0";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<ConnectionManager>,
    pub generator: QueryGenerator,
}

impl AppState {
    pub fn new(manager: ConnectionManager, generator: QueryGenerator) -> Self {
        Self {
            manager: Arc::new(manager),
            generator,
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root).post(root_post))
        .route("/connect", post(connect))
        .route("/get_schema", post(get_schema))
        .route("/generate_query", post(generate_query))
        .route("/execute_query", post(execute_query))
        .route("/execute_raw_query", post(execute_raw_query))
        .route("/health/:db_type", get(health))
        .with_state(state)
}

/// Body of `/generate_query` and `/execute_query`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserQuery {
    pub question: String,
    #[serde(default)]
    pub sql_query: Option<String>,
    pub db_data: DbConfig,
}

/// Query string of `/execute_raw_query`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawQueryParams {
    pub query: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    message: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ConnectResponse {
    success: bool,
    message: String,
}

#[derive(Debug, Serialize)]
struct SchemaResponse {
    success: bool,
    schema: String,
    tables: Vec<String>,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    success: bool,
    sql_query: String,
    db_type: Dialect,
}

#[derive(Debug, Serialize)]
struct ExecuteResponse {
    success: bool,
    query: String,
    results: Vec<Map<String, Value>>,
    row_count: usize,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    success: bool,
    database_type: Dialect,
    status: &'static str,
    response_time_ms: f64,
    timestamp: String,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::unprocessable(rejection.body_text()))
}

/// Runs blocking work off the async executor.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("Internal error: {e}")))?
}

async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "active",
        message: "API is running",
        version: API_VERSION,
    })
}

async fn root_post() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "active",
        message: "POST method is working",
        version: API_VERSION,
    })
}

async fn connect(
    State(state): State<AppState>,
    body: Result<Json<DbConfig>, JsonRejection>,
) -> ApiResult<ConnectResponse> {
    let config = parse_body(body)?;
    let dialect = config.dialect;

    blocking(move || {
        state
            .manager
            .test_connection(&config)
            .map(|_| ())
            .map_err(|e| {
                ApiError::from_db(e, StatusCode::SERVICE_UNAVAILABLE, "Database connection failed")
            })
    })
    .await?;

    Ok(Json(ConnectResponse {
        success: true,
        message: format!("Successfully connected to {dialect} database"),
    }))
}

async fn get_schema(
    State(state): State<AppState>,
    body: Result<Json<DbConfig>, JsonRejection>,
) -> ApiResult<SchemaResponse> {
    let config = parse_body(body)?;

    let schema = blocking(move || {
        state.manager.schema(&config).map_err(|e| {
            ApiError::from_db(e, StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve schema")
        })
    })
    .await?;

    Ok(Json(SchemaResponse {
        success: true,
        schema: schema.to_text(),
        tables: schema.tables.iter().map(|t| t.name.clone()).collect(),
    }))
}

async fn generate_query(
    State(state): State<AppState>,
    body: Result<Json<UserQuery>, JsonRejection>,
) -> ApiResult<GenerateResponse> {
    let request = parse_body(body)?;
    if request.question.trim().is_empty() {
        return Err(ApiError::bad_request("question cannot be empty"));
    }
    let dialect = request.db_data.dialect;

    let sql_query = blocking(move || {
        let schema = state
            .manager
            .schema(&request.db_data)
            .map_err(|e| ApiError::from_db(e, StatusCode::BAD_REQUEST, "Failed to get schema"))?;
        state
            .generator
            .generate_query(&request.question, &schema)
            .map_err(ApiError::from_generator)
    })
    .await?;

    info!(dialect = %dialect, "generated query");
    Ok(Json(GenerateResponse {
        success: true,
        sql_query,
        db_type: dialect,
    }))
}

async fn execute_query(
    State(state): State<AppState>,
    body: Result<Json<UserQuery>, JsonRejection>,
) -> ApiResult<ExecuteResponse> {
    let request = parse_body(body)?;
    let sql = request
        .sql_query
        .as_deref()
        .map(str::trim)
        .filter(|sql| !sql.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("sql_query is required"))?;

    run_query(
        state,
        request.db_data,
        sql,
        Some("Failed to get schema"),
        "Query execution failed",
    )
    .await
}

async fn execute_raw_query(
    State(state): State<AppState>,
    params: Result<Query<RawQueryParams>, QueryRejection>,
    body: Result<Json<DbConfig>, JsonRejection>,
) -> ApiResult<ExecuteResponse> {
    let Query(params) = params.map_err(|rejection| ApiError::unprocessable(rejection.body_text()))?;
    let config = parse_body(body)?;
    if params.query.trim().is_empty() {
        return Err(ApiError::bad_request("query cannot be empty"));
    }

    run_query(state, config, params.query, None, "Raw query execution failed").await
}

/// Executes `sql`, optionally checking the schema can be read first.
async fn run_query(
    state: AppState,
    config: DbConfig,
    sql: String,
    schema_check: Option<&'static str>,
    failure: &'static str,
) -> ApiResult<ExecuteResponse> {
    blocking(move || {
        if let Some(action) = schema_check {
            state
                .manager
                .schema(&config)
                .map_err(|e| ApiError::from_db(e, StatusCode::BAD_REQUEST, action))?;
        }

        let result = state
            .manager
            .execute(&config, &sql)
            .map_err(|e| ApiError::from_db(e, StatusCode::INTERNAL_SERVER_ERROR, failure))?;

        Ok(Json(ExecuteResponse {
            success: true,
            row_count: result.row_count(),
            results: result.records(),
            query: sql,
        }))
    })
    .await
}

async fn health(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<DbConfig>, JsonRejection>,
) -> ApiResult<HealthResponse> {
    let Path(db_type) = path.map_err(|rejection| ApiError::unprocessable(rejection.body_text()))?;
    let dialect: Dialect = db_type
        .parse()
        .map_err(|e: askdb_core::CoreError| ApiError::unprocessable(e.to_string()))?;
    let config = parse_body(body)?;
    if config.dialect != dialect {
        return Err(ApiError::bad_request(format!(
            "db_type in path ({dialect}) does not match db_type in body ({})",
            config.dialect
        )));
    }

    let elapsed = blocking(move || {
        state.manager.test_connection(&config).map_err(|e| {
            warn!(dialect = %dialect, error = %e, "health check failed");
            ApiError::unavailable(format!("Database health check failed: {e}"))
        })
    })
    .await?;

    let millis = elapsed.as_secs_f64() * 1000.0;
    Ok(Json(HealthResponse {
        success: true,
        database_type: dialect,
        status: "healthy",
        response_time_ms: (millis * 100.0).round() / 100.0,
        timestamp: chrono::Local::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_user_query_without_sql() {
        let request: UserQuery = serde_json::from_value(json!({
            "question": "How many students?",
            "db_data": {"db_type": "sqlite", "db_name": "school.db"}
        }))
        .unwrap();
        assert!(request.sql_query.is_none());
        assert_eq!(request.db_data.dialect, Dialect::Sqlite);
    }

    #[test]
    fn test_generate_response_shape() {
        let response = GenerateResponse {
            success: true,
            sql_query: "SELECT 1;".into(),
            db_type: Dialect::Postgres,
        };
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({"success": true, "sql_query": "SELECT 1;", "db_type": "PostgreSQL"})
        );
    }
}

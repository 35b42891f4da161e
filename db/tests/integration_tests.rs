//! Integration tests for the askdb-db crate.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use askdb_core::{DbConfig, Dialect, Value};
use askdb_db::{ConnectOptions, ConnectionManager, DbError};
use rusqlite::Connection;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Creates a SQLite file with a small school database and returns its path.
fn school_db(dir: &TempDir) -> String {
    let path = dir.path().join("school.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        r#"
CREATE TABLE student (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    enrolled DATE
);
CREATE TABLE grade (
    student_id INTEGER REFERENCES student(id),
    course TEXT,
    score REAL
);
INSERT INTO student (id, name, enrolled) VALUES
    (1, 'Ada', '2023-09-01'),
    (2, 'Grace', '2024-01-15');
INSERT INTO grade VALUES (1, 'math', 97.5), (2, 'math', 88.0), (2, 'art', NULL);
"#,
    )
    .unwrap();
    path_string(&path)
}

fn path_string(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

fn fast_options() -> ConnectOptions {
    ConnectOptions {
        connect_timeout: Duration::from_secs(2),
    }
}

/// Settings for a networked dialect pointing at a port nothing listens on.
fn unreachable_config(dialect: Dialect) -> DbConfig {
    let mut config = DbConfig::sqlite("askdb_test");
    config.dialect = dialect;
    config.host = Some("127.0.0.1".into());
    config.port = Some("1".into());
    config.user = Some("askdb".into());
    config.password = Some("secret".into());
    config
}

// ---------------------------------------------------------------------------
// Schema inspection
// ---------------------------------------------------------------------------

#[test]
fn test_sqlite_schema_text_block() {
    let dir = TempDir::new().unwrap();
    let manager = ConnectionManager::default();
    let config = DbConfig::sqlite(school_db(&dir));

    let schema = manager.schema(&config).unwrap();

    assert_eq!(schema.dialect, Dialect::Sqlite);
    assert_eq!(
        schema.to_text(),
        "\n  Table: student\n    - id (INTEGER)\n    - name (TEXT)\n    - enrolled (DATE)\n\
         \n  Table: grade\n    - student_id (INTEGER)\n    - course (TEXT)\n    - score (REAL)"
    );
}

#[test]
fn test_sqlite_schema_of_empty_database() {
    let dir = TempDir::new().unwrap();
    let manager = ConnectionManager::default();
    let config = DbConfig::sqlite(path_string(&dir.path().join("empty.db")));

    let schema = manager.schema(&config).unwrap();
    assert!(schema.is_empty());
    assert_eq!(schema.to_text(), "");
}

#[test]
fn test_sqlite_schema_sees_tables_created_through_manager() {
    let dir = TempDir::new().unwrap();
    let manager = ConnectionManager::default();
    let config = DbConfig::sqlite(school_db(&dir));

    manager
        .execute(&config, "CREATE TABLE teacher (id INTEGER, subject TEXT)")
        .unwrap();

    let schema = manager.schema(&config).unwrap();
    let teacher = schema.table("teacher").unwrap();
    assert_eq!(teacher.columns.len(), 2);
}

// ---------------------------------------------------------------------------
// Query execution
// ---------------------------------------------------------------------------

#[test]
fn test_execute_select_returns_columns_and_rows() {
    let dir = TempDir::new().unwrap();
    let manager = ConnectionManager::default();
    let config = DbConfig::sqlite(school_db(&dir));

    let result = manager
        .execute(
            &config,
            "SELECT s.name, g.score FROM student s JOIN grade g ON g.student_id = s.id \
             WHERE g.course = 'math' ORDER BY g.score DESC",
        )
        .unwrap();

    assert_eq!(result.columns, vec!["name", "score"]);
    assert_eq!(result.row_count(), 2);
    assert_eq!(result.rows[0][0], Value::Text("Ada".into()));
    assert_eq!(result.rows[0][1], Value::Real(97.5));

    let records = serde_json::to_value(result.records()).unwrap();
    assert_eq!(
        records,
        serde_json::json!([
            {"name": "Ada", "score": 97.5},
            {"name": "Grace", "score": 88.0}
        ])
    );
}

#[test]
fn test_execute_preserves_nulls() {
    let dir = TempDir::new().unwrap();
    let manager = ConnectionManager::default();
    let config = DbConfig::sqlite(school_db(&dir));

    let result = manager
        .execute(&config, "SELECT score FROM grade WHERE course = 'art'")
        .unwrap();
    assert_eq!(result.rows, vec![vec![Value::Null]]);
}

#[test]
fn test_execute_write_is_visible_to_later_reads() {
    let dir = TempDir::new().unwrap();
    let manager = ConnectionManager::default();
    let path = school_db(&dir);
    let config = DbConfig::sqlite(path.clone());

    let inserted = manager
        .execute(&config, "INSERT INTO student (id, name) VALUES (3, 'Linus')")
        .unwrap();
    assert_eq!(inserted.rows_affected, Some(1));
    assert!(inserted.columns.is_empty());

    // A separate connection sees the row, so the write was committed.
    let conn = Connection::open(&path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM student", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 3);
}

#[test]
fn test_execute_invalid_sql_is_a_statement_error() {
    let dir = TempDir::new().unwrap();
    let manager = ConnectionManager::default();
    let config = DbConfig::sqlite(school_db(&dir));

    let err = manager.execute(&config, "SELECT * FROM nowhere").unwrap_err();
    assert!(matches!(err, DbError::Sqlite(_)));
    assert!(!err.is_connection());
    assert!(err.to_string().contains("nowhere"));

    // The connection stays cached and usable after a failed statement.
    assert!(manager.is_cached(&config.key()));
    assert!(manager.execute(&config, "SELECT 1").is_ok());
}

// ---------------------------------------------------------------------------
// Connection caching
// ---------------------------------------------------------------------------

#[test]
fn test_one_connection_per_target() {
    let dir = TempDir::new().unwrap();
    let manager = ConnectionManager::default();
    let first = DbConfig::sqlite(school_db(&dir));
    let second = DbConfig::sqlite(path_string(&dir.path().join("other.db")));

    let a = manager.connect(&first).unwrap();
    let b = manager.connect(&first).unwrap();
    manager.connect(&second).unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(manager.len(), 2);
}

#[test]
fn test_in_memory_database_persists_across_calls() {
    let manager = ConnectionManager::default();
    let config = DbConfig::sqlite(":memory:");

    manager
        .execute(&config, "CREATE TABLE t (id INTEGER)")
        .unwrap();
    manager.execute(&config, "INSERT INTO t VALUES (7)").unwrap();

    let result = manager.execute(&config, "SELECT id FROM t").unwrap();
    assert_eq!(result.rows, vec![vec![Value::Integer(7)]]);
}

#[test]
fn test_connection_reports_round_trip() {
    let dir = TempDir::new().unwrap();
    let manager = ConnectionManager::default();
    let config = DbConfig::sqlite(school_db(&dir));

    let elapsed = manager.test_connection(&config).unwrap();
    assert!(elapsed < Duration::from_secs(5));
    assert!(manager.is_cached(&config.key()));
}

#[test]
fn test_invalid_settings_are_rejected_before_connecting() {
    let manager = ConnectionManager::default();
    let config = DbConfig::sqlite("");

    let err = manager.schema(&config).unwrap_err();
    assert!(err.is_config());
    assert!(manager.is_empty());
}

// ---------------------------------------------------------------------------
// Networked dialects without a server
// ---------------------------------------------------------------------------

#[test]
fn test_postgres_unreachable_is_connection_error() {
    let manager = ConnectionManager::new(fast_options());
    let config = unreachable_config(Dialect::Postgres);

    let err = manager.test_connection(&config).unwrap_err();
    assert!(err.is_connection(), "unexpected error: {err}");
    assert!(err.to_string().contains("PostgreSQL"));
    assert!(!manager.is_cached(&config.key()));
}

#[test]
fn test_mysql_unreachable_is_connection_error() {
    let manager = ConnectionManager::new(fast_options());
    let config = unreachable_config(Dialect::Mysql);

    let err = manager.schema(&config).unwrap_err();
    assert!(err.is_connection(), "unexpected error: {err}");
    assert!(err.to_string().contains("MySQL"));
    assert!(manager.is_empty());
}

//! PostgreSQL driver.
//!
//! Schema inspection reads `information_schema` for base tables in the
//! `public` schema. Statements run over the simple-query protocol, so every
//! cell arrives as text and is decoded with [`Value::from_text`]. A single
//! statement is also prepared first to learn its column types; strings with
//! several statements cannot be prepared and decode as text.
//!
//! Connections negotiate TLS the way libpq's default `sslmode=prefer` does:
//! encrypt when the server offers it, fall back to plaintext when it does not,
//! and do not verify the server certificate.

use askdb_core::{ColumnKind, ColumnSchema, DbConfig, Dialect, QueryResult, TableSchema, Value};
use native_tls::TlsConnector;
use postgres::config::SslMode;
use postgres::error::SqlState;
use postgres::types::Type;
use postgres::{Client, SimpleQueryMessage};
use postgres_native_tls::MakeTlsConnector;

use crate::driver::{ConnectOptions, Database};
use crate::error::{DbError, Result};

const SCHEMA_SQL: &str = r#"
SELECT
    t.table_name::text,
    c.column_name::text,
    c.data_type::text,
    c.column_default::text,
    c.is_nullable::text
FROM information_schema.tables t
JOIN information_schema.columns c
    ON c.table_schema = t.table_schema
    AND c.table_name = t.table_name
WHERE t.table_schema = 'public'
    AND t.table_type = 'BASE TABLE'
ORDER BY t.table_name, c.ordinal_position
"#;

/// A client connection to a PostgreSQL server.
pub struct PostgresDatabase {
    client: Client,
}

impl PostgresDatabase {
    /// Connects using the host, port, database and credentials of `config`.
    ///
    /// The settings are expected to have passed [`DbConfig::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connection`] if the TLS connector cannot be built or
    /// the server cannot be reached.
    pub fn connect(config: &DbConfig, options: &ConnectOptions) -> Result<Self> {
        let tls = tls_connector().map_err(|e| DbError::connection(Dialect::Postgres, e))?;
        let client = client_config(config, options)
            .connect(tls)
            .map_err(|e| DbError::connection(Dialect::Postgres, e))?;
        Ok(Self { client })
    }
}

/// Builds the driver configuration for `config`.
fn client_config(config: &DbConfig, options: &ConnectOptions) -> postgres::Config {
    let mut pg = postgres::Config::new();
    pg.host(config.host_or_default())
        .dbname(&config.database)
        .connect_timeout(options.connect_timeout)
        .ssl_mode(SslMode::Prefer);
    if let Ok(Some(port)) = config.port() {
        pg.port(port);
    }
    if let Some(user) = config.user() {
        pg.user(user);
    }
    if let Some(password) = &config.password {
        pg.password(password);
    }
    pg
}

/// TLS connector with libpq `prefer` semantics: no certificate verification.
fn tls_connector() -> std::result::Result<MakeTlsConnector, native_tls::Error> {
    let connector = TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()?;
    Ok(MakeTlsConnector::new(connector))
}

impl Database for PostgresDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn ping(&mut self) -> Result<()> {
        self.client.simple_query("SELECT 1")?;
        Ok(())
    }

    fn inspect(&mut self) -> Result<Vec<TableSchema>> {
        let rows = self.client.query(SCHEMA_SQL, &[])?;
        let mut catalog = Vec::with_capacity(rows.len());
        for row in rows {
            let table: String = row.try_get(0)?;
            let column = ColumnSchema::new(row.try_get::<_, String>(1)?, row.try_get::<_, String>(2)?)
                .with_nullable(row.try_get::<_, String>(4)? == "YES")
                .with_default(row.try_get(3)?);
            catalog.push((table, column));
        }
        Ok(group_by_table(catalog))
    }

    fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        // Multi-statement strings are rejected by `prepare` as a syntax error.
        // Anything genuinely malformed fails again below with the same message.
        let kinds: Vec<ColumnKind> = match self.client.prepare(sql) {
            Ok(statement) => statement
                .columns()
                .iter()
                .map(|c| column_kind(c.type_()))
                .collect(),
            Err(e) if e.code() == Some(&SqlState::SYNTAX_ERROR) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut results = ResultCollector::new(kinds);
        for message in self.client.simple_query(sql)? {
            match message {
                SimpleQueryMessage::RowDescription(columns) => {
                    results.describe(columns.iter().map(|c| c.name().to_string()).collect());
                }
                SimpleQueryMessage::Row(row) => {
                    results.row((0..row.len()).map(|i| row.get(i)).collect());
                }
                SimpleQueryMessage::CommandComplete(n) => results.complete(n),
                _ => {}
            }
        }
        Ok(results.finish())
    }
}

/// Accumulates simple-query messages into the result of the last statement.
#[derive(Debug, Default)]
struct ResultCollector {
    kinds: Vec<ColumnKind>,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    described: bool,
    affected: u64,
}

impl ResultCollector {
    fn new(kinds: Vec<ColumnKind>) -> Self {
        Self {
            kinds,
            ..Self::default()
        }
    }

    /// Starts a new result set.
    fn describe(&mut self, columns: Vec<String>) {
        self.columns = columns;
        self.rows.clear();
        self.described = true;
    }

    fn row(&mut self, cells: Vec<Option<&str>>) {
        let values = cells
            .into_iter()
            .enumerate()
            .map(|(i, cell)| match cell {
                Some(text) => {
                    Value::from_text(self.kinds.get(i).copied().unwrap_or(ColumnKind::Text), text)
                }
                None => Value::Null,
            })
            .collect();
        self.rows.push(values);
    }

    /// Ends a statement. A statement without a row description clears any
    /// earlier result set.
    fn complete(&mut self, affected: u64) {
        if !self.described {
            self.columns.clear();
            self.rows.clear();
        }
        self.described = false;
        self.affected = affected;
    }

    fn finish(self) -> QueryResult {
        if self.columns.is_empty() {
            return QueryResult::affected(self.affected);
        }
        QueryResult::new(self.columns, self.rows)
    }
}

/// Maps a PostgreSQL type to the decoding hint for its text representation.
fn column_kind(ty: &Type) -> ColumnKind {
    match ty {
        &Type::BOOL => ColumnKind::Bool,
        &Type::INT2 | &Type::INT4 | &Type::INT8 | &Type::OID => ColumnKind::Integer,
        &Type::FLOAT4 | &Type::FLOAT8 | &Type::NUMERIC => ColumnKind::Real,
        &Type::JSON | &Type::JSONB => ColumnKind::Json,
        _ => ColumnKind::Text,
    }
}

/// Groups catalog rows, already ordered by table, into tables.
fn group_by_table(rows: Vec<(String, ColumnSchema)>) -> Vec<TableSchema> {
    let mut tables: Vec<TableSchema> = Vec::new();
    for (table, column) in rows {
        match tables.last_mut() {
            Some(current) if current.name == table => current.columns.push(column),
            _ => tables.push(TableSchema {
                name: table,
                columns: vec![column],
            }),
        }
    }
    tables
}

//! SQLite driver.
//!
//! Tables are listed from `sqlite_master` (internal `sqlite_*` tables
//! excluded) and their columns from the `pragma_table_info` table-valued
//! function, which reports the declared type only.

use askdb_core::{ColumnSchema, Dialect, QueryResult, TableSchema, Value};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, params};

use crate::driver::Database;
use crate::error::Result;

const LIST_TABLES_SQL: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'";

const TABLE_COLUMNS_SQL: &str = "SELECT name, type FROM pragma_table_info(?1) ORDER BY cid";

/// A SQLite database file opened in read-write mode.
///
/// # Examples
///
/// ```
/// use askdb_db::{Database, SqliteDatabase};
/// use rusqlite::Connection;
///
/// let conn = Connection::open_in_memory().unwrap();
/// conn.execute_batch("CREATE TABLE student (id INTEGER, name TEXT);").unwrap();
///
/// let mut db = SqliteDatabase::from_connection(conn);
/// let tables = db.inspect().unwrap();
/// assert_eq!(tables[0].name, "student");
/// assert_eq!(tables[0].columns.len(), 2);
/// ```
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// Opens (or creates) the database file at `path`. `:memory:` opens a
    /// private in-memory database.
    pub fn open(path: &str) -> std::result::Result<Self, rusqlite::Error> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    /// Wraps an already open connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl Database for SqliteDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn inspect(&mut self) -> Result<Vec<TableSchema>> {
        let mut stmt = self.conn.prepare(LIST_TABLES_SQL)?;
        let names: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut columns_stmt = self.conn.prepare(TABLE_COLUMNS_SQL)?;
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = columns_stmt
                .query_map(params![name], |row| {
                    Ok(ColumnSchema::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            tables.push(TableSchema { name, columns });
        }
        Ok(tables)
    }

    fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        if columns.is_empty() {
            let changed = stmt.execute([])?;
            return Ok(QueryResult::affected(changed as u64));
        }

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(decode(row.get_ref(i)?));
            }
            out.push(values);
        }
        Ok(QueryResult::new(columns, out))
    }
}

fn decode(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    }
}

//! MySQL driver.
//!
//! Tables come from `SHOW TABLES` and their columns from ``DESCRIBE `t` ``.
//! Statements run over the text protocol; cells are decoded by the column
//! type reported in the result set metadata.

use askdb_core::{ColumnKind, ColumnSchema, DbConfig, Dialect, QueryResult, TableSchema, Value};
use mysql::consts::ColumnType;
use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Row};

use crate::driver::{ConnectOptions, Database};
use crate::error::{DbError, Result};

/// Character set id MySQL reports for binary strings and blobs.
const BINARY_CHARSET: u16 = 63;

/// A connection to a MySQL server.
pub struct MysqlDatabase {
    conn: Conn,
}

impl MysqlDatabase {
    /// Connects using the host, port, database and credentials of `config`.
    ///
    /// The settings are expected to have passed [`DbConfig::validate`].
    pub fn connect(
        config: &DbConfig,
        options: &ConnectOptions,
    ) -> std::result::Result<Self, mysql::Error> {
        let port = match config.port() {
            Ok(Some(port)) => port,
            _ => Dialect::Mysql.default_port().unwrap_or(3306),
        };
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(config.host_or_default()))
            .tcp_port(port)
            .db_name(Some(config.database.as_str()))
            .user(config.user())
            .pass(config.password.as_deref())
            .tcp_connect_timeout(Some(options.connect_timeout));
        Ok(Self {
            conn: Conn::new(opts)?,
        })
    }
}

impl Database for MysqlDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn ping(&mut self) -> Result<()> {
        self.conn.query_drop("SELECT 1")?;
        Ok(())
    }

    fn inspect(&mut self) -> Result<Vec<TableSchema>> {
        let names: Vec<String> = self.conn.query("SHOW TABLES")?;
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let describe = format!("DESCRIBE {}", quote_identifier(&name));
            let rows: Vec<Row> = self.conn.query(describe.as_str())?;
            let columns = rows
                .into_iter()
                .map(|row| {
                    let fields: Vec<Option<String>> =
                        row.unwrap().into_iter().map(value_to_string).collect();
                    describe_column(&fields)
                })
                .collect::<Result<Vec<_>>>()?;
            tables.push(TableSchema { name, columns });
        }
        Ok(tables)
    }

    fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        let result = self.conn.query_iter(sql)?;
        let (columns, kinds): (Vec<String>, Vec<ColumnKind>) = result
            .columns()
            .as_ref()
            .iter()
            .map(|c| {
                (
                    c.name_str().into_owned(),
                    column_kind(c.column_type(), c.character_set()),
                )
            })
            .unzip();
        let affected = result.affected_rows();

        let mut rows = Vec::new();
        for row in result {
            let values = row?
                .unwrap()
                .into_iter()
                .enumerate()
                .map(|(i, value)| {
                    let kind = kinds.get(i).copied().unwrap_or(ColumnKind::Text);
                    decode(kind, value)
                })
                .collect();
            rows.push(values);
        }

        if columns.is_empty() {
            return Ok(QueryResult::affected(affected));
        }
        Ok(QueryResult::new(columns, rows))
    }
}

/// Quotes a table name for interpolation into `DESCRIBE`.
fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Maps a MySQL column type to the decoding hint for its text representation.
fn column_kind(column_type: ColumnType, charset: u16) -> ColumnKind {
    use ColumnType::*;
    match column_type {
        MYSQL_TYPE_TINY | MYSQL_TYPE_SHORT | MYSQL_TYPE_LONG | MYSQL_TYPE_INT24
        | MYSQL_TYPE_LONGLONG | MYSQL_TYPE_YEAR => ColumnKind::Integer,
        MYSQL_TYPE_FLOAT | MYSQL_TYPE_DOUBLE | MYSQL_TYPE_DECIMAL | MYSQL_TYPE_NEWDECIMAL => {
            ColumnKind::Real
        }
        MYSQL_TYPE_JSON => ColumnKind::Json,
        MYSQL_TYPE_BIT => ColumnKind::Bytes,
        MYSQL_TYPE_TINY_BLOB | MYSQL_TYPE_MEDIUM_BLOB | MYSQL_TYPE_LONG_BLOB | MYSQL_TYPE_BLOB
        | MYSQL_TYPE_VAR_STRING | MYSQL_TYPE_VARCHAR | MYSQL_TYPE_STRING
            if charset == BINARY_CHARSET =>
        {
            ColumnKind::Bytes
        }
        _ => ColumnKind::Text,
    }
}

fn decode(kind: ColumnKind, value: mysql::Value) -> Value {
    match value {
        mysql::Value::NULL => Value::Null,
        mysql::Value::Bytes(bytes) => match kind {
            ColumnKind::Bytes => Value::Bytes(bytes),
            _ => Value::from_text(kind, &String::from_utf8_lossy(&bytes)),
        },
        mysql::Value::Int(i) => Value::Integer(i),
        mysql::Value::UInt(u) => i64::try_from(u)
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::Text(u.to_string())),
        mysql::Value::Float(f) => Value::Real(f64::from(f)),
        mysql::Value::Double(d) => Value::Real(d),
        temporal => Value::Text(temporal.as_sql(true).trim_matches('\'').to_string()),
    }
}

fn value_to_string(value: mysql::Value) -> Option<String> {
    match value {
        mysql::Value::NULL => None,
        mysql::Value::Bytes(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        other => Some(other.as_sql(true).trim_matches('\'').to_string()),
    }
}

/// Builds a column from a `DESCRIBE` row: Field, Type, Null, Key, Default, Extra.
fn describe_column(fields: &[Option<String>]) -> Result<ColumnSchema> {
    if fields.len() < 6 {
        return Err(DbError::Catalog(format!(
            "DESCRIBE returned {} fields, expected 6",
            fields.len()
        )));
    }
    let name = fields[0]
        .clone()
        .ok_or_else(|| DbError::Catalog("DESCRIBE returned a column without a name".into()))?;
    Ok(
        ColumnSchema::new(name, fields[1].clone().unwrap_or_default())
            .with_nullable(fields[2].as_deref() == Some("YES"))
            .with_default(fields[4].clone())
            .with_key(fields[3].clone())
            .with_extra(fields[5].clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(String::from)).collect()
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("orders"), "`orders`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_describe_column_primary_key() {
        let column = describe_column(&fields(&[
            Some("id"),
            Some("int"),
            Some("NO"),
            Some("PRI"),
            None,
            Some("auto_increment"),
        ]))
        .unwrap();
        assert_eq!(column.detail(), "int NOT NULL PRI auto_increment");
    }

    #[test]
    fn test_describe_column_nullable_with_default() {
        let column = describe_column(&fields(&[
            Some("status"),
            Some("varchar(20)"),
            Some("YES"),
            Some(""),
            Some("pending"),
            Some(""),
        ]))
        .unwrap();
        assert_eq!(column.detail(), "varchar(20) NULL DEFAULT pending");
    }

    #[test]
    fn test_describe_column_short_row() {
        let err = describe_column(&fields(&[Some("id"), Some("int")])).unwrap_err();
        assert!(matches!(err, DbError::Catalog(_)));
    }

    #[test]
    fn test_column_kind() {
        assert_eq!(column_kind(ColumnType::MYSQL_TYPE_LONGLONG, 33), ColumnKind::Integer);
        assert_eq!(column_kind(ColumnType::MYSQL_TYPE_NEWDECIMAL, 63), ColumnKind::Real);
        assert_eq!(column_kind(ColumnType::MYSQL_TYPE_JSON, 63), ColumnKind::Json);
        assert_eq!(column_kind(ColumnType::MYSQL_TYPE_BLOB, 63), ColumnKind::Bytes);
        assert_eq!(column_kind(ColumnType::MYSQL_TYPE_BLOB, 255), ColumnKind::Text);
        assert_eq!(column_kind(ColumnType::MYSQL_TYPE_VAR_STRING, 255), ColumnKind::Text);
        assert_eq!(column_kind(ColumnType::MYSQL_TYPE_DATETIME, 63), ColumnKind::Text);
    }

    #[test]
    fn test_decode_text_protocol_values() {
        assert_eq!(
            decode(ColumnKind::Integer, mysql::Value::Bytes(b"42".to_vec())),
            Value::Integer(42)
        );
        assert_eq!(
            decode(ColumnKind::Real, mysql::Value::Bytes(b"9.99".to_vec())),
            Value::Real(9.99)
        );
        assert_eq!(
            decode(ColumnKind::Text, mysql::Value::Bytes(b"hello".to_vec())),
            Value::Text("hello".into())
        );
        assert_eq!(
            decode(ColumnKind::Bytes, mysql::Value::Bytes(vec![0, 255])),
            Value::Bytes(vec![0, 255])
        );
        assert_eq!(decode(ColumnKind::Text, mysql::Value::NULL), Value::Null);
    }

    #[test]
    fn test_decode_binary_values() {
        assert_eq!(decode(ColumnKind::Integer, mysql::Value::Int(-3)), Value::Integer(-3));
        assert_eq!(
            decode(ColumnKind::Integer, mysql::Value::UInt(u64::MAX)),
            Value::Text(u64::MAX.to_string())
        );
        assert_eq!(decode(ColumnKind::Real, mysql::Value::Double(0.5)), Value::Real(0.5));
    }

    #[test]
    fn test_decode_date() {
        let value = decode(
            ColumnKind::Text,
            mysql::Value::Date(2024, 3, 9, 14, 5, 0, 0),
        );
        match value {
            Value::Text(text) => assert!(text.starts_with("2024-03-09")),
            other => panic!("expected text, got {other:?}"),
        }
    }
}

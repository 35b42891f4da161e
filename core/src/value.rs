//! Tabular query results.
//!
//! Drivers decode cells into [`Value`]s. PostgreSQL and MySQL deliver cells as
//! text, so [`Value::from_text`] converts them using a [`ColumnKind`] derived
//! from the catalog type of each column.

use serde::Serialize;
use serde_json::{Map, Number};

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

/// Decoding hint for a textual cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Bool,
    Integer,
    Real,
    Json,
    Text,
    Bytes,
}

impl Value {
    /// Decodes a text-protocol cell according to its column kind.
    ///
    /// Cells that do not parse as their kind are kept as [`Value::Text`].
    ///
    /// # Examples
    ///
    /// ```
    /// use askdb_core::{ColumnKind, Value};
    ///
    /// assert_eq!(Value::from_text(ColumnKind::Integer, "42"), Value::Integer(42));
    /// assert_eq!(Value::from_text(ColumnKind::Bool, "t"), Value::Bool(true));
    /// assert_eq!(
    ///     Value::from_text(ColumnKind::Integer, "18446744073709551615"),
    ///     Value::Text("18446744073709551615".into())
    /// );
    /// ```
    pub fn from_text(kind: ColumnKind, text: &str) -> Value {
        let fallback = || Value::Text(text.to_string());
        match kind {
            ColumnKind::Bool => match text {
                "t" | "true" | "TRUE" | "1" => Value::Bool(true),
                "f" | "false" | "FALSE" | "0" => Value::Bool(false),
                _ => fallback(),
            },
            ColumnKind::Integer => text.parse().map(Value::Integer).unwrap_or_else(|_| fallback()),
            ColumnKind::Real => text.parse().map(Value::Real).unwrap_or_else(|_| fallback()),
            ColumnKind::Json => serde_json::from_str(text)
                .map(Value::Json)
                .unwrap_or_else(|_| fallback()),
            ColumnKind::Text => fallback(),
            ColumnKind::Bytes => Value::Bytes(text.as_bytes().to_vec()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Real(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Json(v) => v.clone(),
            Value::Bytes(bytes) => serde_json::Value::Array(
                bytes.iter().map(|b| serde_json::Value::from(*b)).collect(),
            ),
        }
    }
}

/// Column names and rows produced by one statement.
///
/// Statements without a result set have no columns and report
/// [`rows_affected`](Self::rows_affected) instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<u64>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            rows_affected: None,
        }
    }

    /// Result of a statement that returns no rows.
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            rows_affected: Some(rows_affected),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Converts rows to JSON objects keyed by column name.
    ///
    /// Keys keep the result's column order. When a result repeats a column
    /// name, the rightmost value wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use askdb_core::{QueryResult, Value};
    ///
    /// let result = QueryResult::new(
    ///     vec!["id".into(), "name".into()],
    ///     vec![vec![Value::Integer(1), Value::Text("Ada".into())]],
    /// );
    /// let records = result.records();
    /// assert_eq!(records[0]["name"], "Ada");
    /// ```
    pub fn records(&self) -> Vec<Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| (column.clone(), serde_json::Value::from(value)))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_text_bool() {
        assert_eq!(Value::from_text(ColumnKind::Bool, "f"), Value::Bool(false));
        assert_eq!(Value::from_text(ColumnKind::Bool, "1"), Value::Bool(true));
        assert_eq!(
            Value::from_text(ColumnKind::Bool, "maybe"),
            Value::Text("maybe".into())
        );
    }

    #[test]
    fn test_from_text_numbers() {
        assert_eq!(Value::from_text(ColumnKind::Integer, "-7"), Value::Integer(-7));
        assert_eq!(Value::from_text(ColumnKind::Real, "12.50"), Value::Real(12.5));
        assert_eq!(Value::from_text(ColumnKind::Real, "3"), Value::Real(3.0));
        assert_eq!(
            Value::from_text(ColumnKind::Real, "n/a"),
            Value::Text("n/a".into())
        );
    }

    #[test]
    fn test_from_text_json() {
        assert_eq!(
            Value::from_text(ColumnKind::Json, r#"{"a": [1, 2]}"#),
            Value::Json(json!({"a": [1, 2]}))
        );
        assert_eq!(
            Value::from_text(ColumnKind::Json, "{broken"),
            Value::Text("{broken".into())
        );
    }

    #[test]
    fn test_from_text_bytes_and_text() {
        assert_eq!(
            Value::from_text(ColumnKind::Bytes, "ab"),
            Value::Bytes(vec![b'a', b'b'])
        );
        assert_eq!(
            Value::from_text(ColumnKind::Text, "2024-01-01"),
            Value::Text("2024-01-01".into())
        );
    }

    #[test]
    fn test_json_conversion() {
        assert_eq!(serde_json::Value::from(&Value::Null), json!(null));
        assert_eq!(serde_json::Value::from(&Value::Real(f64::NAN)), json!(null));
        assert_eq!(serde_json::Value::from(&Value::Bytes(vec![1, 2])), json!([1, 2]));
        assert_eq!(serde_json::Value::from(&Value::Bool(true)), json!(true));
    }

    #[test]
    fn test_serialize_untagged() {
        let row = vec![Value::Integer(1), Value::Null, Value::Text("x".into())];
        assert_eq!(serde_json::to_value(&row).unwrap(), json!([1, null, "x"]));
    }

    #[test]
    fn test_records_orientation() {
        let result = QueryResult::new(
            vec!["id".into(), "score".into()],
            vec![
                vec![Value::Integer(1), Value::Real(9.5)],
                vec![Value::Integer(2), Value::Null],
            ],
        );
        assert_eq!(result.row_count(), 2);
        assert_eq!(
            serde_json::to_value(result.records()).unwrap(),
            json!([{"id": 1, "score": 9.5}, {"id": 2, "score": null}])
        );
    }

    #[test]
    fn test_records_duplicate_columns_last_wins() {
        let result = QueryResult::new(
            vec!["id".into(), "id".into()],
            vec![vec![Value::Integer(1), Value::Integer(2)]],
        );
        assert_eq!(result.records()[0]["id"], json!(2));
    }

    #[test]
    fn test_affected_result() {
        let result = QueryResult::affected(3);
        assert!(result.is_empty());
        assert!(result.columns.is_empty());
        assert_eq!(result.rows_affected, Some(3));
        assert!(result.records().is_empty());
    }

    #[test]
    fn test_records_keep_column_order() {
        let result = QueryResult::new(
            vec!["zeta".into(), "mid".into(), "alpha".into()],
            vec![vec![Value::Integer(3), Value::Integer(2), Value::Integer(1)]],
        );
        assert_eq!(
            serde_json::to_string(&result.records()).unwrap(),
            r#"[{"zeta":3,"mid":2,"alpha":1}]"#
        );
    }
}

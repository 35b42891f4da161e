//! Database schema model and its text rendering.
//!
//! Each dialect's inspector normalizes catalog rows into [`TableSchema`]
//! values. [`DatabaseSchema::to_text`] flattens them into the human-readable
//! block embedded in generation prompts:
//!
//! ```text
//!
//!   Table: users
//!     - id (integer NOT NULL DEFAULT nextval('users_id_seq'::regclass))
//!     - email (text NULL)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;

/// One column as reported by a database catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Declared type, as spelled by the catalog.
    pub data_type: String,
    /// Nullability, when the catalog reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Index membership such as `PRI` or `UNI` (MySQL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Extra attributes such as `auto_increment` (MySQL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl ColumnSchema {
    /// Creates a column with only a name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: None,
            default: None,
            key: None,
            extra: None,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn with_default(mut self, default: Option<String>) -> Self {
        self.default = default;
        self
    }

    pub fn with_key(mut self, key: Option<String>) -> Self {
        self.key = key;
        self
    }

    pub fn with_extra(mut self, extra: Option<String>) -> Self {
        self.extra = extra;
        self
    }

    /// Renders the parenthesized detail: type, nullability, default, key, extra.
    ///
    /// # Examples
    ///
    /// ```
    /// use askdb_core::ColumnSchema;
    ///
    /// let col = ColumnSchema::new("id", "int")
    ///     .with_nullable(false)
    ///     .with_key(Some("PRI".into()))
    ///     .with_extra(Some("auto_increment".into()));
    /// assert_eq!(col.detail(), "int NOT NULL PRI auto_increment");
    /// ```
    pub fn detail(&self) -> String {
        let mut detail = self.data_type.clone();
        match self.nullable {
            Some(true) => detail.push_str(" NULL"),
            Some(false) => detail.push_str(" NOT NULL"),
            None => {}
        }
        if let Some(default) = present(&self.default) {
            detail.push_str(" DEFAULT ");
            detail.push_str(default);
        }
        for part in [&self.key, &self.extra] {
            if let Some(part) = present(part) {
                detail.push(' ');
                detail.push_str(part);
            }
        }
        detail
    }
}

/// A table and its columns in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnSchema) -> Self {
        self.columns.push(column);
        self
    }

    /// Renders the table as a block of the schema text.
    pub fn to_text(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|col| format!("    - {} ({})", col.name, col.detail()))
            .collect();
        format!("\n  Table: {}\n{}", self.name, columns.join("\n"))
    }
}

/// All user tables of one database.
///
/// # Examples
///
/// ```
/// use askdb_core::{ColumnSchema, DatabaseSchema, Dialect, TableSchema};
///
/// let schema = DatabaseSchema::new(
///     Dialect::Sqlite,
///     vec![TableSchema::new("student")
///         .with_column(ColumnSchema::new("id", "INTEGER"))
///         .with_column(ColumnSchema::new("name", "TEXT"))],
/// );
/// assert_eq!(
///     schema.to_text(),
///     "\n  Table: student\n    - id (INTEGER)\n    - name (TEXT)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub dialect: Dialect,
    pub tables: Vec<TableSchema>,
}

impl DatabaseSchema {
    pub fn new(dialect: Dialect, tables: Vec<TableSchema>) -> Self {
        Self { dialect, tables }
    }

    /// Returns `true` when the database has no user tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Looks up a table by exact name.
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Renders the schema text block passed to the generative model.
    pub fn to_text(&self) -> String {
        self.tables
            .iter()
            .map(TableSchema::to_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for DatabaseSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

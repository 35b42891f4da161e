//! Question to SQL generation.

use std::sync::Arc;

use askdb_core::DatabaseSchema;
use tracing::{debug, info};

use crate::error::{GeneratorError, Result};
use crate::model::TextModel;
use crate::prompt;

/// Turns natural-language questions into SQL using a [`TextModel`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use askdb_core::{ColumnSchema, DatabaseSchema, Dialect, TableSchema};
/// use askdb_generator::{QueryGenerator, TextModel};
///
/// struct Canned;
///
/// impl TextModel for Canned {
///     fn generate(&self, _prompt: &str) -> askdb_generator::Result<String> {
///         Ok("```sql\nSELECT COUNT(*) FROM student;\n```".to_string())
///     }
///     fn name(&self) -> &str {
///         "canned"
///     }
/// }
///
/// let schema = DatabaseSchema::new(
///     Dialect::Sqlite,
///     vec![TableSchema::new("student").with_column(ColumnSchema::new("id", "INTEGER"))],
/// );
/// let generator = QueryGenerator::new(Arc::new(Canned));
/// let sql = generator.generate_query("How many students?", &schema).unwrap();
/// assert_eq!(sql, "SELECT COUNT(*) FROM student;");
/// ```
#[derive(Clone)]
pub struct QueryGenerator {
    model: Arc<dyn TextModel>,
}

impl QueryGenerator {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Name of the underlying model.
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Builds the full prompt for `question` against a schema text block.
    pub fn build_prompt(&self, question: &str, schema_text: &str) -> String {
        prompt::with_question(&prompt::render(schema_text), question)
    }

    /// Asks the model for a SQL statement answering `question`.
    ///
    /// The reply is trimmed and any surrounding Markdown code fence removed.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::EmptyQuestion`] for a blank question,
    /// [`GeneratorError::EmptyResponse`] when nothing is left after cleanup,
    /// and any error raised by the model.
    pub fn generate_query(&self, question: &str, schema: &DatabaseSchema) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(GeneratorError::EmptyQuestion);
        }

        let prompt = self.build_prompt(question, &schema.to_text());
        debug!(model = self.model.name(), tables = schema.tables.len(), "generating query");

        let reply = self.model.generate(&prompt)?;
        let sql = clean_reply(&reply);
        if sql.is_empty() {
            return Err(GeneratorError::EmptyResponse);
        }

        info!(model = self.model.name(), sql_len = sql.len(), "generated query");
        Ok(sql)
    }
}

impl std::fmt::Debug for QueryGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryGenerator")
            .field("model", &self.model.name())
            .finish()
    }
}

/// Trims a model reply and strips a surrounding code fence.
pub fn clean_reply(reply: &str) -> String {
    let mut sql = reply.trim();
    if let Some(rest) = sql.strip_prefix("```") {
        // Drop an info string such as `sql` on the opening fence line.
        sql = match rest.split_once('\n') {
            Some((info, body)) if !info.trim().contains(' ') => body,
            _ => rest,
        };
        sql = sql.trim_end();
        sql = sql.strip_suffix("```").unwrap_or(sql);
    }
    sql.trim().to_string()
}

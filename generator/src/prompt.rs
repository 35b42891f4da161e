//! Instruction template sent to the text model.

/// Renders the fixed instruction prompt around a schema text block.
pub fn render(schema: &str) -> String {
    format!(
        "You are an expert SQL assistant. You will help users write SQL queries that are \
efficient, secure and follow best practices.

Database Schema:
{schema}

Rules to follow:
1. Only write standardized SQL that works across major databases
2. Convert English questions into SQL queries based on the above schema
3. Add proper indexing suggestions when relevant
4. Use clear aliases and formatting
5. Consider performance implications
6. Avoid SQL injection risks
7. Include error handling where needed
8. SQL code should not have any syntax errors
9. Do not begin or end with any ``` or any other special characters
10. Only use tables and columns that exist in the schema above

Important note: Don't mention sql in your response, provide only the SQL query

Please provide only the SQL query without any explanations unless specifically asked for details.
"
    )
}

/// Appends the user's question to a rendered instruction prompt.
pub fn with_question(instructions: &str, question: &str) -> String {
    format!("{instructions}\n\nUser Question: {question}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_embeds_schema() {
        let prompt = render("\n  Table: student\n    - name (TEXT)");
        assert!(prompt.contains("Database Schema:\n\n  Table: student\n    - name (TEXT)\n"));
        assert!(prompt.contains("10. Only use tables and columns that exist"));
    }

    #[test]
    fn test_with_question_appends_question_last() {
        let prompt = with_question(&render(""), "How many students are there?");
        assert!(prompt.ends_with("\n\nUser Question: How many students are there?"));
    }
}

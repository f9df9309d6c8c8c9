//! Prompt text for SQL generation and result summaries

use crate::db::Dialect;
use crate::query::NO_QUERY_SENTINEL;

pub fn sql_system_prompt(dialect: Dialect) -> String {
    let engine = match dialect {
        Dialect::Sqlite => "SQLite",
        Dialect::MsSql => "SQL Server",
    };
    format!(
        "You are an expert {} database developer. You translate questions into a single \
         SQL statement and reply with nothing but that statement.",
        engine
    )
}

/// User prompt carrying the schema description, question and row limit
pub fn sql_prompt(
    question: &str,
    schema_description: &str,
    row_limit: usize,
    dialect: Dialect,
) -> String {
    let (limit_rule, function_rule) = match dialect {
        Dialect::Sqlite => (
            format!("Always include LIMIT {} in SELECT queries.", row_limit),
            "Use SQLite functions (e.g., date('now'), strftime()).",
        ),
        Dialect::MsSql => (
            format!("Always include TOP {} in SELECT queries.", row_limit),
            "Use SQL Server functions (e.g., GETDATE(), DATEADD()).",
        ),
    };

    format!(
        "Generate a SQL query based on the following schema and question.\n\
         \n\
         Database schema:\n\
         {schema}\n\
         \n\
         Question: {question}\n\
         \n\
         Requirements:\n\
         1. Use ONLY tables and columns from the schema above.\n\
         2. {limit_rule}\n\
         3. Do not quote identifiers with square brackets; use plain names (e.g., employees.first_name).\n\
         4. Use JOINs that follow the declared foreign keys; lines marked (inferred) are hints only.\n\
         5. Return ONLY the SQL query: no explanations, markdown, or extra text.\n\
         6. If the schema cannot answer the question, return exactly {sentinel}.\n\
         7. {function_rule}\n\
         \n\
         SQL query:",
        schema = schema_description,
        question = question,
        limit_rule = limit_rule,
        sentinel = NO_QUERY_SENTINEL,
        function_rule = function_rule,
    )
}

pub fn summary_system_prompt() -> &'static str {
    "You are a helpful data analyst. You describe query results in plain, \
     conversational language for someone who does not read SQL."
}

/// User prompt for summarizing result records (already JSON-encoded)
pub fn summary_prompt(question: &str, records_json: &str, record_count: usize) -> String {
    format!(
        "Question: {}\n\
         \n\
         The database returned {} record(s):\n\
         {}\n\
         \n\
         Answer the question using only these records. Be concise, do not mention SQL, \
         and do not invent values that are not present.",
        question, record_count, records_json
    )
}

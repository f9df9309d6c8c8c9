//! Row-limit injection
//!
//! A SELECT without a top-level TOP/LIMIT/FETCH clause gets exactly one,
//! written in the dialect's syntax. Anything else passes through unchanged.

use crate::db::Dialect;
use crate::query::lexer;

/// True when the statement already carries a top-level row-limit clause
pub fn has_row_limit(sql: &str, dialect: Dialect) -> bool {
    !lexer::top_level_limits(sql, dialect).is_empty()
}

/// Number of top-level row-limit clauses
pub fn row_limit_count(sql: &str, dialect: Dialect) -> usize {
    lexer::top_level_limits(sql, dialect).len()
}

/// Inject a row limit into a SELECT that lacks one
///
/// * MsSql: `SELECT [DISTINCT] TOP n ...`
/// * Sqlite: `... LIMIT n`, on its own line when the text ends in a `--`
///   comment
pub fn apply_row_limit(sql: &str, limit: usize, dialect: Dialect) -> String {
    let Some(insert_at) = lexer::select_list_start(sql, dialect) else {
        return sql.to_string();
    };
    if has_row_limit(sql, dialect) {
        return sql.to_string();
    }

    match dialect {
        Dialect::MsSql => format!("{} TOP {}{}", &sql[..insert_at], limit, &sql[insert_at..]),
        Dialect::Sqlite => {
            let body = sql.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
            let separator = if lexer::ends_in_line_comment(body, dialect) {
                "\n"
            } else {
                " "
            };
            format!("{}{}LIMIT {}", body, separator, limit)
        }
    }
}

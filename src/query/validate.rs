//! Static validator
//!
//! Checks a normalized candidate against the schema snapshot before anything
//! touches the database. Purely lexical: it catches hallucinated tables,
//! aliases and columns, and is not a security boundary.
//!
//! Steps run in order and the first failure wins:
//! 1. triviality (empty, too short/long, "no query possible" sentinel)
//! 2. statement shape (SELECT/INSERT/UPDATE/DELETE; SELECT needs FROM)
//! 3. alias map sanity (at least one table, no ambiguous alias)
//! 4. table existence
//! 5. qualified column existence

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::db::Dialect;
use crate::query::alias::{AliasMap, AliasTarget};
use crate::query::lexer::{self, QualifiedColumn};
use crate::schema::SchemaSnapshot;

/// Sentinel a generator returns when the question cannot be answered
pub const NO_QUERY_SENTINEL: &str = "NO_VALID_QUERY_POSSIBLE";

const ALLOWED_STATEMENTS: &[&str] = &["select", "insert", "update", "delete"];

/// Length bounds for a candidate query (in characters) and the dialect its
/// text is tokenized in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub min_length: usize,
    pub max_length: usize,
    pub dialect: Dialect,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_length: 10,
            max_length: 1000,
            dialect: Dialect::Sqlite,
        }
    }
}

/// A qualified column that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidColumn {
    pub reference: QualifiedColumn,
    /// The qualifier is not a defined alias or table
    pub undefined_alias: bool,
}

impl fmt::Display for InvalidColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.undefined_alias {
            write!(f, "{} (undefined alias)", self.reference)
        } else {
            write!(f, "{}", self.reference)
        }
    }
}

/// Why a candidate was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("Query is empty")]
    Empty,

    #[error("Query is too short ({length} characters, minimum {min})")]
    TooShort { length: usize, min: usize },

    #[error("Query is too long ({length} characters, maximum {max})")]
    TooLong { length: usize, max: usize },

    #[error("Generator indicated no valid query is possible")]
    NoQueryPossible,

    #[error("Unsupported statement '{0}': query must start with SELECT, INSERT, UPDATE or DELETE")]
    UnsupportedStatement(String),

    #[error("SELECT query has no FROM clause")]
    MissingFrom,

    #[error("Query does not reference any table")]
    NoTables,

    #[error("Alias '{alias}' is bound to multiple tables: {}", .tables.join(", "))]
    AmbiguousAlias { alias: String, tables: Vec<String> },

    #[error("Query references invalid tables: {}", .0.join(", "))]
    UnknownTables(Vec<String>),

    #[error("Query references invalid columns: {}", join(.0))]
    InvalidColumns(Vec<InvalidColumn>),
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of static validation; `reason` is empty iff `valid`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub reason: String,
    pub suggestions: Vec<String>,
    #[serde(skip)]
    pub failure: Option<ValidationFailure>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            reason: String::new(),
            suggestions: Vec::new(),
            failure: None,
        }
    }

    pub fn rejected(failure: ValidationFailure, suggestions: Vec<String>) -> Self {
        Self {
            valid: false,
            reason: failure.to_string(),
            suggestions,
            failure: Some(failure),
        }
    }
}

/// Validate with default length bounds
pub fn validate(
    normalized_query: &str,
    aliases: &AliasMap,
    schema: &SchemaSnapshot,
) -> ValidationResult {
    validate_with(normalized_query, aliases, schema, &ValidationRules::default())
}

/// Validate a normalized candidate against the schema
pub fn validate_with(
    normalized_query: &str,
    aliases: &AliasMap,
    schema: &SchemaSnapshot,
    rules: &ValidationRules,
) -> ValidationResult {
    let result = run_checks(normalized_query, aliases, schema, rules);
    if !result.valid {
        debug!(reason = %result.reason, "candidate query rejected");
    }
    result
}

fn run_checks(
    query: &str,
    aliases: &AliasMap,
    schema: &SchemaSnapshot,
    rules: &ValidationRules,
) -> ValidationResult {
    let query = query.trim();

    // 1. Triviality
    if query.is_empty() {
        return ValidationResult::rejected(ValidationFailure::Empty, vec![]);
    }
    let unquoted = query.trim_matches(|c: char| matches!(c, '"' | '\'' | '`')).trim();
    if unquoted.eq_ignore_ascii_case(NO_QUERY_SENTINEL) {
        return ValidationResult::rejected(ValidationFailure::NoQueryPossible, vec![]);
    }
    let length = query.chars().count();
    if length < rules.min_length {
        return ValidationResult::rejected(
            ValidationFailure::TooShort {
                length,
                min: rules.min_length,
            },
            vec![],
        );
    }
    if length > rules.max_length {
        return ValidationResult::rejected(
            ValidationFailure::TooLong {
                length,
                max: rules.max_length,
            },
            vec![],
        );
    }

    // 2. Statement shape
    let keyword = lexer::leading_keyword(query, rules.dialect).unwrap_or_default();
    if !ALLOWED_STATEMENTS.contains(&keyword.as_str()) {
        let shown = query.split_whitespace().next().unwrap_or_default();
        return ValidationResult::rejected(
            ValidationFailure::UnsupportedStatement(shown.to_string()),
            vec![],
        );
    }
    if keyword == "select" && !lexer::has_from_clause(query, rules.dialect) {
        return ValidationResult::rejected(ValidationFailure::MissingFrom, vec![]);
    }

    // 3. Alias map
    if aliases.tables().is_empty() {
        return ValidationResult::rejected(ValidationFailure::NoTables, vec![]);
    }
    if let Some(conflict) = aliases.conflicts().first() {
        return ValidationResult::rejected(
            ValidationFailure::AmbiguousAlias {
                alias: conflict.alias.clone(),
                tables: conflict.targets.clone(),
            },
            vec![],
        );
    }

    // 4. Tables
    let unknown: Vec<String> = aliases
        .tables()
        .iter()
        .filter(|t| !schema.has_table(t))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        let suggestions = unknown
            .iter()
            .filter_map(|t| closest_table(t, schema))
            .collect();
        return ValidationResult::rejected(ValidationFailure::UnknownTables(unknown), suggestions);
    }

    // 5. Columns
    let mut invalid = Vec::new();
    let mut suggestions: Vec<String> = Vec::new();
    for reference in lexer::extract(query, rules.dialect).columns {
        match aliases.resolve(&reference.qualifier) {
            None => {
                push_unique(&mut suggestions, rebind_suggestions(&reference, aliases, schema));
                invalid.push(InvalidColumn {
                    reference,
                    undefined_alias: true,
                });
            }
            Some(AliasTarget::Derived) => {}
            Some(AliasTarget::Table(table)) => {
                if reference.column == "*" {
                    continue;
                }
                let Some(info) = schema.table(table) else {
                    continue;
                };
                if info.has_column(&reference.column) {
                    continue;
                }
                push_unique(
                    &mut suggestions,
                    info.column_keys()
                        .filter(|c| c.contains(&reference.column) || reference.column.contains(c))
                        .map(|c| format!("{}.{}", reference.qualifier, c)),
                );
                invalid.push(InvalidColumn {
                    reference,
                    undefined_alias: false,
                });
            }
        }
    }
    if !invalid.is_empty() {
        return ValidationResult::rejected(ValidationFailure::InvalidColumns(invalid), suggestions);
    }

    ValidationResult::ok()
}

/// Append suggestions not already present, keeping first-seen order
fn push_unique(suggestions: &mut Vec<String>, candidates: impl IntoIterator<Item = String>) {
    for candidate in candidates {
        if !suggestions.contains(&candidate) {
            suggestions.push(candidate);
        }
    }
}

/// Nearest known table by substring containment, smallest length gap first
fn closest_table(name: &str, schema: &SchemaSnapshot) -> Option<String> {
    schema
        .table_keys()
        .zip(schema.tables())
        .filter(|(key, _)| key.contains(name) || name.contains(key))
        .min_by_key(|(key, _)| key.len().abs_diff(name.len()))
        .map(|(_, table)| table.name.clone())
}

/// For an undefined qualifier, the defined aliases whose table has the column
fn rebind_suggestions(
    reference: &QualifiedColumn,
    aliases: &AliasMap,
    schema: &SchemaSnapshot,
) -> Vec<String> {
    aliases
        .iter()
        .filter_map(|(alias, target)| match target {
            AliasTarget::Table(table) => schema.table(table).map(|info| (alias, info)),
            AliasTarget::Derived => None,
        })
        .filter(|(_, info)| reference.column == "*" || info.has_column(&reference.column))
        .map(|(alias, _)| format!("{}.{}", alias, reference.column))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::alias;
    use crate::schema::{ColumnInfo, TableInfo};

    fn schema() -> SchemaSnapshot {
        let mut snapshot = SchemaSnapshot::new();
        for (name, columns) in [
            ("customers", &["id", "name", "email"][..]),
            ("orders", &["id", "customer_id", "total"][..]),
            ("order_items", &["id", "order_id", "product_id"][..]),
        ] {
            let mut table = TableInfo::new(name, false);
            for column in columns {
                table.add_column(ColumnInfo {
                    name: column.to_string(),
                    data_type: "TEXT".to_string(),
                    nullable: true,
                    primary_key: *column == "id",
                });
            }
            snapshot.add_table(table);
        }
        snapshot
    }

    fn resolve(sql: &str) -> AliasMap {
        alias::resolve(sql, Dialect::Sqlite)
    }

    fn check(sql: &str) -> ValidationResult {
        validate(sql, &resolve(sql), &schema())
    }

    #[test]
    fn test_valid_select_with_joins() {
        let result = check(
            "SELECT c.name, o.total FROM customers c \
             JOIN orders o ON o.customer_id = c.id WHERE c.email LIKE '%x.y%'",
        );
        assert!(result.valid, "{}", result.reason);
        assert!(result.reason.is_empty());
        assert!(result.failure.is_none());
    }

    #[test]
    fn test_valid_unqualified_and_dml() {
        assert!(check("SELECT name FROM customers WHERE id = 1").valid);
        assert!(check("UPDATE orders SET total = 0 WHERE id = 3").valid);
        assert!(check("INSERT INTO customers (name, email) VALUES ('a', 'b')").valid);
        assert!(check("DELETE FROM order_items WHERE order_id = 9").valid);
    }

    #[test]
    fn test_unknown_table_is_named() {
        let result = check("SELECT * FROM nonexistent_table");
        assert!(!result.valid);
        assert!(result.reason.contains("nonexistent_table"));
        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn test_unknown_table_suggestion_by_containment() {
        let result = check("SELECT * FROM customer");
        assert_eq!(
            result.failure,
            Some(ValidationFailure::UnknownTables(vec!["customer".to_string()]))
        );
        assert_eq!(result.suggestions, vec!["customers"]);

        let result = check("SELECT * FROM items WHERE id > 0");
        assert_eq!(result.suggestions, vec!["order_items"]);
    }

    #[test]
    fn test_alias_resolves_against_its_table() {
        assert!(check("SELECT c.email FROM customers c JOIN orders o ON o.customer_id = c.id").valid);

        let result = check("SELECT o.email FROM customers c JOIN orders o ON o.customer_id = c.id");
        assert!(!result.valid);
        assert!(result.reason.contains("o.email"));
        assert!(!result.reason.contains("undefined alias"));
    }

    #[test]
    fn test_undefined_alias_is_invalid_even_if_column_exists() {
        let result = check("SELECT c.name FROM customers o");
        assert!(!result.valid);
        assert!(result.reason.contains("c.name (undefined alias)"));
        assert_eq!(result.suggestions, vec!["o.name"]);

        let result = check("SELECT x.email FROM customers c JOIN orders o ON o.customer_id = c.id");
        assert!(result.reason.contains("x.email (undefined alias)"));
    }

    #[test]
    fn test_suggestions_are_unique_across_references() {
        let result = check("SELECT x.name, c.mail, y.name FROM customers c");
        assert!(!result.valid);
        assert_eq!(result.suggestions, vec!["c.name", "c.email"]);
    }

    #[test]
    fn test_distinct_from_predicate_is_not_a_table() {
        let result = check("SELECT c.name FROM customers c WHERE c.email IS DISTINCT FROM c.name");
        assert!(result.valid, "{}", result.reason);

        let result =
            check("SELECT c.name FROM customers c WHERE c.email IS NOT DISTINCT FROM c.nme");
        assert!(result.reason.contains("c.nme"), "{}", result.reason);
        assert!(!result.reason.contains("invalid tables"));
    }

    #[test]
    fn test_from_inside_trim_is_not_a_table() {
        let result = check("SELECT TRIM(' ' FROM c.name) FROM customers c");
        assert!(result.valid, "{}", result.reason);

        let result = check("SELECT TRIM(' ' FROM name) AS n");
        assert_eq!(result.failure, Some(ValidationFailure::MissingFrom));
    }

    #[test]
    fn test_mssql_bracket_identifiers() {
        let rules = ValidationRules {
            dialect: Dialect::MsSql,
            ..ValidationRules::default()
        };
        let sql = "SELECT TOP 5 [c].[name] FROM [dbo].[customers] [c]";
        let aliases = alias::resolve(sql, Dialect::MsSql);
        let result = validate_with(sql, &aliases, &schema(), &rules);
        assert!(result.valid, "{}", result.reason);
    }

    #[test]
    fn test_column_suggestions_by_substring() {
        let result = check("SELECT c.mail FROM customers c");
        assert_eq!(result.suggestions, vec!["c.email"]);

        let result = check("SELECT c.customer_name FROM customers c");
        assert_eq!(result.suggestions, vec!["c.name"]);
    }

    #[test]
    fn test_triviality() {
        assert_eq!(check("").failure, Some(ValidationFailure::Empty));
        assert!(matches!(check("SELECT 1").failure, Some(ValidationFailure::TooShort { .. })));
        assert_eq!(
            check("no_valid_query_possible").failure,
            Some(ValidationFailure::NoQueryPossible)
        );
        for quoted in ["\"NO_VALID_QUERY_POSSIBLE\"", "'NO_VALID_QUERY_POSSIBLE'", "`NO_VALID_QUERY_POSSIBLE`"] {
            assert_eq!(check(quoted).failure, Some(ValidationFailure::NoQueryPossible), "{}", quoted);
        }

        let long = format!("SELECT name FROM customers WHERE {}", "id = 1 OR ".repeat(200));
        assert!(matches!(check(&long).failure, Some(ValidationFailure::TooLong { .. })));
    }

    #[test]
    fn test_custom_length_rules() {
        let rules = ValidationRules {
            min_length: 1,
            max_length: 20,
            dialect: Dialect::Sqlite,
        };
        let sql = "SELECT name FROM customers";
        let result = validate_with(sql, &resolve(sql), &schema(), &rules);
        assert!(matches!(result.failure, Some(ValidationFailure::TooLong { length: 26, max: 20 })));
    }

    #[test]
    fn test_statement_shape() {
        assert!(matches!(
            check("DROP TABLE customers").failure,
            Some(ValidationFailure::UnsupportedStatement(ref s)) if s == "DROP"
        ));
        assert_eq!(check("SELECT 1 + 1 AS two").failure, Some(ValidationFailure::MissingFrom));
        assert!(matches!(
            check("WITH x AS (SELECT 1) SELECT * FROM x").failure,
            Some(ValidationFailure::UnsupportedStatement(_))
        ));
    }

    #[test]
    fn test_ambiguous_alias() {
        let result = check("SELECT x.id FROM customers x JOIN orders x ON x.id = x.id");
        assert!(matches!(result.failure, Some(ValidationFailure::AmbiguousAlias { .. })));
        assert!(result.reason.contains("customers, orders"));
    }

    #[test]
    fn test_derived_table_columns_are_not_checked() {
        let result = check("SELECT t.anything FROM (SELECT COUNT(*) AS n FROM orders) t");
        assert!(result.valid, "{}", result.reason);
    }

    #[test]
    fn test_derived_table_inner_tables_are_checked() {
        let result = check("SELECT t.n FROM (SELECT COUNT(*) AS n FROM ghosts) t");
        assert!(result.reason.contains("ghosts"));
    }

    #[test]
    fn test_star_on_alias() {
        assert!(check("SELECT c.* FROM customers c").valid);
        let result = check("SELECT z.* FROM customers c");
        assert!(result.reason.contains("z.* (undefined alias)"));
    }

    #[test]
    fn test_reason_empty_iff_valid() {
        for sql in [
            "",
            "SELECT name FROM customers",
            "SELECT * FROM nope_table",
            "SELECT c.nope FROM customers c",
        ] {
            let result = check(sql);
            assert_eq!(result.valid, result.reason.is_empty(), "{}", sql);
        }
    }
}

//! Candidate query normalizer
//!
//! Strips generator artifacts from raw model output and repairs a couple of
//! known formatting defects. Never fails: a pattern that is not present is a
//! no-op.

use regex::Regex;
use std::sync::OnceLock;

/// Phrases a generator likes to put in front of the statement
const PREFIXES: &[&str] = &[
    "here's the sql query:",
    "here is the sql query:",
    "here is the query:",
    "the sql query is:",
    "generated query:",
    "sql query:",
    "sqlquery:",
    "query:",
    "sql:",
];

/// A line containing any of these is commentary
const EXPLANATORY_MARKERS: &[&str] = &["explanation:", "note:", "this query"];

/// A line starting with any of these is commentary
const COMMENTARY_STARTS: &[&str] = &["here is", "here's", "sqlresult:", "answer:"];

static CODE_FENCE: OnceLock<Regex> = OnceLock::new();
static BRACKET_IDENT: OnceLock<Regex> = OnceLock::new();
static LIMIT_SPACING: OnceLock<Regex> = OnceLock::new();

fn code_fence() -> &'static Regex {
    CODE_FENCE.get_or_init(|| {
        Regex::new(r"(?i)```(?:sql|tsql|sqlite|mssql)?").expect("valid code fence regex")
    })
}

fn bracket_ident() -> &'static Regex {
    BRACKET_IDENT
        .get_or_init(|| Regex::new(r"\[([^\[\]\r\n]+)\]").expect("valid bracket regex"))
}

fn limit_spacing() -> &'static Regex {
    LIMIT_SPACING
        .get_or_init(|| Regex::new(r"(?i)\b(top|limit)(\d+)\b").expect("valid limit regex"))
}

/// Normalize raw generator output into a candidate statement
pub fn normalize(raw: &str) -> String {
    let unfenced = code_fence().replace_all(raw, "");
    let stripped = strip_prefixes(&unfenced);

    let kept: Vec<&str> = stripped
        .lines()
        .filter(|line| !is_commentary(line))
        .collect();
    let joined = kept.join("\n");

    let unbracketed = bracket_ident().replace_all(&joined, "$1");
    let spaced = limit_spacing().replace_all(&unbracketed, "${1} ${2}");

    spaced
        .trim_start()
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace())
        .to_string()
}

/// Repeatedly strip known prefatory phrases from the head of the text
fn strip_prefixes(text: &str) -> &str {
    let mut rest = text.trim_start();
    loop {
        let matched = PREFIXES.iter().find(|p| {
            rest.get(..p.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(p))
        });
        let Some(prefix) = matched else {
            return rest;
        };
        rest = rest[prefix.len()..].trim_start();
    }
}

fn is_commentary(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    EXPLANATORY_MARKERS.iter().any(|m| lower.contains(m))
        || COMMENTARY_STARTS.iter().any(|s| lower.starts_with(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_fences_and_prefixes() {
        let raw = "```sql\nSQLQuery: SELECT name FROM customers;\n```";
        assert_eq!(normalize(raw), "SELECT name FROM customers");
    }

    #[test]
    fn test_strips_stacked_prefixes_case_insensitive() {
        assert_eq!(
            normalize("Here is the SQL query:\nquery: select 1 from t"),
            "select 1 from t"
        );
    }

    #[test]
    fn test_drops_explanatory_lines() {
        let raw = "SELECT id\nFROM orders\nExplanation: this selects ids\nNote: none";
        assert_eq!(normalize(raw), "SELECT id\nFROM orders");
    }

    #[test]
    fn test_commentary_start_does_not_hit_identifiers() {
        let raw = "SELECT id FROM flags\nWHERE is_set = 1";
        assert_eq!(normalize(raw), raw);
    }

    #[test]
    fn test_removes_bracket_quoting() {
        assert_eq!(
            normalize("SELECT [Order Id] FROM [dbo].[Orders]"),
            "SELECT Order Id FROM dbo.Orders"
        );
    }

    #[test]
    fn test_repairs_limit_spacing() {
        assert_eq!(normalize("SELECT TOP10 * FROM t"), "SELECT TOP 10 * FROM t");
        assert_eq!(normalize("SELECT * FROM t limit5"), "SELECT * FROM t limit 5");
        assert_eq!(normalize("SELECT stop10 FROM t"), "SELECT stop10 FROM t");
    }

    #[test]
    fn test_trims_terminators() {
        assert_eq!(normalize("  SELECT 1 FROM t ; ;\n\t"), "SELECT 1 FROM t");
    }

    #[test]
    fn test_is_idempotent() {
        let once = normalize("```sql\nQuery: SELECT TOP5 [a] FROM [t];\n```");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_never_fails_on_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("```"), "");
    }
}

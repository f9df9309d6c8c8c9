//! SQL token stream and lexical extraction
//!
//! Everything that pattern-matches SQL text for the validator lives here:
//! table sources after FROM/JOIN/UPDATE/INTO, qualified column references,
//! the leading statement keyword, and top-level row-limit clauses. Tokens
//! come from the `sqlparser` tokenizer for the target dialect, so literals,
//! quoted identifiers and comments never look like table references. This is
//! not a parser: statements are never built into an AST.

use sqlparser::dialect::{MsSqlDialect, SQLiteDialect};
use sqlparser::tokenizer::{Location, Token as SqlToken, Tokenizer, Whitespace};
use std::ops::Range;
use tracing::debug;

use crate::db::Dialect;

/// Token kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword (quoted or not), lowercased
    Word(String),
    /// Numeric literal
    Number(String),
    /// String literal (content not retained)
    Literal,
    Dot,
    Comma,
    Star,
    LParen,
    RParen,
    /// Any other operator or punctuation
    Other(String),
}

/// Token with its byte span in the source text and parenthesis depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
    pub depth: usize,
}

impl Token {
    pub fn is_word(&self, word: &str) -> bool {
        matches!(&self.kind, TokenKind::Word(w) if w == word)
    }

    pub fn word(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Word(w) => Some(w),
            _ => None,
        }
    }
}

/// Words that can never be a table alias
const RESERVED: &[&str] = &[
    "all", "and", "as", "by", "cross", "default", "else", "end", "except", "fetch", "for",
    "from", "full", "group", "having", "inner", "intersect", "into", "join", "left", "limit",
    "natural", "not", "offset", "on", "or", "order", "outer", "output", "returning", "right",
    "select", "set", "then", "top", "union", "using", "values", "when", "where", "window",
    "with",
];

pub fn is_reserved(word: &str) -> bool {
    RESERVED.contains(&word)
}

/// Raw tokenizer output with start positions, whitespace and comments included
///
/// Text the tokenizer rejects (an unterminated literal or comment) yields no
/// tokens at all.
fn raw_tokens(sql: &str, dialect: Dialect) -> Vec<(SqlToken, Location)> {
    let result = match dialect {
        Dialect::Sqlite => Tokenizer::new(&SQLiteDialect {}, sql).tokenize_with_location(),
        Dialect::MsSql => Tokenizer::new(&MsSqlDialect {}, sql).tokenize_with_location(),
    };
    match result {
        Ok(tokens) => tokens
            .into_iter()
            .map(|t| (t.token, t.span.start))
            .collect(),
        Err(err) => {
            debug!(error = %err, dialect = dialect.name(), "SQL text could not be tokenized");
            Vec::new()
        }
    }
}

/// Line/column → byte offset lookup (both 1-based, columns in characters)
struct LineIndex<'a> {
    sql: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(sql: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(sql.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Self { sql, line_starts }
    }

    fn offset(&self, location: &Location) -> usize {
        let line = (location.line as usize).saturating_sub(1);
        let column = (location.column as usize).saturating_sub(1);
        let Some(&start) = self.line_starts.get(line) else {
            return self.sql.len();
        };
        self.sql[start..]
            .char_indices()
            .nth(column)
            .map_or(self.sql.len(), |(idx, _)| start + idx)
    }
}

/// Split SQL into significant tokens (no whitespace or comments)
///
/// Never fails: text the tokenizer rejects yields an empty list, and
/// unbalanced parentheses clamp the depth at zero.
pub fn tokenize(sql: &str, dialect: Dialect) -> Vec<Token> {
    let raw = raw_tokens(sql, dialect);
    let index = LineIndex::new(sql);
    let starts: Vec<usize> = raw.iter().map(|(_, loc)| index.offset(loc)).collect();

    let mut tokens = Vec::new();
    let mut depth = 0usize;
    for (idx, (token, _)) in raw.into_iter().enumerate() {
        let start = starts[idx];
        let end = starts.get(idx + 1).copied().unwrap_or(sql.len());
        let kind = match token {
            SqlToken::Whitespace(_) | SqlToken::EOF => continue,
            SqlToken::Word(word) => TokenKind::Word(word.value.to_lowercase()),
            SqlToken::Number(number, _) => TokenKind::Number(number),
            SqlToken::SingleQuotedString(_)
            | SqlToken::DoubleQuotedString(_)
            | SqlToken::NationalStringLiteral(_)
            | SqlToken::EscapedStringLiteral(_)
            | SqlToken::HexStringLiteral(_) => TokenKind::Literal,
            SqlToken::Period => TokenKind::Dot,
            SqlToken::Comma => TokenKind::Comma,
            SqlToken::Mul => TokenKind::Star,
            SqlToken::LParen => TokenKind::LParen,
            SqlToken::RParen => TokenKind::RParen,
            other => TokenKind::Other(other.to_string()),
        };

        match kind {
            TokenKind::LParen => {
                tokens.push(Token {
                    kind,
                    span: start..end,
                    depth,
                });
                depth += 1;
            }
            TokenKind::RParen => {
                depth = depth.saturating_sub(1);
                tokens.push(Token {
                    kind,
                    span: start..end,
                    depth,
                });
            }
            kind => tokens.push(Token {
                kind,
                span: start..end,
                depth,
            }),
        }
    }

    tokens
}

/// True when the text ends inside a `--` line comment
pub fn ends_in_line_comment(sql: &str, dialect: Dialect) -> bool {
    raw_tokens(sql, dialect)
        .iter()
        .rev()
        .find(|(token, _)| *token != SqlToken::EOF)
        .is_some_and(|(token, _)| {
            matches!(token, SqlToken::Whitespace(Whitespace::SingleLineComment { .. }))
        })
}

/// Leading statement keyword (lowercased), if the text starts with a word
pub fn leading_keyword(sql: &str, dialect: Dialect) -> Option<String> {
    tokenize(sql, dialect).first().and_then(|t| t.word().map(str::to_string))
}

/// True when a source-opening FROM is followed by a table name or subquery
pub fn has_from_clause(sql: &str, dialect: Dialect) -> bool {
    let tokens = tokenize(sql, dialect);
    (0..tokens.len().saturating_sub(1)).any(|idx| {
        opens_source(&tokens, idx)
            && tokens[idx].is_word("from")
            && match &tokens[idx + 1].kind {
                TokenKind::Word(w) => !is_reserved(w),
                TokenKind::LParen => true,
                _ => false,
            }
    })
}

/// Whether the keyword at `idx` starts a table source
///
/// FROM is a source keyword except in `IS [NOT] DISTINCT FROM` and inside a
/// function call such as `TRIM(x FROM y)` or `EXTRACT(YEAR FROM d)`: a FROM
/// nested in parentheses only counts when a SELECT precedes it in the same
/// group.
fn opens_source(tokens: &[Token], idx: usize) -> bool {
    match tokens[idx].word() {
        Some("join") | Some("update") => true,
        Some("into") => idx > 0 && tokens[idx - 1].is_word("insert"),
        Some("from") => {
            if idx > 0 && tokens[idx - 1].is_word("distinct") {
                return false;
            }
            let depth = tokens[idx].depth;
            if depth == 0 {
                return true;
            }
            for token in tokens[..idx].iter().rev() {
                if token.depth < depth {
                    // the enclosing '('
                    return false;
                }
                if token.depth == depth && token.is_word("select") {
                    return true;
                }
            }
            false
        }
        _ => false,
    }
}

/// One table source found after FROM/JOIN/UPDATE/INTO
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// A named table; `table` is the lowercased last segment of a dotted name
    Table { table: String, alias: Option<String> },
    /// A parenthesised subquery with an alias
    Derived { alias: String },
}

/// A `qualifier.column` reference (both lowercased; column may be `*`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedColumn {
    pub qualifier: String,
    pub column: String,
}

impl std::fmt::Display for QualifiedColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.qualifier, self.column)
    }
}

/// Result of one lexical scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub sources: Vec<SourceRef>,
    pub columns: Vec<QualifiedColumn>,
}

/// Extract table sources and qualified column references
pub fn extract(sql: &str, dialect: Dialect) -> Extraction {
    let tokens = tokenize(sql, dialect);
    let mut consumed = vec![false; tokens.len()];
    let mut sources = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        if !opens_source(&tokens, i) {
            i += 1;
            continue;
        }

        // FROM a, b, c: keep reading comma-separated sources
        let allow_list = tokens[i].is_word("from");
        let insert_target = tokens[i].is_word("into");
        let mut pos = i + 1;
        loop {
            let Some((source, next)) = parse_source(&tokens, pos, insert_target, &mut consumed)
            else {
                break;
            };
            if let Some(source) = source {
                sources.push(source);
            }
            pos = next;
            if allow_list && tokens.get(pos).map(|t| &t.kind) == Some(&TokenKind::Comma) {
                pos += 1;
                continue;
            }
            break;
        }
        i += 1;
    }

    let columns = qualified_columns(&tokens, &consumed);
    Extraction { sources, columns }
}

/// Parse one source at `pos`. Returns the source (None for an unaliased
/// subquery) and the position after it, or None when nothing parseable
/// starts there.
fn parse_source(
    tokens: &[Token],
    pos: usize,
    insert_target: bool,
    consumed: &mut [bool],
) -> Option<(Option<SourceRef>, usize)> {
    let first = tokens.get(pos)?;

    if first.kind == TokenKind::LParen {
        let close = matching_paren(tokens, pos)?;
        let (alias, next) = parse_alias(tokens, close + 1);
        return Some((alias.map(|alias| SourceRef::Derived { alias }), next));
    }

    let name = first.word().filter(|w| !is_reserved(w))?;
    let mut last = name.to_string();
    let mut end = pos + 1;
    consumed[pos] = true;

    // schema.table or db.schema.table
    while tokens.get(end).map(|t| &t.kind) == Some(&TokenKind::Dot) {
        match tokens.get(end + 1).and_then(Token::word) {
            Some(segment) => {
                consumed[end] = true;
                consumed[end + 1] = true;
                last = segment.to_string();
                end += 2;
            }
            None => break,
        }
    }

    if tokens.get(end).map(|t| &t.kind) == Some(&TokenKind::LParen) {
        // INSERT INTO t (columns...)
        if insert_target {
            return Some((Some(SourceRef::Table { table: last, alias: None }), end));
        }
        // Table-valued function, not a table
        return Some((None, end));
    }

    let (alias, next) = parse_alias(tokens, end);
    Some((Some(SourceRef::Table { table: last, alias }), next))
}

/// Optional `[AS] alias` at `pos`
fn parse_alias(tokens: &[Token], pos: usize) -> (Option<String>, usize) {
    let mut pos = pos;
    let explicit = tokens.get(pos).is_some_and(|t| t.is_word("as"));
    if explicit {
        pos += 1;
    }
    match tokens.get(pos).and_then(Token::word) {
        Some(word) if !is_reserved(word) => (Some(word.to_string()), pos + 1),
        _ => (None, pos),
    }
}

fn matching_paren(tokens: &[Token], open: usize) -> Option<usize> {
    let depth = tokens[open].depth;
    tokens
        .iter()
        .enumerate()
        .skip(open + 1)
        .find(|(_, t)| t.kind == TokenKind::RParen && t.depth == depth)
        .map(|(idx, _)| idx)
}

/// Dotted chains not consumed as table names; the last two segments form
/// `qualifier.column`. Chains followed by `(` are function calls.
fn qualified_columns(tokens: &[Token], consumed: &[bool]) -> Vec<QualifiedColumn> {
    let mut columns: Vec<QualifiedColumn> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        if consumed[i] || tokens[i].word().is_none() {
            i += 1;
            continue;
        }

        let mut segments = vec![tokens[i].word().unwrap_or_default().to_string()];
        let mut end = i + 1;
        while tokens.get(end).map(|t| &t.kind) == Some(&TokenKind::Dot) {
            match tokens.get(end + 1).map(|t| &t.kind) {
                Some(TokenKind::Word(w)) => segments.push(w.clone()),
                Some(TokenKind::Star) => segments.push("*".to_string()),
                _ => break,
            }
            end += 2;
        }

        let is_call = tokens.get(end).map(|t| &t.kind) == Some(&TokenKind::LParen);
        if segments.len() >= 2 && !is_call {
            let column = segments[segments.len() - 1].clone();
            let qualifier = segments[segments.len() - 2].clone();
            let reference = QualifiedColumn { qualifier, column };
            if !columns.contains(&reference) {
                columns.push(reference);
            }
        }
        i = end.max(i + 1);
    }

    columns
}

/// Kinds of row-limit clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitClause {
    /// `SELECT [DISTINCT] TOP n`
    Top,
    /// `LIMIT n`
    Limit,
    /// `FETCH FIRST|NEXT n ROWS`
    Fetch,
}

/// Row-limit clauses at parenthesis depth zero
pub fn top_level_limits(sql: &str, dialect: Dialect) -> Vec<LimitClause> {
    let tokens = tokenize(sql, dialect);
    let mut found = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        if token.depth != 0 {
            continue;
        }
        let next = tokens.get(idx + 1).map(|t| &t.kind);
        match token.word() {
            Some("top") => {
                let prev = idx.checked_sub(1).and_then(|p| tokens[p].word());
                if matches!(prev, Some("select") | Some("distinct") | Some("all")) {
                    found.push(LimitClause::Top);
                }
            }
            Some("limit") if matches!(next, Some(TokenKind::Number(_))) => {
                found.push(LimitClause::Limit)
            }
            Some("fetch") => {
                if matches!(next, Some(TokenKind::Word(w)) if w == "first" || w == "next") {
                    found.push(LimitClause::Fetch);
                }
            }
            _ => {}
        }
    }

    found
}

/// Byte offset just after the top-level `SELECT [DISTINCT|ALL]` keyword(s)
pub fn select_list_start(sql: &str, dialect: Dialect) -> Option<usize> {
    let tokens = tokenize(sql, dialect);
    let select = tokens.first().filter(|t| t.is_word("select"))?;
    match tokens.get(1) {
        Some(t) if t.is_word("distinct") || t.is_word("all") => Some(t.span.end),
        _ => Some(select.span.end),
    }
}

//! Relational database collaborator
//!
//! The pipeline only needs two things from a database: catalog metadata for
//! the schema snapshot, and statement execution with a cursor-style result
//! descriptor. Both live behind the `Database` trait so tests and hosts can
//! supply their own engine.
//!
//! - `sqlite.rs`: `SqliteDatabase`, a rusqlite-backed implementation

pub mod sqlite;

pub use sqlite::SqliteDatabase;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Database errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DbError {
    /// Database cannot be reached or opened
    #[error("{0}")]
    Connection(String),

    /// Engine rejected the statement (prepare or step failure)
    #[error("{0}")]
    Statement(String),
}

/// SQL dialect, which decides how row limits are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `SELECT ... LIMIT n`
    #[default]
    Sqlite,
    /// `SELECT TOP n ...`
    MsSql,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::MsSql => "mssql",
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Dialect::Sqlite),
            "mssql" | "sqlserver" | "tsql" => Ok(Dialect::MsSql),
            other => Err(format!("Unsupported dialect: {}", other)),
        }
    }
}

/// Raw catalog metadata, exactly as introspected
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub tables: Vec<CatalogTable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTable {
    pub name: String,
    pub is_view: bool,
    pub columns: Vec<CatalogColumn>,
    pub foreign_keys: Vec<CatalogForeignKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogColumn {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

/// Declared foreign key (`column` on the owning table)
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogForeignKey {
    pub column: String,
    pub target_table: String,
    pub target_column: String,
}

/// One row as the driver (or a host) hands it over
#[derive(Debug, Clone, PartialEq)]
pub enum RawRow {
    /// Already field → value shaped
    Record(Vec<(String, Value)>),
    /// Positional values, to be zipped with the column descriptor
    Positional(Vec<Value>),
    /// A single bare value (including textual fallbacks)
    Scalar(Value),
}

/// Result of one statement: column descriptor plus raw rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
    /// True when more rows were available than `max_rows`
    pub truncated: bool,
}

/// Database collaborator
///
/// Implementations open a scoped connection per call and release it on
/// every exit path.
pub trait Database: Send + Sync {
    /// Dialect used for row-limit injection
    fn dialect(&self) -> Dialect;

    /// Read table/column/foreign-key catalogs
    fn introspect(&self) -> Result<Catalog, DbError>;

    /// Execute one statement, collecting at most `max_rows` rows
    fn execute(&self, sql: &str, max_rows: usize) -> Result<RawResultSet, DbError>;
}

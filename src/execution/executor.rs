//! Bounded executor
//!
//! Runs a validated statement with a row ceiling: the limit clause is
//! injected into the text when absent, and the driver stops fetching at the
//! same bound either way.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::{Database, DbError, Dialect};
use crate::execution::results::{normalize_rows, ExecutionRecord};
use crate::query::apply_row_limit;

/// Successful execution
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Statement text as sent to the engine (limit injected)
    pub executed_sql: String,
    pub columns: Vec<String>,
    pub records: Vec<ExecutionRecord>,
    /// More rows were available than the limit allowed
    pub truncated: bool,
}

/// Executes validated statements against the database collaborator
#[derive(Clone)]
pub struct BoundedExecutor {
    database: Arc<dyn Database>,
}

impl BoundedExecutor {
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self { database }
    }

    pub fn dialect(&self) -> Dialect {
        self.database.dialect()
    }

    /// The statement that would be sent for `validated_query`
    pub fn prepare(&self, validated_query: &str, row_limit: usize) -> String {
        apply_row_limit(validated_query, row_limit, self.database.dialect())
    }

    /// Execute `validated_query`, returning at most `row_limit` records
    ///
    /// # Returns
    /// * `Err(DbError::Connection)` - database unreachable
    /// * `Err(DbError::Statement)` - engine rejected the statement
    pub fn execute(&self, validated_query: &str, row_limit: usize) -> Result<Execution, DbError> {
        let executed_sql = self.prepare(validated_query, row_limit);
        debug!(sql = %executed_sql, row_limit, "executing statement");

        let raw = self
            .database
            .execute(&executed_sql, row_limit)
            .map_err(|err| {
                warn!(error = %err, "statement execution failed");
                err
            })?;

        let records = normalize_rows(raw.rows, &raw.columns);
        debug!(rows = records.len(), truncated = raw.truncated, "statement executed");

        Ok(Execution {
            executed_sql,
            columns: raw.columns,
            records,
            truncated: raw.truncated,
        })
    }
}

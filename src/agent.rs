//! SqlAgent: question in, `AgentResponse` out
//!
//! Holds the long-lived collaborators (database, generator, summarizer) and
//! the schema snapshot. Per call:
//!
//! candidate → normalize → resolve aliases → validate → execute (bounded)
//! → normalize rows → assemble response
//!
//! `query` and `execute_raw` never fail; every failure is encoded in the
//! returned response. Only construction can fail.

use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{AgentConfig, AgentSettings, LlmProvider};
use crate::db::{Database, DbError, Dialect, SqliteDatabase};
use crate::error::AgentError;
use crate::execution::BoundedExecutor;
use crate::llm::{
    create_adapter, GenerationRequest, LlmAdapter, LlmSqlGenerator, LlmSummarizer, SqlGenerator,
    Summarizer,
};
use crate::query::{normalize, resolve, validate_with, ValidationResult};
use crate::response::{AgentResponse, ResponseAssembler};
use crate::schema::{load_schema, SchemaSnapshot};

/// Static check of one candidate, without execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryCheck {
    /// Candidate after normalization
    pub query: String,
    pub tables_used: Vec<String>,
    #[serde(flatten)]
    pub result: ValidationResult,
}

pub struct SqlAgent {
    database: Arc<dyn Database>,
    executor: BoundedExecutor,
    generator: Option<Box<dyn SqlGenerator>>,
    assembler: ResponseAssembler,
    schema: ArcSwap<SchemaSnapshot>,
    settings: AgentSettings,
}

impl SqlAgent {
    /// Build an agent and load the schema snapshot once
    ///
    /// # Returns
    /// * `Err(AgentError::Configuration)` - invalid settings
    /// * `Err(AgentError::Connection)` - database unreachable during introspection
    pub fn new(
        settings: AgentSettings,
        database: Arc<dyn Database>,
        generator: Option<Box<dyn SqlGenerator>>,
        summarizer: Option<Box<dyn Summarizer>>,
    ) -> Result<Self, AgentError> {
        if settings.row_limit == 0 {
            return Err(AgentError::Configuration(
                "row_limit must be positive".to_string(),
            ));
        }

        let snapshot = load_schema(database.as_ref()).map_err(connection_error)?;
        info!(
            tables = snapshot.table_count(),
            dialect = database.dialect().name(),
            generator = generator.is_some(),
            summarizer = summarizer.is_some(),
            "agent ready"
        );

        let mut assembler =
            ResponseAssembler::new(settings.value_char_budget).verbose_errors(settings.verbose_errors);
        if let Some(summarizer) = summarizer {
            assembler = assembler.with_summarizer(summarizer);
        }

        Ok(Self {
            executor: BoundedExecutor::new(database.clone()),
            database,
            generator,
            assembler,
            schema: ArcSwap::from_pointee(snapshot),
            settings,
        })
    }

    /// Validate config, open the SQLite database, and build LLM collaborators
    pub fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        config.validate()?;

        if config.database.dialect != Dialect::Sqlite {
            return Err(AgentError::Configuration(format!(
                "no built-in driver for dialect '{}'; use SqlAgent::new with a Database implementation",
                config.database.dialect.name()
            )));
        }
        let database = Arc::new(
            SqliteDatabase::new(&config.database.path).read_only(config.database.read_only),
        );

        let (generator, summarizer): (Option<Box<dyn SqlGenerator>>, Option<Box<dyn Summarizer>>) =
            match config.llm.provider {
                LlmProvider::Disabled => (None, None),
                _ => {
                    let adapter: Arc<dyn LlmAdapter> = Arc::new(create_adapter(&config.llm)?);
                    let summarizer = config
                        .agent
                        .summarize
                        .then(|| Box::new(LlmSummarizer::new(adapter.clone())) as Box<dyn Summarizer>);
                    let generator =
                        Box::new(LlmSqlGenerator::new(adapter)) as Box<dyn SqlGenerator>;
                    (Some(generator), summarizer)
                }
            };

        Self::new(config.agent.clone(), database, generator, summarizer)
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Answer a natural-language question
    ///
    /// `row_limit` defaults to the configured limit.
    pub fn query(&self, question: &str, row_limit: Option<usize>) -> AgentResponse {
        let limit = row_limit.unwrap_or(self.settings.row_limit);
        info!(question, limit, "processing question");

        if question.trim().is_empty() {
            return self.reject(question, AgentError::validation("Question is empty"));
        }
        if limit == 0 {
            return self.reject(question, AgentError::validation("Row limit must be positive"));
        }
        let Some(generator) = &self.generator else {
            return self.reject(
                question,
                AgentError::Configuration("SQL generation is disabled".to_string()),
            );
        };

        let schema = self.schema.load_full();
        let description = schema.describe(self.settings.schema_table_limit);
        let request = GenerationRequest {
            question,
            schema_description: &description,
            row_limit: limit,
            dialect: self.database.dialect(),
        };

        match generator.generate(&request) {
            Ok(raw) => self.run_candidate(question, &raw, limit, &schema, false),
            Err(err) => {
                warn!(error = %err, "SQL generation failed");
                self.reject(question, err)
            }
        }
    }

    /// Validate and execute SQL directly, skipping generation
    pub fn execute_raw(&self, sql: &str) -> AgentResponse {
        let question = format!("Direct SQL execution: {}", sql);
        let schema = self.schema.load_full();
        self.run_candidate(&question, sql, self.settings.row_limit, &schema, true)
    }

    /// `query` as pretty-printed JSON
    pub fn query_json(&self, question: &str, row_limit: Option<usize>) -> String {
        self.query(question, row_limit).to_json_pretty()
    }

    /// Normalize and validate without executing
    pub fn check(&self, sql: &str) -> QueryCheck {
        let schema = self.schema.load_full();
        let dialect = self.database.dialect();
        let query = normalize(sql);
        let aliases = resolve(&query, dialect);
        let result = validate_with(&query, &aliases, &schema, &self.settings.validation_rules(dialect));
        QueryCheck {
            tables_used: if result.valid {
                aliases.tables().to_vec()
            } else {
                Vec::new()
            },
            query,
            result,
        }
    }

    /// Current schema snapshot
    pub fn schema(&self) -> Arc<SchemaSnapshot> {
        self.schema.load_full()
    }

    /// Re-introspect and swap in a fresh snapshot
    ///
    /// Callers holding the previous `Arc` keep a consistent view.
    pub fn reload_schema(&self) -> Result<Arc<SchemaSnapshot>, AgentError> {
        let snapshot = Arc::new(load_schema(self.database.as_ref()).map_err(connection_error)?);
        self.schema.store(snapshot.clone());
        info!(tables = snapshot.table_count(), "schema snapshot reloaded");
        Ok(snapshot)
    }

    /// Schema description text, as sent to the generator
    pub fn table_info(&self, limit_tables: Option<usize>) -> String {
        self.schema()
            .describe(limit_tables.or(self.settings.schema_table_limit))
    }

    /// Check the database is reachable
    pub fn test_connection(&self) -> Result<(), AgentError> {
        self.database
            .introspect()
            .map(|_| ())
            .map_err(connection_error)
    }

    /// `direct` marks caller-supplied SQL (`execute_raw`)
    fn run_candidate(
        &self,
        question: &str,
        raw_sql: &str,
        limit: usize,
        schema: &SchemaSnapshot,
        direct: bool,
    ) -> AgentResponse {
        let dialect = self.database.dialect();
        let sql = normalize(raw_sql);
        debug!(raw = %raw_sql, normalized = %sql, "candidate normalized");

        let aliases = resolve(&sql, dialect);
        let validation =
            validate_with(&sql, &aliases, schema, &self.settings.validation_rules(dialect));
        if !validation.valid {
            info!(reason = %validation.reason, direct, "candidate rejected");
            let err = AgentError::Validation {
                reason: validation.reason,
                suggestions: validation.suggestions,
            };
            return if direct {
                self.assembler.direct_failure(question, &sql, &err, Vec::new())
            } else {
                self.assembler.failure(question, &sql, &err, Vec::new())
            };
        }

        let tables_used = aliases.tables().to_vec();
        let mut truncated = false;
        let outcome = self
            .executor
            .execute(&sql, limit)
            .map(|execution| {
                let mut records = execution.records;
                truncated = execution.truncated || records.len() > limit;
                records.truncate(limit);
                records
            })
            .map_err(AgentError::from);

        let mut response = match outcome {
            Err(err) if direct => self.assembler.direct_failure(question, &sql, &err, tables_used),
            outcome => self.assembler.assemble(question, &sql, outcome, tables_used),
        };
        response.truncated = truncated;
        response
    }

    fn reject(&self, question: &str, err: AgentError) -> AgentResponse {
        self.assembler.failure(question, "", &err, Vec::new())
    }
}

/// Any failure while introspecting means the database is unreachable
fn connection_error(err: DbError) -> AgentError {
    match err {
        DbError::Connection(msg) | DbError::Statement(msg) => AgentError::Connection(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Catalog, CatalogColumn, CatalogTable, RawResultSet, RawRow};
    use crate::error::ErrorKind;
    use serde_json::json;
    use std::sync::Mutex;

    /// customers(id, name, email); replies to every statement with `reply`
    struct Scripted {
        reply: Result<RawResultSet, DbError>,
        executed: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(reply: Result<RawResultSet, DbError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                executed: Mutex::new(Vec::new()),
            })
        }
    }

    impl Database for Scripted {
        fn dialect(&self) -> Dialect {
            Dialect::MsSql
        }

        fn introspect(&self) -> Result<Catalog, DbError> {
            let column = |name: &str| CatalogColumn {
                name: name.to_string(),
                data_type: "TEXT".to_string(),
                nullable: name != "id",
                primary_key: name == "id",
            };
            Ok(Catalog {
                tables: vec![CatalogTable {
                    name: "customers".to_string(),
                    is_view: false,
                    columns: vec![column("id"), column("name"), column("email")],
                    foreign_keys: vec![],
                }],
            })
        }

        fn execute(&self, sql: &str, _max_rows: usize) -> Result<RawResultSet, DbError> {
            self.executed.lock().unwrap().push(sql.to_string());
            self.reply.clone()
        }
    }

    fn john_doe() -> Result<RawResultSet, DbError> {
        Ok(RawResultSet {
            columns: vec!["name".to_string()],
            rows: vec![RawRow::Positional(vec![json!("John Doe")])],
            truncated: false,
        })
    }

    fn agent_with(db: Arc<Scripted>, candidate: &'static str) -> SqlAgent {
        let generator =
            move |_req: &GenerationRequest<'_>| Ok::<_, AgentError>(candidate.to_string());
        SqlAgent::new(AgentSettings::default(), db, Some(Box::new(generator)), None).unwrap()
    }

    #[test]
    fn test_query_success() {
        let db = Scripted::new(john_doe());
        let agent = agent_with(db.clone(), "SELECT name FROM customers WHERE id = 1");

        let response = agent.query("What is the name of customer 1?", None);
        assert!(response.is_success());
        assert_eq!(serde_json::to_value(&response.records).unwrap(), json!([{"name": "John Doe"}]));
        assert_eq!(response.tables_used, vec!["customers"]);
        assert_eq!(
            db.executed.lock().unwrap().as_slice(),
            ["SELECT TOP 10 name FROM customers WHERE id = 1"]
        );
    }

    #[test]
    fn test_invalid_table_never_executes() {
        let db = Scripted::new(john_doe());
        let agent = agent_with(db.clone(), "SELECT * FROM nonexistent_table");

        let response = agent.query("q", None);
        assert!(response.is_error());
        assert!(response.records.is_empty());
        assert!(response.error_details.unwrap().contains("nonexistent_table"));
        assert!(db.executed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_question_and_zero_limit_are_validation_errors() {
        let db = Scripted::new(john_doe());
        let agent = SqlAgent::new(
            AgentSettings::default(),
            db,
            Some(Box::new(|_req: &GenerationRequest<'_>| -> Result<String, AgentError> {
                panic!("generator must not be called")
            })),
            None,
        )
        .unwrap();

        let response = agent.query("   ", None);
        assert_eq!(response.error_kind, Some(ErrorKind::ValidationError));

        let response = agent.query("list customers", Some(0));
        assert_eq!(response.error_kind, Some(ErrorKind::ValidationError));
    }

    #[test]
    fn test_generator_failure() {
        let db = Scripted::new(john_doe());
        let generator = |_req: &GenerationRequest<'_>| {
            Err::<String, _>(AgentError::Generation("timeout".to_string()))
        };
        let agent =
            SqlAgent::new(AgentSettings::default(), db, Some(Box::new(generator)), None).unwrap();

        let response = agent.query("q", None);
        assert_eq!(response.error_kind, Some(ErrorKind::GenerationError));
        assert!(response.records.is_empty());
    }

    #[test]
    fn test_no_generator_is_configuration_error() {
        let agent = SqlAgent::new(AgentSettings::default(), Scripted::new(john_doe()), None, None)
            .unwrap();
        let response = agent.query("q", None);
        assert_eq!(response.error_kind, Some(ErrorKind::ConfigurationError));

        // execute_raw still works without a generator
        let response = agent.execute_raw("SELECT name FROM customers");
        assert!(response.is_success());
        assert_eq!(response.question, "Direct SQL execution: SELECT name FROM customers");
    }

    #[test]
    fn test_execute_raw_rejection_says_invalid_sql() {
        let db = Scripted::new(john_doe());
        let agent = agent_with(db.clone(), "unused");

        let response = agent.execute_raw("SELECT * FROM customer");
        assert_eq!(response.error_kind, Some(ErrorKind::ValidationError));
        assert_eq!(
            response.natural_language_response,
            "Invalid SQL: Query references invalid tables: customer Did you mean: customers?"
        );
        assert!(db.executed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_execution_error_keeps_tables() {
        let db = Scripted::new(Err(DbError::Statement("Invalid column name 'x'".to_string())));
        let agent = agent_with(db, "SELECT name FROM customers");

        let response = agent.query("q", Some(3));
        assert_eq!(response.error_kind, Some(ErrorKind::ExecutionError));
        assert_eq!(response.tables_used, vec!["customers"]);
        assert_eq!(response.error_details.as_deref(), Some("Invalid column name 'x'"));
    }

    #[test]
    fn test_records_truncated_to_limit() {
        let db = Scripted::new(Ok(RawResultSet {
            columns: vec!["rows_affected".to_string()],
            rows: vec![RawRow::Scalar(json!(1)), RawRow::Scalar(json!(2)), RawRow::Scalar(json!(3))],
            truncated: false,
        }));
        let agent = agent_with(db, "SELECT name FROM customers");

        let response = agent.query("q", Some(2));
        assert_eq!(response.records.len(), 2);
        assert!(response.truncated);
    }

    #[test]
    fn test_zero_row_limit_rejected_at_construction() {
        let settings = AgentSettings {
            row_limit: 0,
            ..AgentSettings::default()
        };
        let result = SqlAgent::new(settings, Scripted::new(john_doe()), None, None);
        assert!(matches!(result, Err(AgentError::Configuration(_))));
    }

    #[test]
    fn test_check_reports_without_executing() {
        let db = Scripted::new(john_doe());
        let agent = agent_with(db.clone(), "unused");

        let check = agent.check("```sql\nSELECT c.name FROM customers o;\n```");
        assert_eq!(check.query, "SELECT c.name FROM customers o");
        assert!(!check.result.valid);
        assert!(check.result.reason.contains("c.name (undefined alias)"));
        assert!(check.tables_used.is_empty());
        assert!(db.executed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_table_info_and_reload() {
        let agent = agent_with(Scripted::new(john_doe()), "unused");
        assert!(agent.table_info(None).contains("CREATE TABLE customers"));

        let before = agent.schema();
        let after = agent.reload_schema().unwrap();
        assert_eq!(*before, *after);
        assert!(!Arc::ptr_eq(&before, &agent.schema()));
        agent.test_connection().unwrap();
    }
}

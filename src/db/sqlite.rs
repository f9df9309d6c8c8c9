//! SQLite database: catalog introspection and statement execution
//!
//! Opens a fresh connection for every call. The connection is dropped when
//! the call returns, whether it succeeded or not.

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::db::{
    Catalog, CatalogColumn, CatalogForeignKey, CatalogTable, Database, DbError, Dialect,
    RawResultSet, RawRow,
};

/// SQLite database handle (path only; connections are per call)
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    path: PathBuf,
    read_only: bool,
}

impl SqliteDatabase {
    /// Create handle for an existing database file
    ///
    /// Does not touch the file; reachability is checked on first use.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            read_only: false,
        }
    }

    /// Open connections read-only (writes fail at execution time)
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a scoped connection. Never creates the file.
    fn connect(&self) -> Result<Connection, DbError> {
        if !self.path.exists() {
            return Err(DbError::Connection(format!(
                "database not found at {}",
                self.path.display()
            )));
        }

        let access = if self.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE
        };

        Connection::open_with_flags(&self.path, access | OpenFlags::SQLITE_OPEN_NO_MUTEX).map_err(
            |e| {
                DbError::Connection(format!(
                    "failed to open {}: {}",
                    self.path.display(),
                    e
                ))
            },
        )
    }

    fn list_tables(conn: &Connection) -> rusqlite::Result<Vec<(String, bool)>> {
        let mut stmt = conn.prepare(
            "SELECT name, type FROM sqlite_master
             WHERE type IN ('table', 'view')
               AND name NOT LIKE 'sqlite_%'
             ORDER BY name ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let name: String = row.get(0)?;
                let kind: String = row.get(1)?;
                Ok((name, kind == "view"))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<CatalogColumn>> {
        let mut stmt = conn.prepare(
            "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid ASC",
        )?;

        let rows = stmt
            .query_map([table], |row| {
                let not_null: i64 = row.get(2)?;
                let pk: i64 = row.get(3)?;
                Ok(CatalogColumn {
                    name: row.get(0)?,
                    data_type: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    nullable: not_null == 0 && pk == 0,
                    primary_key: pk > 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn table_foreign_keys(
        conn: &Connection,
        table: &str,
    ) -> rusqlite::Result<Vec<(String, String, Option<String>)>> {
        let mut stmt = conn.prepare(
            "SELECT \"table\", \"from\", \"to\" FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
        )?;

        let rows = stmt
            .query_map([table], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

impl Database for SqliteDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn introspect(&self) -> Result<Catalog, DbError> {
        let conn = self.connect()?;
        let introspection_err = |e: rusqlite::Error| {
            DbError::Connection(format!("schema introspection failed: {}", e))
        };

        let mut tables = Vec::new();
        for (name, is_view) in Self::list_tables(&conn).map_err(introspection_err)? {
            let columns = Self::table_columns(&conn, &name).map_err(introspection_err)?;
            // Implicit target columns are resolved below, once every primary key is known
            let foreign_keys = Self::table_foreign_keys(&conn, &name)
                .map_err(introspection_err)?
                .into_iter()
                .map(unresolved_fk)
                .collect();
            tables.push(CatalogTable {
                name,
                is_view,
                columns,
                foreign_keys,
            });
        }

        resolve_implicit_targets(&mut tables);
        debug!(tables = tables.len(), path = %self.path.display(), "introspected sqlite catalog");

        Ok(Catalog { tables })
    }

    fn execute(&self, sql: &str, max_rows: usize) -> Result<RawResultSet, DbError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DbError::Statement(e.to_string()))?;

        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        if columns.is_empty() {
            let affected = stmt
                .execute([])
                .map_err(|e| DbError::Statement(e.to_string()))?;
            return Ok(RawResultSet {
                columns: vec!["rows_affected".to_string()],
                rows: vec![RawRow::Record(vec![(
                    "rows_affected".to_string(),
                    Value::from(affected as u64),
                )])],
                truncated: false,
            });
        }

        let mut rows = stmt
            .query([])
            .map_err(|e| DbError::Statement(e.to_string()))?;

        let mut out = Vec::new();
        let mut truncated = false;
        while let Some(row) = rows.next().map_err(|e| DbError::Statement(e.to_string()))? {
            if out.len() >= max_rows {
                truncated = true;
                break;
            }
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                let value = row
                    .get_ref(idx)
                    .map_err(|e| DbError::Statement(e.to_string()))?;
                values.push(json_value(value));
            }
            out.push(RawRow::Positional(values));
        }

        Ok(RawResultSet {
            columns,
            rows: out,
            truncated,
        })
    }
}

/// Foreign key whose target column may still be implicit (NULL `to`)
fn unresolved_fk(
    (target_table, column, target_column): (String, String, Option<String>),
) -> CatalogForeignKey {
    CatalogForeignKey {
        column,
        target_table,
        target_column: target_column.unwrap_or_default(),
    }
}

/// `REFERENCES t` without a column list points at t's primary key
fn resolve_implicit_targets(tables: &mut [CatalogTable]) {
    let primary_keys: Vec<(String, String)> = tables
        .iter()
        .filter_map(|t| {
            t.columns
                .iter()
                .find(|c| c.primary_key)
                .map(|c| (t.name.to_lowercase(), c.name.clone()))
        })
        .collect();

    for table in tables.iter_mut() {
        for fk in table.foreign_keys.iter_mut().filter(|fk| fk.target_column.is_empty()) {
            let target = fk.target_table.to_lowercase();
            if let Some((_, pk)) = primary_keys.iter().find(|(t, _)| *t == target) {
                fk.target_column = pk.clone();
            }
        }
    }
}

/// Convert a SQLite value to JSON
fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
            Value::String(format!("x'{}'", hex))
        }
    }
}

//! Immutable schema model
//!
//! Built once by the loader and shared read-only afterwards. Table and
//! column keys are lowercased; the original spelling is kept for display.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

/// One column, derived solely from catalog metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

/// One table (or view)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Original-case name
    pub name: String,
    pub is_view: bool,
    /// Lowercased column name → column, in declaration order
    columns: Vec<(String, ColumnInfo)>,
}

impl TableInfo {
    pub fn new(name: impl Into<String>, is_view: bool) -> Self {
        Self {
            name: name.into(),
            is_view,
            columns: Vec::new(),
        }
    }

    /// Add a column. Returns false (and keeps the first) on a case-insensitive duplicate.
    pub fn add_column(&mut self, column: ColumnInfo) -> bool {
        let key = column.name.to_lowercase();
        if self.columns.iter().any(|(k, _)| *k == key) {
            return false;
        }
        self.columns.push((key, column));
        true
    }

    /// Case-insensitive column lookup
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        let key = name.to_lowercase();
        self.columns.iter().find(|(k, _)| *k == key).map(|(_, c)| c)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Columns in declaration order
    pub fn columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().map(|(_, c)| c)
    }

    /// Lowercased column names in declaration order
    pub fn column_keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }

    /// Primary key columns in declaration order
    pub fn primary_key(&self) -> Vec<&ColumnInfo> {
        self.columns().filter(|c| c.primary_key).collect()
    }
}

/// Foreign-key edge, declared or inferred
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    /// Guessed from naming conventions; advisory only
    pub inferred: bool,
}

/// Immutable view of the target database's structure at load time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    tables: BTreeMap<String, TableInfo>,
    relationships: Vec<Relationship>,
}

impl SchemaSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table. Returns false (and keeps the first) on a case-insensitive duplicate.
    pub fn add_table(&mut self, table: TableInfo) -> bool {
        let key = table.name.to_lowercase();
        if self.tables.contains_key(&key) {
            return false;
        }
        self.tables.insert(key, table);
        true
    }

    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    /// Case-insensitive table lookup
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.get(&name.to_lowercase())
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// Tables ordered by canonical (lowercased) name
    pub fn tables(&self) -> impl Iterator<Item = &TableInfo> {
        self.tables.values()
    }

    /// Canonical (lowercased) table names, sorted
    pub fn table_keys(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|k| k.as_str())
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Declared foreign keys only
    pub fn declared_relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter().filter(|r| !r.inferred)
    }

    /// Render the schema as `CREATE TABLE`-style text for the SQL generator
    ///
    /// Declared foreign keys appear as constraints; inferred relationships
    /// appear only as comment hints. With `limit_tables`, output stops after
    /// that many tables and ends with a truncation marker.
    pub fn describe(&self, limit_tables: Option<usize>) -> String {
        let mut out = String::new();

        for (idx, (key, table)) in self.tables.iter().enumerate() {
            if limit_tables.is_some_and(|limit| idx >= limit) {
                out.push_str("... (schema truncated)\n");
                return out;
            }

            let keyword = if table.is_view { "VIEW" } else { "TABLE" };
            let _ = writeln!(out, "CREATE {} {} (", keyword, table.name);

            let mut lines: Vec<String> = table
                .columns()
                .map(|c| {
                    let mut line = format!("    {} {}", c.name, c.data_type);
                    if c.primary_key {
                        line.push_str(" PRIMARY KEY");
                    } else if !c.nullable {
                        line.push_str(" NOT NULL");
                    }
                    line.trim_end().to_string()
                })
                .collect();

            for rel in self
                .declared_relationships()
                .filter(|r| r.source_table.eq_ignore_ascii_case(key))
            {
                lines.push(format!(
                    "    FOREIGN KEY ({}) REFERENCES {} ({})",
                    rel.source_column, rel.target_table, rel.target_column
                ));
            }

            let _ = writeln!(out, "{}", lines.join(",\n"));
            out.push_str(")\n");

            for rel in self
                .relationships
                .iter()
                .filter(|r| r.inferred && r.source_table.eq_ignore_ascii_case(key))
            {
                let _ = writeln!(
                    out,
                    "-- likely join: {}.{} -> {}.{} (inferred)",
                    rel.source_table, rel.source_column, rel.target_table, rel.target_column
                );
            }
            out.push('\n');
        }

        out.trim_end().to_string()
    }
}

//! Schema snapshot loader
//!
//! Turns raw catalog metadata into a `SchemaSnapshot`. Declared foreign keys
//! become relationships as-is; when the catalog declares none, the inference
//! pass adds advisory ones.

use tracing::{info, warn};

use crate::db::{Catalog, Database, DbError};
use crate::schema::inference::infer_relationships;
use crate::schema::snapshot::{ColumnInfo, Relationship, SchemaSnapshot, TableInfo};

/// Introspect `database` and build a snapshot
///
/// # Returns
/// * `Ok(SchemaSnapshot)` - possibly empty, never absent
/// * `Err(DbError::Connection)` - database unreachable
pub fn load_schema(database: &dyn Database) -> Result<SchemaSnapshot, DbError> {
    let catalog = database.introspect()?;
    let snapshot = build_snapshot(catalog);

    let inferred = snapshot.relationships().iter().filter(|r| r.inferred).count();
    info!(
        tables = snapshot.table_count(),
        relationships = snapshot.relationships().len(),
        inferred,
        "schema snapshot loaded"
    );

    Ok(snapshot)
}

/// Build a snapshot from catalog metadata (no I/O)
pub fn build_snapshot(catalog: Catalog) -> SchemaSnapshot {
    let mut snapshot = SchemaSnapshot::new();
    let mut declared = Vec::new();

    for table in catalog.tables {
        let mut info = TableInfo::new(&table.name, table.is_view);
        for column in table.columns {
            let name = column.name.clone();
            let added = info.add_column(ColumnInfo {
                name: column.name,
                data_type: column.data_type,
                nullable: column.nullable,
                primary_key: column.primary_key,
            });
            if !added {
                warn!(table = %table.name, column = %name, "duplicate column name ignored");
            }
        }

        if !snapshot.add_table(info) {
            warn!(table = %table.name, "duplicate table name ignored");
            continue;
        }

        declared.extend(table.foreign_keys.into_iter().map(|fk| Relationship {
            source_table: table.name.clone(),
            source_column: fk.column,
            target_table: fk.target_table,
            target_column: fk.target_column,
            inferred: false,
        }));
    }

    if declared.is_empty() {
        for relationship in infer_relationships(&snapshot) {
            snapshot.add_relationship(relationship);
        }
    } else {
        for relationship in declared {
            snapshot.add_relationship(relationship);
        }
    }

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CatalogColumn, CatalogForeignKey, CatalogTable, Dialect, RawResultSet};

    fn column(name: &str, primary_key: bool) -> CatalogColumn {
        CatalogColumn {
            name: name.to_string(),
            data_type: "INTEGER".to_string(),
            nullable: !primary_key,
            primary_key,
        }
    }

    struct CatalogOnly(Result<Catalog, DbError>);

    impl Database for CatalogOnly {
        fn dialect(&self) -> Dialect {
            Dialect::Sqlite
        }

        fn introspect(&self) -> Result<Catalog, DbError> {
            self.0.clone()
        }

        fn execute(&self, _sql: &str, _max_rows: usize) -> Result<RawResultSet, DbError> {
            Ok(RawResultSet::default())
        }
    }

    #[test]
    fn test_declared_keys_suppress_inference() {
        let catalog = Catalog {
            tables: vec![
                CatalogTable {
                    name: "customer".to_string(),
                    is_view: false,
                    columns: vec![column("custno", true)],
                    foreign_keys: vec![],
                },
                CatalogTable {
                    name: "invoice".to_string(),
                    is_view: false,
                    columns: vec![column("invno", true), column("custno", false)],
                    foreign_keys: vec![CatalogForeignKey {
                        column: "custno".to_string(),
                        target_table: "customer".to_string(),
                        target_column: "custno".to_string(),
                    }],
                },
            ],
        };

        let snapshot = build_snapshot(catalog);
        assert_eq!(snapshot.relationships().len(), 1);
        assert!(!snapshot.relationships()[0].inferred);
    }

    #[test]
    fn test_inference_runs_without_declared_keys() {
        let catalog = Catalog {
            tables: vec![
                CatalogTable {
                    name: "customer".to_string(),
                    is_view: false,
                    columns: vec![column("custno", true)],
                    foreign_keys: vec![],
                },
                CatalogTable {
                    name: "invoice".to_string(),
                    is_view: false,
                    columns: vec![column("invno", true), column("custno", false)],
                    foreign_keys: vec![],
                },
            ],
        };

        let snapshot = build_snapshot(catalog);
        assert_eq!(snapshot.relationships().len(), 1);
        assert!(snapshot.relationships()[0].inferred);
    }

    #[test]
    fn test_empty_catalog_gives_empty_snapshot() {
        let snapshot = load_schema(&CatalogOnly(Ok(Catalog::default()))).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_unreachable_database_propagates() {
        let db = CatalogOnly(Err(DbError::Connection("refused".to_string())));
        assert!(matches!(load_schema(&db), Err(DbError::Connection(_))));
    }

    #[test]
    fn test_case_duplicate_tables_keep_first() {
        let catalog = Catalog {
            tables: vec![
                CatalogTable {
                    name: "Orders".to_string(),
                    is_view: false,
                    columns: vec![column("id", true)],
                    foreign_keys: vec![],
                },
                CatalogTable {
                    name: "ORDERS".to_string(),
                    is_view: true,
                    columns: vec![column("other", false)],
                    foreign_keys: vec![],
                },
            ],
        };

        let snapshot = build_snapshot(catalog);
        assert_eq!(snapshot.table_count(), 1);
        assert!(snapshot.table("orders").unwrap().has_column("id"));
    }
}

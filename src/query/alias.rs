//! Alias resolver
//!
//! Builds the per-query mapping from alias (or bare table name) to the
//! canonical, lowercased table name.

use crate::db::Dialect;
use crate::query::lexer::{self, SourceRef};

/// What an alias points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasTarget {
    /// A named table (canonical lowercase name)
    Table(String),
    /// A parenthesised subquery; its columns are not known statically
    Derived,
}

/// An alias bound to more than one distinct target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasConflict {
    pub alias: String,
    /// Display names of every target the alias was bound to, in order
    pub targets: Vec<String>,
}

/// Per-query alias → table mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    /// Insertion order is first appearance; the value is the last binding
    entries: Vec<(String, AliasTarget)>,
    /// Every table named in the query, first appearance order
    tables: Vec<String>,
    conflicts: Vec<AliasConflict>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias → target`; the latest binding wins, a different
    /// earlier binding is recorded as a conflict
    pub fn bind(&mut self, alias: &str, target: AliasTarget) {
        let alias = alias.to_lowercase();
        if let AliasTarget::Table(table) = &target {
            if !self.tables.contains(table) {
                self.tables.push(table.clone());
            }
        }

        match self.entries.iter_mut().find(|(a, _)| *a == alias) {
            Some((_, existing)) if *existing == target => {}
            Some((_, existing)) => {
                let previous = std::mem::replace(existing, target.clone());
                self.record_conflict(&alias, &previous, &target);
            }
            None => self.entries.push((alias, target)),
        }
    }

    fn record_conflict(&mut self, alias: &str, previous: &AliasTarget, current: &AliasTarget) {
        let current = display(current);
        match self.conflicts.iter_mut().find(|c| c.alias == alias) {
            Some(conflict) => {
                if !conflict.targets.contains(&current) {
                    conflict.targets.push(current);
                }
            }
            None => self.conflicts.push(AliasConflict {
                alias: alias.to_string(),
                targets: vec![display(previous), current],
            }),
        }
    }

    /// Case-insensitive lookup
    pub fn resolve(&self, alias: &str) -> Option<&AliasTarget> {
        let alias = alias.to_lowercase();
        self.entries.iter().find(|(a, _)| *a == alias).map(|(_, t)| t)
    }

    /// Canonical table names referenced by the query, first appearance order
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn conflicts(&self) -> &[AliasConflict] {
        &self.conflicts
    }

    pub fn is_ambiguous(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Defined aliases with their targets
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AliasTarget)> {
        self.entries.iter().map(|(a, t)| (a.as_str(), t))
    }
}

fn display(target: &AliasTarget) -> String {
    match target {
        AliasTarget::Table(table) => table.clone(),
        AliasTarget::Derived => "(subquery)".to_string(),
    }
}

/// Build the alias map for a normalized query. Never fails.
pub fn resolve(normalized_query: &str, dialect: Dialect) -> AliasMap {
    alias_map_from(&lexer::extract(normalized_query, dialect).sources)
}

/// Build an alias map from already-extracted sources
pub fn alias_map_from(sources: &[SourceRef]) -> AliasMap {
    let mut map = AliasMap::new();
    for source in sources {
        match source {
            SourceRef::Table { table, alias } => {
                let key = alias.as_deref().unwrap_or(table);
                map.bind(key, AliasTarget::Table(table.clone()));
            }
            SourceRef::Derived { alias } => map.bind(alias, AliasTarget::Derived),
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(sql: &str) -> AliasMap {
        super::resolve(sql, Dialect::Sqlite)
    }

    fn table(name: &str) -> AliasTarget {
        AliasTarget::Table(name.to_string())
    }

    #[test]
    fn test_aliases_and_bare_tables() {
        let map = resolve("SELECT c.email FROM Customers c JOIN orders ON orders.cid = c.id");
        assert_eq!(map.resolve("c"), Some(&table("customers")));
        assert_eq!(map.resolve("C"), Some(&table("customers")));
        assert_eq!(map.resolve("orders"), Some(&table("orders")));
        assert_eq!(map.resolve("customers"), None);
        assert_eq!(map.tables(), ["customers", "orders"]);
        assert!(!map.is_ambiguous());
    }

    #[test]
    fn test_no_from_clause_gives_empty_map() {
        let map = resolve("SELECT 1 + 1");
        assert!(map.is_empty());
        assert!(map.tables().is_empty());
    }

    #[test]
    fn test_reusing_alias_for_same_table_is_fine() {
        let map = resolve(
            "SELECT o.id FROM orders o WHERE o.id IN (SELECT o.id FROM orders o WHERE o.total > 5)",
        );
        assert_eq!(map.len(), 1);
        assert!(!map.is_ambiguous());
    }

    #[test]
    fn test_reusing_alias_for_other_table_is_ambiguous() {
        let map = resolve("SELECT x.id FROM customers x JOIN orders x ON x.id = x.id");
        assert!(map.is_ambiguous());
        assert_eq!(map.resolve("x"), Some(&table("orders")));
        assert_eq!(map.conflicts()[0].alias, "x");
        assert_eq!(map.conflicts()[0].targets, vec!["customers", "orders"]);
    }

    #[test]
    fn test_derived_alias() {
        let map = resolve("SELECT s.n FROM (SELECT COUNT(*) n FROM orders) s");
        assert_eq!(map.resolve("s"), Some(&AliasTarget::Derived));
        assert_eq!(map.tables(), ["orders"]);
    }
}

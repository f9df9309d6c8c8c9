//! Relationship inference from well-known shared key names
//!
//! Used only when the catalog declares no foreign keys. A table whose
//! single-column primary key belongs to one of the key families below is
//! treated as the target for same-named columns in every other table.
//! Results are tagged `inferred` and never used for validation.

use crate::schema::snapshot::{Relationship, SchemaSnapshot};

/// A family of interchangeable key spellings plus a hint for the owning table's name
struct KeyFamily {
    names: &'static [&'static str],
    table_hint: &'static [&'static str],
}

const KEY_FAMILIES: &[KeyFamily] = &[
    KeyFamily {
        names: &["custno", "cust_no", "custid", "cust_id", "customer_id", "customerid", "customer_no"],
        table_hint: &["cust"],
    },
    KeyFamily {
        names: &["compno", "comp_no", "compid", "comp_id", "company_id", "companyid"],
        table_hint: &["comp"],
    },
    KeyFamily {
        names: &["deptno", "dept_no", "deptid", "dept_id", "department_id", "departmentid"],
        table_hint: &["dept", "depart"],
    },
    KeyFamily {
        names: &["zip", "zipcode", "zip_code", "areacode", "area_code", "postal_code"],
        table_hint: &["zip", "area", "postal"],
    },
];

fn family_of(column: &str) -> Option<&'static KeyFamily> {
    let key = column.to_lowercase();
    KEY_FAMILIES.iter().find(|f| f.names.contains(&key.as_str()))
}

/// Infer relationships for a snapshot with no declared foreign keys
pub fn infer_relationships(snapshot: &SchemaSnapshot) -> Vec<Relationship> {
    // (table key, table name, pk column name, family)
    let mut owners = Vec::new();
    for (key, table) in snapshot.table_keys().zip(snapshot.tables()) {
        if let [pk] = table.primary_key().as_slice() {
            if let Some(family) = family_of(&pk.name) {
                owners.push((key, table, pk.name.as_str(), family));
            }
        }
    }

    let mut relationships = Vec::new();
    for (_, _, pk_name, family) in &owners {
        let pk_key = pk_name.to_lowercase();

        // Several tables keyed by the same name: keep the one whose name fits the family
        let mut targets: Vec<_> = owners
            .iter()
            .filter(|(_, _, name, _)| name.eq_ignore_ascii_case(pk_name))
            .collect();
        if targets.len() > 1 {
            targets.retain(|(key, _, _, _)| family.table_hint.iter().any(|h| key.contains(h)));
        }
        let [(target_key, target, target_column, _)] = targets.as_slice() else {
            continue;
        };
        // Each distinct key name is handled once
        if relationships
            .iter()
            .any(|r: &Relationship| r.target_column.eq_ignore_ascii_case(&pk_key))
        {
            continue;
        }

        for (source_key, source) in snapshot.table_keys().zip(snapshot.tables()) {
            if source_key == *target_key {
                continue;
            }
            if let Some(column) = source.column(&pk_key) {
                relationships.push(Relationship {
                    source_table: source.name.clone(),
                    source_column: column.name.clone(),
                    target_table: target.name.clone(),
                    target_column: target_column.to_string(),
                    inferred: true,
                });
            }
        }
    }

    relationships
}

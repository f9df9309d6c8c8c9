//! Schema snapshot: immutable model of the target database
//!
//! - `snapshot.rs`: SchemaSnapshot, TableInfo, ColumnInfo, Relationship
//! - `loader.rs`: build a snapshot from catalog metadata
//! - `inference.rs`: advisory relationships from shared key names

pub mod inference;
pub mod loader;
pub mod snapshot;

pub use inference::infer_relationships;
pub use loader::{build_snapshot, load_schema};
pub use snapshot::{ColumnInfo, Relationship, SchemaSnapshot, TableInfo};

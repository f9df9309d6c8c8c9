//! Candidate query handling
//!
//! - `lexer.rs`: SQL tokenizer; table sources, qualified columns, limit clauses
//! - `normalize.rs`: strip generator artifacts
//! - `alias.rs`: alias → canonical table mapping
//! - `validate.rs`: static validation against the schema snapshot
//! - `limit.rs`: dialect-aware row-limit injection

pub mod alias;
pub mod lexer;
pub mod limit;
pub mod normalize;
pub mod validate;

pub use alias::{resolve, AliasConflict, AliasMap, AliasTarget};
pub use limit::{apply_row_limit, has_row_limit, row_limit_count};
pub use normalize::normalize;
pub use validate::{
    validate, validate_with, InvalidColumn, ValidationFailure, ValidationResult, ValidationRules,
    NO_QUERY_SENTINEL,
};

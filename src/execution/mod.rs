//! Statement execution
//!
//! - `executor.rs`: BoundedExecutor (row-limit injection + bounded fetch)
//! - `results.rs`: ExecutionRecord and raw row normalization

pub mod executor;
pub mod results;

pub use executor::{BoundedExecutor, Execution};
pub use results::{normalize_rows, ExecutionRecord};

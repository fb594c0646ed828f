//! In-memory entity store: change-tracking contexts and lazy queries.

pub mod context;
mod entity_set;
pub mod query;

// Re-exports
pub use context::*;
pub use query::*;

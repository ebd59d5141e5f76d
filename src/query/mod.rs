//! Query system for infrastructure graphs
//!
//! Provides capabilities for finding resource nodes and walking the
//! dependency edges between them.

mod find;
mod traverse;
mod types;

pub use find::FindQuery;
pub use traverse::TraverseQuery;
pub use types::{Direction, QueryResult, TraversalResult};

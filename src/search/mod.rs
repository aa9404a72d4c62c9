//! Indexing and search core
//!
//! Records flow through the normalizer into a per-field inverted index at
//! build time. Queries are normalized, turned into a structured query and
//! executed against the index, producing ranked record ids.

pub mod engine;
pub mod executor;
pub mod fuzzy;
pub mod index;
pub mod normalizer;
pub mod query;
pub mod snapshot;

pub use engine::SearchEngine;
pub use executor::{execute, ExecuteOptions, Hit, SearchResults, DEFAULT_LIMIT};
pub use fuzzy::{FuzzyMatcher, FuzzyTerm, ScanBudget};
pub use index::{Field, FieldIndex};
pub use normalizer::normalize;
pub use query::{QueryBuilder, SearchMode, StructuredQuery};
pub use snapshot::IndexSnapshot;

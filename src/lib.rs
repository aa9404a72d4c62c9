//! bookfind: full-text search over a fixed record catalog
//!
//! Two query modes over the title, author and tags fields:
//! - fuzzy: diacritic-insensitive, edit-distance tolerant, per-field boosts
//! - exact: classic multi-field term query

pub mod config;
pub mod error;
pub mod search;
pub mod store;

pub use config::{load_config, FieldProfile, FieldProfiles, SearchConfig};
pub use error::SearchError;
pub use search::{Field, SearchEngine, SearchMode, SearchResults};
pub use store::{DocumentStore, JsonFileStore, MemoryStore, Record, RecordId};

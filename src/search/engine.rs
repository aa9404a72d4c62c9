//! Search engine facade
//!
//! Ties the document store, index, query builder and executor together
//! behind the three host commands: `create_index`, `search_fuzzy` and
//! `search_exact`.

use super::executor::{execute, ExecuteOptions, SearchResults};
use super::index::FieldIndex;
use super::query::{QueryBuilder, SearchMode};
use super::snapshot::IndexSnapshot;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::store::{fingerprint, DocumentStore, Record};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Search engine over one document store.
///
/// The published index is swapped in whole: a rebuild happens outside the
/// lock, and searches already holding the previous `Arc` keep using it.
pub struct SearchEngine<S> {
    store: S,
    config: SearchConfig,
    snapshot: Option<IndexSnapshot>,
    index: RwLock<Option<Arc<FieldIndex>>>,
}

impl<S: DocumentStore> SearchEngine<S> {
    /// Create an engine with no index published yet
    pub fn new(store: S, config: SearchConfig) -> Self {
        Self {
            store,
            config,
            snapshot: None,
            index: RwLock::new(None),
        }
    }

    /// Persist every rebuilt index to `snapshot`
    pub fn with_snapshot(mut self, snapshot: IndexSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Build the index from the store and publish it, replacing any previous
    /// one. Safe to call repeatedly.
    pub fn create_index(&self) -> Result<(), SearchError> {
        let records = self.store.all_records()?;
        let index = FieldIndex::build(&records);
        info!("Built index over {} records", index.record_count());

        if let Some(snapshot) = &self.snapshot {
            snapshot.save(&index, &self.store.source(), &fingerprint(&records))?;
        }

        self.publish(index)
    }

    /// Publish the index stored in the configured snapshot.
    ///
    /// Fails with [`SearchError::Snapshot`] when the store's records differ
    /// from the ones the snapshot was built from, since result ids would
    /// resolve to the wrong records.
    pub fn load_snapshot(&self) -> Result<(), SearchError> {
        let snapshot = self
            .snapshot
            .as_ref()
            .ok_or_else(|| SearchError::Snapshot("no snapshot location configured".to_string()))?;
        let (index, info) = snapshot.load()?;

        let records = self.store.all_records()?;
        if fingerprint(&records) != info.fingerprint {
            warn!(
                "Snapshot was built from {} but the store reads {}",
                info.source,
                self.store.source()
            );
            return Err(SearchError::Snapshot(format!(
                "records do not match the indexed set (index built from {}); rebuild the index",
                info.source
            )));
        }

        debug!(
            "Publishing snapshot index of {} records built at {}",
            info.record_count, info.built_at
        );
        self.publish(index)
    }

    fn publish(&self, index: FieldIndex) -> Result<(), SearchError> {
        let mut slot = self
            .index
            .write()
            .map_err(|e| SearchError::Internal(format!("Failed to acquire write lock: {}", e)))?;
        *slot = Some(Arc::new(index));
        Ok(())
    }

    /// Current published index
    pub fn current_index(&self) -> Result<Arc<FieldIndex>, SearchError> {
        let slot = self
            .index
            .read()
            .map_err(|e| SearchError::Internal(format!("Failed to acquire read lock: {}", e)))?;
        slot.clone().ok_or(SearchError::IndexNotBuilt)
    }

    pub fn is_indexed(&self) -> bool {
        self.current_index().is_ok()
    }

    pub fn search_fuzzy(&self, text: &str) -> Result<SearchResults, SearchError> {
        self.search(text, SearchMode::Fuzzy)
    }

    pub fn search_exact(&self, text: &str) -> Result<SearchResults, SearchError> {
        self.search(text, SearchMode::Exact)
    }

    pub fn search(&self, text: &str, mode: SearchMode) -> Result<SearchResults, SearchError> {
        self.search_with_limit(text, mode, self.config.max_results)
    }

    pub fn search_with_limit(
        &self,
        text: &str,
        mode: SearchMode,
        limit: usize,
    ) -> Result<SearchResults, SearchError> {
        let index = self.current_index()?;
        let query = QueryBuilder::new(&self.config.fields, self.config.exact_boost).build(text, mode);

        let options = ExecuteOptions {
            limit,
            aggregate_boosts: self.config.aggregate_boosts,
            max_vocabulary_scan: self.config.max_vocabulary_scan,
        };
        let results = execute(&index, &query, options);

        debug!(
            "{:?} search for {:?} returned {} hits{}",
            mode,
            text,
            results.len(),
            if results.degraded { " (degraded)" } else { "" }
        );
        Ok(results)
    }

    /// Materialize result ids into records, preserving order
    pub fn resolve(&self, results: &SearchResults) -> Result<Vec<Record>, SearchError> {
        results.hits.iter().map(|hit| self.store.by_id(hit.id)).collect()
    }
}

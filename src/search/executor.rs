//! Query execution and scoring
//!
//! Evaluates a [`StructuredQuery`] against a [`FieldIndex`] using record ids
//! only. Each hit is scored by summing the boosts of the clauses it satisfied;
//! ranking is score descending with ascending id as the tie-break.

use super::fuzzy::{FuzzyMatcher, ScanBudget};
use super::index::{Field, FieldIndex};
use super::query::{Combinator, SearchMode, StructuredQuery, SubQuery, TermMatcher};
use crate::store::RecordId;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

pub const DEFAULT_LIMIT: usize = 100;

/// Execution knobs, usually derived from [`crate::config::SearchConfig`]
#[derive(Debug, Clone, Copy)]
pub struct ExecuteOptions {
    pub limit: usize,
    pub aggregate_boosts: bool,
    pub max_vocabulary_scan: Option<usize>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            aggregate_boosts: true,
            max_vocabulary_scan: None,
        }
    }
}

/// One matching record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub id: RecordId,
    /// Sum of boosts of every satisfied clause
    pub score: f64,
    /// Fields that contributed to the match
    pub fields: BTreeSet<Field>,
}

/// Ordered, deduplicated and truncated search outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub mode: SearchMode,
    pub hits: Vec<Hit>,
    /// True when the fuzzy scan budget ran out and hits may be missing
    pub degraded: bool,
}

impl SearchResults {
    pub fn empty(mode: SearchMode) -> Self {
        Self {
            mode,
            hits: Vec::new(),
            degraded: false,
        }
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.hits.iter().map(|h| h.id).collect()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Per-record outcome of evaluating one sub-query
#[derive(Debug, Default)]
struct SubQueryMatch {
    clauses: usize,
    fields: BTreeSet<Field>,
}

pub fn execute(index: &FieldIndex, query: &StructuredQuery, options: ExecuteOptions) -> SearchResults {
    if query.matches_nothing() || options.limit == 0 {
        return SearchResults::empty(query.mode);
    }

    let matcher = FuzzyMatcher::new(index);
    let mut budget = ScanBudget::new(options.max_vocabulary_scan);

    // Candidates in first-match order, deduplicated by id
    let mut hits: Vec<Hit> = Vec::new();
    let mut positions: HashMap<RecordId, usize> = HashMap::new();

    for sub in &query.sub_queries {
        for (id, matched) in evaluate(&matcher, sub, &mut budget) {
            let pos = *positions.entry(id).or_insert_with(|| {
                hits.push(Hit {
                    id,
                    score: 0.0,
                    fields: BTreeSet::new(),
                });
                hits.len() - 1
            });
            let hit = &mut hits[pos];
            hit.score += sub.boost * matched.clauses as f64;
            hit.fields.extend(matched.fields);
        }
    }

    if options.aggregate_boosts {
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
    }

    let total = hits.len();
    hits.truncate(options.limit);
    debug!(
        "Query matched {} records, returning {} ({:?} mode)",
        total,
        hits.len(),
        query.mode
    );

    SearchResults {
        mode: query.mode,
        hits,
        degraded: budget.is_exhausted(),
    }
}

/// Evaluate one sub-query; ids come back in ascending order
fn evaluate(
    matcher: &FuzzyMatcher<'_>,
    sub: &SubQuery,
    budget: &mut ScanBudget,
) -> BTreeMap<RecordId, SubQueryMatch> {
    let per_term: Vec<BTreeMap<RecordId, BTreeSet<Field>>> = sub
        .terms
        .iter()
        .map(|term| term_postings(matcher, sub, term, budget))
        .collect();

    let mut result: BTreeMap<RecordId, SubQueryMatch> = BTreeMap::new();

    match sub.combinator {
        Combinator::All => {
            let Some((first, rest)) = per_term.split_first() else {
                return result;
            };
            for (id, fields) in first {
                if rest.iter().all(|postings| postings.contains_key(id)) {
                    let entry = result.entry(*id).or_default();
                    entry.clauses = 1;
                    entry.fields.extend(fields.iter().copied());
                    for postings in rest {
                        entry.fields.extend(postings[id].iter().copied());
                    }
                }
            }
        }
        Combinator::Any => {
            for postings in &per_term {
                for (id, fields) in postings {
                    let entry = result.entry(*id).or_default();
                    entry.clauses += 1;
                    entry.fields.extend(fields.iter().copied());
                }
            }
        }
    }

    result
}

/// Union of postings of every index term the query term matches, across the
/// sub-query's fields
fn term_postings(
    matcher: &FuzzyMatcher<'_>,
    sub: &SubQuery,
    term: &str,
    budget: &mut ScanBudget,
) -> BTreeMap<RecordId, BTreeSet<Field>> {
    let mut postings: BTreeMap<RecordId, BTreeSet<Field>> = BTreeMap::new();
    let index = matcher.index();

    for &field in &sub.fields {
        let mut add = |index_term: &str| {
            for id in index.lookup(field, index_term) {
                postings.entry(*id).or_default().insert(field);
            }
        };

        match sub.matcher {
            TermMatcher::Exact => add(term),
            TermMatcher::Fuzzy { threshold } => {
                for fuzzy in matcher.fuzzy_terms(field, term, threshold, budget) {
                    add(&fuzzy.term);
                }
            }
        }
    }

    postings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldProfiles;
    use crate::search::query::QueryBuilder;
    use crate::store::{sample_catalog, Record};

    fn run(records: &[Record], raw: &str, mode: SearchMode, options: ExecuteOptions) -> SearchResults {
        let index = FieldIndex::build(records);
        let profiles = FieldProfiles::default();
        let query = QueryBuilder::new(&profiles, 1.0).build(raw, mode);
        execute(&index, &query, options)
    }

    #[test]
    fn test_fuzzy_single_field_hit() {
        let results = run(&sample_catalog(), "codigo", SearchMode::Fuzzy, ExecuteOptions::default());
        assert_eq!(results.ids(), vec![1]);
        // title (1.0) and tags (0.5) both match
        assert!((results.hits[0].score - 1.5).abs() < 1e-9);
        assert_eq!(results.hits[0].fields, BTreeSet::from([Field::Title, Field::Tags]));
    }

    #[test]
    fn test_fuzzy_phrase_intersects_tokens() {
        let results = run(&sample_catalog(), "stephen king", SearchMode::Fuzzy, ExecuteOptions::default());
        assert_eq!(results.ids(), vec![2, 3]);
        assert!(results.hits.iter().all(|h| (h.score - 0.9).abs() < 1e-9));
        assert!(results.hits.iter().all(|h| h.fields == BTreeSet::from([Field::Author])));
    }

    #[test]
    fn test_fuzzy_phrase_needs_every_token_in_one_field() {
        // "stephen" is in author, "pet" is in title: no single field has both
        let results = run(&sample_catalog(), "stephen pet", SearchMode::Fuzzy, ExecuteOptions::default());
        assert!(results.is_empty());
    }

    #[test]
    fn test_ranking_by_summed_boost() {
        let records = vec![
            Record::new(1, "Misery", "Someone", &[]),
            Record::new(2, "Other", "Misery Writer", &[]),
            Record::new(3, "Misery", "Misery", &["misery"]),
        ];
        let results = run(&records, "misery", SearchMode::Fuzzy, ExecuteOptions::default());
        // 3: 1.0 + 0.9 + 0.5, 1: 1.0, 2: 0.9
        assert_eq!(results.ids(), vec![3, 1, 2]);
    }

    #[test]
    fn test_match_order_without_aggregation() {
        let records = vec![
            Record::new(1, "Other", "Misery Writer", &[]),
            Record::new(2, "Misery", "Someone", &[]),
            Record::new(3, "Misery", "Misery", &["misery"]),
        ];
        let options = ExecuteOptions {
            aggregate_boosts: false,
            ..ExecuteOptions::default()
        };
        let results = run(&records, "misery", SearchMode::Fuzzy, options);
        // title hits first (2, 3), then author-only hit 1
        assert_eq!(results.ids(), vec![2, 3, 1]);
    }

    #[test]
    fn test_exact_mode_any_token_any_field() {
        let results = run(&sample_catalog(), "Iluminado", SearchMode::Exact, ExecuteOptions::default());
        assert_eq!(results.ids(), vec![2]);

        let results = run(&sample_catalog(), "brown ramones", SearchMode::Exact, ExecuteOptions::default());
        assert_eq!(results.ids(), vec![1, 3]);
    }

    #[test]
    fn test_exact_mode_counts_matched_tokens() {
        let results = run(&sample_catalog(), "king pet", SearchMode::Exact, ExecuteOptions::default());
        // 3 matches both tokens, 2 only "king"
        assert_eq!(results.ids(), vec![3, 2]);
        assert!((results.hits[0].score - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_exact_mode_is_not_fuzzy() {
        let results = run(&sample_catalog(), "iluminad", SearchMode::Exact, ExecuteOptions::default());
        assert!(results.is_empty());
    }

    #[test]
    fn test_empty_query() {
        let results = run(&sample_catalog(), "", SearchMode::Fuzzy, ExecuteOptions::default());
        assert!(results.is_empty());
        assert!(!results.degraded);
    }

    #[test]
    fn test_limit_truncates() {
        let records: Vec<Record> = (0..150)
            .map(|i| Record::new(i, "Same Title", "", &[]))
            .collect();
        let results = run(&records, "same", SearchMode::Fuzzy, ExecuteOptions::default());
        assert_eq!(results.len(), DEFAULT_LIMIT);
        // equal scores fall back to ascending id
        assert_eq!(results.hits[0].id, 0);
        assert_eq!(results.hits[99].id, 99);

        let options = ExecuteOptions {
            limit: 7,
            ..ExecuteOptions::default()
        };
        let results = run(&records, "same", SearchMode::Exact, options);
        assert_eq!(results.len(), 7);
    }

    #[test]
    fn test_degraded_when_budget_runs_out() {
        let options = ExecuteOptions {
            max_vocabulary_scan: Some(3),
            ..ExecuteOptions::default()
        };
        let results = run(&sample_catalog(), "vinci", SearchMode::Fuzzy, options);
        assert!(results.degraded);
    }

    #[test]
    fn test_deterministic() {
        let first = run(&sample_catalog(), "king", SearchMode::Fuzzy, ExecuteOptions::default());
        let second = run(&sample_catalog(), "king", SearchMode::Fuzzy, ExecuteOptions::default());
        assert_eq!(first, second);
    }
}

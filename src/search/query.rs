//! Query building
//!
//! Turns a raw query string into a [`StructuredQuery`]: an OR over field
//! sub-queries, each carrying its own boost and term matcher.
//!
//! - Fuzzy mode produces one sub-query per indexed field. Every query token
//!   must fuzzy-match within that field (a single token is just one match).
//! - Exact mode produces a single sub-query over the union of all fields in
//!   which any token matching verbatim in any field is enough.

use super::index::Field;
use super::normalizer::normalize;
use crate::config::FieldProfiles;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Fuzzy,
    Exact,
}

/// How a query token is compared to index terms
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TermMatcher {
    Exact,
    Fuzzy { threshold: f64 },
}

/// How the per-token clauses of one sub-query combine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Every token must match; the sub-query counts once
    All,
    /// Any token may match; each matching token counts as a satisfied clause
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubQuery {
    pub fields: Vec<Field>,
    pub terms: Vec<String>,
    pub matcher: TermMatcher,
    pub combinator: Combinator,
    pub boost: f64,
}

/// OR of sub-queries. No sub-queries means the query matches nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery {
    pub mode: SearchMode,
    pub sub_queries: Vec<SubQuery>,
}

impl StructuredQuery {
    pub fn match_nothing(mode: SearchMode) -> Self {
        Self {
            mode,
            sub_queries: Vec::new(),
        }
    }

    pub fn matches_nothing(&self) -> bool {
        self.sub_queries.is_empty()
    }
}

/// Builds structured queries against one boost profile
pub struct QueryBuilder<'a> {
    profiles: &'a FieldProfiles,
    exact_boost: f64,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(profiles: &'a FieldProfiles, exact_boost: f64) -> Self {
        Self {
            profiles,
            exact_boost,
        }
    }

    pub fn build(&self, raw_query: &str, mode: SearchMode) -> StructuredQuery {
        let terms = normalize(raw_query);
        if terms.is_empty() {
            return StructuredQuery::match_nothing(mode);
        }

        let sub_queries = match mode {
            SearchMode::Fuzzy => Field::ALL
                .iter()
                .map(|&field| {
                    let profile = self.profiles.get(field);
                    SubQuery {
                        fields: vec![field],
                        terms: terms.clone(),
                        matcher: TermMatcher::Fuzzy {
                            threshold: profile.threshold,
                        },
                        combinator: Combinator::All,
                        boost: profile.boost,
                    }
                })
                .collect(),
            SearchMode::Exact => vec![SubQuery {
                fields: Field::ALL.to_vec(),
                terms,
                matcher: TermMatcher::Exact,
                combinator: Combinator::Any,
                boost: self.exact_boost,
            }],
        };

        StructuredQuery { mode, sub_queries }
    }
}

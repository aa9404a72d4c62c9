//! Fuzzy term matching over a field vocabulary
//!
//! Similarity between two terms is `1 - distance / max_len` where distance is
//! the Levenshtein edit distance counted in chars. Candidates are taken from
//! the field's vocabulary by brute-force scan, bounded by a [`ScanBudget`].

use super::index::{Field, FieldIndex};
use tracing::warn;

/// A vocabulary term that passed the similarity threshold
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyTerm {
    pub term: String,
    pub score: f64,
}

/// Cap on the number of candidate terms examined across one search call.
///
/// Once exhausted, further scans return what they found so far and the
/// budget stays marked as exhausted so callers can flag the result degraded.
#[derive(Debug, Clone)]
pub struct ScanBudget {
    remaining: Option<usize>,
    exhausted: bool,
}

impl ScanBudget {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            remaining: limit,
            exhausted: false,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Consume one unit. Returns false when nothing is left.
    fn take(&mut self) -> bool {
        match self.remaining.as_mut() {
            None => true,
            Some(0) => {
                self.exhausted = true;
                false
            }
            Some(n) => {
                *n -= 1;
                true
            }
        }
    }
}

/// Fuzzy matcher reading candidate terms from a [`FieldIndex`]
pub struct FuzzyMatcher<'a> {
    index: &'a FieldIndex,
}

impl<'a> FuzzyMatcher<'a> {
    pub fn new(index: &'a FieldIndex) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &'a FieldIndex {
        self.index
    }

    /// All terms of `field` whose similarity to `query_term` is at least
    /// `threshold`, in vocabulary order.
    pub fn fuzzy_terms(
        &self,
        field: Field,
        query_term: &str,
        threshold: f64,
        budget: &mut ScanBudget,
    ) -> Vec<FuzzyTerm> {
        let query: Vec<char> = query_term.chars().collect();
        if query.is_empty() || budget.is_exhausted() {
            return Vec::new();
        }

        let mut matches = Vec::new();
        for candidate in self.index.vocabulary(field) {
            if !budget.take() {
                warn!(
                    "Fuzzy scan budget exhausted on field {} for term {:?}",
                    field, query_term
                );
                break;
            }

            let candidate_chars: Vec<char> = candidate.chars().collect();
            let max_len = query.len().max(candidate_chars.len());

            // The length difference alone is a lower bound on the distance
            let best_case = 1.0 - query.len().abs_diff(candidate_chars.len()) as f64 / max_len as f64;
            if best_case < threshold {
                continue;
            }

            let score = similarity_chars(&query, &candidate_chars);
            if score >= threshold {
                matches.push(FuzzyTerm {
                    term: candidate.to_string(),
                    score,
                });
            }
        }

        matches
    }
}

/// Normalized similarity in [0, 1]; two empty strings are identical
fn similarity_chars(a: &[char], b: &[char]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / max_len as f64
}

/// Levenshtein distance using a single DP row
pub fn edit_distance(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Shorter string on the row axis
    let (row_chars, col_chars) = if a.len() < b.len() { (a, b) } else { (b, a) };
    let mut row: Vec<usize> = (0..=row_chars.len()).collect();

    for (i, &cc) in col_chars.iter().enumerate() {
        let mut prev = row[0];
        row[0] = i + 1;

        for (j, &rc) in row_chars.iter().enumerate() {
            let cost = usize::from(cc != rc);
            let substitution = prev + cost;
            let deletion = row[j + 1] + 1;
            let insertion = row[j] + 1;

            prev = row[j + 1];
            row[j + 1] = substitution.min(deletion).min(insertion);
        }
    }

    row[row_chars.len()]
}

//! Per-field inverted index
//!
//! Maps each indexed field to a term → record-id postings table. Built once
//! from a record set and read-only afterwards; a rebuild produces a new
//! [`FieldIndex`] that replaces the old one wholesale.

use super::normalizer::normalize;
use crate::store::{Record, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// Indexed record fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Author,
    Tags,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Title, Field::Author, Field::Tags];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Author => "author",
            Field::Tags => "tags",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record ids containing one term in one field
pub type Posting = BTreeSet<RecordId>;

/// Term → postings table for a single field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldPostings {
    terms: BTreeMap<String, Posting>,
}

impl FieldPostings {
    fn add(&mut self, term: String, id: RecordId) {
        self.terms.entry(term).or_default().insert(id);
    }

    pub fn get(&self, term: &str) -> Option<&Posting> {
        self.terms.get(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// The complete inverted index over all indexed fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldIndex {
    fields: BTreeMap<Field, FieldPostings>,
    record_count: usize,
}

static EMPTY_POSTING: Posting = BTreeSet::new();

impl FieldIndex {
    /// Build an index over every indexed field of every record.
    ///
    /// A record with an empty field simply contributes no terms for it.
    pub fn build(records: &[Record]) -> Self {
        let mut fields: BTreeMap<Field, FieldPostings> = Field::ALL
            .iter()
            .map(|f| (*f, FieldPostings::default()))
            .collect();

        for record in records {
            for field in Field::ALL {
                let postings = fields.entry(field).or_default();
                for term in normalize(&record.field_text(field)) {
                    postings.add(term, record.id);
                }
            }
        }

        for (field, postings) in &fields {
            debug!("Indexed {} distinct terms for field {}", postings.len(), field);
        }

        Self {
            fields,
            record_count: records.len(),
        }
    }

    /// Record ids containing `term` in `field`. Absent terms give an empty set.
    pub fn lookup(&self, field: Field, term: &str) -> &Posting {
        self.fields
            .get(&field)
            .and_then(|p| p.get(term))
            .unwrap_or(&EMPTY_POSTING)
    }

    /// Distinct terms of one field, in ascending order
    pub fn vocabulary(&self, field: Field) -> impl Iterator<Item = &str> + '_ {
        self.fields
            .get(&field)
            .into_iter()
            .flat_map(|p| p.terms.keys().map(String::as_str))
    }

    pub fn term_count(&self, field: Field) -> usize {
        self.fields.get(&field).map_or(0, FieldPostings::len)
    }

    /// Number of records the index was built from
    pub fn record_count(&self) -> usize {
        self.record_count
    }
}

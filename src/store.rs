//! Document store adapters
//!
//! The search core only ever sees record ids. Records themselves come from a
//! [`DocumentStore`], which is consumed once at index build time and again by
//! callers that want to turn result ids back into displayable records.

use crate::error::SearchError;
use crate::search::Field;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Externally assigned record identifier
pub type RecordId = u32;

/// A catalog record with its indexed text fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Record {
    pub fn new(id: RecordId, title: &str, author: &str, tags: &[&str]) -> Self {
        Self {
            id,
            title: title.to_string(),
            author: author.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Raw text content of one indexed field. Tags are joined with a space.
    pub fn field_text(&self, field: Field) -> String {
        match field {
            Field::Title => self.title.clone(),
            Field::Author => self.author.clone(),
            Field::Tags => self.tags.join(" "),
        }
    }
}

/// Where a record set was read from, recorded alongside a saved index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum RecordSource {
    /// Records held in memory, e.g. the built-in catalog
    Memory,
    /// A JSON records file
    File(PathBuf),
}

impl RecordSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            RecordSource::Memory => None,
            RecordSource::File(path) => Some(path),
        }
    }
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSource::Memory => write!(f, "built-in catalog"),
            RecordSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Source of the fixed record set
pub trait DocumentStore {
    /// Every record, consumed once per index build
    fn all_records(&self) -> Result<Vec<Record>, SearchError>;

    /// Resolve one id back to its record
    fn by_id(&self, id: RecordId) -> Result<Record, SearchError>;

    fn source(&self) -> RecordSource {
        RecordSource::Memory
    }
}

impl<T: DocumentStore + ?Sized> DocumentStore for Box<T> {
    fn all_records(&self) -> Result<Vec<Record>, SearchError> {
        (**self).all_records()
    }

    fn by_id(&self, id: RecordId) -> Result<Record, SearchError> {
        (**self).by_id(id)
    }

    fn source(&self) -> RecordSource {
        (**self).source()
    }
}

/// SHA-256 over every record's id and indexed fields, in id order.
///
/// Two stores with the same fingerprint resolve every id to the same record.
pub fn fingerprint(records: &[Record]) -> String {
    let mut ordered: Vec<&Record> = records.iter().collect();
    ordered.sort_by_key(|record| record.id);

    let mut hasher = Sha256::new();
    for record in ordered {
        hasher.update(record.id.to_be_bytes());
        for text in [&record.title, &record.author] {
            hasher.update((text.len() as u64).to_be_bytes());
            hasher.update(text.as_bytes());
        }
        hasher.update((record.tags.len() as u64).to_be_bytes());
        for tag in &record.tags {
            hasher.update((tag.len() as u64).to_be_bytes());
            hasher.update(tag.as_bytes());
        }
    }
    hex::encode(hasher.finalize())
}

/// In-memory store keyed by record id
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<RecordId, Record>,
}

impl MemoryStore {
    /// Build a store, rejecting duplicate ids
    pub fn new(records: Vec<Record>) -> Result<Self, SearchError> {
        let mut map = BTreeMap::new();
        for record in records {
            let id = record.id;
            if map.insert(id, record).is_some() {
                return Err(SearchError::InvalidRecords(format!("duplicate id {}", id)));
            }
        }
        Ok(Self { records: map })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn all_records(&self) -> Result<Vec<Record>, SearchError> {
        Ok(self.records.values().cloned().collect())
    }

    fn by_id(&self, id: RecordId) -> Result<Record, SearchError> {
        self.records
            .get(&id)
            .cloned()
            .ok_or(SearchError::NotFound(id))
    }
}

/// Store backed by a JSON array of records on disk.
///
/// The file is read once on open; later edits require reopening.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Read a records file. The path is canonicalized so a saved index can
    /// find it again from another working directory.
    pub fn open(path: &Path) -> Result<Self, SearchError> {
        let path = fs::canonicalize(path)?;
        let data = fs::read_to_string(&path)?;
        let records: Vec<Record> = serde_json::from_str(&data)?;
        debug!("Loaded {} records from {}", records.len(), path.display());

        Ok(Self {
            path,
            inner: MemoryStore::new(records)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for JsonFileStore {
    fn all_records(&self) -> Result<Vec<Record>, SearchError> {
        self.inner.all_records()
    }

    fn by_id(&self, id: RecordId) -> Result<Record, SearchError> {
        self.inner.by_id(id)
    }

    fn source(&self) -> RecordSource {
        RecordSource::File(self.path().to_path_buf())
    }
}

/// The built-in three-book catalog
pub fn sample_catalog() -> Vec<Record> {
    vec![
        Record::new(1, "O Código da Vinci", "Dan Brown", &["código", "da vinci"]),
        Record::new(2, "O Iluminado", "Stephen King", &["iluminado", "stanley kubrick"]),
        Record::new(3, "Pet Sematary", "Stephen King", &["pet", "sematary", "ramones"]),
    ]
}

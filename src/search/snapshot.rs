//! On-disk index snapshot
//!
//! Layout: `{index_dir}/index.json` plus a sibling `index.lock` used with
//! `fs2` advisory locks. Writers hold the lock exclusively and publish by
//! renaming a `.tmp` file into place, so readers see either the previous
//! snapshot or the new one.
//!
//! Each snapshot records where its records came from and a fingerprint of
//! them, so a later search can reopen the same records and detect when the
//! store no longer matches the index.

use super::index::FieldIndex;
use crate::error::SearchError;
use crate::store::RecordSource;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SNAPSHOT_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    built_at: DateTime<Utc>,
    source: RecordSource,
    fingerprint: String,
    index: FieldIndex,
}

/// Metadata of a stored snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotInfo {
    pub built_at: DateTime<Utc>,
    pub record_count: usize,
    /// Where the indexed records were read from
    pub source: RecordSource,
    /// [`crate::store::fingerprint`] of the indexed records
    pub fingerprint: String,
}

impl SnapshotFile {
    fn info(&self) -> SnapshotInfo {
        SnapshotInfo {
            built_at: self.built_at,
            record_count: self.index.record_count(),
            source: self.source.clone(),
            fingerprint: self.fingerprint.clone(),
        }
    }
}

/// Advisory lock held for the lifetime of the guard
struct LockGuard {
    file: File,
}

impl LockGuard {
    fn exclusive(path: &Path) -> Result<Self, SearchError> {
        let file = File::create(path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }

    fn shared(path: &Path) -> Result<Self, SearchError> {
        let file = File::create(path)?;
        file.lock_shared()?;
        Ok(Self { file })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    dir: PathBuf,
}

impl IndexSnapshot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Snapshot in the platform cache directory
    pub fn in_default_dir() -> Self {
        Self::new(default_index_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join("index.json")
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join("index.lock")
    }

    pub fn exists(&self) -> bool {
        self.index_path().exists()
    }

    /// Write the index, replacing any previous snapshot atomically
    pub fn save(
        &self,
        index: &FieldIndex,
        source: &RecordSource,
        fingerprint: &str,
    ) -> Result<SnapshotInfo, SearchError> {
        fs::create_dir_all(&self.dir)?;
        let _guard = LockGuard::exclusive(&self.lock_path())?;

        let snapshot = SnapshotFile {
            version: SNAPSHOT_VERSION,
            built_at: Utc::now(),
            source: source.clone(),
            fingerprint: fingerprint.to_string(),
            index: index.clone(),
        };

        let index_path = self.index_path();
        let tmp_path = index_path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_vec(&snapshot)?)?;
        fs::rename(&tmp_path, &index_path)?;

        info!(
            "Saved index snapshot of {} records from {} to {}",
            index.record_count(),
            source,
            index_path.display()
        );

        Ok(snapshot.info())
    }

    /// Read the stored index. A missing snapshot means the index was never built.
    pub fn load(&self) -> Result<(FieldIndex, SnapshotInfo), SearchError> {
        let snapshot = self.read()?;
        debug!(
            "Loaded index snapshot built at {} from {}",
            snapshot.built_at, snapshot.source
        );
        let info = snapshot.info();
        Ok((snapshot.index, info))
    }

    /// Metadata of the stored snapshot without publishing it
    pub fn info(&self) -> Result<SnapshotInfo, SearchError> {
        Ok(self.read()?.info())
    }

    fn read(&self) -> Result<SnapshotFile, SearchError> {
        let index_path = self.index_path();
        if !index_path.exists() {
            return Err(SearchError::IndexNotBuilt);
        }

        let _guard = LockGuard::shared(&self.lock_path())?;
        let data = fs::read(&index_path)?;

        // Check the version first so older layouts are reported as such
        let version = serde_json::from_slice::<serde_json::Value>(&data)
            .ok()
            .and_then(|value| value.get("version").and_then(serde_json::Value::as_u64));
        if let Some(version) = version {
            if version != u64::from(SNAPSHOT_VERSION) {
                return Err(SearchError::Snapshot(format!(
                    "unsupported snapshot version {} (expected {})",
                    version, SNAPSHOT_VERSION
                )));
            }
        }

        serde_json::from_slice(&data)
            .map_err(|e| SearchError::Snapshot(format!("corrupt snapshot: {}", e)))
    }
}

/// Platform cache directory for index snapshots
pub fn default_index_dir() -> PathBuf {
    if let Some(xdg_cache) = std::env::var_os("XDG_CACHE_HOME") {
        PathBuf::from(xdg_cache).join("bookfind")
    } else if let Some(cache) = dirs::cache_dir() {
        cache.join("bookfind")
    } else {
        PathBuf::from(".cache").join("bookfind")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::Field;
    use crate::store::{fingerprint, sample_catalog};

    fn save_catalog(snapshot: &IndexSnapshot) -> SnapshotInfo {
        let catalog = sample_catalog();
        snapshot
            .save(&FieldIndex::build(&catalog), &RecordSource::Memory, &fingerprint(&catalog))
            .unwrap()
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = IndexSnapshot::new(dir.path().join("idx"));

        assert!(!snapshot.exists());
        let saved = save_catalog(&snapshot);
        assert!(snapshot.exists());

        let (loaded, info) = snapshot.load().unwrap();
        assert_eq!(loaded, FieldIndex::build(&sample_catalog()));
        assert_eq!(info, saved);
        assert_eq!(info.record_count, 3);
        assert!(loaded.lookup(Field::Title, "iluminado").contains(&2));
    }

    #[test]
    fn test_records_source_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = IndexSnapshot::new(dir.path());
        let source = RecordSource::File(dir.path().join("books.json"));

        snapshot
            .save(&FieldIndex::build(&[]), &source, "abc123")
            .unwrap();

        let info = snapshot.info().unwrap();
        assert_eq!(info.source, source);
        assert_eq!(info.fingerprint, "abc123");
        assert_eq!(info.record_count, 0);
    }

    #[test]
    fn test_load_missing_is_index_not_built() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = IndexSnapshot::new(dir.path());
        assert!(matches!(snapshot.load(), Err(SearchError::IndexNotBuilt)));
    }

    #[test]
    fn test_save_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = IndexSnapshot::new(dir.path());

        save_catalog(&snapshot);
        snapshot
            .save(&FieldIndex::build(&[]), &RecordSource::Memory, &fingerprint(&[]))
            .unwrap();

        let (loaded, _) = snapshot.load().unwrap();
        assert_eq!(loaded.record_count(), 0);
        assert!(!dir.path().join("index.json.tmp").exists());
    }

    #[test]
    fn test_rejects_corrupt_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.json"), b"{ nope").unwrap();

        let snapshot = IndexSnapshot::new(dir.path());
        assert!(matches!(snapshot.load(), Err(SearchError::Snapshot(_))));
    }

    #[test]
    fn test_rejects_other_version() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile {
            version: SNAPSHOT_VERSION + 1,
            built_at: Utc::now(),
            source: RecordSource::Memory,
            fingerprint: String::new(),
            index: FieldIndex::default(),
        };
        fs::write(dir.path().join("index.json"), serde_json::to_vec(&file).unwrap()).unwrap();

        let err = IndexSnapshot::new(dir.path()).load().unwrap_err();
        assert!(err.to_string().contains("unsupported snapshot version"));
    }

    #[test]
    fn test_rejects_version_one_layout() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = serde_json::json!({
            "version": 1,
            "built_at": Utc::now(),
            "index": FieldIndex::default(),
        });
        fs::write(dir.path().join("index.json"), legacy.to_string()).unwrap();

        let err = IndexSnapshot::new(dir.path()).info().unwrap_err();
        assert!(err.to_string().contains("unsupported snapshot version 1"));
    }
}

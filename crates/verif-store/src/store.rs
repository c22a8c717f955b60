//! Filesystem-backed record store.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use verif_common::VerifKey;

use crate::error::{StoreError, StoreResult};
use crate::record::{FssRecord, SalRecord};

/// Stores one JSON document per (score kind, verification key).
///
/// Writes go through a sibling temp file and a rename, so readers never
/// observe a half-written record.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    /// Create a store rooted at a directory. The directory is created on
    /// first save, not here.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the FSS record for a key.
    pub fn fss_path(&self, key: &VerifKey) -> PathBuf {
        self.record_path("FSS", key)
    }

    /// Path of the SAL record for a key.
    pub fn sal_path(&self, key: &VerifKey) -> PathBuf {
        self.record_path("SAL", key)
    }

    fn record_path(&self, kind: &str, key: &VerifKey) -> PathBuf {
        self.root
            .join(kind)
            .join(key.relative_dir())
            .join(format!("{}.json", key.file_stem(kind)))
    }

    /// Load the FSS record for a key, or None if it was never saved.
    pub fn load_fss(&self, key: &VerifKey) -> StoreResult<Option<FssRecord>> {
        let record: Option<FssRecord> = self.load(&self.fss_path(key))?;
        if let Some(record) = &record {
            check_key(key, &record.key)?;
        }
        Ok(record)
    }

    /// Load the SAL record for a key, or None if it was never saved.
    pub fn load_sal(&self, key: &VerifKey) -> StoreResult<Option<SalRecord>> {
        let record: Option<SalRecord> = self.load(&self.sal_path(key))?;
        if let Some(record) = &record {
            check_key(key, &record.key)?;
        }
        Ok(record)
    }

    /// Save the FSS record for its key.
    pub fn save_fss(&self, record: &FssRecord) -> StoreResult<PathBuf> {
        let path = self.fss_path(&record.key);
        self.save(&path, record)?;
        info!(path = %path.display(), lead_times = record.tables.len(), "saved FSS record");
        Ok(path)
    }

    /// Save the SAL record for its key.
    pub fn save_sal(&self, record: &SalRecord) -> StoreResult<PathBuf> {
        let path = self.sal_path(&record.key);
        self.save(&path, record)?;
        info!(path = %path.display(), lead_times = record.rows.len(), "saved SAL record");
        Ok(path)
    }

    /// Remove both records for a key. Used by replace-mode runs.
    pub fn remove(&self, key: &VerifKey) -> StoreResult<()> {
        for path in [self.fss_path(key), self.sal_path(key)] {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed record"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, path: &Path) -> StoreResult<Option<T>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), "loaded record");
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save<T: Serialize>(&self, path: &Path, record: &T) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut bytes = serde_json::to_vec_pretty(record)?;
        bytes.push(b'\n');

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn check_key(expected: &VerifKey, found: &VerifKey) -> StoreResult<()> {
    if expected != found {
        return Err(StoreError::KeyMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}

//! Report stores: where report records come from.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;
use towerdoc_types::ReportRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid report id '{0}'")]
    InvalidId(String),

    #[error("Failed to read report '{id}': {source}")]
    Io {
        id: String,
        #[source]
        source: io::Error,
    },

    #[error("Report '{id}' is not valid JSON: {source}")]
    Json {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Report store lock poisoned")]
    Poisoned,
}

/// Fetches report records by identifier. `Ok(None)` means the record does
/// not exist.
pub trait ReportStore: Send + Sync {
    fn fetch(&self, id: &str) -> Result<Option<ReportRecord>, StoreError>;

    /// Every identifier the store holds, sorted.
    fn ids(&self) -> Result<Vec<String>, StoreError>;
}

/// Ids are used as file names, so only `[A-Za-z0-9_-]` is accepted.
pub fn validate_id(id: &str) -> Result<(), StoreError> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

/// Parses a record, filling in the id when the JSON leaves it empty.
pub fn parse_record(id: &str, json: &str) -> Result<ReportRecord, StoreError> {
    let mut record: ReportRecord = serde_json::from_str(json).map_err(|source| StoreError::Json {
        id: id.to_string(),
        source,
    })?;
    if record.id.trim().is_empty() {
        record.id = id.to_string();
    }
    Ok(record)
}

/// Reads `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirectoryStore {
    dir: PathBuf,
}

impl JsonDirectoryStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl ReportStore for JsonDirectoryStore {
    fn fetch(&self, id: &str) -> Result<Option<ReportRecord>, StoreError> {
        validate_id(id)?;
        let path = self.path_for(id);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No report at {}", path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(StoreError::Io {
                    id: id.to_string(),
                    source,
                });
            }
        };
        parse_record(id, &json).map(Some)
    }

    fn ids(&self) -> Result<Vec<String>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            id: self.dir.display().to_string(),
            source,
        })?;
        let mut ids: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .filter(|id| validate_id(id).is_ok())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

/// Records held in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    records: RwLock<HashMap<String, ReportRecord>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, mut record: ReportRecord) -> Result<(), StoreError> {
        validate_id(&record.id)?;
        record.id = record.id.trim().to_string();
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        records.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn with(self, record: ReportRecord) -> Result<Self, StoreError> {
        self.insert(record)?;
        Ok(self)
    }
}

impl ReportStore for InMemoryReportStore {
    fn fetch(&self, id: &str) -> Result<Option<ReportRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.get(id).cloned())
    }

    fn ids(&self) -> Result<Vec<String>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        let mut ids: Vec<String> = records.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

//! Immutable in-memory telemetry dataset.
//!
//! Loaded once at startup from a JSON array of records. A region index is
//! built at load time so per-request lookups never rescan the dataset.

use crate::error::LoadError;
use crate::types::TelemetryRecord;
use indexmap::IndexMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Read-only telemetry snapshot.
#[derive(Debug, Clone, Default)]
pub struct TelemetryStore {
    records: Vec<TelemetryRecord>,
    // region -> positions in `records`, regions in first-seen order
    by_region: IndexMap<String, Vec<usize>>,
}

impl TelemetryStore {
    /// Load a dataset from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound {
                path: path.to_path_buf(),
            },
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let store = Self::parse(&content, path.display().to_string())?;
        info!(
            "Loaded telemetry dataset from {} ({} records, {} regions)",
            path.display(),
            store.len(),
            store.by_region.len()
        );
        Ok(store)
    }

    /// Parse a dataset held in memory, with the same validation as [`load`](Self::load).
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        Self::parse(json, "<inline>".to_string())
    }

    pub fn from_records(records: Vec<TelemetryRecord>) -> Self {
        let mut by_region: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_region.entry(record.region.clone()).or_default().push(idx);
        }
        debug!("Indexed {} records into {} regions", records.len(), by_region.len());
        Self { records, by_region }
    }

    fn parse(json: &str, origin: String) -> Result<Self, LoadError> {
        let records: Vec<TelemetryRecord> =
            serde_json::from_str(json).map_err(|source| LoadError::Parse { origin, source })?;
        Ok(Self::from_records(records))
    }

    /// Records whose region equals `region` exactly, in dataset order.
    ///
    /// No case folding or trimming is applied.
    pub fn records_for_region<'a>(
        &'a self,
        region: &str,
    ) -> impl Iterator<Item = &'a TelemetryRecord> + 'a {
        let positions: &'a [usize] = self
            .by_region
            .get(region)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        positions.iter().map(move |&idx| &self.records[idx])
    }

    /// Distinct region names in first-seen order.
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.by_region.keys().map(String::as_str)
    }

    pub fn records(&self) -> &[TelemetryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

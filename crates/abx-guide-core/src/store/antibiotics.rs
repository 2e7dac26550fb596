//! Antibiotic documents.

use tracing::{debug, warn};

use super::{check_id, yaml_stems, FileStore, RecordKind, StoreError, StoreResult};
use crate::models::AntibioticRecord;

impl FileStore {
    /// Load and validate `antibiotics/<id>.yml`.
    pub fn read_antibiotic(&self, id: &str) -> StoreResult<AntibioticRecord> {
        check_id(id)?;

        let path = self.antibiotics_dir().join(format!("{id}.yml"));
        let record: AntibioticRecord = self.read_document(&path, RecordKind::Antibiotic, id)?;

        record.validate().map_err(|source| StoreError::Invalid {
            kind: RecordKind::Antibiotic,
            id: id.to_string(),
            source,
        })?;
        Ok(record)
    }

    /// Every valid antibiotic document, sorted by file name.
    pub fn read_antibiotics(&self) -> StoreResult<Vec<AntibioticRecord>> {
        let dir = self.antibiotics_dir();
        let stems = match yaml_stems(&dir) {
            Ok(stems) => stems,
            Err(e) => {
                warn!(path = %dir.display(), "Error loading antibiotics: {e}");
                return Ok(Vec::new());
            }
        };

        let mut records = Vec::with_capacity(stems.len());
        for id in stems {
            match self.read_antibiotic(&id) {
                Ok(record) => records.push(record),
                Err(e) => warn!(antibiotic = %id, "Skipping antibiotic: {e}"),
            }
        }
        debug!(count = records.len(), "Listed antibiotics");
        Ok(records)
    }
}

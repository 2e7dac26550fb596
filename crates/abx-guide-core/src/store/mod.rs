//! File-backed guideline store.
//!
//! Layout under the data directory:
//!
//! ```text
//! <root>/antibiotics/<id>.yml
//! <root>/categories/<category>/<condition>.yml
//! ```
//!
//! Every document is parsed and validated on load; nothing is cached.

mod antibiotics;
mod conditions;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{AntibioticRecord, Catalog, ConditionRecord, ValidationError};
use crate::resolver::{hyphenate, SynonymTable};

/// Kind of document a store error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Category,
    Condition,
    Antibiotic,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Category => "category",
            RecordKind::Condition => "condition",
            RecordKind::Antibiotic => "antibiotic",
        })
    }
}

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("invalid document id: {0:?}")]
    InvalidId(String),

    #[error("data directory does not exist: {0}")]
    MissingDataDir(PathBuf),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid {kind} {id}: {source}")]
    Invalid {
        kind: RecordKind,
        id: String,
        source: ValidationError,
    },
}

impl StoreError {
    /// True for a document that does not exist, as opposed to a broken one.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to guideline documents.
pub trait GuidelineStore {
    fn load_condition(&self, category: &str, id: &str) -> StoreResult<ConditionRecord>;

    fn load_antibiotic(&self, id: &str) -> StoreResult<AntibioticRecord>;

    /// Category ids, sorted.
    fn list_categories(&self) -> StoreResult<Vec<String>>;

    /// Conditions in a category, sorted by id. Broken documents are skipped.
    fn list_category_conditions(&self, category: &str) -> StoreResult<Vec<ConditionRecord>>;

    /// Every antibiotic, sorted by id. Broken documents are skipped.
    fn list_antibiotics(&self) -> StoreResult<Vec<AntibioticRecord>>;

    /// Load every antibiotic a condition's regimens name.
    ///
    /// Each record is registered under the token as written and under its
    /// file id. A token whose own file id has no document is retried under its
    /// canonical synonym ("Zosyn" → `piperacillin-tazobactam`). Tokens with no
    /// loadable document are skipped with a warning.
    fn load_catalog_for_condition(&self, condition: &ConditionRecord) -> Catalog {
        let mut catalog = Catalog::new();

        let tokens = condition
            .treatment_lines
            .iter()
            .flat_map(|(_, line)| line.all_regimens())
            .flat_map(|regimen| regimen.components());

        for token in tokens {
            if catalog.contains_key(token) {
                continue;
            }

            let mut file_ids = vec![file_id_for(token)];
            if let Some(canonical) = SynonymTable::standard().canonical_name(token) {
                if !file_ids.iter().any(|id| id == canonical) {
                    file_ids.push(canonical.to_string());
                }
            }

            let mut failure = None;
            let found = file_ids.into_iter().find_map(|file_id| {
                if let Some(record) = catalog.get(&file_id) {
                    return Some((file_id, record.clone()));
                }
                match self.load_antibiotic(&file_id) {
                    Ok(record) => Some((file_id, record)),
                    Err(e) => {
                        failure = Some(e);
                        None
                    }
                }
            });

            match (found, failure) {
                (Some((file_id, record)), _) => {
                    catalog.insert(token.to_string(), record.clone());
                    catalog.entry(file_id).or_insert(record);
                }
                (None, Some(e)) => {
                    warn!(
                        condition = %condition.id,
                        token,
                        "Skipping antibiotic without usable data: {e}"
                    );
                }
                (None, None) => {}
            }
        }

        debug!(condition = %condition.id, entries = catalog.len(), "Loaded antibiotic catalog");
        catalog
    }
}

/// Document id for a regimen token: lower-cased, whitespace runs to "-",
/// anything outside `[a-z0-9-]` dropped.
pub fn file_id_for(token: &str) -> String {
    hyphenate(token.trim())
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// Build a catalog keyed by record id, keeping the given order.
pub fn catalog_from(records: impl IntoIterator<Item = AntibioticRecord>) -> Catalog {
    records.into_iter().map(|r| (r.id.clone(), r)).collect()
}

/// Guideline store over a directory of YAML documents.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a data directory.
    pub fn open<P: AsRef<Path>>(root: P) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(StoreError::MissingDataDir(root));
        }
        debug!(root = %root.display(), "Opened guideline store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn antibiotics_dir(&self) -> PathBuf {
        self.root.join("antibiotics")
    }

    fn categories_dir(&self) -> PathBuf {
        self.root.join("categories")
    }

    /// Read and parse one YAML document.
    fn read_document<T: DeserializeOwned>(
        &self,
        path: &Path,
        kind: RecordKind,
        id: &str,
    ) -> StoreResult<T> {
        debug!(path = %path.display(), "Reading {kind} document");
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound {
                    kind,
                    id: id.to_string(),
                }
            } else {
                StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        serde_yaml::from_str(&text).map_err(|source| StoreError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl GuidelineStore for FileStore {
    fn load_condition(&self, category: &str, id: &str) -> StoreResult<ConditionRecord> {
        self.read_condition(category, id)
    }

    fn load_antibiotic(&self, id: &str) -> StoreResult<AntibioticRecord> {
        self.read_antibiotic(id)
    }

    fn list_categories(&self) -> StoreResult<Vec<String>> {
        self.read_categories()
    }

    fn list_category_conditions(&self, category: &str) -> StoreResult<Vec<ConditionRecord>> {
        self.read_category_conditions(category)
    }

    fn list_antibiotics(&self) -> StoreResult<Vec<AntibioticRecord>> {
        self.read_antibiotics()
    }
}

/// Ids become file names, so only `[A-Za-z0-9_-]` is accepted.
fn check_id(id: &str) -> StoreResult<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

/// `.yml` file stems in a directory, sorted.
fn yaml_stems(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut stems = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("yml") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            stems.push(stem.to_string());
        }
    }
    stems.sort();
    Ok(stems)
}

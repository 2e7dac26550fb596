//! Condition and category documents.

use tracing::{debug, warn};

use super::{check_id, yaml_stems, FileStore, RecordKind, StoreError, StoreResult};
use crate::models::ConditionRecord;

impl FileStore {
    /// Load and validate `categories/<category>/<id>.yml`.
    pub fn read_condition(&self, category: &str, id: &str) -> StoreResult<ConditionRecord> {
        check_id(category)?;
        check_id(id)?;

        let path = self.categories_dir().join(category).join(format!("{id}.yml"));
        let mut condition: ConditionRecord = self.read_document(&path, RecordKind::Condition, id)?;
        if condition.category.is_empty() {
            condition.category = category.to_string();
        }

        condition.validate().map_err(|source| StoreError::Invalid {
            kind: RecordKind::Condition,
            id: id.to_string(),
            source,
        })?;
        Ok(condition)
    }

    /// Category directory names, sorted. An unreadable directory lists as empty.
    pub fn read_categories(&self) -> StoreResult<Vec<String>> {
        let dir = self.categories_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %dir.display(), "Error loading categories: {e}");
                return Ok(Vec::new());
            }
        };

        let mut categories: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(String::from))
            .collect();
        categories.sort();
        Ok(categories)
    }

    /// Every valid condition in a category, sorted by file name.
    pub fn read_category_conditions(&self, category: &str) -> StoreResult<Vec<ConditionRecord>> {
        check_id(category)?;

        let dir = self.categories_dir().join(category);
        if !dir.is_dir() {
            return Err(StoreError::NotFound {
                kind: RecordKind::Category,
                id: category.to_string(),
            });
        }
        let stems = match yaml_stems(&dir) {
            Ok(stems) => stems,
            Err(e) => {
                warn!(category, "Error loading conditions: {e}");
                return Ok(Vec::new());
            }
        };

        let mut conditions = Vec::with_capacity(stems.len());
        for id in stems {
            match self.read_condition(category, &id) {
                Ok(condition) => conditions.push(condition),
                Err(e) => warn!(category, condition = %id, "Skipping condition: {e}"),
            }
        }
        debug!(category, count = conditions.len(), "Listed conditions");
        Ok(conditions)
    }
}

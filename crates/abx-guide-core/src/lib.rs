//! Antibiotic Guide Core Library
//!
//! Reference browser for antibiotic treatment guidelines: conditions with
//! tiered regimens, antibiotic detail, unit-aware dosing text and pediatric
//! dose calculation.
//!
//! # Architecture
//!
//! ```text
//!   YAML documents ──► store (parse + validate) ──► ConditionRecord / Catalog
//!                                                         │
//!            ┌────────────────────────────────────────────┼──────────────────┐
//!            ▼                                            ▼                  ▼
//!     regimens::select_regimens                 resolver::Resolver    dosing::format_dosage
//!     (line, cohort, setting)                   (token → record)      dosing::PediatricCalculator
//!            │                                            │                  │
//!            └──────────────► view (TreatmentView / AntibioticView) ◄────────┘
//!                                          │
//!                                  JSON / text for clients
//! ```
//!
//! # Core Principle
//!
//! **Lookups degrade, they do not fail.** An antibiotic that cannot be
//! resolved, a weight outside a rule's range or an empty setting filter is
//! reported alongside the result instead of aborting the page.
//!
//! # Modules
//!
//! - [`models`]: Document types (AntibioticRecord, ConditionRecord, filters, units)
//! - [`resolver`]: Normalizer, synonym table and antibiotic resolution
//! - [`regimens`]: Regimen selection by cohort and care setting
//! - [`dosing`]: Dose text conversion and pediatric dose calculation
//! - [`store`]: File-backed guideline store
//! - [`search`]: Free-text search across documents
//! - [`session`]: Unit preferences and patient context
//! - [`view`]: Treatment and antibiotic page assembly

pub mod dosing;
pub mod models;
pub mod regimens;
pub mod resolver;
pub mod search;
pub mod session;
pub mod store;
pub mod view;

// Re-export commonly used types
pub use dosing::{format_dosage, PediatricCalculator, PediatricDoseResult, RoundingPolicy};
pub use models::{AntibioticRecord, Catalog, ConditionRecord, LineTier, Setting, UnitSystem};
pub use resolver::{normalize, Resolver, SynonymTable};
pub use session::{Session, SessionContext};
pub use store::{FileStore, GuidelineStore, StoreError};
pub use view::{AntibioticView, TreatmentRequest, TreatmentView, ViewConfig};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

use models::AgeGroup;
use search::{HitKind, SearchHit};
use session::SessionError;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum GuideError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Session state error: {0}")]
    StateError(String),
}

impl From<StoreError> for GuideError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => GuideError::NotFound(e.to_string()),
            StoreError::InvalidId(_) => GuideError::InvalidInput(e.to_string()),
            _ => GuideError::DataUnavailable(e.to_string()),
        }
    }
}

impl From<SessionError> for GuideError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::InvalidWeight(_) => GuideError::InvalidInput(e.to_string()),
            SessionError::LockPoisoned => GuideError::StateError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for GuideError {
    fn from(e: serde_json::Error) -> Self {
        GuideError::SerializationError(e.to_string())
    }
}

fn parse_input<T>(value: &str) -> Result<T, GuideError>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse().map_err(GuideError::InvalidInput)
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open a guideline data directory.
///
/// `rounding` names the pediatric rounding policy: "tiered" or "nearest-ten".
#[uniffi::export]
pub fn open_guidelines(
    data_dir: String,
    rounding: String,
) -> Result<Arc<GuidelineBrowser>, GuideError> {
    let store = FileStore::open(&data_dir)?;
    let rounding: RoundingPolicy = parse_input(&rounding)?;
    Ok(Arc::new(GuidelineBrowser::new(store, ViewConfig::new(rounding))))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Guideline browser for one client session.
#[derive(uniffi::Object)]
pub struct GuidelineBrowser {
    store: FileStore,
    session: Session,
    config: ViewConfig,
}

impl GuidelineBrowser {
    pub fn new(store: FileStore, config: ViewConfig) -> Self {
        Self {
            store,
            session: Session::default(),
            config,
        }
    }

    pub fn with_session(store: FileStore, config: ViewConfig, context: SessionContext) -> Self {
        Self {
            store,
            session: Session::new(context),
            config,
        }
    }

    /// Assemble the treatment page for a condition.
    pub fn build_treatment_view(
        &self,
        category: &str,
        condition_id: &str,
        request: TreatmentRequest,
    ) -> Result<TreatmentView, GuideError> {
        let condition = self.store.load_condition(category, condition_id)?;
        let catalog = self.store.load_catalog_for_condition(&condition);
        let context = self.session.snapshot()?;
        Ok(TreatmentView::build(&condition, &catalog, request, &context))
    }

    /// Assemble the detail page for an antibiotic named by id, name or alias.
    pub fn build_antibiotic_view(&self, name: &str) -> Result<AntibioticView, GuideError> {
        let catalog = store::catalog_from(self.store.list_antibiotics()?);
        let record = Resolver::standard()
            .resolve(name, &catalog)
            .ok_or_else(|| GuideError::NotFound(format!("antibiotic: {name}")))?;
        let context = self.session.snapshot()?;
        Ok(AntibioticView::build(record, &context, &self.config))
    }
}

#[uniffi::export]
impl GuidelineBrowser {
    // =========================================================================
    // Browsing
    // =========================================================================

    /// Category ids.
    pub fn list_categories(&self) -> Result<Vec<String>, GuideError> {
        Ok(self.store.list_categories()?)
    }

    /// Conditions in a category.
    pub fn list_conditions(&self, category: String) -> Result<Vec<FfiConditionSummary>, GuideError> {
        let conditions = self.store.list_category_conditions(&category)?;
        Ok(conditions.into_iter().map(|c| c.into()).collect())
    }

    /// Treatment page as JSON. `setting` defaults to the condition's first.
    pub fn treatment_view(
        &self,
        category: String,
        condition_id: String,
        line: String,
        setting: Option<String>,
    ) -> Result<String, GuideError> {
        let request = TreatmentRequest {
            line: parse_input(&line)?,
            setting: setting.as_deref().map(parse_input).transpose()?,
        };
        let view = self.build_treatment_view(&category, &condition_id, request)?;
        Ok(view.to_json()?)
    }

    /// Antibiotic detail page as JSON.
    pub fn antibiotic_view(&self, name: String) -> Result<String, GuideError> {
        Ok(self.build_antibiotic_view(&name)?.to_json()?)
    }

    /// Search antibiotics and conditions.
    pub fn search(&self, term: String) -> Result<Vec<FfiSearchHit>, GuideError> {
        let hits = search::search(&self.store, &term)?;
        Ok(hits.into_iter().map(|h| h.into()).collect())
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Current session state.
    pub fn session(&self) -> Result<FfiSession, GuideError> {
        Ok(self.session.snapshot()?.into())
    }

    /// Flip metric/imperial. Returns the new unit system.
    pub fn toggle_units(&self) -> Result<String, GuideError> {
        Ok(self.session.toggle_units()?.as_str().to_string())
    }

    /// Flip pediatric mode. Returns the new state.
    pub fn toggle_pediatric(&self) -> Result<bool, GuideError> {
        Ok(self.session.toggle_pediatric()?)
    }

    /// Set the patient weight (kg) and age group together.
    pub fn set_patient(
        &self,
        weight_kg: Option<f64>,
        age_group: Option<String>,
    ) -> Result<(), GuideError> {
        let age_group: Option<AgeGroup> = age_group.as_deref().map(parse_input).transpose()?;
        self.session.set_patient(weight_kg, age_group)?;
        Ok(())
    }

    /// Rewrite weight-based dose text for the session's unit system.
    pub fn format_dosage(&self, text: String) -> Result<String, GuideError> {
        let system = self.session.snapshot()?.unit_system();
        Ok(dosing::format_dosage(&text, system))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe condition listing entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConditionSummary {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
}

impl From<ConditionRecord> for FfiConditionSummary {
    fn from(condition: ConditionRecord) -> Self {
        Self {
            id: condition.id,
            name: condition.name,
            category: condition.category,
            description: condition.description,
        }
    }
}

/// FFI-safe search result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSearchHit {
    /// "antibiotic" or "condition"
    pub kind: String,
    pub id: String,
    pub category: Option<String>,
    pub name: String,
    pub description: Option<String>,
}

impl From<SearchHit> for FfiSearchHit {
    fn from(hit: SearchHit) -> Self {
        Self {
            kind: match hit.kind {
                HitKind::Antibiotic => "antibiotic".into(),
                HitKind::Condition => "condition".into(),
            },
            id: hit.id,
            category: hit.category,
            name: hit.name,
            description: hit.description,
        }
    }
}

/// FFI-safe session state.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSession {
    pub unit_system: String,
    pub pediatric_mode: bool,
    pub weight_kg: Option<f64>,
    pub age_group: Option<String>,
}

impl From<SessionContext> for FfiSession {
    fn from(ctx: SessionContext) -> Self {
        Self {
            unit_system: ctx.units.system.as_str().to_string(),
            pediatric_mode: ctx.pediatric_mode,
            weight_kg: ctx.weight_kg,
            age_group: ctx.age_group.map(|a| a.as_str().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::test_support::seeded;
    use tempfile::TempDir;

    fn browser() -> (TempDir, Arc<GuidelineBrowser>) {
        let dir = TempDir::new().unwrap();
        seeded(dir.path());
        let browser =
            open_guidelines(dir.path().display().to_string(), "tiered".into()).unwrap();
        (dir, browser)
    }

    #[test]
    fn test_open_rejects_bad_input() {
        let dir = TempDir::new().unwrap();

        let err = open_guidelines(dir.path().display().to_string(), "nearest-five".into());
        assert!(matches!(err, Err(GuideError::InvalidInput(_))));

        let err = open_guidelines(dir.path().join("missing").display().to_string(), "tiered".into());
        assert!(matches!(err, Err(GuideError::DataUnavailable(_))));
    }

    #[test]
    fn test_treatment_view_json() {
        let (_dir, browser) = browser();

        let json = browser
            .treatment_view(
                "respiratory".into(),
                "pneumonia-cap".into(),
                "first_line".into(),
                Some("inpatient".into()),
            )
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["setting"], "inpatient");
        assert_eq!(value["regimens"].as_array().unwrap().len(), 2);
        // Amoxicillin has no document in the scratch store
        assert_eq!(value["warnings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_treatment_view_errors() {
        let (_dir, browser) = browser();

        let err = browser.treatment_view(
            "respiratory".into(),
            "pneumonia-cap".into(),
            "fourth_line".into(),
            None,
        );
        assert!(matches!(err, Err(GuideError::InvalidInput(_))));

        let err = browser.treatment_view("respiratory".into(), "croup".into(), "1".into(), None);
        assert!(matches!(err, Err(GuideError::NotFound(_))));
    }

    #[test]
    fn test_antibiotic_view_by_alias() {
        let (_dir, browser) = browser();

        let view = browser.build_antibiotic_view("Rocephin").unwrap();
        assert_eq!(view.id, "ceftriaxone");

        assert!(matches!(
            browser.antibiotic_view("linezolid".into()),
            Err(GuideError::NotFound(_))
        ));
    }

    #[test]
    fn test_session_round_trip() {
        let (_dir, browser) = browser();

        assert_eq!(browser.toggle_units().unwrap(), "imperial");
        assert!(browser.toggle_pediatric().unwrap());
        browser.set_patient(Some(18.0), Some("child".into())).unwrap();

        let session = browser.session().unwrap();
        assert_eq!(session.unit_system, "imperial");
        assert_eq!(session.weight_kg, Some(18.0));
        assert_eq!(session.age_group.as_deref(), Some("child"));

        assert_eq!(
            browser.format_dosage("15 mg/kg q8h".into()).unwrap(),
            "33.1 mg/lb q8h"
        );

        let err = browser.set_patient(Some(0.0), None);
        assert!(matches!(err, Err(GuideError::InvalidInput(_))));
        let err = browser.set_patient(Some(9.0), Some("toddler".into()));
        assert!(matches!(err, Err(GuideError::InvalidInput(_))));

        // Failed updates leave the patient untouched
        let session = browser.session().unwrap();
        assert_eq!(session.weight_kg, Some(18.0));
        assert_eq!(session.age_group.as_deref(), Some("child"));
    }

    #[test]
    fn test_search_and_listing() {
        let (_dir, browser) = browser();

        assert_eq!(browser.list_categories().unwrap(), vec!["respiratory"]);
        let conditions = browser.list_conditions("respiratory".into()).unwrap();
        assert_eq!(conditions[0].id, "pneumonia-cap");

        let hits = browser.search("zithro".into()).unwrap();
        assert_eq!(hits[0].kind, "antibiotic");
        assert_eq!(hits[0].id, "azithromycin");
    }
}

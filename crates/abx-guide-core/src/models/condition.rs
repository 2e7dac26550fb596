//! Clinical condition records and their treatment lines.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::antibiotic::Route;
use super::decision::DecisionTree;
use super::filters::{Allergy, Population, Setting};
use super::validation::ValidationError;

/// Regimens keyed by scenario (e.g. "inpatient_moderate"), in document order.
pub type RegimenSet = IndexMap<String, RegimenRecord>;

/// Priority tier of therapy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LineTier {
    FirstLine,
    SecondLine,
    ThirdLine,
}

impl LineTier {
    pub const ALL: [LineTier; 3] = [LineTier::FirstLine, LineTier::SecondLine, LineTier::ThirdLine];

    pub fn as_str(&self) -> &'static str {
        match self {
            LineTier::FirstLine => "first_line",
            LineTier::SecondLine => "second_line",
            LineTier::ThirdLine => "third_line",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LineTier::FirstLine => "First Line",
            LineTier::SecondLine => "Second Line",
            LineTier::ThirdLine => "Third Line",
        }
    }
}

impl std::str::FromStr for LineTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        match key.as_str() {
            "first_line" | "first" | "1" => Ok(LineTier::FirstLine),
            "second_line" | "second" | "2" => Ok(LineTier::SecondLine),
            "third_line" | "third" | "3" => Ok(LineTier::ThirdLine),
            _ => Err(format!("unknown treatment line: {s}")),
        }
    }
}

/// A recommended drug/dose/route combination for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegimenRecord {
    /// Drug combination text, agents joined by "+"
    pub regimen: String,
    pub route: Route,
    /// Free-text dosing (may embed "mg/kg" tokens)
    pub dosing: String,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "super::string_or_seq")]
    pub notes: Vec<String>,
    #[serde(default)]
    pub monitoring: Vec<String>,
    /// Explicit care-setting tag
    #[serde(default)]
    pub setting: Option<String>,
    #[serde(default)]
    pub populations: Vec<String>,
}

impl RegimenRecord {
    pub fn new(regimen: impl Into<String>, route: Route, dosing: impl Into<String>) -> Self {
        Self {
            regimen: regimen.into(),
            route,
            dosing: dosing.into(),
            duration: None,
            notes: Vec::new(),
            monitoring: Vec::new(),
            setting: None,
            populations: Vec::new(),
        }
    }

    /// Component agent names, trimmed, in listed order.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.regimen
            .split('+')
            .map(str::trim)
            .filter(|part| !part.is_empty())
    }
}

/// Regimens for one treatment tier, split by cohort.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TreatmentLine {
    #[serde(default)]
    pub adult: RegimenSet,
    #[serde(default)]
    pub pediatric: Option<RegimenSet>,
}

impl TreatmentLine {
    /// Every regimen across both cohorts.
    pub fn all_regimens(&self) -> impl Iterator<Item = &RegimenRecord> {
        self.adult
            .values()
            .chain(self.pediatric.iter().flat_map(|set| set.values()))
    }
}

/// Treatment lines by tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TreatmentLines {
    #[serde(default)]
    pub first_line: Option<TreatmentLine>,
    #[serde(default)]
    pub second_line: Option<TreatmentLine>,
    #[serde(default)]
    pub third_line: Option<TreatmentLine>,
}

impl TreatmentLines {
    pub fn get(&self, tier: LineTier) -> Option<&TreatmentLine> {
        match tier {
            LineTier::FirstLine => self.first_line.as_ref(),
            LineTier::SecondLine => self.second_line.as_ref(),
            LineTier::ThirdLine => self.third_line.as_ref(),
        }
    }

    /// Tiers present, in priority order.
    pub fn available(&self) -> Vec<LineTier> {
        LineTier::ALL
            .into_iter()
            .filter(|tier| self.get(*tier).is_some())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LineTier, &TreatmentLine)> {
        LineTier::ALL
            .into_iter()
            .filter_map(|tier| self.get(tier).map(|line| (tier, line)))
    }
}

/// Filters a condition says are meaningful for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApplicableFilters {
    #[serde(default)]
    pub allergies: Vec<Allergy>,
    #[serde(default)]
    pub setting: Vec<Setting>,
    #[serde(default)]
    pub populations: Vec<Population>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConditionFilters {
    pub applicable: ApplicableFilters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Epidemiology {
    #[serde(default)]
    pub incidence: Option<String>,
    #[serde(default)]
    pub common_pathogens: Vec<String>,
}

/// Patient-facing instruction blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientInstructions {
    #[serde(default)]
    pub general: Vec<String>,
    #[serde(default)]
    pub purulent: Vec<String>,
    #[serde(default)]
    pub follow_up: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub wound_care: Vec<String>,
    #[serde(default)]
    pub stepdown_guidance: Vec<String>,
}

impl PatientInstructions {
    pub fn is_empty(&self) -> bool {
        self.general.is_empty()
            && self.purulent.is_empty()
            && self.follow_up.is_empty()
            && self.wound_care.is_empty()
            && self.stepdown_guidance.is_empty()
    }
}

/// A clinical condition with its treatment guidance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionRecord {
    pub id: String,
    pub name: String,
    /// Category directory; filled from the document location when absent
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub epidemiology: Option<Epidemiology>,
    #[serde(default)]
    pub diagnostic_pearls: Vec<String>,
    #[serde(default)]
    pub filters: Option<ConditionFilters>,
    #[serde(default)]
    pub empiric_logic: Option<String>,
    #[serde(default)]
    pub decision_tree: Option<DecisionTree>,
    pub treatment_lines: TreatmentLines,
    #[serde(default)]
    pub patient_instructions: Option<PatientInstructions>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub last_updated: Option<NaiveDate>,
}

impl ConditionRecord {
    /// Create a condition with no treatment lines.
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            description: None,
            tags: Vec::new(),
            epidemiology: None,
            diagnostic_pearls: Vec::new(),
            filters: None,
            empiric_logic: None,
            decision_tree: None,
            treatment_lines: TreatmentLines::default(),
            patient_instructions: None,
            references: Vec::new(),
            last_updated: None,
        }
    }

    /// Setting to show first: the condition's first applicable setting.
    pub fn default_setting(&self) -> Setting {
        self.filters
            .as_ref()
            .and_then(|f| f.applicable.setting.first().copied())
            .unwrap_or_default()
    }

    /// Check record invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingId);
        }
        if self.treatment_lines.first_line.is_none() {
            return Err(ValidationError::MissingFirstLine);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELLULITIS: &str = r#"
id: cellulitis
name: Cellulitis
category: skin
filters:
  applicable:
    allergies: [none, penicillin]
    setting: [inpatient, outpatient]
    populations: [none]
treatmentLines:
  first_line:
    adult:
      outpatient_mild:
        regimen: Cephalexin
        route: PO
        dosing: 500 mg q6h
        notes: Legacy single note
      inpatient_moderate:
        regimen: Cefazolin
        route: IV
        dosing: 2 g q8h
        notes: [First, Second]
patientInstructions:
  general: [Elevate the limb]
  followUp:
    48h: [Return if spreading]
"#;

    #[test]
    fn test_parse_condition() {
        let condition: ConditionRecord = serde_yaml::from_str(CELLULITIS).unwrap();

        assert_eq!(condition.id, "cellulitis");
        assert_eq!(condition.default_setting(), Setting::Inpatient);
        assert_eq!(condition.treatment_lines.available(), vec![LineTier::FirstLine]);

        let line = condition.treatment_lines.get(LineTier::FirstLine).unwrap();
        let scenarios: Vec<&str> = line.adult.keys().map(|k| k.as_str()).collect();
        assert_eq!(scenarios, vec!["outpatient_mild", "inpatient_moderate"]);

        assert_eq!(line.adult["outpatient_mild"].notes, vec!["Legacy single note"]);
        assert_eq!(line.adult["inpatient_moderate"].notes.len(), 2);

        let instructions = condition.patient_instructions.as_ref().unwrap();
        assert_eq!(instructions.follow_up["48h"], vec!["Return if spreading"]);
        assert!(condition.validate().is_ok());
    }

    #[test]
    fn test_default_setting_without_filters() {
        let mut condition: ConditionRecord = serde_yaml::from_str(CELLULITIS).unwrap();
        condition.filters = None;
        assert_eq!(condition.default_setting(), Setting::Outpatient);
    }

    #[test]
    fn test_missing_first_line_rejected() {
        let mut condition: ConditionRecord = serde_yaml::from_str(CELLULITIS).unwrap();
        condition.treatment_lines.first_line = None;
        assert_eq!(condition.validate(), Err(ValidationError::MissingFirstLine));
    }

    #[test]
    fn test_regimen_components() {
        let regimen = RegimenRecord::new("Piperacillin-Tazobactam + Vancomycin ", Route::Iv, "");
        let parts: Vec<&str> = regimen.components().collect();
        assert_eq!(parts, vec!["Piperacillin-Tazobactam", "Vancomycin"]);
    }

    #[test]
    fn test_line_tier_parse() {
        assert_eq!("first_line".parse::<LineTier>(), Ok(LineTier::FirstLine));
        assert_eq!("second-line".parse::<LineTier>(), Ok(LineTier::SecondLine));
        assert_eq!("3".parse::<LineTier>(), Ok(LineTier::ThirdLine));
        assert!("fourth".parse::<LineTier>().is_err());
    }
}

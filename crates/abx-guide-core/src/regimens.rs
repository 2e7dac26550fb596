//! Regimen selection for a treatment line.
//!
//! Selection is a permissive OR-filter over setting tags and scenario key
//! names. Untagged regimens always pass, so most lines show every regimen in
//! every setting; only explicitly tagged regimens are ever hidden.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::{ConditionRecord, LineTier, RegimenRecord, RegimenSet, Setting, TreatmentLine};

/// Patient cohort a regimen set is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cohort {
    #[default]
    Adult,
    Pediatric,
}

impl Cohort {
    pub fn from_pediatric_mode(pediatric_mode: bool) -> Self {
        if pediatric_mode {
            Cohort::Pediatric
        } else {
            Cohort::Adult
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cohort::Adult => "adult",
            Cohort::Pediatric => "pediatric",
        }
    }
}

/// Select the regimens to display for `setting`, keeping document order.
pub fn select_regimens(regimens: &RegimenSet, setting: Setting) -> IndexMap<&str, &RegimenRecord> {
    regimens
        .iter()
        .filter(|(key, regimen)| is_applicable(key, regimen, setting))
        .map(|(key, regimen)| (key.as_str(), regimen))
        .collect()
}

/// A regimen passes when any of these hold:
/// - it has no setting tag (an empty tag counts as none)
/// - its setting tag equals the active setting exactly (`"icu"`, not `"ICU"`)
/// - its scenario key mentions the active setting
/// - its scenario key is a combination not marked setting-specific
pub fn is_applicable(key: &str, regimen: &RegimenRecord, setting: Setting) -> bool {
    let key = key.to_lowercase();
    let active = setting.as_str();

    match regimen.setting.as_deref() {
        None | Some("") => true,
        Some(tag) if tag == active => true,
        Some(_) => {
            key.contains(active)
                || (key.contains("combination") && !key.contains("setting_specific"))
        }
    }
}

/// Regimens for a cohort. `None` when the line has nothing for it.
pub fn regimens_for_cohort(line: &TreatmentLine, cohort: Cohort) -> Option<&RegimenSet> {
    let regimens = match cohort {
        Cohort::Adult => Some(&line.adult),
        Cohort::Pediatric => line.pediatric.as_ref(),
    };
    regimens.filter(|set| !set.is_empty())
}

/// Treatment-line tiers present on a condition, first to third.
pub fn available_lines(condition: &ConditionRecord) -> Vec<LineTier> {
    condition.treatment_lines.available()
}

/// Where a scenario key named by a decision-tree leaf lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TreatmentLocation {
    pub line: LineTier,
    pub setting: Setting,
}

/// Find the line holding scenario `key` and the setting to display it under.
///
/// The setting comes from the regimen's own tag, else from the key name
/// (`inpatient`, `icu`), else outpatient. When the key appears on several
/// lines the last one wins.
pub fn locate_treatment(condition: &ConditionRecord, key: &str) -> Option<TreatmentLocation> {
    let mut found = None;

    for (tier, line) in condition.treatment_lines.iter() {
        let regimen = line
            .adult
            .get(key)
            .or_else(|| line.pediatric.as_ref().and_then(|p| p.get(key)));
        let Some(regimen) = regimen else {
            continue;
        };

        let setting = regimen
            .setting
            .as_deref()
            .and_then(|tag| tag.parse::<Setting>().ok())
            .unwrap_or_else(|| {
                if key.contains("inpatient") {
                    Setting::Inpatient
                } else if key.contains("icu") {
                    Setting::Icu
                } else {
                    Setting::Outpatient
                }
            });

        found = Some(TreatmentLocation { line: tier, setting });
    }

    found
}

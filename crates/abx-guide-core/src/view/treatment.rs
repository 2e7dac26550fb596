//! Treatment page: regimens for one condition, line and setting.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dosing::format_dosage;
use crate::models::{
    Catalog, ConditionRecord, LineTier, PatientInstructions, RegimenRecord, Route, Setting,
    UnitSystem,
};
use crate::regimens::{available_lines, regimens_for_cohort, select_regimens, Cohort};
use crate::resolver::{ComponentResolution, Resolver};
use crate::session::SessionContext;

/// Which part of a condition to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreatmentRequest {
    pub line: LineTier,
    /// Care setting; the condition's default when unset
    pub setting: Option<Setting>,
}

impl Default for TreatmentRequest {
    fn default() -> Self {
        Self {
            line: LineTier::FirstLine,
            setting: None,
        }
    }
}

/// One displayed regimen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegimenView {
    pub scenario: String,
    pub regimen: String,
    pub route: Route,
    /// Dosing text in the session's unit system
    pub dosing: String,
    pub duration: Option<String>,
    pub notes: Vec<String>,
    pub monitoring: Vec<String>,
    pub setting: Option<String>,
    pub components: Vec<ComponentResolution>,
}

impl RegimenView {
    fn build(
        scenario: &str,
        regimen: &RegimenRecord,
        catalog: &Catalog,
        system: UnitSystem,
        resolver: &Resolver<'_>,
    ) -> Self {
        Self {
            scenario: scenario.to_string(),
            regimen: regimen.regimen.clone(),
            route: regimen.route,
            dosing: format_dosage(&regimen.dosing, system),
            duration: regimen.duration.clone(),
            notes: regimen.notes.clone(),
            monitoring: regimen.monitoring.clone(),
            setting: regimen.setting.clone(),
            components: resolver.resolve_components(&regimen.regimen, catalog),
        }
    }

    /// Display title from the scenario key ("inpatient_moderate" → "Inpatient Moderate").
    pub fn title(&self) -> String {
        self.scenario
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Regimens for one condition, line and setting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentView {
    pub condition_id: String,
    pub condition_name: String,
    pub description: Option<String>,
    pub diagnostic_pearls: Vec<String>,
    /// Empiric therapy rationale
    pub empiric_logic: Option<String>,
    pub line: LineTier,
    pub setting: Setting,
    pub cohort: Cohort,
    pub unit_system: UnitSystem,
    pub available_lines: Vec<LineTier>,
    pub available_settings: Vec<Setting>,
    pub regimens: Vec<RegimenView>,
    /// Message shown instead of an empty regimen list
    pub empty_state: Option<String>,
    /// Regimen components without antibiotic details
    pub warnings: Vec<String>,
    /// Patient education and step-down guidance, when the condition has any
    pub patient_instructions: Option<PatientInstructions>,
}

impl TreatmentView {
    /// Assemble the treatment page. Never fails: absent data becomes an
    /// empty state or a warning.
    pub fn build(
        condition: &ConditionRecord,
        catalog: &Catalog,
        request: TreatmentRequest,
        session: &SessionContext,
    ) -> Self {
        let setting = request.setting.unwrap_or_else(|| condition.default_setting());
        let cohort = Cohort::from_pediatric_mode(session.pediatric_mode);
        let available_settings = condition
            .filters
            .as_ref()
            .map(|f| f.applicable.setting.clone())
            .filter(|settings| !settings.is_empty())
            .unwrap_or_else(|| vec![Setting::Outpatient]);

        let mut view = Self {
            condition_id: condition.id.clone(),
            condition_name: condition.name.clone(),
            description: condition.description.clone(),
            diagnostic_pearls: condition.diagnostic_pearls.clone(),
            empiric_logic: condition.empiric_logic.clone(),
            line: request.line,
            setting,
            cohort,
            unit_system: session.unit_system(),
            available_lines: available_lines(condition),
            available_settings,
            regimens: Vec::new(),
            empty_state: None,
            warnings: Vec::new(),
            patient_instructions: condition
                .patient_instructions
                .clone()
                .filter(|instructions| !instructions.is_empty()),
        };

        let Some(line) = condition.treatment_lines.get(request.line) else {
            view.empty_state = Some(format!(
                "No {} treatments available for this condition.",
                request.line.label().to_lowercase()
            ));
            return view;
        };

        let Some(regimens) = regimens_for_cohort(line, cohort) else {
            view.empty_state = Some(format!(
                "No {} treatments available for this condition. Please consult with a specialist.",
                cohort.as_str()
            ));
            return view;
        };

        let selected = select_regimens(regimens, setting);
        debug!(
            condition = %condition.id,
            line = request.line.as_str(),
            setting = setting.as_str(),
            shown = selected.len(),
            total = regimens.len(),
            "Selected regimens"
        );
        if selected.is_empty() {
            view.empty_state = Some(format!(
                "No regimens for the {} setting on the {}.",
                setting.as_str(),
                request.line.label().to_lowercase()
            ));
            return view;
        }

        let resolver = Resolver::standard();
        for (scenario, regimen) in selected {
            let regimen_view =
                RegimenView::build(scenario, regimen, catalog, view.unit_system, &resolver);

            for component in &regimen_view.components {
                if let ComponentResolution::Missing(miss) = component {
                    warn!(condition = %condition.id, scenario, token = %miss.token, "Unresolved antibiotic");
                    view.warnings.push(miss.to_string());
                }
            }
            view.regimens.push(regimen_view);
        }

        info!(
            condition = %condition.id,
            regimens = view.regimens.len(),
            unresolved = view.warnings.len(),
            "Built treatment view"
        );
        view
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        super::to_json(self)
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TreatmentView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.condition_name)?;
        if let Some(description) = &self.description {
            writeln!(f, "{description}")?;
        }
        if !self.diagnostic_pearls.is_empty() {
            writeln!(f, "\nDiagnostic pearls")?;
            write_items(f, &self.diagnostic_pearls)?;
        }
        if let Some(logic) = &self.empiric_logic {
            writeln!(f, "\nEmpiric logic: {logic}")?;
        }

        writeln!(
            f,
            "\n{} | {} | {}",
            self.line.label(),
            self.setting.as_str(),
            self.cohort.as_str()
        )?;

        if let Some(message) = &self.empty_state {
            writeln!(f, "\n{message}")?;
        }

        for regimen in &self.regimens {
            writeln!(f, "\n{}", regimen.title())?;
            writeln!(f, "  {} ({})", regimen.regimen, regimen.route)?;
            writeln!(f, "  Dosing: {}", regimen.dosing)?;
            if let Some(duration) = &regimen.duration {
                writeln!(f, "  Duration: {duration}")?;
            }
            write_items(f, &regimen.notes)?;
            if !regimen.monitoring.is_empty() {
                writeln!(f, "  Monitoring: {}", regimen.monitoring.join(", "))?;
            }
        }

        for warning in &self.warnings {
            writeln!(f, "\nWarning: {warning}")?;
        }

        if let Some(instructions) = &self.patient_instructions {
            write_instructions(f, instructions)?;
        }
        Ok(())
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[String]) -> fmt::Result {
    for item in items {
        writeln!(f, "  - {item}")?;
    }
    Ok(())
}

fn write_instructions(f: &mut fmt::Formatter<'_>, instructions: &PatientInstructions) -> fmt::Result {
    let education = [
        ("General", &instructions.general),
        ("Purulent infection", &instructions.purulent),
        ("Wound care", &instructions.wound_care),
    ];
    if education.iter().any(|(_, items)| !items.is_empty()) || !instructions.follow_up.is_empty() {
        writeln!(f, "\nPatient education")?;
        for (heading, items) in education {
            if !items.is_empty() {
                writeln!(f, " {heading}")?;
                write_items(f, items)?;
            }
        }
        for (when, items) in &instructions.follow_up {
            writeln!(f, " Follow-up {when}")?;
            write_items(f, items)?;
        }
    }

    if !instructions.stepdown_guidance.is_empty() {
        writeln!(f, "\nStep-down guidance")?;
        write_items(f, &instructions.stepdown_guidance)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AntibioticRecord, ApplicableFilters, ConditionFilters, RegimenSet, TreatmentLine,
        TreatmentLines,
    };
    use indexmap::IndexMap;

    fn condition() -> ConditionRecord {
        let mut adult = RegimenSet::new();
        let mut combo = RegimenRecord::new("Ceftriaxone + Azithromycin", Route::Iv, "50 mg/kg IV q24h");
        combo.duration = Some("5 days".into());
        adult.insert("inpatient_moderate".into(), combo);
        let mut icu = RegimenRecord::new("Vancomycin", Route::Iv, "15 mg/kg q12h");
        icu.setting = Some("icu".into());
        adult.insert("severe".into(), icu);

        let mut condition = ConditionRecord::new("pneumonia-cap", "Community-acquired pneumonia", "respiratory");
        condition.filters = Some(ConditionFilters {
            applicable: ApplicableFilters {
                setting: vec![Setting::Inpatient, Setting::Icu],
                ..Default::default()
            },
        });
        condition.treatment_lines = TreatmentLines {
            first_line: Some(TreatmentLine {
                adult,
                pediatric: None,
            }),
            ..Default::default()
        };
        condition
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert(
            "Ceftriaxone".into(),
            AntibioticRecord::new("ceftriaxone".into(), "Ceftriaxone".into(), "Cephalosporin".into()),
        );
        catalog
    }

    #[test]
    fn test_build_defaults_to_condition_setting() {
        let view = TreatmentView::build(
            &condition(),
            &catalog(),
            TreatmentRequest::default(),
            &SessionContext::default(),
        );

        assert_eq!(view.setting, Setting::Inpatient);
        assert_eq!(view.available_settings, vec![Setting::Inpatient, Setting::Icu]);
        // "severe" is tagged icu and its key does not mention inpatient
        let scenarios: Vec<&str> = view.regimens.iter().map(|r| r.scenario.as_str()).collect();
        assert_eq!(scenarios, vec!["inpatient_moderate"]);
        assert!(view.empty_state.is_none());
    }

    #[test]
    fn test_build_degrades_on_missing_antibiotic() {
        let view = TreatmentView::build(
            &condition(),
            &catalog(),
            TreatmentRequest::default(),
            &SessionContext::default(),
        );

        let components = &view.regimens[0].components;
        assert!(components[0].is_resolved());
        assert!(!components[1].is_resolved());
        assert_eq!(view.warnings.len(), 1);
        assert!(view.warnings[0].contains("Azithromycin"));
    }

    #[test]
    fn test_build_formats_dosing_for_units() {
        let session = SessionContext::with_units(UnitSystem::Imperial);
        let view = TreatmentView::build(
            &condition(),
            &catalog(),
            TreatmentRequest {
                line: LineTier::FirstLine,
                setting: Some(Setting::Icu),
            },
            &session,
        );

        assert_eq!(view.regimens.len(), 2);
        assert_eq!(view.regimens[0].dosing, "110.2 mg/lb IV q24h");
        assert_eq!(view.regimens[1].dosing, "33.1 mg/lb q12h");
    }

    #[test]
    fn test_build_empty_states() {
        let session = SessionContext::default();

        let view = TreatmentView::build(
            &condition(),
            &catalog(),
            TreatmentRequest {
                line: LineTier::SecondLine,
                setting: None,
            },
            &session,
        );
        assert!(view.regimens.is_empty());
        assert_eq!(
            view.empty_state.as_deref(),
            Some("No second line treatments available for this condition.")
        );

        let pediatric = SessionContext {
            pediatric_mode: true,
            ..session
        };
        let view = TreatmentView::build(
            &condition(),
            &catalog(),
            TreatmentRequest::default(),
            &pediatric,
        );
        assert_eq!(view.cohort, Cohort::Pediatric);
        assert!(view.empty_state.unwrap().starts_with("No pediatric treatments"));
    }

    #[test]
    fn test_build_empty_after_filter() {
        let mut condition = condition();
        let line = condition.treatment_lines.first_line.as_mut().unwrap();
        line.adult.shift_remove("inpatient_moderate");

        let view = TreatmentView::build(
            &condition,
            &catalog(),
            TreatmentRequest {
                line: LineTier::FirstLine,
                setting: Some(Setting::Outpatient),
            },
            &SessionContext::default(),
        );
        assert!(view.regimens.is_empty());
        assert_eq!(
            view.empty_state.as_deref(),
            Some("No regimens for the outpatient setting on the first line.")
        );
    }

    #[test]
    fn test_title_and_text() {
        let view = TreatmentView::build(
            &condition(),
            &catalog(),
            TreatmentRequest::default(),
            &SessionContext::default(),
        );

        assert_eq!(view.regimens[0].title(), "Inpatient Moderate");
        let text = view.to_text();
        assert!(text.contains("Ceftriaxone + Azithromycin (IV)"));
        assert!(text.contains("Duration: 5 days"));
        assert!(text.contains("Warning: No antibiotic details found for \"Azithromycin\""));

        let json = view.to_json().unwrap();
        assert!(json.contains("\"conditionId\": \"pneumonia-cap\""));
    }

    #[test]
    fn test_condition_guidance_sections() {
        let mut condition = condition();
        condition.diagnostic_pearls = vec!["Check CURB-65".into()];
        condition.empiric_logic = Some("Cover pneumococcus and atypicals".into());
        condition.patient_instructions = Some(PatientInstructions {
            general: vec!["Finish the course".into()],
            follow_up: IndexMap::from([("48h".to_string(), vec!["Return if worse".to_string()])]),
            stepdown_guidance: vec!["Switch to oral when afebrile".into()],
            ..Default::default()
        });

        // Guidance shows even when the line has nothing to list
        let view = TreatmentView::build(
            &condition,
            &catalog(),
            TreatmentRequest {
                line: LineTier::ThirdLine,
                setting: None,
            },
            &SessionContext::default(),
        );
        assert_eq!(view.diagnostic_pearls, vec!["Check CURB-65"]);
        assert!(view.empty_state.is_some());

        let text = view.to_text();
        assert!(text.contains("Diagnostic pearls\n  - Check CURB-65"));
        assert!(text.contains("Empiric logic: Cover pneumococcus and atypicals"));
        assert!(text.contains("Patient education\n General\n  - Finish the course"));
        assert!(text.contains(" Follow-up 48h\n  - Return if worse"));
        assert!(text.contains("Step-down guidance\n  - Switch to oral when afebrile"));

        let json: serde_json::Value = serde_json::from_str(&view.to_json().unwrap()).unwrap();
        assert_eq!(json["empiricLogic"], "Cover pneumococcus and atypicals");
        assert_eq!(json["patientInstructions"]["stepdownGuidance"][0], "Switch to oral when afebrile");
        assert_eq!(json["patientInstructions"]["followUp"]["48h"][0], "Return if worse");
    }

    #[test]
    fn test_empty_instructions_are_dropped() {
        let mut condition = condition();
        condition.patient_instructions = Some(PatientInstructions::default());

        let view = TreatmentView::build(
            &condition,
            &catalog(),
            TreatmentRequest::default(),
            &SessionContext::default(),
        );
        assert!(view.patient_instructions.is_none());
        assert!(!view.to_text().contains("Patient education"));
    }
}

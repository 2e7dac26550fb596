//! Antibiotic detail page.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::ViewConfig;
use crate::dosing::{convert_weight, format_dosage, PediatricDoseResult};
use crate::models::{
    AntibioticRecord, CostTier, Pkpd, RenalAdjustment, Route, Spectrum, StewardshipTier,
    UnitSystem, WeightUnit,
};
use crate::session::SessionContext;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdultDosingView {
    pub indication: String,
    pub dose: String,
    pub route: Route,
    pub frequency: String,
    pub duration: Option<String>,
    pub max_dose: Option<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PediatricDosingView {
    pub indication: String,
    /// Rule dose, e.g. "50 mg/kg/day q24h", in the session's units
    pub rule: String,
    /// Present when pediatric mode is on and a weight is known
    pub calculation: Option<PediatricDoseResult>,
}

/// Everything shown for one antibiotic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AntibioticView {
    pub id: String,
    pub name: String,
    pub drug_class: String,
    pub stewardship_tier: Option<StewardshipTier>,
    pub cost: Option<CostTier>,
    pub spectrum: Spectrum,
    pub unit_system: UnitSystem,
    pub adult_dosing: Vec<AdultDosingView>,
    pub pediatric_dosing: Vec<PediatricDosingView>,
    /// Patient weight in the session's display unit
    pub patient_weight: Option<f64>,
    /// Prompt shown when pediatric mode is on but no weight is set
    pub pediatric_prompt: Option<String>,
    pub renal_adjustment: Option<RenalAdjustment>,
    pub hepatic_adjustment: Option<String>,
    pub pkpd: Option<Pkpd>,
    pub adverse_effects: Vec<String>,
    pub monitoring: Vec<String>,
    pub pregnancy: Option<String>,
    pub references: Vec<String>,
    pub last_updated: Option<NaiveDate>,
}

impl AntibioticView {
    pub fn build(record: &AntibioticRecord, session: &SessionContext, config: &ViewConfig) -> Self {
        let system = session.unit_system();

        let adult_dosing = record
            .adult
            .iter()
            .map(|(indication, dosing)| AdultDosingView {
                indication: indication.clone(),
                dose: format_dosage(&dosing.dose, system),
                route: dosing.route,
                frequency: dosing.frequency.clone(),
                duration: dosing.duration.clone(),
                max_dose: dosing.max_dose.clone(),
                notes: dosing.notes.clone(),
            })
            .collect();

        let calculator = config.calculator();
        let weight = session.pediatric_weight();
        let pediatric_dosing = record
            .pediatric
            .iter()
            .map(|(indication, rule)| {
                let calculation = weight.map(|weight_kg| {
                    let adult_dose = record.adult_dosing_for(indication).map(|d| d.dose.as_str());
                    calculator.calculate(weight_kg, session.age_group, rule, adult_dose)
                });
                PediatricDosingView {
                    indication: indication.clone(),
                    rule: format_dosage(
                        &format!("{} mg/kg/day {}", rule.dose_per_kg, rule.frequency),
                        system,
                    ),
                    calculation,
                }
            })
            .collect();

        let pediatric_prompt = (session.pediatric_mode
            && session.weight_kg.is_none()
            && !record.pediatric.is_empty())
        .then(|| "Enter patient weight in kg to calculate dose".to_string());

        debug!(
            antibiotic = %record.id,
            pediatric = session.pediatric_mode,
            calculated = weight.is_some(),
            "Built antibiotic view"
        );

        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            drug_class: record.drug_class.clone(),
            stewardship_tier: record.stewardship_tier,
            cost: record.cost,
            spectrum: record.spectrum.clone(),
            unit_system: system,
            adult_dosing,
            pediatric_dosing,
            patient_weight: weight.map(|kg| convert_weight(kg, WeightUnit::Kg, system)),
            pediatric_prompt,
            renal_adjustment: record.renal_adjustment.clone(),
            hepatic_adjustment: record.hepatic_adjustment.clone(),
            pkpd: record.pkpd.clone(),
            adverse_effects: record.adverse_effects.clone(),
            monitoring: record.monitoring.clone(),
            pregnancy: record.pregnancy.clone(),
            references: record.references.clone(),
            last_updated: record.last_updated,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        super::to_json(self)
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AntibioticView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.drug_class)?;
        if let Some(tier) = self.stewardship_tier {
            write!(f, "Stewardship: {}", tier.as_str())?;
            if let Some(cost) = self.cost {
                write!(f, "  Cost: {}", cost.symbol())?;
            }
            writeln!(f)?;
        }

        if !self.spectrum.plus.is_empty() {
            writeln!(f, "Covers: {}", self.spectrum.plus.join(", "))?;
        }
        if !self.spectrum.minus.is_empty() {
            writeln!(f, "Does not cover: {}", self.spectrum.minus.join(", "))?;
        }

        if !self.adult_dosing.is_empty() {
            writeln!(f, "\nAdult dosing")?;
            for dosing in &self.adult_dosing {
                write!(
                    f,
                    "  {}: {} {} {}",
                    dosing.indication, dosing.dose, dosing.route, dosing.frequency
                )?;
                if let Some(max) = &dosing.max_dose {
                    write!(f, " (max {max})")?;
                }
                writeln!(f)?;
            }
        }

        if !self.pediatric_dosing.is_empty() {
            writeln!(f, "\nPediatric dosing")?;
            if let Some(weight) = self.patient_weight {
                let unit = match self.unit_system {
                    UnitSystem::Metric => "kg",
                    UnitSystem::Imperial => "lb",
                };
                writeln!(f, "  Patient weight: {weight} {unit}")?;
            }
            for dosing in &self.pediatric_dosing {
                writeln!(f, "  {}: {}", dosing.indication, dosing.rule)?;
                if let Some(result) = &dosing.calculation {
                    for line in result.format().lines() {
                        writeln!(f, "    {line}")?;
                    }
                }
            }
            if let Some(prompt) = &self.pediatric_prompt {
                writeln!(f, "  {prompt}")?;
            }
        }

        if let Some(renal) = &self.renal_adjustment {
            writeln!(f, "\nRenal: {}", renal.note)?;
            for row in &renal.table {
                writeln!(f, "  CrCl {}: {} {}", row.crcl, row.dose, row.frequency)?;
            }
        }
        if let Some(hepatic) = &self.hepatic_adjustment {
            writeln!(f, "Hepatic: {hepatic}")?;
        }
        if !self.adverse_effects.is_empty() {
            writeln!(f, "Adverse effects: {}", self.adverse_effects.join(", "))?;
        }
        if !self.monitoring.is_empty() {
            writeln!(f, "Monitoring: {}", self.monitoring.join(", "))?;
        }
        if let Some(pregnancy) = &self.pregnancy {
            writeln!(f, "Pregnancy: {pregnancy}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dosing::RoundingPolicy;
    use crate::models::{AdultDosing, AgeGroup, PediatricDosingRule};

    fn vancomycin() -> AntibioticRecord {
        let mut record =
            AntibioticRecord::new("vancomycin".into(), "Vancomycin".into(), "Glycopeptide".into());
        record.adult.insert(
            "sepsis".into(),
            AdultDosing {
                dose: "15 mg/kg".into(),
                route: Route::Iv,
                frequency: "q12h".into(),
                duration: None,
                max_dose: Some("2 g per dose".into()),
                notes: Vec::new(),
            },
        );
        record.adult.insert(
            "c-diff".into(),
            AdultDosing {
                dose: "125 mg".into(),
                route: Route::Po,
                frequency: "q6h".into(),
                duration: None,
                max_dose: None,
                notes: Vec::new(),
            },
        );
        let mut rule = PediatricDosingRule::new(60.0, "q6h");
        rule.max_daily = Some(4000.0);
        record.pediatric.insert("sepsis".into(), rule);
        record.pediatric.insert("c-diff".into(), PediatricDosingRule::new(40.0, "q6h"));
        record
    }

    fn config() -> ViewConfig {
        ViewConfig::new(RoundingPolicy::Tiered)
    }

    #[test]
    fn test_adult_only_view() {
        let view = AntibioticView::build(&vancomycin(), &SessionContext::default(), &config());

        assert_eq!(view.adult_dosing.len(), 2);
        assert_eq!(view.pediatric_dosing[0].rule, "60 mg/kg/day q6h");
        assert!(view.pediatric_dosing.iter().all(|p| p.calculation.is_none()));
        assert!(view.pediatric_prompt.is_none());
        assert!(view.patient_weight.is_none());
    }

    #[test]
    fn test_pediatric_calculations() {
        let session = SessionContext {
            pediatric_mode: true,
            weight_kg: Some(20.0),
            age_group: Some(AgeGroup::Child),
            ..SessionContext::default()
        };
        let view = AntibioticView::build(&vancomycin(), &session, &config());

        // 20 x 60 = 1200/day, 300 per dose; adult "15 mg/kg" is not comparable
        let sepsis = view.pediatric_dosing[0].calculation.as_ref().unwrap();
        assert_eq!(sepsis.rounded_dose, 300.0);
        assert!(!sepsis.is_above_adult_dose);

        // 20 x 40 = 800/day, 200 per dose, above the 125 mg adult oral dose
        let cdiff = view.pediatric_dosing[1].calculation.as_ref().unwrap();
        assert_eq!(cdiff.rounded_dose, 200.0);
        assert!(cdiff.is_above_adult_dose);
    }

    #[test]
    fn test_prompt_without_weight() {
        let session = SessionContext {
            pediatric_mode: true,
            ..SessionContext::default()
        };
        let view = AntibioticView::build(&vancomycin(), &session, &config());

        assert_eq!(
            view.pediatric_prompt.as_deref(),
            Some("Enter patient weight in kg to calculate dose")
        );
    }

    #[test]
    fn test_imperial_view() {
        let session = SessionContext {
            pediatric_mode: true,
            weight_kg: Some(10.0),
            ..SessionContext::with_units(UnitSystem::Imperial)
        };
        let view = AntibioticView::build(&vancomycin(), &session, &config());

        assert_eq!(view.adult_dosing[0].dose, "33.1 mg/lb");
        assert_eq!(view.pediatric_dosing[0].rule, "132.3 mg/lb/day q6h");
        assert_eq!(view.patient_weight, Some(22.0));

        let text = view.to_text();
        assert!(text.contains("Patient weight: 22 lb"));
        assert!(text.contains("sepsis: 33.1 mg/lb IV q12h (max 2 g per dose)"));
    }
}

//! Antibiotic reference records.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::pediatric::PediatricDosingRule;
use super::validation::ValidationError;

/// Catalog of loaded antibiotic records keyed by lookup name.
///
/// Iteration follows insertion order, which the resolver relies on to break
/// ties between equally good matches.
pub type Catalog = IndexMap<String, AntibioticRecord>;

/// Route of administration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Route {
    Iv,
    Im,
    Po,
    Pr,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Iv => "IV",
            Route::Im => "IM",
            Route::Po => "PO",
            Route::Pr => "PR",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Antimicrobial stewardship classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StewardshipTier {
    Core,
    Watch,
    Reserve,
}

impl StewardshipTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            StewardshipTier::Core => "Core",
            StewardshipTier::Watch => "Watch",
            StewardshipTier::Reserve => "Reserve",
        }
    }
}

/// Relative acquisition cost.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CostTier {
    #[serde(rename = "$")]
    Low,
    #[serde(rename = "$$")]
    Moderate,
    #[serde(rename = "$$$")]
    High,
}

impl CostTier {
    pub fn symbol(&self) -> &'static str {
        match self {
            CostTier::Low => "$",
            CostTier::Moderate => "$$",
            CostTier::High => "$$$",
        }
    }
}

/// Organisms covered and not covered.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Spectrum {
    /// Organisms reliably covered
    #[serde(default)]
    pub plus: Vec<String>,
    /// Organisms not covered
    #[serde(default)]
    pub minus: Vec<String>,
}

/// Adult dosing for a single indication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdultDosing {
    /// Dose text (e.g. "1 g", "15-20 mg/kg")
    pub dose: String,
    pub route: Route,
    /// Frequency text (e.g. "q24h")
    pub frequency: String,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub max_dose: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// One row of a renal dose-adjustment table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenalDoseRow {
    /// Creatinine clearance band (e.g. "10-50")
    pub crcl: String,
    pub dose: String,
    pub frequency: String,
}

/// Renal dose adjustment guidance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenalAdjustment {
    pub note: String,
    #[serde(default)]
    pub table: Vec<RenalDoseRow>,
}

/// Pharmacokinetic / pharmacodynamic summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pkpd {
    #[serde(default)]
    pub half_life: Option<String>,
    #[serde(default)]
    pub vd: Option<String>,
}

/// A single antibiotic reference record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AntibioticRecord {
    /// Stable lookup key (e.g. "piperacillin-tazobactam")
    pub id: String,
    /// Display name
    pub name: String,
    /// Drug class (e.g. "Cephalosporin (3rd generation)")
    #[serde(rename = "class")]
    pub drug_class: String,
    #[serde(default)]
    pub spectrum: Spectrum,
    #[serde(default)]
    pub stewardship_tier: Option<StewardshipTier>,
    /// Adult dosing keyed by indication, in document order
    #[serde(default)]
    pub adult: IndexMap<String, AdultDosing>,
    /// Pediatric dosing rules keyed by indication
    #[serde(default, rename = "paeds", alias = "pediatric")]
    pub pediatric: IndexMap<String, PediatricDosingRule>,
    #[serde(default)]
    pub renal_adjustment: Option<RenalAdjustment>,
    #[serde(default)]
    pub hepatic_adjustment: Option<String>,
    #[serde(default)]
    pub pkpd: Option<Pkpd>,
    #[serde(default)]
    pub adverse_effects: Vec<String>,
    #[serde(default)]
    pub monitoring: Vec<String>,
    /// Pregnancy category text
    #[serde(default)]
    pub pregnancy: Option<String>,
    #[serde(default)]
    pub cost: Option<CostTier>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub last_updated: Option<NaiveDate>,
}

impl AntibioticRecord {
    /// Create a new record with required fields.
    pub fn new(id: String, name: String, drug_class: String) -> Self {
        Self {
            id,
            name,
            drug_class,
            spectrum: Spectrum::default(),
            stewardship_tier: None,
            adult: IndexMap::new(),
            pediatric: IndexMap::new(),
            renal_adjustment: None,
            hepatic_adjustment: None,
            pkpd: None,
            adverse_effects: Vec::new(),
            monitoring: Vec::new(),
            pregnancy: None,
            cost: None,
            references: Vec::new(),
            last_updated: None,
        }
    }

    /// Adult dosing for an indication, falling back to the first listed one.
    pub fn adult_dosing_for(&self, indication: &str) -> Option<&AdultDosing> {
        self.adult
            .get(indication)
            .or_else(|| self.adult.values().next())
    }

    /// Check record invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingId);
        }

        for organism in &self.spectrum.plus {
            let lower = organism.to_lowercase();
            if self.spectrum.minus.iter().any(|m| m.to_lowercase() == lower) {
                return Err(ValidationError::SpectrumOverlap(organism.clone()));
            }
        }

        for (indication, rule) in &self.pediatric {
            rule.validate(indication)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CEFTRIAXONE: &str = r#"
id: ceftriaxone
name: Ceftriaxone
class: Cephalosporin (3rd generation)
spectrum:
  plus: [Streptococcus pneumoniae, Haemophilus influenzae]
  minus: [MRSA, Pseudomonas aeruginosa]
stewardshipTier: Watch
adult:
  pneumonia:
    dose: 1 g
    route: IV
    frequency: q24h
  meningitis:
    dose: 2 g
    route: IV
    frequency: q12h
paeds:
  pneumonia:
    dosePerKg: 50
    frequency: q24h
    maxDaily: 2000
cost: $
lastUpdated: 2024-03-01
"#;

    #[test]
    fn test_parse_record() {
        let record: AntibioticRecord = serde_yaml::from_str(CEFTRIAXONE).unwrap();

        assert_eq!(record.id, "ceftriaxone");
        assert_eq!(record.drug_class, "Cephalosporin (3rd generation)");
        assert_eq!(record.stewardship_tier, Some(StewardshipTier::Watch));
        assert_eq!(record.cost, Some(CostTier::Low));
        assert_eq!(record.adult["pneumonia"].route, Route::Iv);
        assert_eq!(record.pediatric["pneumonia"].dose_per_kg, 50.0);
        assert_eq!(
            record.last_updated,
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );

        // Indications keep document order
        let indications: Vec<&str> = record.adult.keys().map(|k| k.as_str()).collect();
        assert_eq!(indications, vec!["pneumonia", "meningitis"]);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_adult_dosing_fallback() {
        let record: AntibioticRecord = serde_yaml::from_str(CEFTRIAXONE).unwrap();

        assert_eq!(record.adult_dosing_for("meningitis").unwrap().dose, "2 g");
        assert_eq!(record.adult_dosing_for("cellulitis").unwrap().dose, "1 g");
    }

    #[test]
    fn test_spectrum_overlap_rejected() {
        let mut record = AntibioticRecord::new("x".into(), "X".into(), "Test".into());
        record.spectrum.plus = vec!["MRSA".into()];
        record.spectrum.minus = vec!["mrsa".into()];

        assert_eq!(
            record.validate(),
            Err(ValidationError::SpectrumOverlap("MRSA".into()))
        );
    }

    #[test]
    fn test_unknown_route_rejected() {
        let yaml = "id: x\nname: X\nclass: T\nadult:\n  a:\n    dose: 1 g\n    route: SQ\n    frequency: q24h\n";
        assert!(serde_yaml::from_str::<AntibioticRecord>(yaml).is_err());
    }
}

//! Pediatric dosing rules.

use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// Pediatric age band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Neonate,
    Infant,
    Child,
    Adolescent,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Neonate => "neonate",
            AgeGroup::Infant => "infant",
            AgeGroup::Child => "child",
            AgeGroup::Adolescent => "adolescent",
        }
    }
}

impl std::str::FromStr for AgeGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "neonate" => Ok(AgeGroup::Neonate),
            "infant" => Ok(AgeGroup::Infant),
            "child" => Ok(AgeGroup::Child),
            "adolescent" => Ok(AgeGroup::Adolescent),
            other => Err(format!("unknown age group: {other}")),
        }
    }
}

/// Neonatal override of a pediatric rule.
///
/// Weight bounds left unset are inherited from the parent rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NeonateRule {
    pub dose_per_kg: f64,
    pub frequency: String,
    #[serde(default)]
    pub max_daily: Option<f64>,
    #[serde(default)]
    pub min_weight: Option<f64>,
    #[serde(default)]
    pub max_weight: Option<f64>,
    /// Minimum postnatal age in days
    #[serde(default)]
    pub min_age: Option<f64>,
    /// Maximum postnatal age in days
    #[serde(default)]
    pub max_age: Option<f64>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Weight-based pediatric dosing rule for one indication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PediatricDosingRule {
    /// Daily dose in mg per kg body weight
    pub dose_per_kg: f64,
    /// Frequency code (e.g. "q8h")
    pub frequency: String,
    /// Maximum total daily dose in mg
    #[serde(default)]
    pub max_daily: Option<f64>,
    /// Minimum weight in kg this rule applies to
    #[serde(default)]
    pub min_weight: Option<f64>,
    /// Maximum weight in kg this rule applies to
    #[serde(default)]
    pub max_weight: Option<f64>,
    #[serde(default)]
    pub notes: Vec<String>,
    /// Guideline source for the rule
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub neonate: Option<NeonateRule>,
}

impl PediatricDosingRule {
    /// Create a rule with required fields.
    pub fn new(dose_per_kg: f64, frequency: impl Into<String>) -> Self {
        Self {
            dose_per_kg,
            frequency: frequency.into(),
            max_daily: None,
            min_weight: None,
            max_weight: None,
            notes: Vec::new(),
            source: None,
            neonate: None,
        }
    }

    /// Check rule invariants.
    pub fn validate(&self, indication: &str) -> Result<(), ValidationError> {
        let doses = std::iter::once(self.dose_per_kg)
            .chain(self.neonate.as_ref().map(|n| n.dose_per_kg));
        for dose_per_kg in doses {
            // Written so NaN fails too
            if !(dose_per_kg > 0.0) {
                return Err(ValidationError::NonPositiveDose {
                    indication: indication.to_string(),
                    dose_per_kg,
                });
            }
        }

        if let (Some(min), Some(max)) = (self.min_weight, self.max_weight) {
            if min > max {
                return Err(ValidationError::WeightBounds {
                    indication: indication.to_string(),
                    min,
                    max,
                });
            }
        }

        Ok(())
    }
}

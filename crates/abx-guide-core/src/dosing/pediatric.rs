//! Pediatric dose calculation.
//!
//! Dose derivation, in order:
//! 1. Pick the neonatal sub-rule for neonates when one exists
//! 2. Flag weights outside the global 2-100 kg range (soft, still computed)
//! 3. Outside the rule's own weight bounds, return the raw weight x dose/kg
//! 4. Parse `q<N>h` into doses per day (default 1)
//! 5. Cap the daily total at the rule's maximum
//! 6. Split into per-dose amounts and round for administration
//! 7. Compare against the adult dose
//!
//! Every warning that fires is returned; none suppresses another.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{AgeGroup, PediatricDosingRule};

/// Lowest plausible pediatric weight in kg.
pub const MIN_WEIGHT_KG: f64 = 2.0;
/// Highest plausible pediatric weight in kg.
pub const MAX_WEIGHT_KG: f64 = 100.0;

static FREQUENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)q\s*(\d+)\s*h").expect("valid regex"));

static LEADING_DOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)(?:\s*-\s*\d+(?:\.\d+)?)?\s*([a-z]*)\s*(/)?")
        .expect("valid regex")
});

/// How a computed per-dose amount is rounded for administration.
///
/// Two policies exist in circulation. Neither is a default; the caller names
/// the one it uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingPolicy {
    /// Nearest 100 mg from 1000 mg, nearest 25 mg from 100 mg, else nearest 5 mg
    Tiered,
    /// Nearest 10 mg at every magnitude
    NearestTen,
}

impl RoundingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundingPolicy::Tiered => "tiered",
            RoundingPolicy::NearestTen => "nearest-ten",
        }
    }

    pub fn round(&self, dose: f64) -> f64 {
        let step = match self {
            RoundingPolicy::Tiered if dose >= 1000.0 => 100.0,
            RoundingPolicy::Tiered if dose >= 100.0 => 25.0,
            RoundingPolicy::Tiered => 5.0,
            RoundingPolicy::NearestTen => 10.0,
        };
        (dose / step).round() * step
    }
}

impl fmt::Display for RoundingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoundingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tiered" => Ok(RoundingPolicy::Tiered),
            "nearest-ten" | "nearest10" | "ten" => Ok(RoundingPolicy::NearestTen),
            other => Err(format!("unknown rounding policy: {other}")),
        }
    }
}

/// Doses per day for a frequency code such as "q8h" or "div q6h".
///
/// Anything without a positive `q<N>h` is treated as once daily.
pub fn parse_frequency(frequency: &str) -> f64 {
    FREQUENCY
        .captures(frequency)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|hours| *hours > 0)
        .map(|hours| 24.0 / f64::from(hours))
        .unwrap_or(1.0)
}

/// Milligram value of the leading number of an adult dose text.
///
/// "500 mg" → 500, "1-2 g" → 1000, "250 mcg" → 0.25. Weight-based doses
/// ("15 mg/kg") and unknown units yield `None`.
pub fn parse_adult_dose_mg(dose: &str) -> Option<f64> {
    let lower = dose.to_lowercase();
    let caps = LEADING_DOSE.captures(&lower)?;
    if caps.get(3).is_some() {
        return None;
    }

    let value = caps.get(1)?.as_str().parse::<f64>().ok()?;
    match caps.get(2).map_or("", |m| m.as_str()) {
        "" | "mg" => Some(value),
        "g" | "gm" | "gram" | "grams" => Some(value * 1000.0),
        "mcg" | "microgram" | "micrograms" => Some(value / 1000.0),
        _ => None,
    }
}

/// The rule in force for one calculation, after neonatal selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRule<'a> {
    pub dose_per_kg: f64,
    pub frequency: &'a str,
    pub max_daily: Option<f64>,
    pub min_weight: Option<f64>,
    pub max_weight: Option<f64>,
    /// Age bounds in days, only set by neonatal sub-rules
    pub min_age: Option<f64>,
    pub max_age: Option<f64>,
    pub notes: &'a [String],
}

impl<'a> ActiveRule<'a> {
    /// Neonates use the neonatal sub-rule when present, inheriting any weight
    /// bound it leaves unset.
    pub fn select(rule: &'a PediatricDosingRule, age_group: Option<AgeGroup>) -> Self {
        match (&rule.neonate, age_group) {
            (Some(neonate), Some(AgeGroup::Neonate)) => Self {
                dose_per_kg: neonate.dose_per_kg,
                frequency: &neonate.frequency,
                max_daily: neonate.max_daily,
                min_weight: neonate.min_weight.or(rule.min_weight),
                max_weight: neonate.max_weight.or(rule.max_weight),
                min_age: neonate.min_age,
                max_age: neonate.max_age,
                notes: &neonate.notes,
            },
            _ => Self {
                dose_per_kg: rule.dose_per_kg,
                frequency: &rule.frequency,
                max_daily: rule.max_daily,
                min_weight: rule.min_weight,
                max_weight: rule.max_weight,
                min_age: None,
                max_age: None,
                notes: &rule.notes,
            },
        }
    }
}

/// A clinical warning attached to a dose calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DoseWarning {
    WeightOutsideLimits { weight_kg: f64 },
    BelowRuleMinimum { weight_kg: f64, min_weight: f64 },
    AboveRuleMaximum { weight_kg: f64, max_weight: f64 },
    AgeOutOfRange { age_days: f64 },
    MaxDailyExceeded { max_daily: f64 },
    AboveAdultDose { adult_dose_mg: f64 },
}

impl fmt::Display for DoseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoseWarning::WeightOutsideLimits { .. } => write!(
                f,
                "Weight should be between {MIN_WEIGHT_KG}-{MAX_WEIGHT_KG} kg"
            ),
            DoseWarning::BelowRuleMinimum { weight_kg, min_weight } => write!(
                f,
                "Patient weight ({weight_kg} kg) below minimum recommended weight ({min_weight} kg)"
            ),
            DoseWarning::AboveRuleMaximum { weight_kg, max_weight } => write!(
                f,
                "Patient weight ({weight_kg} kg) above maximum recommended weight ({max_weight} kg)"
            ),
            DoseWarning::AgeOutOfRange { age_days } => write!(
                f,
                "Patient age ({age_days} days) outside the range for this regimen"
            ),
            DoseWarning::MaxDailyExceeded { .. } => write!(
                f,
                "Calculated dose exceeds maximum daily dose, adjusted accordingly"
            ),
            DoseWarning::AboveAdultDose { .. } => write!(
                f,
                "Calculated dose exceeds adult dose - verify with pharmacy"
            ),
        }
    }
}

/// Result of a pediatric dose calculation. Doses are in mg.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PediatricDoseResult {
    pub per_dose: f64,
    pub doses_per_day: f64,
    pub total_daily_dose: f64,
    pub rounded_dose: f64,
    pub frequency: String,
    pub max_daily_dose: Option<f64>,
    pub notes: Vec<String>,
    pub is_weight_valid: bool,
    pub is_age_valid: bool,
    pub is_max_dose_exceeded: bool,
    pub is_above_adult_dose: bool,
    /// Set when the rule's own weight bounds cut the calculation short
    pub is_outside_rule_bounds: bool,
    pub warnings: Vec<DoseWarning>,
}

impl PediatricDoseResult {
    /// One-line dose summary followed by one line per warning.
    pub fn format(&self) -> String {
        let mut out = format!("{} mg {}", self.rounded_dose, self.frequency);
        if let Some(max) = self.max_daily_dose {
            out.push_str(&format!(" (max {max} mg/day)"));
        }
        for warning in &self.warnings {
            out.push_str(&format!("\nWarning: {warning}"));
        }
        out
    }
}

/// Weight-based pediatric dose calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PediatricCalculator {
    rounding: RoundingPolicy,
}

impl PediatricCalculator {
    pub fn new(rounding: RoundingPolicy) -> Self {
        Self { rounding }
    }

    pub fn rounding(&self) -> RoundingPolicy {
        self.rounding
    }

    /// Calculate a dose without an age in days.
    pub fn calculate(
        &self,
        weight_kg: f64,
        age_group: Option<AgeGroup>,
        rule: &PediatricDosingRule,
        adult_dose: Option<&str>,
    ) -> PediatricDoseResult {
        self.calculate_with_age(weight_kg, age_group, None, rule, adult_dose)
    }

    /// Calculate a dose, checking `age_days` against neonatal age bounds.
    pub fn calculate_with_age(
        &self,
        weight_kg: f64,
        age_group: Option<AgeGroup>,
        age_days: Option<f64>,
        rule: &PediatricDosingRule,
        adult_dose: Option<&str>,
    ) -> PediatricDoseResult {
        let active = ActiveRule::select(rule, age_group);
        let mut warnings = Vec::new();

        let is_weight_valid = (MIN_WEIGHT_KG..=MAX_WEIGHT_KG).contains(&weight_kg);
        if !is_weight_valid {
            warnings.push(DoseWarning::WeightOutsideLimits { weight_kg });
        }

        let is_age_valid = match age_days {
            Some(age) => {
                active.min_age.map_or(true, |min| age >= min)
                    && active.max_age.map_or(true, |max| age <= max)
            }
            None => true,
        };
        if let (false, Some(age_days)) = (is_age_valid, age_days) {
            warnings.push(DoseWarning::AgeOutOfRange { age_days });
        }

        let doses_per_day = parse_frequency(active.frequency);
        let raw_total = weight_kg * active.dose_per_kg;

        let bound_warning = match (active.min_weight, active.max_weight) {
            (Some(min_weight), _) if weight_kg < min_weight => Some(DoseWarning::BelowRuleMinimum {
                weight_kg,
                min_weight,
            }),
            (_, Some(max_weight)) if weight_kg > max_weight => Some(DoseWarning::AboveRuleMaximum {
                weight_kg,
                max_weight,
            }),
            _ => None,
        };
        if let Some(warning) = bound_warning {
            warnings.push(warning);
            return PediatricDoseResult {
                per_dose: raw_total,
                doses_per_day,
                total_daily_dose: raw_total,
                rounded_dose: raw_total,
                frequency: active.frequency.to_string(),
                max_daily_dose: active.max_daily,
                notes: active.notes.to_vec(),
                is_weight_valid,
                is_age_valid,
                is_max_dose_exceeded: false,
                is_above_adult_dose: false,
                is_outside_rule_bounds: true,
                warnings,
            };
        }

        let mut total_daily_dose = raw_total;
        let mut is_max_dose_exceeded = false;
        if let Some(max_daily) = active.max_daily {
            if total_daily_dose > max_daily {
                is_max_dose_exceeded = true;
                total_daily_dose = max_daily;
                warnings.push(DoseWarning::MaxDailyExceeded { max_daily });
            }
        }

        let per_dose = total_daily_dose / doses_per_day;
        let rounded_dose = self.rounding.round(per_dose);

        let adult_dose_mg = adult_dose.and_then(parse_adult_dose_mg);
        let is_above_adult_dose = adult_dose_mg.is_some_and(|adult| per_dose >= adult);
        if let (true, Some(adult_dose_mg)) = (is_above_adult_dose, adult_dose_mg) {
            warnings.push(DoseWarning::AboveAdultDose { adult_dose_mg });
        }

        PediatricDoseResult {
            per_dose,
            doses_per_day,
            total_daily_dose,
            rounded_dose,
            frequency: active.frequency.to_string(),
            max_daily_dose: active.max_daily,
            notes: active.notes.to_vec(),
            is_weight_valid,
            is_age_valid,
            is_max_dose_exceeded,
            is_above_adult_dose,
            is_outside_rule_bounds: false,
            warnings,
        }
    }
}

//! Measurement unit preferences.

use serde::{Deserialize, Serialize};

/// Kilograms to pounds.
pub const KG_TO_LB: f64 = 2.20462;
/// Pounds to kilograms.
pub const LB_TO_KG: f64 = 0.453592;
/// Centimetres to inches.
pub const CM_TO_IN: f64 = 0.393701;
/// Inches to centimetres.
pub const IN_TO_CM: f64 = 2.54;

/// Display unit system.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            UnitSystem::Metric => UnitSystem::Imperial,
            UnitSystem::Imperial => UnitSystem::Metric,
        }
    }
}

impl std::str::FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            other => Err(format!("unknown unit system: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    Lb,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HeightUnit {
    Cm,
    In,
}

/// Unit preferences for display. The three fields always move together.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnitPreferences {
    pub system: UnitSystem,
    pub weight_unit: WeightUnit,
    pub height_unit: HeightUnit,
}

impl Default for UnitPreferences {
    fn default() -> Self {
        Self::for_system(UnitSystem::Metric)
    }
}

impl UnitPreferences {
    pub fn for_system(system: UnitSystem) -> Self {
        match system {
            UnitSystem::Metric => Self {
                system,
                weight_unit: WeightUnit::Kg,
                height_unit: HeightUnit::Cm,
            },
            UnitSystem::Imperial => Self {
                system,
                weight_unit: WeightUnit::Lb,
                height_unit: HeightUnit::In,
            },
        }
    }

    /// Flip to the other unit system.
    pub fn toggle(&mut self) {
        *self = Self::for_system(self.system.toggled());
    }
}

//! Care setting, allergy and population filters.

use serde::{Deserialize, Serialize};

/// Care setting.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Setting {
    #[default]
    Outpatient,
    Inpatient,
    Icu,
}

impl Setting {
    pub const ALL: [Setting; 3] = [Setting::Outpatient, Setting::Inpatient, Setting::Icu];

    pub fn as_str(&self) -> &'static str {
        match self {
            Setting::Outpatient => "outpatient",
            Setting::Inpatient => "inpatient",
            Setting::Icu => "icu",
        }
    }
}

impl std::str::FromStr for Setting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Setting::ALL
            .into_iter()
            .find(|setting| setting.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown setting: {s}"))
    }
}

/// Reported drug allergy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Allergy {
    #[default]
    None,
    Penicillin,
    Cephalosporin,
    BetaLactam,
}

impl Allergy {
    pub const ALL: [Allergy; 4] = [
        Allergy::None,
        Allergy::Penicillin,
        Allergy::Cephalosporin,
        Allergy::BetaLactam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Allergy::None => "none",
            Allergy::Penicillin => "penicillin",
            Allergy::Cephalosporin => "cephalosporin",
            Allergy::BetaLactam => "beta-lactam",
        }
    }
}

impl std::str::FromStr for Allergy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Allergy::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown allergy: {s}"))
    }
}

/// Special patient population.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Population {
    #[default]
    None,
    Pregnancy,
    RenalImpairment,
    HepaticImpairment,
    Immunocompromised,
}

impl Population {
    pub const ALL: [Population; 5] = [
        Population::None,
        Population::Pregnancy,
        Population::RenalImpairment,
        Population::HepaticImpairment,
        Population::Immunocompromised,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Population::None => "none",
            Population::Pregnancy => "pregnancy",
            Population::RenalImpairment => "renal-impairment",
            Population::HepaticImpairment => "hepatic-impairment",
            Population::Immunocompromised => "immunocompromised",
        }
    }
}

impl std::str::FromStr for Population {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Population::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown population: {s}"))
    }
}

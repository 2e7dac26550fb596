//! Page assembly.
//!
//! Views combine records from the store with the session context and run the
//! resolver, regimen filter and dose functions over them. They are plain data
//! and render to JSON for UI clients or to text for the terminal.

mod antibiotic;
mod treatment;

pub use antibiotic::*;
pub use treatment::*;

use serde::{Deserialize, Serialize};

use crate::dosing::{PediatricCalculator, RoundingPolicy};

/// Presentation settings that are fixed for an integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Rounding applied to calculated pediatric doses
    pub rounding: RoundingPolicy,
}

impl ViewConfig {
    pub fn new(rounding: RoundingPolicy) -> Self {
        Self { rounding }
    }

    pub fn calculator(&self) -> PediatricCalculator {
        PediatricCalculator::new(self.rounding)
    }
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

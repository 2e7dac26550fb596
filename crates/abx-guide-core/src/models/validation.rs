//! Record invariants checked at the store boundary.

use thiserror::Error;

/// A guideline document violated a record invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("record has an empty id")]
    MissingId,

    #[error("organism {0} is listed as both covered and not covered")]
    SpectrumOverlap(String),

    #[error("pediatric rule for {indication}: dosePerKg must be positive, got {dose_per_kg}")]
    NonPositiveDose { indication: String, dose_per_kg: f64 },

    #[error("pediatric rule for {indication}: minWeight {min} exceeds maxWeight {max}")]
    WeightBounds { indication: String, min: f64, max: f64 },

    #[error("condition defines no first_line treatment")]
    MissingFirstLine,
}

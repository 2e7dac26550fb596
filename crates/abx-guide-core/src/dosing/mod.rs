//! Dose display and derivation.
//!
//! - `converter`: rewrites weight-based dose tokens for the active unit system
//! - `pediatric`: weight-driven pediatric dose calculation with rounding and caps

mod converter;
mod pediatric;

pub use converter::*;
pub use pediatric::*;

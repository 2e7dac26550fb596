//! Domain models for the antibiotic guideline browser.
//!
//! Records are deserialized from guideline documents at the store boundary,
//! validated once, and then treated as read-only for the rest of the request.

mod antibiotic;
mod condition;
mod decision;
mod filters;
mod pediatric;
mod units;
mod validation;

pub use antibiotic::*;
pub use condition::*;
pub use decision::*;
pub use filters::*;
pub use pediatric::*;
pub use units::*;
pub use validation::*;

use serde::{Deserialize, Deserializer};

/// Accept either a single string or a list of strings.
///
/// Older condition documents carry `notes: "..."` where newer ones carry a list.
pub(crate) fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

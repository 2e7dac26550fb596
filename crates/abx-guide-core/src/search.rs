//! Free-text search across antibiotics and conditions.
//!
//! A linear scan over every document in the store, matching on normalized
//! substrings. Antibiotics also match when the term is a known synonym of
//! their id.

use serde::Serialize;
use tracing::debug;

use crate::resolver::{normalize, text_matches, SynonymTable};
use crate::store::{GuidelineStore, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HitKind {
    Antibiotic,
    Condition,
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(rename = "type")]
    pub kind: HitKind,
    pub id: String,
    /// Category of a condition hit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub name: String,
    pub description: Option<String>,
}

/// Search every antibiotic, then every condition by category.
///
/// A term that normalizes to nothing returns no hits.
pub fn search<S: GuidelineStore + ?Sized>(store: &S, term: &str) -> StoreResult<Vec<SearchHit>> {
    if normalize(term).is_empty() {
        return Ok(Vec::new());
    }
    let canonical = SynonymTable::standard().canonical_name(term);
    let mut hits = Vec::new();

    for antibiotic in store.list_antibiotics()? {
        let fields_match = std::iter::once(antibiotic.name.as_str())
            .chain(std::iter::once(antibiotic.drug_class.as_str()))
            .chain(antibiotic.spectrum.plus.iter().map(String::as_str))
            .chain(antibiotic.spectrum.minus.iter().map(String::as_str))
            .any(|text| text_matches(text, term));

        if fields_match || canonical == Some(antibiotic.id.as_str()) {
            let tier = antibiotic
                .stewardship_tier
                .map_or("No tier", |tier| tier.as_str());
            hits.push(SearchHit {
                kind: HitKind::Antibiotic,
                description: Some(format!("{} - {}", antibiotic.drug_class, tier)),
                id: antibiotic.id,
                category: None,
                name: antibiotic.name,
            });
        }
    }

    for category in store.list_categories()? {
        for condition in store.list_category_conditions(&category)? {
            let pathogens = condition
                .epidemiology
                .iter()
                .flat_map(|e| e.common_pathogens.iter());
            let matches = std::iter::once(&condition.name)
                .chain(condition.description.iter())
                .chain(condition.tags.iter())
                .chain(pathogens)
                .any(|text| text_matches(text, term));

            if matches {
                hits.push(SearchHit {
                    kind: HitKind::Condition,
                    id: condition.id,
                    category: Some(category.clone()),
                    name: condition.name,
                    description: condition.description,
                });
            }
        }
    }

    debug!(term, hits = hits.len(), "Search complete");
    Ok(hits)
}

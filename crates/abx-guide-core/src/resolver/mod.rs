//! Antibiotic name resolution.
//!
//! Pipeline: Combination split → Variations → Exact key match →
//! Containment match → Letters-only match
//!
//! Resolution is a pure function of the token and the supplied catalog. A miss
//! is an ordinary `None`; callers decide how to degrade.

mod normalizer;
mod suggest;
mod synonyms;

pub use normalizer::*;
pub use suggest::*;
pub use synonyms::*;

use serde::Serialize;

use crate::models::{AntibioticRecord, Catalog};

/// A regimen token that matched no catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionMiss {
    /// Trimmed token as written in the regimen
    pub token: String,
    /// Closest catalog key, when one is similar enough
    pub suggestion: Option<Suggestion>,
}

impl std::fmt::Display for ResolutionMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No antibiotic details found for \"{}\"", self.token)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean {}?)", suggestion.key)?;
        }
        Ok(())
    }
}

/// Outcome for one component of a combination regimen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComponentResolution {
    Resolved { token: String, antibiotic_id: String },
    Missing(ResolutionMiss),
}

impl ComponentResolution {
    pub fn token(&self) -> &str {
        match self {
            ComponentResolution::Resolved { token, .. } => token,
            ComponentResolution::Missing(miss) => &miss.token,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ComponentResolution::Resolved { .. })
    }
}

/// Resolves free-text regimen tokens against an antibiotic catalog.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    synonyms: &'a SynonymTable,
}

impl Default for Resolver<'static> {
    fn default() -> Self {
        Self::standard()
    }
}

impl Resolver<'static> {
    /// Resolver over the shared default synonym table.
    pub fn standard() -> Self {
        Self {
            synonyms: SynonymTable::standard(),
        }
    }
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a custom synonym table.
    pub fn new(synonyms: &'a SynonymTable) -> Self {
        Self { synonyms }
    }

    pub fn synonyms(&self) -> &'a SynonymTable {
        self.synonyms
    }

    /// Resolve a raw token to a catalog record.
    ///
    /// A "+"-joined combination resolves to its first listed agent only.
    pub fn resolve<'c>(&self, raw: &str, catalog: &'c Catalog) -> Option<&'c AntibioticRecord> {
        if raw.contains('+') {
            let first = raw.split('+').next().unwrap_or_default().trim();
            return self.resolve(first, catalog);
        }

        self.exact_match(raw, catalog)
            .or_else(|| containment_match(raw, catalog))
            .or_else(|| letters_only_match(raw, catalog))
    }

    /// Resolve every "+"-separated component independently.
    ///
    /// Empty components are dropped. A miss carries a suggestion when a
    /// catalog key is close.
    pub fn resolve_components(&self, regimen: &str, catalog: &Catalog) -> Vec<ComponentResolution> {
        regimen
            .split('+')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| match self.resolve(token, catalog) {
                Some(record) => ComponentResolution::Resolved {
                    token: token.to_string(),
                    antibiotic_id: record.id.clone(),
                },
                None => ComponentResolution::Missing(ResolutionMiss {
                    token: token.to_string(),
                    suggestion: suggest(token, catalog),
                }),
            })
            .collect()
    }

    /// Candidate spellings for a token, in insertion order without duplicates.
    ///
    /// Lower-cased raw, normalized and hyphenated forms, then the full
    /// synonym closure when the token names a known antibiotic.
    pub fn variations(&self, raw: &str) -> Vec<String> {
        let mut variations: Vec<String> = Vec::new();
        let mut push = |candidate: String| {
            if !variations.contains(&candidate) {
                variations.push(candidate);
            }
        };

        push(raw.to_lowercase());
        push(normalize(raw));
        push(hyphenate(raw));

        if let Some(entry) = self.synonyms.lookup(raw) {
            for name in entry.closure() {
                push(name.to_string());
            }
        }

        variations
    }

    fn exact_match<'c>(&self, raw: &str, catalog: &'c Catalog) -> Option<&'c AntibioticRecord> {
        let variations = self.variations(raw);
        catalog
            .iter()
            .find(|(key, _)| variations.contains(&key.to_lowercase()))
            .map(|(_, record)| record)
    }
}

/// First catalog entry whose normalized key contains, or is contained in, the
/// normalized token.
fn containment_match<'c>(raw: &str, catalog: &'c Catalog) -> Option<&'c AntibioticRecord> {
    let needle = normalize(raw);
    if needle.is_empty() {
        return None;
    }
    catalog
        .iter()
        .find(|(key, _)| {
            let key = normalize(key);
            !key.is_empty() && (key.contains(&needle) || needle.contains(&key))
        })
        .map(|(_, record)| record)
}

fn letters_only_match<'c>(raw: &str, catalog: &'c Catalog) -> Option<&'c AntibioticRecord> {
    let needle = letters_only(raw);
    if needle.is_empty() {
        return None;
    }
    catalog
        .iter()
        .find(|(key, _)| letters_only(key) == needle)
        .map(|(_, record)| record)
}

//! Near-miss suggestions for unresolved antibiotic tokens.
//!
//! Suggestions are advisory: the resolver never treats them as matches.

use serde::Serialize;
use strsim::{jaro_winkler, normalized_levenshtein};

use crate::models::Catalog;

use super::normalizer::normalize;

/// Minimum similarity for a catalog key to be offered as a suggestion.
pub const MIN_SIMILARITY: f64 = 0.80;

/// Closest catalog key for a token that failed to resolve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    /// Catalog key as supplied
    pub key: String,
    /// Blended similarity score in [0.0, 1.0]
    pub similarity: f64,
}

/// Find the catalog key most similar to `token`.
///
/// Returns `None` when the catalog is empty, the token normalizes to nothing,
/// or no key reaches [`MIN_SIMILARITY`]. Ties keep the earlier catalog entry.
pub fn suggest(token: &str, catalog: &Catalog) -> Option<Suggestion> {
    let needle = normalize(token);
    if needle.is_empty() {
        return None;
    }

    let mut best: Option<Suggestion> = None;
    for key in catalog.keys() {
        let similarity = fuzzy_match(&needle, &normalize(key));
        if similarity < MIN_SIMILARITY {
            continue;
        }
        if best.as_ref().map_or(true, |b| similarity > b.similarity) {
            best = Some(Suggestion {
                key: key.clone(),
                similarity,
            });
        }
    }
    best
}

/// Compute fuzzy similarity between two normalized names.
fn fuzzy_match(a: &str, b: &str) -> f64 {
    // Jaro-Winkler rewards shared prefixes, Levenshtein overall edit distance
    let jw = jaro_winkler(a, b);
    let lev = normalized_levenshtein(a, b);

    jw * 0.6 + lev * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AntibioticRecord;

    fn catalog(keys: &[&str]) -> Catalog {
        keys.iter()
            .map(|k| {
                (
                    k.to_string(),
                    AntibioticRecord::new(k.to_string(), k.to_string(), "Test".into()),
                )
            })
            .collect()
    }

    #[test]
    fn test_suggest_typo() {
        let catalog = catalog(&["ceftriaxone", "vancomycin"]);

        let suggestion = suggest("ceftriaxon", &catalog).unwrap();
        assert_eq!(suggestion.key, "ceftriaxone");
        assert!(suggestion.similarity >= MIN_SIMILARITY);

        let suggestion = suggest("vancomicin", &catalog).unwrap();
        assert_eq!(suggestion.key, "vancomycin");
    }

    #[test]
    fn test_suggest_nothing_close() {
        let catalog = catalog(&["ceftriaxone", "vancomycin"]);

        assert!(suggest("nonexistent-drug-xyz", &catalog).is_none());
        assert!(suggest("", &catalog).is_none());
        assert!(suggest("ceftriaxon", &Catalog::new()).is_none());
    }

    #[test]
    fn test_fuzzy_match_identical() {
        assert!((fuzzy_match("cefepime", "cefepime") - 1.0).abs() < 1e-9);
    }
}

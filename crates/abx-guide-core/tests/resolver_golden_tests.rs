//! Golden tests for antibiotic name resolution.
//!
//! Regimen tokens as they appear in guideline documents, resolved against the
//! sample antibiotic set under `data/`.

use abx_guide_core::models::Catalog;
use abx_guide_core::resolver::{ComponentResolution, Resolver};
use abx_guide_core::store::{catalog_from, FileStore, GuidelineStore};

const DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data");

/// Test case from the golden table.
struct GoldenCase {
    id: &'static str,
    token: &'static str,
    expected_id: Option<&'static str>,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "exact-id",
            token: "ceftriaxone",
            expected_id: Some("ceftriaxone"),
        },
        GoldenCase {
            id: "display-name",
            token: "Piperacillin-Tazobactam",
            expected_id: Some("piperacillin-tazobactam"),
        },
        GoldenCase {
            id: "abbreviation",
            token: "Pip-Tazo",
            expected_id: Some("piperacillin-tazobactam"),
        },
        GoldenCase {
            id: "abbreviation-spaced",
            token: "pip tazo",
            expected_id: Some("piperacillin-tazobactam"),
        },
        GoldenCase {
            id: "brand-name",
            token: "Zosyn",
            expected_id: Some("piperacillin-tazobactam"),
        },
        GoldenCase {
            id: "brand-upper",
            token: "ROCEPHIN",
            expected_id: Some("ceftriaxone"),
        },
        GoldenCase {
            id: "short-form",
            token: "Vanc",
            expected_id: Some("vancomycin"),
        },
        GoldenCase {
            id: "combination-abbreviation",
            token: "TMP-SMX",
            expected_id: Some("trimethoprim-sulfamethoxazole"),
        },
        GoldenCase {
            id: "spaced-combination-name",
            token: "Trimethoprim Sulfamethoxazole",
            expected_id: Some("trimethoprim-sulfamethoxazole"),
        },
        GoldenCase {
            id: "dose-suffix",
            token: "Vancomycin 15 mg/kg",
            expected_id: Some("vancomycin"),
        },
        GoldenCase {
            id: "route-suffix",
            token: "Levofloxacin (IV)",
            expected_id: Some("levofloxacin"),
        },
        GoldenCase {
            id: "combination-first-agent",
            token: "Ceftriaxone + Azithromycin",
            expected_id: Some("ceftriaxone"),
        },
        GoldenCase {
            id: "combination-first-agent-alias",
            token: "Zosyn + Vancomycin",
            expected_id: Some("piperacillin-tazobactam"),
        },
        GoldenCase {
            // No document; containment lands on the contained agent
            id: "undocumented-combination",
            token: "Amoxicillin-Clavulanate",
            expected_id: Some("amoxicillin"),
        },
        GoldenCase {
            id: "not-in-catalog",
            token: "Linezolid",
            expected_id: None,
        },
        GoldenCase {
            id: "misspelled",
            token: "Cefriaxone",
            expected_id: None,
        },
        GoldenCase {
            id: "blank",
            token: "   ",
            expected_id: None,
        },
    ]
}

fn sample_catalog() -> Catalog {
    let store = FileStore::open(DATA_DIR).unwrap();
    catalog_from(store.list_antibiotics().unwrap())
}

#[test]
fn test_golden_cases() {
    let catalog = sample_catalog();
    let resolver = Resolver::standard();

    for case in get_golden_cases() {
        let resolved = resolver.resolve(case.token, &catalog).map(|r| r.id.as_str());
        assert_eq!(resolved, case.expected_id, "Case {}: resolution mismatch", case.id);
    }
}

#[test]
fn test_combination_matches_first_agent_alone() {
    let catalog = sample_catalog();
    let resolver = Resolver::standard();

    for combo in [
        "Ceftriaxone + Azithromycin",
        "Piperacillin-Tazobactam + Vancomycin",
        "Amoxicillin+Azithromycin",
    ] {
        let first = combo.split('+').next().unwrap().trim();
        assert_eq!(
            resolver.resolve(combo, &catalog).map(|r| &r.id),
            resolver.resolve(first, &catalog).map(|r| &r.id),
            "{combo}"
        );
    }
}

#[test]
fn test_components_resolve_independently() {
    let catalog = sample_catalog();
    let components =
        Resolver::standard().resolve_components("Linezolid + Piperacillin-Tazobactam", &catalog);

    assert_eq!(components.len(), 2);
    assert!(!components[0].is_resolved());
    assert_eq!(
        components[1],
        ComponentResolution::Resolved {
            token: "Piperacillin-Tazobactam".to_string(),
            antibiotic_id: "piperacillin-tazobactam".to_string(),
        }
    );
}

#[test]
fn test_misspelling_gets_suggestion() {
    let catalog = sample_catalog();
    let components = Resolver::standard().resolve_components("Cefriaxone", &catalog);

    match &components[..] {
        [ComponentResolution::Missing(miss)] => {
            let suggestion = miss.suggestion.as_ref().expect("close key suggested");
            assert_eq!(suggestion.key, "ceftriaxone");
            assert!(miss.to_string().ends_with("(did you mean ceftriaxone?)"));
        }
        other => panic!("expected one miss, got {other:?}"),
    }
}

#[test]
fn test_every_synonym_resolves_when_documented() {
    let catalog = sample_catalog();
    let resolver = Resolver::standard();

    for entry in resolver.synonyms().entries() {
        if !catalog.contains_key(entry.canonical()) {
            continue;
        }
        for alias in entry.aliases() {
            let resolved = resolver.resolve(alias, &catalog).map(|r| r.id.as_str());
            assert_eq!(resolved, Some(entry.canonical()), "alias {alias}");
        }
    }
}

//! Unit-system-aware rewriting of dosing text.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::models::{UnitSystem, WeightUnit, KG_TO_LB, LB_TO_KG};

static WEIGHT_DOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(mg/kg|mg/lb)").expect("valid regex")
});

/// Rewrite every "X mg/kg" or "X mg/lb" token for `system`.
///
/// Tokens already in the target unit, and all other text, pass through
/// verbatim. Converted values are rendered to one decimal place.
pub fn format_dosage(text: &str, system: UnitSystem) -> String {
    WEIGHT_DOSE
        .replace_all(text, |caps: &Captures| rewrite_token(caps, system))
        .into_owned()
}

fn rewrite_token(caps: &Captures, system: UnitSystem) -> String {
    let original = caps[0].to_string();
    let Ok(value) = caps[1].parse::<f64>() else {
        return original;
    };
    let unit = caps[2].to_ascii_lowercase();

    match (system, unit.as_str()) {
        (UnitSystem::Metric, "mg/lb") => format!("{:.1} mg/kg", value * LB_TO_KG),
        (UnitSystem::Imperial, "mg/kg") => format!("{:.1} mg/lb", value * KG_TO_LB),
        _ => original,
    }
}

/// Convert a body weight into the display unit of `system`.
///
/// Converted values are rounded to one decimal; values already in the
/// system's unit are returned unchanged.
pub fn convert_weight(value: f64, from: WeightUnit, system: UnitSystem) -> f64 {
    match (from, system) {
        (WeightUnit::Kg, UnitSystem::Imperial) => round_to_tenth(value * KG_TO_LB),
        (WeightUnit::Lb, UnitSystem::Metric) => round_to_tenth(value * LB_TO_KG),
        _ => value,
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_dosage_imperial() {
        let out = format_dosage("Give 15 mg/kg IV", UnitSystem::Imperial);
        assert_eq!(out, "Give 33.1 mg/lb IV");
    }

    #[test]
    fn test_format_dosage_metric() {
        let out = format_dosage("Give 50 mg/lb", UnitSystem::Metric);
        assert_eq!(out, "Give 22.7 mg/kg");
    }

    #[test]
    fn test_format_dosage_same_unit_untouched() {
        assert_eq!(
            format_dosage("15 mg/kg q8h", UnitSystem::Metric),
            "15 mg/kg q8h"
        );
        assert_eq!(
            format_dosage("Give 7mg/lb", UnitSystem::Imperial),
            "Give 7mg/lb"
        );
    }

    #[test]
    fn test_format_dosage_multiple_tokens() {
        let out = format_dosage(
            "Load 25 MG/KG, then 15.5mg/kg q12h (max 2 g)",
            UnitSystem::Imperial,
        );
        assert_eq!(out, "Load 55.1 mg/lb, then 34.2 mg/lb q12h (max 2 g)");
    }

    #[test]
    fn test_format_dosage_no_tokens() {
        assert_eq!(format_dosage("1 g IV q24h", UnitSystem::Imperial), "1 g IV q24h");
        assert_eq!(format_dosage("", UnitSystem::Metric), "");
    }

    #[test]
    fn test_convert_weight() {
        assert_eq!(convert_weight(10.0, WeightUnit::Kg, UnitSystem::Imperial), 22.0);
        assert_eq!(convert_weight(22.0, WeightUnit::Lb, UnitSystem::Metric), 10.0);
        assert_eq!(convert_weight(10.0, WeightUnit::Kg, UnitSystem::Metric), 10.0);
        assert_eq!(convert_weight(22.0, WeightUnit::Lb, UnitSystem::Imperial), 22.0);
    }

    fn leading_value(text: &str) -> f64 {
        text.split_whitespace()
            .next()
            .and_then(|v| v.parse().ok())
            .unwrap()
    }

    proptest! {
        #[test]
        fn prop_text_without_tokens_passes_through(s in "[a-zA-Z ,.()]*") {
            prop_assert_eq!(format_dosage(&s, UnitSystem::Imperial), s.clone());
            prop_assert_eq!(format_dosage(&s, UnitSystem::Metric), s.clone());
        }

        #[test]
        fn prop_round_trip_within_tenth(tenths in 1u32..100_000) {
            let original = f64::from(tenths) / 10.0;
            let text = format!("{original:.1} mg/kg");

            let imperial = format_dosage(&text, UnitSystem::Imperial);
            prop_assert!(imperial.ends_with("mg/lb"));

            let metric = format_dosage(&imperial, UnitSystem::Metric);
            prop_assert!(metric.ends_with("mg/kg"));
            prop_assert!((leading_value(&metric) - original).abs() <= 0.1);
        }
    }
}

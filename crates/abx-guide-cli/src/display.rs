//! Plain-text rendering for list and calculator output.

use abx_guide_core::dosing::{convert_weight, PediatricDoseResult};
use abx_guide_core::models::{ConditionRecord, TreeNode, UnitSystem, WeightUnit};
use abx_guide_core::search::{HitKind, SearchHit};

pub fn render_categories(categories: &[String]) -> String {
    if categories.is_empty() {
        return "No categories found.\n".to_string();
    }
    categories.iter().map(|c| format!("{c}\n")).collect()
}

pub fn render_conditions(conditions: &[ConditionRecord]) -> String {
    if conditions.is_empty() {
        return "No conditions in this category.\n".to_string();
    }
    let width = conditions.iter().map(|c| c.id.len()).max().unwrap_or(0);
    let mut out = String::new();
    for condition in conditions {
        out.push_str(&format!("{:<width$}  {}\n", condition.id, condition.name));
    }
    out
}

pub fn render_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No matches.\n".to_string();
    }
    let mut out = String::new();
    for hit in hits {
        let path = match (&hit.kind, &hit.category) {
            (HitKind::Condition, Some(category)) => format!("{category}/{}", hit.id),
            _ => hit.id.clone(),
        };
        let kind = match hit.kind {
            HitKind::Antibiotic => "drug",
            HitKind::Condition => "condition",
        };
        out.push_str(&format!("[{kind}] {} ({path})", hit.name));
        if let Some(description) = &hit.description {
            out.push_str(&format!(": {description}"));
        }
        out.push('\n');
    }
    out
}

/// Dose summary with the patient weight in the display unit.
pub fn render_dose(result: &PediatricDoseResult, weight_kg: f64, units: UnitSystem) -> String {
    let weight = convert_weight(weight_kg, WeightUnit::Kg, units);
    let unit = match units {
        UnitSystem::Metric => "kg",
        UnitSystem::Imperial => "lb",
    };
    let mut out = format!(
        "Weight: {weight} {unit}\nDaily total: {} mg in {} doses\n{}\n",
        result.total_daily_dose,
        result.doses_per_day,
        result.format()
    );
    for note in &result.notes {
        out.push_str(&format!("Note: {note}\n"));
    }
    out
}

/// A decision-tree question with numbered answers.
pub fn render_question(node: &TreeNode) -> String {
    let mut out = format!("{}\n", node.question);
    for (index, option) in node.options.iter().enumerate() {
        out.push_str(&format!("  {index}) {}\n", option.text));
        for criterion in &option.criteria {
            out.push_str(&format!("       - {criterion}\n"));
        }
    }
    out
}

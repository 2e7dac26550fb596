//! Antibiotic name normalization.
//!
//! Handles:
//! - Case folding and punctuation stripping ("Pip-Tazo" → "piptazo")
//! - Letters-only reduction for the last-chance comparison
//! - Hyphenated spelling ("amoxicillin clavulanate" → "amoxicillin-clavulanate")
//!
//! All functions operate on the ASCII range only. Non-ASCII characters are
//! dropped rather than folded.

/// Lower-case and strip every character outside `[a-z0-9]`.
///
/// Idempotent, and blank input yields an empty string.
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Lower-case and keep only `[a-z]`.
pub fn letters_only(text: &str) -> String {
    text.chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_lowercase())
        .collect()
}

/// Lower-case with each whitespace run replaced by a single hyphen.
pub fn hyphenate(text: &str) -> String {
    let lower = text.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut in_space = false;
    for c in lower.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Check whether `text` contains `term` after normalizing both.
///
/// A term that normalizes to nothing never matches.
pub fn text_matches(text: &str, term: &str) -> bool {
    let term = normalize(term);
    !term.is_empty() && normalize(text).contains(&term)
}

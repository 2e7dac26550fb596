//! Antibiotic synonym table.
//!
//! Maps canonical antibiotic ids to brand names and abbreviations. The table is
//! a closed set built once per process; lookups are by normalized form.

use std::sync::LazyLock;

use super::normalizer::normalize;

static STANDARD: LazyLock<SynonymTable> = LazyLock::new(SynonymTable::new);

/// One canonical id and its aliases.
#[derive(Debug, Clone)]
pub struct SynonymEntry {
    canonical: String,
    aliases: Vec<String>,
    /// Normalized canonical id followed by normalized aliases
    normalized: Vec<String>,
}

impl SynonymEntry {
    fn new(canonical: &str, aliases: &[&str]) -> Self {
        let canonical = canonical.to_lowercase();
        let aliases: Vec<String> = aliases.iter().map(|a| a.to_lowercase()).collect();
        let normalized = std::iter::once(&canonical)
            .chain(aliases.iter())
            .map(|name| normalize(name))
            .collect();
        Self {
            canonical,
            aliases,
            normalized,
        }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Canonical id followed by every alias.
    pub fn closure(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    fn matches_normalized(&self, normalized: &str) -> bool {
        self.normalized.iter().any(|n| n == normalized)
    }
}

/// Canonical id → alias set lookup.
///
/// Aliases are expected not to collide across entries; when they do, the
/// entry listed first wins.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    entries: Vec<SynonymEntry>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SynonymTable {
    /// Create a table with the default synonym set.
    pub fn new() -> Self {
        Self {
            entries: Self::default_entries(),
        }
    }

    /// Create an empty table.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Shared default table, built on first use.
    pub fn standard() -> &'static SynonymTable {
        &STANDARD
    }

    /// Add a canonical id with its aliases.
    pub fn add_entry(&mut self, canonical: &str, aliases: &[&str]) {
        self.entries.push(SynonymEntry::new(canonical, aliases));
    }

    pub fn entries(&self) -> &[SynonymEntry] {
        &self.entries
    }

    /// Entry whose canonical id or any alias normalizes equal to `term`.
    pub fn lookup(&self, term: &str) -> Option<&SynonymEntry> {
        let normalized = normalize(term);
        if normalized.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|entry| entry.matches_normalized(&normalized))
    }

    /// Canonical id for a name, brand name or abbreviation.
    pub fn canonical_name(&self, term: &str) -> Option<&str> {
        self.lookup(term).map(SynonymEntry::canonical)
    }

    fn default_entries() -> Vec<SynonymEntry> {
        vec![
            // Penicillin / beta-lactamase inhibitor combinations
            SynonymEntry::new(
                "piperacillin-tazobactam",
                &["pip-tazo", "zosyn", "piptazo", "tazocin"],
            ),
            SynonymEntry::new(
                "amoxicillin-clavulanate",
                &["augmentin", "co-amoxiclav", "amox-clav"],
            ),
            SynonymEntry::new("ampicillin-sulbactam", &["unasyn"]),
            SynonymEntry::new("piperacillin", &["pip"]),
            // Folate antagonists
            SynonymEntry::new(
                "trimethoprim-sulfamethoxazole",
                &["tmp-smx", "bactrim", "co-trimoxazole", "septra"],
            ),
            // Cephalosporins
            SynonymEntry::new("ceftriaxone", &["rocephin"]),
            SynonymEntry::new("cefazolin", &["ancef", "kefzol"]),
            SynonymEntry::new("cefepime", &["maxipime"]),
            // Glycopeptides / aminoglycosides
            SynonymEntry::new("vancomycin", &["vanc"]),
            SynonymEntry::new("gentamicin", &["gent"]),
            // Anaerobic coverage
            SynonymEntry::new("clindamycin", &["clinda"]),
            SynonymEntry::new("metronidazole", &["flagyl", "metro"]),
            // Macrolides / tetracyclines
            SynonymEntry::new("azithromycin", &["zithromax", "azith"]),
            SynonymEntry::new("doxycycline", &["doxy"]),
            // Fluoroquinolones
            SynonymEntry::new("ciprofloxacin", &["cipro"]),
            SynonymEntry::new("levofloxacin", &["levo", "levaquin"]),
            // Carbapenems
            SynonymEntry::new("meropenem", &["merrem", "mero"]),
        ]
    }
}

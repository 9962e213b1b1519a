//! Database naming.
//!
//! Users and upstream callers refer to databases by their display names
//! ("ClinicalTrials.gov"), while identifier tables and schema mappings are
//! keyed by a shorter internal key ("ClinicalTrials").

/// Databases offered to callers, by display name.
pub const AVAILABLE_DATABASES: &[&str] = &[
    "OpenTargets",
    "ClinicalTrials.gov",
    "ClinVar",
    "Human Protein Atlas",
    "MGI",
    "ChEMBL",
    "IUPHAR",
];

// Display name -> internal key
const DATABASE_KEYS: &[(&str, &str)] = &[
    ("OpenTargets", "OpenTargets"),
    ("ClinicalTrials.gov", "ClinicalTrials"),
    ("ClinVar", "ClinVar"),
    ("Human Protein Atlas", "Human Protein Atlas"),
    ("ChEMBL", "ChEMBL"),
    ("PubChem", "PubChem"),
    ("UniProt", "UniProt"),
];

/// Map a user-facing database name to the internal key used by identifier
/// tables and schema mappings. Unknown names pass through unchanged.
pub fn database_key(display_name: &str) -> &str {
    DATABASE_KEYS
        .iter()
        .find(|(display, _)| *display == display_name)
        .map(|(_, key)| *key)
        .unwrap_or(display_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_key() {
        assert_eq!(database_key("ClinicalTrials.gov"), "ClinicalTrials");
        assert_eq!(database_key("OpenTargets"), "OpenTargets");
        assert_eq!(database_key("Human Protein Atlas"), "Human Protein Atlas");

        // Unknown names are left alone
        assert_eq!(database_key("MGI"), "MGI");
        assert_eq!(database_key("clinicaltrials.gov"), "clinicaltrials.gov");
    }
}

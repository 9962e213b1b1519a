use serde_json::Value;

use super::schema::SENTINEL;

pub const UNKNOWN_PHASE: &str = "Unknown";

const PHASE_MAPPING: &[(&str, &str)] = &[
    ("phase 1", "1"),
    ("phase-1", "1"),
    ("phase i", "1"),
    ("phase 2", "2"),
    ("phase-2", "2"),
    ("phase ii", "2"),
    ("phase 3", "3"),
    ("phase-3", "3"),
    ("phase iii", "3"),
    ("phase 4", "4"),
    ("phase-4", "4"),
    ("phase iv", "4"),
    ("approved", "approved"),
    ("preclinical", "preclinical"),
];

/// Canonical form of a clinical trial phase. Matching is case-insensitive on
/// the trimmed input; values outside the table are returned unchanged.
pub fn canonical_phase(raw: &str) -> String {
    let key = raw.trim().to_lowercase();
    if key.is_empty() || key == SENTINEL {
        return UNKNOWN_PHASE.to_string();
    }

    PHASE_MAPPING
        .iter()
        .find(|(variant, _)| *variant == key)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Phase canonicalization for a raw field value. Numbers keep their textual
/// form; values that cannot be read as a phase become "Unknown".
pub fn canonical_phase_value(value: &Value) -> Value {
    let phase = match value {
        Value::String(s) => canonical_phase(s),
        Value::Number(n) => canonical_phase(&n.to_string()),
        _ => UNKNOWN_PHASE.to_string(),
    };
    Value::String(phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_phase_variants() {
        for raw in ["Phase II", "phase-2", "PHASE 2", "  phase 2 "] {
            assert_eq!(canonical_phase(raw), "2", "input {:?}", raw);
        }
        assert_eq!(canonical_phase("Phase I"), "1");
        assert_eq!(canonical_phase("phase iii"), "3");
        assert_eq!(canonical_phase("Phase-4"), "4");
        assert_eq!(canonical_phase("APPROVED"), "approved");
        assert_eq!(canonical_phase("Preclinical"), "preclinical");
    }

    #[test]
    fn test_unrecognized_phase_passes_through() {
        assert_eq!(canonical_phase("Early Phase 1"), "Early Phase 1");
        assert_eq!(canonical_phase("2"), "2");
    }

    #[test]
    fn test_missing_phase_is_unknown() {
        assert_eq!(canonical_phase("-"), UNKNOWN_PHASE);
        assert_eq!(canonical_phase(" - "), UNKNOWN_PHASE);
        assert_eq!(canonical_phase(""), UNKNOWN_PHASE);
    }

    #[test]
    fn test_phase_values() {
        assert_eq!(canonical_phase_value(&json!("Phase II")), json!("2"));
        assert_eq!(canonical_phase_value(&json!(3)), json!("3"));
        assert_eq!(canonical_phase_value(&Value::Null), json!(UNKNOWN_PHASE));
        assert_eq!(canonical_phase_value(&json!(["phase 1"])), json!(UNKNOWN_PHASE));
    }
}

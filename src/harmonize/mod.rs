//! Merges source-shaped records into the canonical schema.
//!
//! A batch goes through missing-value normalization, per-source schema
//! mapping, intent-specific reconciliation, schema completion with typed
//! coercion, and finally ranking by score. A batch that cannot be coerced is
//! returned unchanged instead.

pub mod intent;
pub mod mapping;
pub mod phase;
pub mod schema;

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{error, info};

use crate::error::HarmonizeError;

pub use intent::Intent;
pub use mapping::SchemaMapper;
pub use phase::{canonical_phase, UNKNOWN_PHASE};
pub use schema::{HarmonizedRecord, RawRecord, SENTINEL, STANDARD_SCHEMA};

pub const TARGET_HARMONIZE: &str = "harmonize";

/// Output of [`Harmonizer::harmonize`]. Both variants serialize as a plain
/// JSON array of objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HarmonizedResults {
    Harmonized(Vec<HarmonizedRecord>),
    /// The input, unchanged, because harmonization failed.
    Raw(Vec<RawRecord>),
}

impl HarmonizedResults {
    pub fn len(&self) -> usize {
        match self {
            HarmonizedResults::Harmonized(records) => records.len(),
            HarmonizedResults::Raw(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_harmonized(&self) -> bool {
        matches!(self, HarmonizedResults::Harmonized(_))
    }

    /// Records as field maps, in output order.
    pub fn to_records(&self) -> Result<Vec<RawRecord>, serde_json::Error> {
        match self {
            HarmonizedResults::Raw(records) => Ok(records.clone()),
            HarmonizedResults::Harmonized(records) => records
                .iter()
                .map(|record| match serde_json::to_value(record)? {
                    Value::Object(map) => Ok(map),
                    _ => Ok(RawRecord::new()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Harmonizer {
    mapper: SchemaMapper,
}

impl Default for Harmonizer {
    fn default() -> Self {
        Self::new(SchemaMapper::standard())
    }
}

impl Harmonizer {
    pub fn new(mapper: SchemaMapper) -> Self {
        Self { mapper }
    }

    pub fn mapper(&self) -> &SchemaMapper {
        &self.mapper
    }

    /// Harmonize a batch, falling back to the raw input if any record cannot
    /// be brought into the canonical schema.
    pub fn harmonize(&self, records: Vec<RawRecord>, intent: &Intent) -> HarmonizedResults {
        if records.is_empty() {
            return HarmonizedResults::Harmonized(Vec::new());
        }

        match self.try_harmonize(&records, intent) {
            Ok(harmonized) => {
                info!(
                    target: TARGET_HARMONIZE,
                    "Harmonized {} results for intent: {}",
                    harmonized.len(),
                    intent
                );
                HarmonizedResults::Harmonized(harmonized)
            }
            Err(e) => {
                error!(
                    target: TARGET_HARMONIZE,
                    "Error harmonizing {} results, returning them unchanged: {}",
                    records.len(),
                    e
                );
                HarmonizedResults::Raw(records)
            }
        }
    }

    pub fn try_harmonize(
        &self,
        records: &[RawRecord],
        intent: &Intent,
    ) -> Result<Vec<HarmonizedRecord>, HarmonizeError> {
        let mut working = fill_missing(records);

        for record in working.iter_mut() {
            self.mapper.apply(record);
            reconcile(record, intent);
        }

        let ranked = working.iter().any(|record| record.contains_key("score"));

        let mut harmonized = working
            .into_iter()
            .enumerate()
            .map(|(index, record)| HarmonizedRecord::from_fields(index, record))
            .collect::<Result<Vec<_>, _>>()?;

        if ranked {
            // sort_by is stable, so equal scores keep their input order
            harmonized.sort_by(|a, b| b.score.total_cmp(&a.score));
        }

        Ok(harmonized)
    }
}

/// Give every record every field seen anywhere in the batch, in first-seen
/// order. Absent and null values become the sentinel.
fn fill_missing(records: &[RawRecord]) -> Vec<RawRecord> {
    let mut seen = HashSet::new();
    let mut fields: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if seen.insert(key.as_str()) {
                fields.push(key.as_str());
            }
        }
    }

    records
        .iter()
        .map(|record| {
            fields
                .iter()
                .map(|field| {
                    let value = match record.get(*field) {
                        None | Some(Value::Null) => Value::String(SENTINEL.to_string()),
                        Some(value) => value.clone(),
                    };
                    (field.to_string(), value)
                })
                .collect()
        })
        .collect()
}

fn reconcile(record: &mut RawRecord, intent: &Intent) {
    match intent {
        Intent::ListDiseases => {
            copy_if_absent(record, "condition", "disease_name");
            if let Some(value) = record.get_mut("phase") {
                *value = phase::canonical_phase_value(value);
            }
        }
        Intent::ListToxicities => copy_if_absent(record, "adverse_event", "toxicity_type"),
        Intent::ListDrugs => copy_if_absent(record, "compound_name", "drug"),
        _ => {}
    }
}

fn copy_if_absent(record: &mut RawRecord, from: &str, to: &str) {
    if record.contains_key(to) {
        return;
    }
    if let Some(value) = record.get(from).cloned() {
        record.insert(to.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: Value) -> Vec<RawRecord> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => map,
                    _ => panic!("expected object"),
                })
                .collect(),
            _ => panic!("expected array"),
        }
    }

    fn harmonized(results: HarmonizedResults) -> Vec<HarmonizedRecord> {
        match results {
            HarmonizedResults::Harmonized(records) => records,
            HarmonizedResults::Raw(_) => panic!("harmonization fell back to raw records"),
        }
    }

    #[test]
    fn test_empty_input() {
        let results = Harmonizer::default().harmonize(Vec::new(), &Intent::ListDiseases);
        assert!(results.is_empty());
        assert!(results.is_harmonized());
        assert_eq!(serde_json::to_string(&results).unwrap(), "[]");
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let input = records(json!([{ "drug": "Imatinib", "interacting_partner": "ABL1" }]));
        let out = harmonized(Harmonizer::default().harmonize(input, &Intent::ListTargets));

        assert_eq!(out.len(), 1);
        let serialized = serde_json::to_value(&out[0]).unwrap();
        let object = serialized.as_object().unwrap();
        for (field, _) in STANDARD_SCHEMA {
            assert!(object.contains_key(*field), "missing {}", field);
        }
        assert_eq!(object["drug"], json!("Imatinib"));
        assert_eq!(object["disease_name"], json!("-"));
        assert_eq!(object["score"], json!(0.0));
        assert_eq!(object["expression_level"], json!(0.0));

        // extras come after every canonical field
        let keys: Vec<&String> = object.keys().collect();
        assert_eq!(keys.len(), STANDARD_SCHEMA.len() + 1);
        assert_eq!(keys.last().unwrap().as_str(), "interacting_partner");
    }

    #[test]
    fn test_phase_canonicalized_for_diseases() {
        let input = records(json!([
            { "drug": "Imatinib", "phase": "Phase II" },
            { "drug": "Imatinib", "phase": "phase-3" },
            { "drug": "Imatinib" }
        ]));
        let out = harmonized(Harmonizer::default().harmonize(input, &Intent::ListDiseases));

        let phases: Vec<&str> = out.iter().map(|r| r.phase.as_str()).collect();
        assert_eq!(phases, vec!["2", "3", UNKNOWN_PHASE]);
    }

    #[test]
    fn test_phase_untouched_for_other_intents() {
        let input = records(json!([{ "phase": "Phase II" }]));
        let out = harmonized(Harmonizer::default().harmonize(input, &Intent::ListDrugs));
        assert_eq!(out[0].phase, "Phase II");
    }

    #[test]
    fn test_ranking_by_score() {
        let input = records(json!([
            { "drug": "a", "score": 0.2 },
            { "drug": "b", "score": 0.9 },
            { "drug": "c", "score": 0.5 }
        ]));
        let out = harmonized(Harmonizer::default().harmonize(input, &Intent::ListDiseases));

        let scores: Vec<f64> = out.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![0.9, 0.5, 0.2]);
    }

    #[test]
    fn test_input_order_without_score() {
        let input = records(json!([
            { "drug": "c" },
            { "drug": "a" },
            { "drug": "b" }
        ]));
        let out = harmonized(Harmonizer::default().harmonize(input, &Intent::ListDrugs));

        let drugs: Vec<&str> = out.iter().map(|r| r.drug.as_str()).collect();
        assert_eq!(drugs, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let input = records(json!([
            { "drug": "first", "score": 0.5 },
            { "drug": "unscored" },
            { "drug": "second", "score": 0.5 },
            { "drug": "top", "score": 0.7 }
        ]));
        let out = harmonized(Harmonizer::default().harmonize(input, &Intent::ListDrugs));

        let drugs: Vec<&str> = out.iter().map(|r| r.drug.as_str()).collect();
        assert_eq!(drugs, vec!["top", "first", "second", "unscored"]);
    }

    #[test]
    fn test_mixed_shapes_from_one_source_rank_by_score() {
        let input = records(json!([
            { "source": "OpenTargets", "drug": "Imatinib", "score": 0.9 },
            { "source": "OpenTargets", "drug_name": "Dasatinib", "evidence_score": 0.5 }
        ]));
        let out = harmonized(Harmonizer::default().harmonize(input, &Intent::ListDrugs));

        let ranked: Vec<(&str, f64)> = out.iter().map(|r| (r.drug.as_str(), r.score)).collect();
        assert_eq!(ranked, vec![("Imatinib", 0.9), ("Dasatinib", 0.5)]);
    }

    #[test]
    fn test_source_mapping_applied() {
        let input = records(json!([
            {
                "source": "OpenTargets",
                "drug_name": "Dasatinib",
                "disease_id": "EFO_0000339",
                "evidence_score": "0.8"
            },
            {
                "source": "ClinicalTrials.gov",
                "intervention_name": "Rituximab",
                "condition": "Lymphoma",
                "study_phase": "Phase III"
            }
        ]));
        let out = harmonized(Harmonizer::default().harmonize(input, &Intent::ListDiseases));

        assert_eq!(out[0].drug, "Dasatinib");
        assert_eq!(out[0].efo_id, "EFO_0000339");
        assert_eq!(out[0].score, 0.8);
        assert_eq!(out[0].extra["drug_name"], json!("Dasatinib"));

        assert_eq!(out[1].drug, "Rituximab");
        assert_eq!(out[1].disease_name, "Lymphoma");
        assert_eq!(out[1].phase, "3");
        assert_eq!(out[1].score, 0.0);
    }

    #[test]
    fn test_intent_reconciliation() {
        let harmonizer = Harmonizer::default();

        let out = harmonized(harmonizer.harmonize(
            records(json!([{ "condition": "Leukemia" }])),
            &Intent::ListDiseases,
        ));
        assert_eq!(out[0].disease_name, "Leukemia");

        let out = harmonized(harmonizer.harmonize(
            records(json!([{ "adverse_event": "Neutropenia" }])),
            &Intent::ListToxicities,
        ));
        assert_eq!(out[0].toxicity_type, "Neutropenia");

        let out = harmonized(harmonizer.harmonize(
            records(json!([{ "compound_name": "Baricitinib", "drug": "Olumiant" }])),
            &Intent::ListDrugs,
        ));
        assert_eq!(out[0].drug, "Olumiant");

        let out = harmonized(harmonizer.harmonize(
            records(json!([{ "adverse_event": "Neutropenia" }])),
            &Intent::ListTrials,
        ));
        assert_eq!(out[0].toxicity_type, "-");
    }

    #[test]
    fn test_null_values_become_sentinel() {
        let input = records(json!([{ "drug": null, "notes": null }]));
        let out = harmonized(Harmonizer::default().harmonize(input, &Intent::ListDrugs));
        assert_eq!(out[0].drug, "-");
        assert_eq!(out[0].extra["notes"], json!("-"));
    }

    #[test]
    fn test_falls_back_to_raw_records() {
        let input = records(json!([
            { "drug": "a", "score": 0.4 },
            { "drug": "b", "score": "very high" }
        ]));
        let results = Harmonizer::default().harmonize(input.clone(), &Intent::ListDrugs);

        assert!(!results.is_harmonized());
        assert_eq!(results, HarmonizedResults::Raw(input));
        assert!(matches!(
            Harmonizer::default().try_harmonize(
                &records(json!([{ "score": "very high" }])),
                &Intent::ListDrugs
            ),
            Err(HarmonizeError::NotNumeric { index: 0, field: "score", .. })
        ));
    }

    #[test]
    fn test_to_records_keeps_field_order() {
        let input = records(json!([{ "extra_field": 1, "drug": "a" }]));
        let results = Harmonizer::default().harmonize(input, &Intent::ListDrugs);
        let rows = results.to_records().unwrap();
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys[0], "drug");
        assert_eq!(keys.last(), Some(&"extra_field"));
    }
}

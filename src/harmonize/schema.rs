//! Canonical output schema.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HarmonizeError;

/// A record as returned by a database client, shaped by its source.
pub type RawRecord = Map<String, Value>;

/// Placeholder for absent text values.
pub const SENTINEL: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
}

/// Every harmonized record carries these fields, in this order.
pub const STANDARD_SCHEMA: &[(&str, FieldKind)] = &[
    ("drug", FieldKind::Text),
    ("drug_id", FieldKind::Text),
    ("disease_name", FieldKind::Text),
    ("efo_id", FieldKind::Text),
    ("phase", FieldKind::Text),
    ("source", FieldKind::Text),
    ("toxicity_type", FieldKind::Text),
    ("target_symbol", FieldKind::Text),
    ("ensembl_id", FieldKind::Text),
    ("score", FieldKind::Number),
    ("expression_level", FieldKind::Number),
    ("snp_id", FieldKind::Text),
    ("phenotype", FieldKind::Text),
    ("localization", FieldKind::Text),
    ("evidence", FieldKind::Text),
    ("frequency", FieldKind::Text),
    ("severity", FieldKind::Text),
];

/// A record in the canonical schema. Source fields outside the schema are
/// kept in `extra` and serialized after the canonical ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonizedRecord {
    pub drug: String,
    pub drug_id: String,
    pub disease_name: String,
    pub efo_id: String,
    pub phase: String,
    pub source: String,
    pub toxicity_type: String,
    pub target_symbol: String,
    pub ensembl_id: String,
    pub score: f64,
    pub expression_level: f64,
    pub snp_id: String,
    pub phenotype: String,
    pub localization: String,
    pub evidence: String,
    pub frequency: String,
    pub severity: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for HarmonizedRecord {
    fn default() -> Self {
        let text = || SENTINEL.to_string();
        HarmonizedRecord {
            drug: text(),
            drug_id: text(),
            disease_name: text(),
            efo_id: text(),
            phase: text(),
            source: text(),
            toxicity_type: text(),
            target_symbol: text(),
            ensembl_id: text(),
            score: 0.0,
            expression_level: 0.0,
            snp_id: text(),
            phenotype: text(),
            localization: text(),
            evidence: text(),
            frequency: text(),
            severity: text(),
            extra: Map::new(),
        }
    }
}

impl HarmonizedRecord {
    /// Build a typed record from a field map. Missing canonical fields take
    /// their defaults; everything else lands in `extra`, in map order.
    /// `index` is the record's position in the batch, for error reporting.
    pub fn from_fields(index: usize, mut fields: Map<String, Value>) -> Result<Self, HarmonizeError> {
        let mut text = |field: &'static str| take_text(index, &mut fields, field);
        let drug = text("drug")?;
        let drug_id = text("drug_id")?;
        let disease_name = text("disease_name")?;
        let efo_id = text("efo_id")?;
        let phase = text("phase")?;
        let source = text("source")?;
        let toxicity_type = text("toxicity_type")?;
        let target_symbol = text("target_symbol")?;
        let ensembl_id = text("ensembl_id")?;
        let snp_id = text("snp_id")?;
        let phenotype = text("phenotype")?;
        let localization = text("localization")?;
        let evidence = text("evidence")?;
        let frequency = text("frequency")?;
        let severity = text("severity")?;

        let score = take_number(index, &mut fields, "score")?;
        let expression_level = take_number(index, &mut fields, "expression_level")?;

        Ok(HarmonizedRecord {
            drug,
            drug_id,
            disease_name,
            efo_id,
            phase,
            source,
            toxicity_type,
            target_symbol,
            ensembl_id,
            score,
            expression_level,
            snp_id,
            phenotype,
            localization,
            evidence,
            frequency,
            severity,
            extra: fields,
        })
    }
}

fn take_text(
    index: usize,
    fields: &mut Map<String, Value>,
    field: &'static str,
) -> Result<String, HarmonizeError> {
    match fields.shift_remove(field) {
        None | Some(Value::Null) => Ok(SENTINEL.to_string()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(Value::Array(_)) | Some(Value::Object(_)) => {
            Err(HarmonizeError::StructuredValue { index, field })
        }
    }
}

fn take_number(
    index: usize,
    fields: &mut Map<String, Value>,
    field: &'static str,
) -> Result<f64, HarmonizeError> {
    let value = match fields.shift_remove(field) {
        None | Some(Value::Null) => return Ok(0.0),
        Some(value) => value,
    };

    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim() == SENTINEL || s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    };

    parsed.ok_or_else(|| HarmonizeError::NotNumeric {
        index,
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_schema_is_consistent_with_record() {
        let serialized = serde_json::to_value(HarmonizedRecord::default()).unwrap();
        let keys: Vec<&str> = serialized
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        let schema: Vec<&str> = STANDARD_SCHEMA.iter().map(|(f, _)| *f).collect();
        assert_eq!(keys, schema);
    }

    #[test]
    fn test_from_fields_defaults_and_extras() {
        let record = HarmonizedRecord::from_fields(
            0,
            fields(json!({
                "interacting_partner": "MDM2",
                "drug": "Imatinib",
                "phase": 2,
                "score": "0.75",
                "partner_ensembl_id": "ENSG00000135679"
            })),
        )
        .unwrap();

        assert_eq!(record.drug, "Imatinib");
        assert_eq!(record.phase, "2");
        assert_eq!(record.score, 0.75);
        assert_eq!(record.expression_level, 0.0);
        assert_eq!(record.disease_name, SENTINEL);

        let extra: Vec<&str> = record.extra.keys().map(String::as_str).collect();
        assert_eq!(extra, vec!["interacting_partner", "partner_ensembl_id"]);
    }

    #[test]
    fn test_sentinel_number_is_zero() {
        let record =
            HarmonizedRecord::from_fields(0, fields(json!({ "score": "-", "expression_level": null })))
                .unwrap();
        assert_eq!(record.score, 0.0);
        assert_eq!(record.expression_level, 0.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = HarmonizedRecord::from_fields(3, fields(json!({ "score": "high" }))).unwrap_err();
        assert_eq!(
            err,
            HarmonizeError::NotNumeric {
                index: 3,
                field: "score",
                value: "\"high\"".to_string()
            }
        );

        let err =
            HarmonizedRecord::from_fields(1, fields(json!({ "drug": { "name": "x" } }))).unwrap_err();
        assert_eq!(
            err,
            HarmonizeError::StructuredValue {
                index: 1,
                field: "drug"
            }
        );
    }

    #[test]
    fn test_serialized_field_order() {
        let mut record = HarmonizedRecord::default();
        record.extra.insert("zeta".to_string(), json!(1));
        record.extra.insert("alpha".to_string(), json!(2));

        let serialized = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = serialized
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();

        assert_eq!(keys.first(), Some(&"drug"));
        assert_eq!(&keys[keys.len() - 2..], &["zeta", "alpha"]);
    }
}

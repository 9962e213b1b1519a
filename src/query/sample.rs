//! Offline stand-in for the OpenTargets GraphQL API.
//!
//! Answers a handful of well-known questions with canned responses shaped
//! like the live service's, so the pipeline can be exercised end to end
//! without network access.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{DatabaseClient, QueryContext};
use crate::entity::EntityType;
use crate::harmonize::{canonical_phase, Intent, RawRecord};
use crate::TARGET_QUERY;

#[derive(Debug, Clone, Default)]
pub struct SampleOpenTargetsClient;

impl SampleOpenTargetsClient {
    pub fn new() -> Self {
        Self
    }

    fn drug_diseases(&self, context: &QueryContext) -> Value {
        let phase = context
            .mention(EntityType::Phase)
            .map(canonical_phase)
            .unwrap_or_default();

        if matches_entity(context, EntityType::Drug, "CHEMBL941", &["imatinib", "gleevec"]) {
            if phase == "2" {
                return imatinib_phase2_diseases();
            }
            return imatinib_all_diseases();
        }
        if matches_entity(context, EntityType::Drug, "CHEMBL1201576", &["rituximab"]) {
            return json!([
                {
                    "drug": "Rituximab",
                    "drug_id": "CHEMBL1201576",
                    "disease_name": "Non-Hodgkin Lymphoma",
                    "efo_id": "EFO_0000403",
                    "phase": "approved",
                    "source": "OpenTargets",
                    "evidence_score": 0.99
                },
                {
                    "drug": "Rituximab",
                    "drug_id": "CHEMBL1201576",
                    "disease_name": "Chronic Lymphocytic Leukemia",
                    "efo_id": "EFO_0000095",
                    "phase": "approved",
                    "source": "OpenTargets",
                    "evidence_score": 0.97
                }
            ]);
        }
        if matches_entity(context, EntityType::Drug, "CHEMBL1421", &["dasatinib"]) {
            return json!([
                {
                    "drug": "Dasatinib",
                    "drug_id": "CHEMBL1421",
                    "disease_name": "Chronic Myeloid Leukemia",
                    "efo_id": "EFO_0000220",
                    "phase": "approved",
                    "source": "OpenTargets",
                    "evidence_score": 0.93
                }
            ]);
        }
        json!([])
    }

    fn drug_toxicities(&self, context: &QueryContext) -> Value {
        if !matches_entity(context, EntityType::Drug, "CHEMBL1421", &["dasatinib"]) {
            return json!([]);
        }
        json!([
            {
                "drug": "Dasatinib",
                "drug_id": "CHEMBL1421",
                "toxicity_type": "Pleural Effusion",
                "severity": "Grade 3",
                "frequency": "28%",
                "source": "OpenTargets"
            },
            {
                "drug": "Dasatinib",
                "drug_id": "CHEMBL1421",
                "toxicity_type": "Thrombocytopenia",
                "severity": "Grade 4",
                "frequency": "15%",
                "source": "OpenTargets"
            }
        ])
    }

    fn disease_drugs(&self, context: &QueryContext) -> Value {
        if !matches_entity(context, EntityType::Disease, "EFO_0000756", &["alopecia"]) {
            return json!([]);
        }
        json!([
            {
                "disease_name": "Alopecia",
                "efo_id": "EFO_0000756",
                "drug": "Minoxidil",
                "drug_id": "CHEMBL807",
                "phase": "approved",
                "source": "OpenTargets"
            }
        ])
    }

    fn target_interactions(&self, context: &QueryContext) -> Value {
        if !matches_entity(context, EntityType::Target, "ENSG00000141510", &["tp53"]) {
            return json!([]);
        }
        json!([
            {
                "target_symbol": "TP53",
                "ensembl_id": "ENSG00000141510",
                "interacting_partner": "MDM2",
                "partner_ensembl_id": "ENSG00000135679",
                "interaction_score": 0.95,
                "source": "OpenTargets"
            }
        ])
    }
}

#[async_trait]
impl DatabaseClient for SampleOpenTargetsClient {
    async fn query(&self, context: &QueryContext) -> Result<Vec<RawRecord>> {
        let response = match context.intent {
            Intent::ListToxicities => self.drug_toxicities(context),
            Intent::ListDrugs => self.disease_drugs(context),
            Intent::ListInteractions => self.target_interactions(context),
            _ => self.drug_diseases(context),
        };

        let records = into_records(response);
        debug!(
            target: TARGET_QUERY,
            "Sample OpenTargets answered {} with {} records",
            context.intent,
            records.len()
        );
        Ok(records)
    }
}

/// True when the entity resolved to `identifier`, or was written as one of
/// `names`.
fn matches_entity(
    context: &QueryContext,
    entity_type: EntityType,
    identifier: &str,
    names: &[&str],
) -> bool {
    if context.identifier(entity_type) == Some(identifier) {
        return true;
    }
    context
        .mention(entity_type)
        .map(|mention| names.contains(&mention.trim().to_lowercase().as_str()))
        .unwrap_or(false)
}

fn imatinib_phase2_diseases() -> Value {
    json!([
        {
            "drug": "Imatinib",
            "drug_id": "CHEMBL941",
            "disease_name": "Chronic Myeloid Leukemia",
            "efo_id": "EFO_0000220",
            "phase": "2",
            "source": "OpenTargets",
            "evidence_score": 0.95
        },
        {
            "drug": "Imatinib",
            "drug_id": "CHEMBL941",
            "disease_name": "Gastrointestinal Stromal Tumor",
            "efo_id": "EFO_0000559",
            "phase": "2",
            "source": "OpenTargets",
            "evidence_score": 0.88
        }
    ])
}

fn imatinib_all_diseases() -> Value {
    let mut all = imatinib_phase2_diseases();
    if let Value::Array(items) = &mut all {
        items.push(json!({
            "drug": "Imatinib",
            "drug_id": "CHEMBL941",
            "disease_name": "Chronic Myeloid Leukemia",
            "efo_id": "EFO_0000220",
            "phase": "approved",
            "source": "OpenTargets",
            "evidence_score": 0.98
        }));
    }
    all
}

fn into_records(value: Value) -> Vec<RawRecord> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the user asked for, as classified upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Intent {
    ListDiseases,
    ListDrugs,
    ListTargets,
    ListToxicities,
    ListTrials,
    ListExpression,
    ListInteractions,
    ListSnps,
    Other(String),
}

impl Intent {
    pub fn as_str(&self) -> &str {
        match self {
            Intent::ListDiseases => "list_diseases",
            Intent::ListDrugs => "list_drugs",
            Intent::ListTargets => "list_targets",
            Intent::ListToxicities => "list_toxicities",
            Intent::ListTrials => "list_trials",
            Intent::ListExpression => "list_expression",
            Intent::ListInteractions => "list_interactions",
            Intent::ListSnps => "list_snps",
            Intent::Other(s) => s,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Intent {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "list_diseases" => Intent::ListDiseases,
            "list_drugs" => Intent::ListDrugs,
            "list_targets" => Intent::ListTargets,
            "list_toxicities" => Intent::ListToxicities,
            "list_trials" => Intent::ListTrials,
            "list_expression" => Intent::ListExpression,
            "list_interactions" => Intent::ListInteractions,
            "list_snps" => Intent::ListSnps,
            _ => Intent::Other(s.to_string()),
        }
    }
}

impl From<String> for Intent {
    fn from(s: String) -> Self {
        Intent::from(s.as_str())
    }
}

impl From<Intent> for String {
    fn from(intent: Intent) -> Self {
        intent.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_round_trip_names() {
        assert_eq!(Intent::from("list_diseases"), Intent::ListDiseases);
        assert_eq!(Intent::from(" LIST_TOXICITIES "), Intent::ListToxicities);
        assert_eq!(Intent::from("list_snps").to_string(), "list_snps");

        let other = Intent::from("count_trials");
        assert_eq!(other, Intent::Other("count_trials".to_string()));
        assert_eq!(other.as_str(), "count_trials");
    }

    #[test]
    fn test_intent_serde() {
        let intent: Intent = serde_json::from_str("\"list_drugs\"").unwrap();
        assert_eq!(intent, Intent::ListDrugs);
        assert_eq!(
            serde_json::to_string(&Intent::ListInteractions).unwrap(),
            "\"list_interactions\""
        );
    }
}

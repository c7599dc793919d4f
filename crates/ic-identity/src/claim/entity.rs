//! Claim Entities

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A claim as the store knows it: fully-qualified type plus value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// A claim as callers see it: catalog key plus value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPair {
    /// Short claim-type key, e.g. `Name`
    pub key: String,
    pub value: String,
}

impl ClaimPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Persisted claim assignment. `id` is the surrogate key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    #[serde(rename = "_id")]
    pub id: i32,
    pub principal_id: String,
    pub claim_type: String,
    pub claim_value: String,
}

impl ClaimRecord {
    pub fn new(id: i32, principal_id: impl Into<String>, claim: &Claim) -> Self {
        Self {
            id,
            principal_id: principal_id.into(),
            claim_type: claim.claim_type.clone(),
            claim_value: claim.value.clone(),
        }
    }

    pub fn claim(&self) -> Claim {
        Claim::new(&self.claim_type, &self.claim_value)
    }

    pub fn matches(&self, principal_id: &str, claim: &Claim) -> bool {
        self.principal_id == principal_id
            && self.claim_type == claim.claim_type
            && self.claim_value == claim.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_matches_exact_pair() {
        let claim = Claim::new("urn:dept", "Eng");
        let record = ClaimRecord::new(12, "u-1", &claim);

        assert!(record.matches("u-1", &claim));
        assert!(!record.matches("u-2", &claim));
        assert!(!record.matches("u-1", &Claim::new("urn:dept", "eng")));
        assert_eq!(record.claim(), claim);
    }

    #[test]
    fn test_record_serializes_surrogate_as_id() {
        let record = ClaimRecord::new(7, "r-1", &Claim::new("t", "v"));
        let doc = bson::to_document(&record).unwrap();
        assert_eq!(doc.get_i32("_id").unwrap(), 7);
        assert_eq!(doc.get_str("principalId").unwrap(), "r-1");
    }
}

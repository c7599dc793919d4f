//! Role Entity

use std::cmp::Ordering;
use std::str::FromStr;

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::claim::{Claim, ClaimPair, ClaimTypeCatalog};
use crate::listing::Listable;
use crate::shared::error::{IdentityError, Result};
use crate::user::entity::normalize;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(rename = "_id")]
    pub id: String,

    pub name: String,

    /// Upper-cased name, unique
    pub normalized_name: String,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            normalized_name: normalize(&name),
            name,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.normalized_name = normalize(&self.name);
        self.updated_at = Utc::now();
    }
}

/// A role with its claims, as returned by the store query.
#[derive(Debug, Clone)]
pub struct RoleRecord {
    pub role: Role,
    pub claims: Vec<Claim>,
}

/// Listing row for a role
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleSummary {
    pub id: String,
    pub name: String,
    pub claims: Vec<ClaimPair>,
}

impl RoleSummary {
    pub fn from_record(record: RoleRecord, catalog: &ClaimTypeCatalog) -> Self {
        Self {
            id: record.role.id,
            name: record.role.name,
            claims: record.claims.iter().map(|c| catalog.to_pair(c)).collect(),
        }
    }
}

/// Entry of the role picker
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoleLookupEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSortField {
    Id,
    Name,
}

impl FromStr for RoleSortField {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            _ => Err(IdentityError::invalid_key("sort column", s)),
        }
    }
}

impl Listable for RoleSummary {
    type Field = RoleSortField;

    fn id(&self) -> &str {
        &self.id
    }

    fn search_text(&self) -> &str {
        &self.name
    }

    fn compare_by(&self, other: &Self, field: RoleSortField) -> Ordering {
        match field {
            RoleSortField::Id => self.id.cmp(&other.id),
            RoleSortField::Name => self.name.cmp(&other.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_updates_normalized_name() {
        let mut role = Role::new("Editor");
        assert_eq!(role.normalized_name, "EDITOR");
        role.rename("Reviewer");
        assert_eq!(role.name, "Reviewer");
        assert_eq!(role.normalized_name, "REVIEWER");
    }

    #[test]
    fn test_sort_field_names() {
        assert_eq!("Name".parse::<RoleSortField>().unwrap(), RoleSortField::Name);
        assert!(matches!(
            "createdAt".parse::<RoleSortField>(),
            Err(IdentityError::InvalidKey { .. })
        ));
    }
}

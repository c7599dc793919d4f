//! User Entity
//!
//! Users are principals that can sign in. Role memberships are stored on
//! the user document by role id so that renaming a role never orphans them.

use std::cmp::Ordering;
use std::str::FromStr;

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::claim::{Claim, ClaimPair, ClaimTypeCatalog};
use crate::claim::catalog::NAME_KEY;
use crate::listing::Listable;
use crate::shared::error::{IdentityError, Result};

/// Lockout end used for "locked until further notice".
pub fn locked_forever() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,

    pub user_name: String,

    /// Upper-cased user name, unique
    pub normalized_user_name: String,

    pub email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,

    /// Absent means not locked
    #[serde(skip_serializing_if = "Option::is_none", default, with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional")]
    pub lockout_end: Option<DateTime<Utc>>,

    #[serde(default)]
    pub role_ids: Vec<String>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(user_name: impl Into<String>, email: impl Into<String>) -> Self {
        let user_name = user_name.into();
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            normalized_user_name: normalize(&user_name),
            user_name,
            email: email.into(),
            password_hash: None,
            lockout_end: None,
            role_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Locked iff the lockout end is set and still in the future.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.lockout_end.map(|end| end > now).unwrap_or(false)
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked_at(Utc::now())
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.lockout_end = if locked { Some(locked_forever()) } else { None };
        self.updated_at = Utc::now();
    }

    pub fn has_role(&self, role_id: &str) -> bool {
        self.role_ids.iter().any(|r| r == role_id)
    }
}

/// Case-insensitive uniqueness key for user and role names.
pub fn normalize(name: &str) -> String {
    name.trim().to_uppercase()
}

/// A user with everything it holds, as returned by the store query.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub roles: Vec<String>,
    pub claims: Vec<Claim>,
}

/// Listing row for a user
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub user_name: String,
    pub email: String,
    /// Value of the `Name` claim, falling back to the user name
    pub display_name: String,
    pub locked: bool,
    pub roles: Vec<String>,
    pub claims: Vec<ClaimPair>,
}

impl UserSummary {
    pub fn from_record(record: UserRecord, catalog: &ClaimTypeCatalog, now: DateTime<Utc>) -> Self {
        let claims: Vec<ClaimPair> = record.claims.iter().map(|c| catalog.to_pair(c)).collect();
        let display_name = claims
            .iter()
            .find(|c| c.key == NAME_KEY)
            .map(|c| c.value.clone())
            .unwrap_or_else(|| record.user.user_name.clone());
        let mut roles = record.roles;
        roles.sort();

        Self {
            locked: record.user.is_locked_at(now),
            id: record.user.id,
            user_name: record.user.user_name,
            email: record.user.email,
            display_name,
            roles,
            claims,
        }
    }
}

/// Columns a user listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Id,
    UserName,
    Email,
    DisplayName,
    Locked,
}

impl FromStr for UserSortField {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "username" => Ok(Self::UserName),
            "email" => Ok(Self::Email),
            "displayname" | "name" => Ok(Self::DisplayName),
            "locked" => Ok(Self::Locked),
            _ => Err(IdentityError::invalid_key("sort column", s)),
        }
    }
}

impl Listable for UserSummary {
    type Field = UserSortField;

    fn id(&self) -> &str {
        &self.id
    }

    fn search_text(&self) -> &str {
        &self.email
    }

    fn compare_by(&self, other: &Self, field: UserSortField) -> Ordering {
        match field {
            UserSortField::Id => self.id.cmp(&other.id),
            UserSortField::UserName => self.user_name.cmp(&other.user_name),
            UserSortField::Email => self.email.cmp(&other.email),
            UserSortField::DisplayName => self.display_name.cmp(&other.display_name),
            UserSortField::Locked => self.locked.cmp(&other.locked),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_lockout_flag() {
        let now = Utc::now();
        let mut user = User::new("alice", "alice@example.com");
        assert!(!user.is_locked_at(now));

        user.lockout_end = Some(now - Duration::minutes(5));
        assert!(!user.is_locked_at(now));

        user.lockout_end = Some(now + Duration::minutes(5));
        assert!(user.is_locked_at(now));

        user.set_locked(true);
        assert_eq!(user.lockout_end, Some(locked_forever()));
        assert!(user.is_locked_at(now));

        user.set_locked(false);
        assert!(user.lockout_end.is_none());
    }

    #[test]
    fn test_summary_flattens_record() {
        let catalog = ClaimTypeCatalog::well_known();
        let name_type = catalog.resolve(NAME_KEY).unwrap().to_string();
        let record = UserRecord {
            user: User::new("alice", "alice@example.com"),
            roles: vec!["Viewer".to_string(), "Admin".to_string()],
            claims: vec![
                Claim::new(name_type, "Alice Liddell"),
                Claim::new("urn:custom:dept", "Eng"),
            ],
        };

        let summary = UserSummary::from_record(record, &catalog, Utc::now());
        assert_eq!(summary.display_name, "Alice Liddell");
        assert_eq!(summary.roles, vec!["Admin", "Viewer"]);
        assert_eq!(summary.claims[0], ClaimPair::new(NAME_KEY, "Alice Liddell"));
        assert_eq!(summary.claims[1], ClaimPair::new("urn:custom:dept", "Eng"));
        assert!(!summary.locked);
    }

    #[test]
    fn test_display_name_falls_back_to_user_name() {
        let record = UserRecord {
            user: User::new("bob", "bob@example.com"),
            roles: vec![],
            claims: vec![],
        };
        let summary = UserSummary::from_record(record, &ClaimTypeCatalog::well_known(), Utc::now());
        assert_eq!(summary.display_name, "bob");
    }

    #[test]
    fn test_sort_field_names() {
        assert_eq!("userName".parse::<UserSortField>().unwrap(), UserSortField::UserName);
        assert_eq!("EMAIL".parse::<UserSortField>().unwrap(), UserSortField::Email);
        assert!("passwordHash".parse::<UserSortField>().is_err());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Alice "), "ALICE");
    }
}

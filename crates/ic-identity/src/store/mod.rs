//! Principal Store
//!
//! The identity persistence collaborator. Reconciliation and listing only
//! talk to the store through [`PrincipalStore`]; the store owns field
//! validation, password hashing and surrogate keys for claim records.

pub mod memory;
pub mod mongo;
pub mod password;
pub mod validation;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::claim::Claim;
use crate::role::entity::{Role, RoleRecord};
use crate::shared::error::Result;
use crate::user::entity::{User, UserRecord};

pub use memory::InMemoryPrincipalStore;
pub use mongo::MongoPrincipalStore;
pub use password::{PasswordPolicy, PasswordService};

/// Which kind of principal a claim belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrincipalKind {
    User,
    Role,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Role => "Role",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity persistence.
///
/// Write methods fail with `ValidationFailed` carrying the reason when the
/// store rejects the change, and `NotFound` when the principal id does not
/// resolve.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_user(&self, id: &str) -> Result<Option<User>>;

    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<User>>;

    /// Validate, hash the password and insert.
    async fn create_user(&self, user: User, password: &str) -> Result<User>;

    /// Replace profile fields (user name, email, lockout). Role ids and
    /// password hash are left as stored.
    async fn update_user(&self, user: &User) -> Result<()>;

    /// Delete the user and its claims.
    async fn delete_user(&self, id: &str) -> Result<()>;

    async fn set_password(&self, id: &str, password: &str) -> Result<()>;

    /// Every user with role names and claims.
    async fn query_users(&self) -> Result<Vec<UserRecord>>;

    async fn get_roles(&self, user_id: &str) -> Result<Vec<String>>;

    async fn add_to_role(&self, user_id: &str, role_name: &str) -> Result<()>;

    async fn remove_from_role(&self, user_id: &str, role_name: &str) -> Result<()>;

    async fn find_role(&self, id: &str) -> Result<Option<Role>>;

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>>;

    async fn create_role(&self, role: Role) -> Result<Role>;

    async fn update_role(&self, role: &Role) -> Result<()>;

    /// Delete the role, its claims and its memberships.
    async fn delete_role(&self, id: &str) -> Result<()>;

    /// Every role with its claims.
    async fn query_roles(&self) -> Result<Vec<RoleRecord>>;

    async fn get_claims(&self, kind: PrincipalKind, principal_id: &str) -> Result<Vec<Claim>>;

    async fn add_claim(&self, kind: PrincipalKind, principal_id: &str, claim: &Claim) -> Result<()>;

    async fn remove_claim(&self, kind: PrincipalKind, principal_id: &str, claim: &Claim) -> Result<()>;

    /// Backend reachability, for health checks.
    async fn ping(&self) -> Result<()>;
}

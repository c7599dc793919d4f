//! Claim/Role Reconciler
//!
//! Converges a principal's persisted claims (and, for users, role
//! memberships) onto a desired set with the fewest store calls.
//!
//! Reading current state, diffing and applying are separate store calls.
//! Two concurrent reconciles of the same principal can interleave; set
//! `reconcile.serialize_per_principal` to hold a per-principal lock across
//! the whole sequence within this process.

pub mod apply;
pub mod delta;

use std::sync::Arc;

pub use apply::{apply, plan, ApplyFailure, ApplyPolicy, ApplyReport, Mutation};
pub use delta::{diff, reconcile_claims, reconcile_roles, Delta};

use crate::claim::Claim;
use crate::shared::error::Result;
use crate::shared::principal_lock::PrincipalLocks;
use crate::store::{PrincipalKind, PrincipalStore};

/// Read, diff and apply for one principal.
pub struct Reconciler {
    store: Arc<dyn PrincipalStore>,
    locks: Arc<PrincipalLocks>,
    policy: ApplyPolicy,
}

impl Reconciler {
    pub fn new(store: Arc<dyn PrincipalStore>, locks: Arc<PrincipalLocks>, policy: ApplyPolicy) -> Self {
        Self { store, locks, policy }
    }

    pub fn policy(&self) -> ApplyPolicy {
        self.policy
    }

    /// Converge a user. `desired_roles = None` leaves memberships alone.
    ///
    /// Claims must already be translated to store claim types. Desired role
    /// names are matched case-insensitively and replaced by the stored name
    /// before diffing.
    pub async fn reconcile_user(
        &self,
        user_id: &str,
        desired_roles: Option<&[String]>,
        desired_claims: &[Claim],
    ) -> Result<ApplyReport> {
        let _guard = self.locks.acquire(user_id).await;

        let role_delta = match desired_roles {
            Some(desired) => {
                let current = self.store.get_roles(user_id).await?;
                let desired = self.stored_role_names(desired).await?;
                Some(reconcile_roles(&current, &desired))
            }
            None => None,
        };
        let current_claims = self.store.get_claims(PrincipalKind::User, user_id).await?;
        let claim_delta = reconcile_claims(&current_claims, desired_claims);

        let mutations = plan(role_delta.as_ref(), &claim_delta);
        Ok(apply(self.store.as_ref(), PrincipalKind::User, user_id, mutations, self.policy).await)
    }

    /// Unknown names pass through unchanged; the grant reports them.
    async fn stored_role_names(&self, desired: &[String]) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(desired.len());
        for name in desired {
            match self.store.find_role_by_name(name).await? {
                Some(role) => names.push(role.name),
                None => names.push(name.clone()),
            }
        }
        Ok(names)
    }

    /// Converge a role's claims.
    pub async fn reconcile_role(&self, role_id: &str, desired_claims: &[Claim]) -> Result<ApplyReport> {
        let _guard = self.locks.acquire(role_id).await;

        let current = self.store.get_claims(PrincipalKind::Role, role_id).await?;
        let delta = reconcile_claims(&current, desired_claims);

        let mutations = plan(None, &delta);
        Ok(apply(self.store.as_ref(), PrincipalKind::Role, role_id, mutations, self.policy).await)
    }
}

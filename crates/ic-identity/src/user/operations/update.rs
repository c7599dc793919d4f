//! Update User Use Case
//!
//! Sets profile fields, then converges roles and claims onto the desired
//! sets. Unknown users and unknown claim keys are rejected before anything
//! is written.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::claim::{ClaimPair, ClaimTypeCatalog};
use crate::reconcile::Reconciler;
use crate::shared::context::IdentityContext;
use crate::shared::error::{IdentityError, Result};
use crate::store::PrincipalStore;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserCommand {
    #[serde(default)]
    pub id: String,

    pub email: String,

    #[serde(default)]
    pub locked: bool,

    /// Desired role names
    #[serde(default)]
    pub roles: Vec<String>,

    /// Desired claims
    #[serde(default)]
    pub claims: Vec<ClaimPair>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdated {
    pub id: String,
    /// Role and claim changes made, in the order applied
    pub applied: Vec<String>,
}

pub struct UpdateUserUseCase {
    store: Arc<dyn PrincipalStore>,
    catalog: Arc<ClaimTypeCatalog>,
    reconciler: Arc<Reconciler>,
}

impl UpdateUserUseCase {
    pub fn new(ctx: &IdentityContext) -> Self {
        Self {
            store: ctx.store.clone(),
            catalog: ctx.catalog.clone(),
            reconciler: ctx.reconciler.clone(),
        }
    }

    pub async fn execute(&self, command: UpdateUserCommand) -> Result<UserUpdated> {
        let mut user = self
            .store
            .find_user(&command.id)
            .await?
            .ok_or_else(|| IdentityError::not_found("User", &command.id))?;

        let desired_claims = self.catalog.translate(&command.claims)?;
        let desired_roles: Vec<String> = command
            .roles
            .iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        user.email = command.email.trim().to_string();
        user.set_locked(command.locked);
        self.store.update_user(&user).await?;

        let report = self
            .reconciler
            .reconcile_user(&user.id, Some(desired_roles.as_slice()), &desired_claims)
            .await?;

        for failure in &report.failures {
            warn!(user_id = %user.id, failure = %failure.describe(), "User change rejected");
        }
        let applied = report.applied_descriptions();
        report.into_result()?;

        info!(user_id = %user.id, locked = command.locked, changes = applied.len(), "User updated");
        Ok(UserUpdated { id: user.id, applied })
    }
}

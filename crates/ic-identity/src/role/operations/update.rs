//! Update Role Use Case

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
pub struct UpdateRoleCommand {
    #[serde(default)]
    pub id: String,

    pub name: String,

    /// Desired claims
    #[serde(default)]
    pub claims: Vec<ClaimPair>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdated {
    pub id: String,
    pub name: String,
    pub applied: Vec<String>,
}

pub struct UpdateRoleUseCase {
    store: Arc<dyn PrincipalStore>,
    catalog: Arc<ClaimTypeCatalog>,
    reconciler: Arc<Reconciler>,
}

impl UpdateRoleUseCase {
    pub fn new(ctx: &IdentityContext) -> Self {
        Self {
            store: ctx.store.clone(),
            catalog: ctx.catalog.clone(),
            reconciler: ctx.reconciler.clone(),
        }
    }

    pub async fn execute(&self, command: UpdateRoleCommand) -> Result<RoleUpdated> {
        let mut role = self
            .store
            .find_role(&command.id)
            .await?
            .ok_or_else(|| IdentityError::not_found("Role", &command.id))?;

        let desired_claims = self.catalog.translate(&command.claims)?;

        let name = command.name.trim();
        if name != role.name {
            role.rename(name);
            self.store.update_role(&role).await?;
        }

        let report = self.reconciler.reconcile_role(&role.id, &desired_claims).await?;
        for failure in &report.failures {
            warn!(role_id = %role.id, failure = %failure.describe(), "Role change rejected");
        }
        let applied = report.applied_descriptions();
        report.into_result()?;

        info!(role_id = %role.id, name = %role.name, changes = applied.len(), "Role updated");
        Ok(RoleUpdated {
            id: role.id,
            name: role.name,
            applied,
        })
    }
}

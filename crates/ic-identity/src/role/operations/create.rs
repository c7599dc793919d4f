//! Create Role Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::role::entity::Role;
use crate::shared::context::IdentityContext;
use crate::shared::error::Result;
use crate::store::PrincipalStore;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleCommand {
    pub name: String,
}

pub struct CreateRoleUseCase {
    store: Arc<dyn PrincipalStore>,
}

impl CreateRoleUseCase {
    pub fn new(ctx: &IdentityContext) -> Self {
        Self { store: ctx.store.clone() }
    }

    pub async fn execute(&self, command: CreateRoleCommand) -> Result<Role> {
        let role = self
            .store
            .create_role(Role::new(command.name.trim()))
            .await
            .map_err(|e| {
                warn!(name = %command.name, error = %e, "Role creation rejected");
                e
            })?;
        info!(role_id = %role.id, name = %role.name, "Role created");
        Ok(role)
    }
}

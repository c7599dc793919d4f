//! Delete Role Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::shared::context::IdentityContext;
use crate::shared::error::Result;
use crate::store::PrincipalStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRoleCommand {
    pub id: String,
}

pub struct DeleteRoleUseCase {
    store: Arc<dyn PrincipalStore>,
}

impl DeleteRoleUseCase {
    pub fn new(ctx: &IdentityContext) -> Self {
        Self { store: ctx.store.clone() }
    }

    /// Memberships and claims of the role go with it.
    pub async fn execute(&self, command: DeleteRoleCommand) -> Result<()> {
        self.store.delete_role(&command.id).await?;
        info!(role_id = %command.id, "Role deleted");
        Ok(())
    }
}

//! Delete User Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::shared::context::IdentityContext;
use crate::shared::error::Result;
use crate::store::PrincipalStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserCommand {
    pub id: String,
}

pub struct DeleteUserUseCase {
    store: Arc<dyn PrincipalStore>,
}

impl DeleteUserUseCase {
    pub fn new(ctx: &IdentityContext) -> Self {
        Self { store: ctx.store.clone() }
    }

    pub async fn execute(&self, command: DeleteUserCommand) -> Result<()> {
        self.store.delete_user(&command.id).await?;
        info!(user_id = %command.id, "User deleted");
        Ok(())
    }
}

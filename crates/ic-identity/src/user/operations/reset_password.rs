//! Reset Password Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::shared::context::IdentityContext;
use crate::shared::error::{IdentityError, Result};
use crate::store::PrincipalStore;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordCommand {
    #[serde(default)]
    pub id: String,
    pub password: String,
    /// Must repeat `password`
    pub verify: String,
}

pub struct ResetPasswordUseCase {
    store: Arc<dyn PrincipalStore>,
}

impl ResetPasswordUseCase {
    pub fn new(ctx: &IdentityContext) -> Self {
        Self { store: ctx.store.clone() }
    }

    pub async fn execute(&self, command: ResetPasswordCommand) -> Result<()> {
        if command.password != command.verify {
            return Err(IdentityError::validation("Password and verification do not match"));
        }

        self.store.set_password(&command.id, &command.password).await?;
        info!(user_id = %command.id, "Password reset");
        Ok(())
    }
}

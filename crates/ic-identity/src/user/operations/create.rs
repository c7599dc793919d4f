//! Create User Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::claim::catalog::NAME_KEY;
use crate::claim::{Claim, ClaimTypeCatalog};
use crate::shared::context::IdentityContext;
use crate::shared::error::{IdentityError, Result};
use crate::store::{PrincipalKind, PrincipalStore};
use crate::user::entity::User;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserCommand {
    pub user_name: String,

    /// Display name, stored as the `Name` claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub email: String,

    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCreated {
    pub id: String,
    pub user_name: String,
}

pub struct CreateUserUseCase {
    store: Arc<dyn PrincipalStore>,
    catalog: Arc<ClaimTypeCatalog>,
}

impl CreateUserUseCase {
    pub fn new(ctx: &IdentityContext) -> Self {
        Self {
            store: ctx.store.clone(),
            catalog: ctx.catalog.clone(),
        }
    }

    pub async fn execute(&self, command: CreateUserCommand) -> Result<UserCreated> {
        let name_claim = match command.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => Some(Claim::new(self.catalog.resolve(NAME_KEY)?, name)),
            None => None,
        };

        let user = User::new(command.user_name.trim(), command.email.trim());
        let user = self.store.create_user(user, &command.password).await.map_err(|e| {
            warn!(user_name = %command.user_name, error = %e, "User creation rejected");
            e
        })?;

        if let Some(claim) = name_claim {
            if let Err(e) = self.store.add_claim(PrincipalKind::User, &user.id, &claim).await {
                warn!(user_id = %user.id, error = %e, "User created without display name");
                return Err(IdentityError::PartialApply {
                    applied: 1,
                    failed: vec![format!("add claim '{}' = '{}': {}", claim.claim_type, claim.value, e)],
                });
            }
        }

        info!(user_id = %user.id, user_name = %user.user_name, "User created");
        Ok(UserCreated {
            id: user.id,
            user_name: user.user_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_deserialization() {
        let cmd: CreateUserCommand = serde_json::from_str(
            r#"{"userName":"alice","email":"alice@example.com","password":"Secret1"}"#,
        )
        .unwrap();
        assert_eq!(cmd.user_name, "alice");
        assert!(cmd.name.is_none());
    }
}

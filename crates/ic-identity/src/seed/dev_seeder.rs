//! Development Data Seeder
//!
//! Seeds demo principals when `dev_mode` is on. Safe to run repeatedly:
//! existing users and roles are left as they are.
//!
//! Default credentials:
//!   Administrator: admin / DevPassword123!
//!   Editor:        alice / DevPassword123!
//!   Viewer:        bob   / DevPassword123!

use std::sync::Arc;

use tracing::info;

use crate::claim::catalog::NAME_KEY;
use crate::claim::{Claim, ClaimTypeCatalog};
use crate::role::entity::Role;
use crate::shared::error::Result;
use crate::store::{PrincipalKind, PrincipalStore};
use crate::user::entity::User;

const DEV_PASSWORD: &str = "DevPassword123!";

const DEV_ROLES: &[&str] = &["Administrator", "Editor", "Viewer"];

/// (user name, email, display name, roles)
const DEV_USERS: &[(&str, &str, &str, &[&str])] = &[
    ("admin", "admin@identity.local", "Console Admin", &["Administrator"]),
    ("alice", "alice@acme.test", "Alice Liddell", &["Editor", "Viewer"]),
    ("bob", "bob@acme.test", "Bob Builder", &["Viewer"]),
];

pub struct DevDataSeeder {
    store: Arc<dyn PrincipalStore>,
    catalog: Arc<ClaimTypeCatalog>,
}

impl DevDataSeeder {
    pub fn new(store: Arc<dyn PrincipalStore>, catalog: Arc<ClaimTypeCatalog>) -> Self {
        Self { store, catalog }
    }

    pub async fn seed(&self) -> Result<()> {
        info!("Seeding development principals");

        for name in DEV_ROLES {
            if self.store.find_role_by_name(name).await?.is_none() {
                self.store.create_role(Role::new(*name)).await?;
                info!(role = %name, "Created role");
            }
        }

        let name_type = self.catalog.resolve(NAME_KEY)?.to_string();
        for (user_name, email, display_name, roles) in DEV_USERS {
            if self.store.find_user_by_name(user_name).await?.is_some() {
                continue;
            }
            let user = self
                .store
                .create_user(User::new(*user_name, *email), DEV_PASSWORD)
                .await?;
            self.store
                .add_claim(PrincipalKind::User, &user.id, &Claim::new(name_type.as_str(), *display_name))
                .await?;
            for role in roles.iter() {
                self.store.add_to_role(&user.id, role).await?;
            }
            info!(user_name = %user_name, "Created user");
        }

        info!("Default logins use password {}", DEV_PASSWORD);
        Ok(())
    }
}

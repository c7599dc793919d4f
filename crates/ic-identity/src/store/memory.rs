//! In-memory principal store
//!
//! Backs tests and `backend = "memory"`. Claim records get surrogate keys
//! from the configured allocator, checked against the keys already issued.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use ic_config::StoreConfig;

use super::password::PasswordService;
use super::validation::{validate_email, validate_role_name, validate_user_name};
use super::{PrincipalKind, PrincipalStore};
use crate::claim::{Claim, ClaimRecord};
use crate::role::entity::{Role, RoleRecord};
use crate::shared::error::{IdentityError, Result};
use crate::shared::surrogate_key::{allocate_unique, allocator_for, RandomKeyAllocator, SurrogateKeyAllocator};
use crate::user::entity::{normalize, User, UserRecord};

const DEFAULT_MAX_KEY_ATTEMPTS: u32 = 8;

#[derive(Default)]
struct State {
    users: BTreeMap<String, User>,
    roles: BTreeMap<String, Role>,
    user_claims: BTreeMap<i32, ClaimRecord>,
    role_claims: BTreeMap<i32, ClaimRecord>,
}

impl State {
    fn claims(&self, kind: PrincipalKind) -> &BTreeMap<i32, ClaimRecord> {
        match kind {
            PrincipalKind::User => &self.user_claims,
            PrincipalKind::Role => &self.role_claims,
        }
    }

    fn claims_mut(&mut self, kind: PrincipalKind) -> &mut BTreeMap<i32, ClaimRecord> {
        match kind {
            PrincipalKind::User => &mut self.user_claims,
            PrincipalKind::Role => &mut self.role_claims,
        }
    }

    fn principal_exists(&self, kind: PrincipalKind, id: &str) -> bool {
        match kind {
            PrincipalKind::User => self.users.contains_key(id),
            PrincipalKind::Role => self.roles.contains_key(id),
        }
    }

    fn claims_of(&self, kind: PrincipalKind, principal_id: &str) -> Vec<Claim> {
        let mut claims: Vec<Claim> = self
            .claims(kind)
            .values()
            .filter(|r| r.principal_id == principal_id)
            .map(ClaimRecord::claim)
            .collect();
        claims.sort();
        claims
    }

    fn role_by_name(&self, name: &str) -> Option<&Role> {
        let normalized = normalize(name);
        self.roles.values().find(|r| r.normalized_name == normalized)
    }

    fn user_name_taken(&self, normalized: &str, except_id: &str) -> bool {
        self.users
            .values()
            .any(|u| u.normalized_user_name == normalized && u.id != except_id)
    }

    fn role_name_taken(&self, normalized: &str, except_id: &str) -> bool {
        self.roles
            .values()
            .any(|r| r.normalized_name == normalized && r.id != except_id)
    }

    fn user_mut(&mut self, id: &str) -> Result<&mut User> {
        self.users
            .get_mut(id)
            .ok_or_else(|| IdentityError::not_found("User", id))
    }
}

pub struct InMemoryPrincipalStore {
    state: RwLock<State>,
    passwords: PasswordService,
    allocator: Box<dyn SurrogateKeyAllocator>,
    max_key_attempts: u32,
}

impl InMemoryPrincipalStore {
    pub fn new(passwords: PasswordService) -> Self {
        Self {
            state: RwLock::new(State::default()),
            passwords,
            allocator: Box::new(RandomKeyAllocator),
            max_key_attempts: DEFAULT_MAX_KEY_ATTEMPTS,
        }
    }

    pub fn from_config(config: &StoreConfig, passwords: PasswordService) -> Self {
        Self::new(passwords).with_allocator(allocator_for(config.key_allocator, 0), config.max_key_attempts)
    }

    pub fn with_allocator(mut self, allocator: Box<dyn SurrogateKeyAllocator>, max_key_attempts: u32) -> Self {
        self.allocator = allocator;
        self.max_key_attempts = max_key_attempts;
        self
    }

    /// Surrogate keys of a principal's claim records, ascending.
    pub async fn claim_keys(&self, kind: PrincipalKind, principal_id: &str) -> Vec<i32> {
        let state = self.state.read().await;
        state
            .claims(kind)
            .values()
            .filter(|r| r.principal_id == principal_id)
            .map(|r| r.id)
            .collect()
    }
}

#[async_trait]
impl PrincipalStore for InMemoryPrincipalStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<User>> {
        let normalized = normalize(user_name);
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.normalized_user_name == normalized)
            .cloned())
    }

    async fn create_user(&self, mut user: User, password: &str) -> Result<User> {
        validate_user_name(&user.user_name)?;
        validate_email(&user.email)?;
        user.normalized_user_name = normalize(&user.user_name);
        let hash = self.passwords.hash_password(password)?;
        user.password_hash = Some(hash);

        let mut state = self.state.write().await;
        if state.users.contains_key(&user.id) {
            return Err(IdentityError::validation(format!("User id '{}' already exists", user.id)));
        }
        if state.user_name_taken(&user.normalized_user_name, &user.id) {
            return Err(IdentityError::validation(format!(
                "User name '{}' is already taken",
                user.user_name
            )));
        }
        state.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        validate_user_name(&user.user_name)?;
        validate_email(&user.email)?;
        let normalized = normalize(&user.user_name);

        let mut state = self.state.write().await;
        if state.user_name_taken(&normalized, &user.id) {
            return Err(IdentityError::validation(format!(
                "User name '{}' is already taken",
                user.user_name
            )));
        }
        let stored = state.user_mut(&user.id)?;
        stored.user_name = user.user_name.clone();
        stored.normalized_user_name = normalized;
        stored.email = user.email.clone();
        stored.lockout_end = user.lockout_end;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if state.users.remove(id).is_none() {
            return Err(IdentityError::not_found("User", id));
        }
        state.user_claims.retain(|_, r| r.principal_id != id);
        Ok(())
    }

    async fn set_password(&self, id: &str, password: &str) -> Result<()> {
        if self.state.read().await.users.get(id).is_none() {
            return Err(IdentityError::not_found("User", id));
        }
        let hash = self.passwords.hash_password(password)?;

        let mut state = self.state.write().await;
        let user = state.user_mut(id)?;
        user.password_hash = Some(hash);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn query_users(&self) -> Result<Vec<UserRecord>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .map(|user| UserRecord {
                roles: user
                    .role_ids
                    .iter()
                    .filter_map(|id| state.roles.get(id).map(|r| r.name.clone()))
                    .collect(),
                claims: state.claims_of(PrincipalKind::User, &user.id),
                user: user.clone(),
            })
            .collect())
    }

    async fn get_roles(&self, user_id: &str) -> Result<Vec<String>> {
        let state = self.state.read().await;
        let user = state
            .users
            .get(user_id)
            .ok_or_else(|| IdentityError::not_found("User", user_id))?;
        Ok(user
            .role_ids
            .iter()
            .filter_map(|id| state.roles.get(id).map(|r| r.name.clone()))
            .collect())
    }

    async fn add_to_role(&self, user_id: &str, role_name: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let role_id = state
            .role_by_name(role_name)
            .map(|r| r.id.clone())
            .ok_or_else(|| IdentityError::validation(format!("Role '{}' does not exist", role_name)))?;
        let user = state.user_mut(user_id)?;
        if user.has_role(&role_id) {
            return Err(IdentityError::validation(format!(
                "User is already in role '{}'",
                role_name
            )));
        }
        user.role_ids.push(role_id);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn remove_from_role(&self, user_id: &str, role_name: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let role_id = state
            .role_by_name(role_name)
            .map(|r| r.id.clone())
            .ok_or_else(|| IdentityError::validation(format!("Role '{}' does not exist", role_name)))?;
        let user = state.user_mut(user_id)?;
        if !user.has_role(&role_id) {
            return Err(IdentityError::validation(format!(
                "User is not in role '{}'",
                role_name
            )));
        }
        user.role_ids.retain(|id| id != &role_id);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn find_role(&self, id: &str) -> Result<Option<Role>> {
        Ok(self.state.read().await.roles.get(id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        Ok(self.state.read().await.role_by_name(name).cloned())
    }

    async fn create_role(&self, mut role: Role) -> Result<Role> {
        validate_role_name(&role.name)?;
        role.normalized_name = normalize(&role.name);

        let mut state = self.state.write().await;
        if state.roles.contains_key(&role.id) {
            return Err(IdentityError::validation(format!("Role id '{}' already exists", role.id)));
        }
        if state.role_name_taken(&role.normalized_name, &role.id) {
            return Err(IdentityError::validation(format!(
                "Role name '{}' is already taken",
                role.name
            )));
        }
        state.roles.insert(role.id.clone(), role.clone());
        Ok(role)
    }

    async fn update_role(&self, role: &Role) -> Result<()> {
        validate_role_name(&role.name)?;
        let normalized = normalize(&role.name);

        let mut state = self.state.write().await;
        if state.role_name_taken(&normalized, &role.id) {
            return Err(IdentityError::validation(format!(
                "Role name '{}' is already taken",
                role.name
            )));
        }
        let stored = state
            .roles
            .get_mut(&role.id)
            .ok_or_else(|| IdentityError::not_found("Role", &role.id))?;
        stored.name = role.name.clone();
        stored.normalized_name = normalized;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_role(&self, id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if state.roles.remove(id).is_none() {
            return Err(IdentityError::not_found("Role", id));
        }
        state.role_claims.retain(|_, r| r.principal_id != id);
        for user in state.users.values_mut() {
            user.role_ids.retain(|r| r != id);
        }
        Ok(())
    }

    async fn query_roles(&self) -> Result<Vec<RoleRecord>> {
        let state = self.state.read().await;
        Ok(state
            .roles
            .values()
            .map(|role| RoleRecord {
                claims: state.claims_of(PrincipalKind::Role, &role.id),
                role: role.clone(),
            })
            .collect())
    }

    async fn get_claims(&self, kind: PrincipalKind, principal_id: &str) -> Result<Vec<Claim>> {
        let state = self.state.read().await;
        if !state.principal_exists(kind, principal_id) {
            return Err(IdentityError::not_found(kind.as_str(), principal_id));
        }
        Ok(state.claims_of(kind, principal_id))
    }

    async fn add_claim(&self, kind: PrincipalKind, principal_id: &str, claim: &Claim) -> Result<()> {
        if claim.claim_type.trim().is_empty() {
            return Err(IdentityError::validation("Claim type is required"));
        }

        let mut state = self.state.write().await;
        if !state.principal_exists(kind, principal_id) {
            return Err(IdentityError::not_found(kind.as_str(), principal_id));
        }
        let records = state.claims_mut(kind);
        if records.values().any(|r| r.matches(principal_id, claim)) {
            return Err(IdentityError::validation(format!(
                "Claim '{}' = '{}' is already assigned",
                claim.claim_type, claim.value
            )));
        }

        let key = allocate_unique(
            self.allocator.as_ref(),
            |k| records.contains_key(&k),
            self.max_key_attempts,
        )?;
        records.insert(key, ClaimRecord::new(key, principal_id, claim));
        debug!(kind = %kind, principal_id, key, "Claim record stored");
        Ok(())
    }

    async fn remove_claim(&self, kind: PrincipalKind, principal_id: &str, claim: &Claim) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.principal_exists(kind, principal_id) {
            return Err(IdentityError::not_found(kind.as_str(), principal_id));
        }
        let records = state.claims_mut(kind);
        let key = records
            .values()
            .find(|r| r.matches(principal_id, claim))
            .map(|r| r.id)
            .ok_or_else(|| {
                IdentityError::validation(format!(
                    "Claim '{}' = '{}' is not assigned",
                    claim.claim_type, claim.value
                ))
            })?;
        records.remove(&key);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

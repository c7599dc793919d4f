//! MongoDB principal store
//!
//! Collections: `users`, `roles`, `user_claims`, `role_claims`. Claim
//! documents use an integer surrogate `_id`. MongoDB has no atomic integer
//! allocation, so keys come from the configured allocator and a duplicate
//! key error on insert is retried with a fresh key.

use std::collections::HashMap;

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::{debug, info};

use ic_config::StoreConfig;

use super::password::PasswordService;
use super::validation::{validate_email, validate_role_name, validate_user_name};
use super::{PrincipalKind, PrincipalStore};
use crate::claim::{Claim, ClaimRecord};
use crate::role::entity::{Role, RoleRecord};
use crate::shared::error::{IdentityError, Result};
use crate::shared::surrogate_key::{allocator_for, insert_with_fresh_key, KeyedInsert, SurrogateKeyAllocator};
use crate::user::entity::{normalize, User, UserRecord};

/// Check if a MongoDB error is a duplicate key error (code 11000)
fn is_duplicate_key_error(error: &mongodb::error::Error) -> bool {
    if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(write_error)) =
        error.kind.as_ref()
    {
        return write_error.code == 11000;
    }
    false
}

fn already_assigned(claim: &Claim) -> IdentityError {
    IdentityError::validation(format!(
        "Claim '{}' = '{}' is already assigned",
        claim.claim_type, claim.value
    ))
}

/// One insert attempt. A duplicate key is either the pair racing in or the
/// surrogate key being taken; only the latter is worth a retry.
async fn insert_claim_record(
    collection: &Collection<ClaimRecord>,
    record: ClaimRecord,
    pair_filter: Document,
) -> Result<KeyedInsert> {
    match collection.insert_one(&record).await {
        Ok(_) => Ok(KeyedInsert::Stored),
        Err(e) if is_duplicate_key_error(&e) => {
            if collection.count_documents(pair_filter).await? > 0 {
                return Err(already_assigned(&record.claim()));
            }
            Ok(KeyedInsert::KeyTaken)
        }
        Err(e) => Err(e.into()),
    }
}

pub struct MongoPrincipalStore {
    db: Database,
    users: Collection<User>,
    roles: Collection<Role>,
    user_claims: Collection<ClaimRecord>,
    role_claims: Collection<ClaimRecord>,
    passwords: PasswordService,
    allocator: Box<dyn SurrogateKeyAllocator>,
    max_key_attempts: u32,
}

impl MongoPrincipalStore {
    pub fn new(
        db: &Database,
        passwords: PasswordService,
        allocator: Box<dyn SurrogateKeyAllocator>,
        max_key_attempts: u32,
    ) -> Self {
        Self {
            db: db.clone(),
            users: db.collection("users"),
            roles: db.collection("roles"),
            user_claims: db.collection("user_claims"),
            role_claims: db.collection("role_claims"),
            passwords,
            allocator,
            max_key_attempts,
        }
    }

    /// Connect, create indexes and prime the key allocator from the
    /// highest claim key already persisted.
    pub async fn connect(config: &StoreConfig, passwords: PasswordService) -> Result<Self> {
        let client = Client::with_uri_str(&config.mongodb_uri).await?;
        let db = client.database(&config.mongodb_database);

        let highest = Self::highest_claim_key(&db).await?;
        let store = Self::new(
            &db,
            passwords,
            allocator_for(config.key_allocator, highest),
            config.max_key_attempts,
        );
        store.ensure_indexes().await?;

        info!(
            database = %config.mongodb_database,
            allocator = ?config.key_allocator,
            highest_claim_key = highest,
            "Connected principal store"
        );
        Ok(store)
    }

    async fn highest_claim_key(db: &Database) -> Result<i32> {
        let mut highest = 0;
        for name in ["user_claims", "role_claims"] {
            let collection: Collection<ClaimRecord> = db.collection(name);
            if let Some(record) = collection.find_one(doc! {}).sort(doc! { "_id": -1 }).await? {
                highest = highest.max(record.id);
            }
        }
        Ok(highest)
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "normalizedUserName": 1 })
                    .options(IndexOptions::builder().name("idx_user_name".to_string()).unique(true).build())
                    .build(),
            )
            .await?;

        self.roles
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "normalizedName": 1 })
                    .options(IndexOptions::builder().name("idx_role_name".to_string()).unique(true).build())
                    .build(),
            )
            .await?;

        for claims in [&self.user_claims, &self.role_claims] {
            claims
                .create_index(
                    IndexModel::builder()
                        .keys(doc! { "principalId": 1, "claimType": 1, "claimValue": 1 })
                        .options(IndexOptions::builder().name("idx_principal_claim".to_string()).unique(true).build())
                        .build(),
                )
                .await?;
        }

        info!("Created indexes on principal store collections");
        Ok(())
    }

    fn claims(&self, kind: PrincipalKind) -> &Collection<ClaimRecord> {
        match kind {
            PrincipalKind::User => &self.user_claims,
            PrincipalKind::Role => &self.role_claims,
        }
    }

    async fn principal_exists(&self, kind: PrincipalKind, id: &str) -> Result<bool> {
        let count = match kind {
            PrincipalKind::User => self.users.count_documents(doc! { "_id": id }).await?,
            PrincipalKind::Role => self.roles.count_documents(doc! { "_id": id }).await?,
        };
        Ok(count > 0)
    }

    async fn require_principal(&self, kind: PrincipalKind, id: &str) -> Result<()> {
        if self.principal_exists(kind, id).await? {
            Ok(())
        } else {
            Err(IdentityError::not_found(kind.as_str(), id))
        }
    }

    async fn require_role_by_name(&self, name: &str) -> Result<Role> {
        self.find_role_by_name(name)
            .await?
            .ok_or_else(|| IdentityError::validation(format!("Role '{}' does not exist", name)))
    }

    async fn require_user(&self, id: &str) -> Result<User> {
        self.find_user(id)
            .await?
            .ok_or_else(|| IdentityError::not_found("User", id))
    }

    async fn claims_by_principal(&self, kind: PrincipalKind) -> Result<HashMap<String, Vec<Claim>>> {
        let records: Vec<ClaimRecord> = self.claims(kind).find(doc! {}).await?.try_collect().await?;
        let mut grouped: HashMap<String, Vec<Claim>> = HashMap::new();
        for record in records {
            grouped.entry(record.principal_id.clone()).or_default().push(record.claim());
        }
        for claims in grouped.values_mut() {
            claims.sort();
        }
        Ok(grouped)
    }

    fn map_duplicate(error: mongodb::error::Error, message: String) -> IdentityError {
        if is_duplicate_key_error(&error) {
            IdentityError::validation(message)
        } else {
            IdentityError::Database(error)
        }
    }
}

#[async_trait]
impl PrincipalStore for MongoPrincipalStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.find_one(doc! { "_id": id }).await?)
    }

    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .find_one(doc! { "normalizedUserName": normalize(user_name) })
            .await?)
    }

    async fn create_user(&self, mut user: User, password: &str) -> Result<User> {
        validate_user_name(&user.user_name)?;
        validate_email(&user.email)?;
        user.normalized_user_name = normalize(&user.user_name);

        if self.find_user_by_name(&user.user_name).await?.is_some() {
            return Err(IdentityError::validation(format!(
                "User name '{}' is already taken",
                user.user_name
            )));
        }
        user.password_hash = Some(self.passwords.hash_password(password)?);

        self.users.insert_one(&user).await.map_err(|e| {
            Self::map_duplicate(e, format!("User name '{}' is already taken", user.user_name))
        })?;
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        validate_user_name(&user.user_name)?;
        validate_email(&user.email)?;

        let lockout_end = match user.lockout_end {
            Some(end) => Bson::DateTime(bson::DateTime::from_chrono(end)),
            None => Bson::Null,
        };
        let result = self
            .users
            .update_one(
                doc! { "_id": &user.id },
                doc! { "$set": {
                    "userName": &user.user_name,
                    "normalizedUserName": normalize(&user.user_name),
                    "email": &user.email,
                    "lockoutEnd": lockout_end,
                    "updatedAt": bson::DateTime::from_chrono(Utc::now()),
                }},
            )
            .await
            .map_err(|e| Self::map_duplicate(e, format!("User name '{}' is already taken", user.user_name)))?;

        if result.matched_count == 0 {
            return Err(IdentityError::not_found("User", &user.id));
        }
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<()> {
        let result = self.users.delete_one(doc! { "_id": id }).await?;
        if result.deleted_count == 0 {
            return Err(IdentityError::not_found("User", id));
        }
        let claims = self.user_claims.delete_many(doc! { "principalId": id }).await?;
        debug!(user_id = %id, claims = claims.deleted_count, "Deleted user claims");
        Ok(())
    }

    async fn set_password(&self, id: &str, password: &str) -> Result<()> {
        self.require_user(id).await?;
        let hash = self.passwords.hash_password(password)?;
        let result = self
            .users
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "passwordHash": hash,
                    "updatedAt": bson::DateTime::from_chrono(Utc::now()),
                }},
            )
            .await?;
        if result.matched_count == 0 {
            return Err(IdentityError::not_found("User", id));
        }
        Ok(())
    }

    async fn query_users(&self) -> Result<Vec<UserRecord>> {
        let users: Vec<User> = self.users.find(doc! {}).await?.try_collect().await?;
        let roles: Vec<Role> = self.roles.find(doc! {}).await?.try_collect().await?;
        let role_names: HashMap<String, String> = roles.into_iter().map(|r| (r.id, r.name)).collect();
        let mut claims = self.claims_by_principal(PrincipalKind::User).await?;

        Ok(users
            .into_iter()
            .map(|user| UserRecord {
                roles: user
                    .role_ids
                    .iter()
                    .filter_map(|id| role_names.get(id).cloned())
                    .collect(),
                claims: claims.remove(&user.id).unwrap_or_default(),
                user,
            })
            .collect())
    }

    async fn get_roles(&self, user_id: &str) -> Result<Vec<String>> {
        let user = self.require_user(user_id).await?;
        let roles: Vec<Role> = self
            .roles
            .find(doc! { "_id": { "$in": user.role_ids.clone() } })
            .await?
            .try_collect()
            .await?;
        Ok(roles.into_iter().map(|r| r.name).collect())
    }

    async fn add_to_role(&self, user_id: &str, role_name: &str) -> Result<()> {
        let role = self.require_role_by_name(role_name).await?;
        let user = self.require_user(user_id).await?;
        if user.has_role(&role.id) {
            return Err(IdentityError::validation(format!(
                "User is already in role '{}'",
                role.name
            )));
        }
        self.users
            .update_one(
                doc! { "_id": user_id },
                doc! {
                    "$addToSet": { "roleIds": &role.id },
                    "$set": { "updatedAt": bson::DateTime::from_chrono(Utc::now()) },
                },
            )
            .await?;
        Ok(())
    }

    async fn remove_from_role(&self, user_id: &str, role_name: &str) -> Result<()> {
        let role = self.require_role_by_name(role_name).await?;
        let user = self.require_user(user_id).await?;
        if !user.has_role(&role.id) {
            return Err(IdentityError::validation(format!(
                "User is not in role '{}'",
                role.name
            )));
        }
        self.users
            .update_one(
                doc! { "_id": user_id },
                doc! {
                    "$pull": { "roleIds": &role.id },
                    "$set": { "updatedAt": bson::DateTime::from_chrono(Utc::now()) },
                },
            )
            .await?;
        Ok(())
    }

    async fn find_role(&self, id: &str) -> Result<Option<Role>> {
        Ok(self.roles.find_one(doc! { "_id": id }).await?)
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        Ok(self.roles.find_one(doc! { "normalizedName": normalize(name) }).await?)
    }

    async fn create_role(&self, mut role: Role) -> Result<Role> {
        validate_role_name(&role.name)?;
        role.normalized_name = normalize(&role.name);

        self.roles.insert_one(&role).await.map_err(|e| {
            Self::map_duplicate(e, format!("Role name '{}' is already taken", role.name))
        })?;
        Ok(role)
    }

    async fn update_role(&self, role: &Role) -> Result<()> {
        validate_role_name(&role.name)?;
        let result = self
            .roles
            .update_one(
                doc! { "_id": &role.id },
                doc! { "$set": {
                    "name": &role.name,
                    "normalizedName": normalize(&role.name),
                    "updatedAt": bson::DateTime::from_chrono(Utc::now()),
                }},
            )
            .await
            .map_err(|e| Self::map_duplicate(e, format!("Role name '{}' is already taken", role.name)))?;

        if result.matched_count == 0 {
            return Err(IdentityError::not_found("Role", &role.id));
        }
        Ok(())
    }

    async fn delete_role(&self, id: &str) -> Result<()> {
        let result = self.roles.delete_one(doc! { "_id": id }).await?;
        if result.deleted_count == 0 {
            return Err(IdentityError::not_found("Role", id));
        }
        self.role_claims.delete_many(doc! { "principalId": id }).await?;
        let members = self
            .users
            .update_many(doc! { "roleIds": id }, doc! { "$pull": { "roleIds": id } })
            .await?;
        debug!(role_id = %id, members = members.modified_count, "Removed role memberships");
        Ok(())
    }

    async fn query_roles(&self) -> Result<Vec<RoleRecord>> {
        let roles: Vec<Role> = self.roles.find(doc! {}).await?.try_collect().await?;
        let mut claims = self.claims_by_principal(PrincipalKind::Role).await?;
        Ok(roles
            .into_iter()
            .map(|role| RoleRecord {
                claims: claims.remove(&role.id).unwrap_or_default(),
                role,
            })
            .collect())
    }

    async fn get_claims(&self, kind: PrincipalKind, principal_id: &str) -> Result<Vec<Claim>> {
        self.require_principal(kind, principal_id).await?;
        let records: Vec<ClaimRecord> = self
            .claims(kind)
            .find(doc! { "principalId": principal_id })
            .await?
            .try_collect()
            .await?;
        let mut claims: Vec<Claim> = records.iter().map(ClaimRecord::claim).collect();
        claims.sort();
        Ok(claims)
    }

    async fn add_claim(&self, kind: PrincipalKind, principal_id: &str, claim: &Claim) -> Result<()> {
        if claim.claim_type.trim().is_empty() {
            return Err(IdentityError::validation("Claim type is required"));
        }
        self.require_principal(kind, principal_id).await?;

        let collection = self.claims(kind);
        let pair_filter = doc! {
            "principalId": principal_id,
            "claimType": &claim.claim_type,
            "claimValue": &claim.value,
        };

        if collection.count_documents(pair_filter.clone()).await? > 0 {
            return Err(already_assigned(claim));
        }

        let key = insert_with_fresh_key(self.allocator.as_ref(), self.max_key_attempts, |key| {
            insert_claim_record(collection, ClaimRecord::new(key, principal_id, claim), pair_filter.clone())
        })
        .await?;

        debug!(kind = %kind, principal_id, key, "Claim record stored");
        Ok(())
    }

    async fn remove_claim(&self, kind: PrincipalKind, principal_id: &str, claim: &Claim) -> Result<()> {
        self.require_principal(kind, principal_id).await?;
        let result = self
            .claims(kind)
            .delete_one(doc! {
                "principalId": principal_id,
                "claimType": &claim.claim_type,
                "claimValue": &claim.value,
            })
            .await?;
        if result.deleted_count == 0 {
            return Err(IdentityError::validation(format!(
                "Claim '{}' = '{}' is not assigned",
                claim.claim_type, claim.value
            )));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

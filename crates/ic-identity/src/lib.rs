//! Identity Console
//!
//! Administration of security principals (users and roles):
//! - Listing with search, enumerated sort columns and stable pagination
//! - Claim and role-membership reconciliation against a desired state
//! - Surrogate keys for claim records in stores without atomic counters
//! - REST endpoints for the admin console
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `operations` - Use cases
//! - `api` - REST endpoints

// Aggregates
pub mod claim;
pub mod role;
pub mod user;

// Core engines
pub mod listing;
pub mod reconcile;

// Persistence
pub mod store;

// Shared infrastructure
pub mod shared;
pub mod seed;

use utoipa_axum::router::OpenApiRouter;

pub use shared::error::{ErrorResponse, IdentityError, Result};
pub use shared::context::IdentityContext;

pub use claim::{Claim, ClaimPair, ClaimRecord, ClaimTypeCatalog};
pub use role::entity::{Role, RoleRecord, RoleSummary};
pub use user::entity::{User, UserRecord, UserSummary};

pub use listing::{ListQuery, Page, SortDirection};
pub use reconcile::{ApplyPolicy, ApplyReport, Delta, Mutation, Reconciler};
pub use store::{InMemoryPrincipalStore, MongoPrincipalStore, PasswordService, PrincipalKind, PrincipalStore};
pub use shared::surrogate_key::{RandomKeyAllocator, SequentialKeyAllocator, SurrogateKeyAllocator};

pub use seed::DevDataSeeder;

/// All identity routes, unnested. Mount under `/api/identity`.
pub fn identity_router(ctx: &IdentityContext) -> OpenApiRouter {
    use claim::api::{claim_types_router, ClaimTypesState};
    use role::api::{roles_router, RolesState};
    use shared::health_api::{health_router, HealthState};
    use user::api::{users_router, UsersState};

    OpenApiRouter::new()
        .nest("/users", users_router(UsersState::new(ctx)))
        .nest("/roles", roles_router(RolesState::new(ctx)))
        .nest(
            "/claim-types",
            claim_types_router(ClaimTypesState { catalog: ctx.catalog.clone() }),
        )
        .merge(health_router(HealthState { store: ctx.store.clone() }))
}

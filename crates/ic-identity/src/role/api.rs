//! Roles Admin API

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};

use ic_config::ListingConfig;

use crate::listing::{ListQuery, Page};
use crate::role::entity::{RoleLookupEntry, RoleSortField, RoleSummary};
use crate::role::operations::{
    CreateRoleCommand, CreateRoleUseCase, DeleteRoleCommand, DeleteRoleUseCase, ListRolesUseCase,
    RoleLookupUseCase, RoleUpdated, UpdateRoleCommand, UpdateRoleUseCase,
};
use crate::shared::api_common::{CreatedResponse, ListParams, SuccessResponse};
use crate::shared::context::IdentityContext;
use crate::shared::error::{ErrorResponse, IdentityError};

/// Roles service state
#[derive(Clone)]
pub struct RolesState {
    pub listing: ListingConfig,
    pub list: Arc<ListRolesUseCase>,
    pub lookup: Arc<RoleLookupUseCase>,
    pub create: Arc<CreateRoleUseCase>,
    pub update: Arc<UpdateRoleUseCase>,
    pub delete: Arc<DeleteRoleUseCase>,
}

impl RolesState {
    pub fn new(ctx: &IdentityContext) -> Self {
        Self {
            listing: ctx.listing.clone(),
            list: Arc::new(ListRolesUseCase::new(ctx)),
            lookup: Arc::new(RoleLookupUseCase::new(ctx)),
            create: Arc::new(CreateRoleUseCase::new(ctx)),
            update: Arc::new(UpdateRoleUseCase::new(ctx)),
            delete: Arc::new(DeleteRoleUseCase::new(ctx)),
        }
    }
}

/// List roles
///
/// Search matches the role name. Sortable columns: id, name.
#[utoipa::path(
    get,
    path = "",
    tag = "roles",
    operation_id = "getApiIdentityRoles",
    params(ListParams),
    responses(
        (status = 200, description = "One page of roles", body = Page<RoleSummary>),
        (status = 400, description = "Unknown sort column or bad limit", body = ErrorResponse)
    )
)]
pub async fn list_roles(
    State(state): State<RolesState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<RoleSummary>>, IdentityError> {
    let query = ListQuery::<RoleSortField>::from_request(
        params.search,
        params.sort.as_deref(),
        params.skip,
        params.limit,
        &state.listing,
    )?;
    Ok(Json(state.list.execute(&query).await?))
}

/// Role id/name pairs ordered by name
#[utoipa::path(
    get,
    path = "/lookup",
    tag = "roles",
    operation_id = "getApiIdentityRolesLookup",
    responses(
        (status = 200, description = "All roles", body = Vec<RoleLookupEntry>)
    )
)]
pub async fn role_lookup(
    State(state): State<RolesState>,
) -> Result<Json<Vec<RoleLookupEntry>>, IdentityError> {
    Ok(Json(state.lookup.execute().await?))
}

/// Create a role
#[utoipa::path(
    post,
    path = "",
    tag = "roles",
    operation_id = "postApiIdentityRoles",
    request_body = CreateRoleCommand,
    responses(
        (status = 201, description = "Role created", body = CreatedResponse),
        (status = 400, description = "Missing or duplicate name", body = ErrorResponse)
    )
)]
pub async fn create_role(
    State(state): State<RolesState>,
    Json(command): Json<CreateRoleCommand>,
) -> Result<(StatusCode, Json<CreatedResponse>), IdentityError> {
    let role = state.create.execute(command).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(role.id))))
}

/// Update a role
///
/// Claims in the body are the desired final set.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "roles",
    operation_id = "putApiIdentityRolesById",
    params(("id" = String, Path, description = "Role ID")),
    request_body = UpdateRoleCommand,
    responses(
        (status = 200, description = "Role updated", body = RoleUpdated),
        (status = 400, description = "Unknown claim key or rejected change", body = ErrorResponse),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 409, description = "Some changes applied, some rejected", body = ErrorResponse)
    )
)]
pub async fn update_role(
    State(state): State<RolesState>,
    Path(id): Path<String>,
    Json(mut command): Json<UpdateRoleCommand>,
) -> Result<Json<RoleUpdated>, IdentityError> {
    command.id = id;
    Ok(Json(state.update.execute(command).await?))
}

/// Delete a role
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "roles",
    operation_id = "deleteApiIdentityRolesById",
    params(("id" = String, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role deleted", body = SuccessResponse),
        (status = 404, description = "Role not found", body = ErrorResponse)
    )
)]
pub async fn delete_role(
    State(state): State<RolesState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, IdentityError> {
    state.delete.execute(DeleteRoleCommand { id }).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub fn roles_router(state: RolesState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_roles, create_role))
        .routes(routes!(role_lookup))
        .routes(routes!(update_role, delete_role))
        .with_state(state)
}

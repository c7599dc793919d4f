//! Users Admin API
//!
//! REST endpoints for user management. Callers are assumed to be
//! authorized by the host.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};

use ic_config::ListingConfig;

use crate::listing::{ListQuery, Page};
use crate::shared::api_common::{ListParams, SuccessResponse};
use crate::shared::context::IdentityContext;
use crate::shared::error::{ErrorResponse, IdentityError};
use crate::user::entity::{UserSortField, UserSummary};
use crate::user::operations::{
    CreateUserCommand, CreateUserUseCase, DeleteUserCommand, DeleteUserUseCase, ListUsersUseCase,
    ResetPasswordCommand, ResetPasswordUseCase, UpdateUserCommand, UpdateUserUseCase, UserCreated,
    UserUpdated,
};

/// Users service state
#[derive(Clone)]
pub struct UsersState {
    pub listing: ListingConfig,
    pub list: Arc<ListUsersUseCase>,
    pub create: Arc<CreateUserUseCase>,
    pub update: Arc<UpdateUserUseCase>,
    pub delete: Arc<DeleteUserUseCase>,
    pub reset_password: Arc<ResetPasswordUseCase>,
}

impl UsersState {
    pub fn new(ctx: &IdentityContext) -> Self {
        Self {
            listing: ctx.listing.clone(),
            list: Arc::new(ListUsersUseCase::new(ctx)),
            create: Arc::new(CreateUserUseCase::new(ctx)),
            update: Arc::new(UpdateUserUseCase::new(ctx)),
            delete: Arc::new(DeleteUserUseCase::new(ctx)),
            reset_password: Arc::new(ResetPasswordUseCase::new(ctx)),
        }
    }
}

/// List users
///
/// Search matches email. Sortable columns: id, userName, email, displayName, locked.
#[utoipa::path(
    get,
    path = "",
    tag = "users",
    operation_id = "getApiIdentityUsers",
    params(ListParams),
    responses(
        (status = 200, description = "One page of users", body = Page<UserSummary>),
        (status = 400, description = "Unknown sort column or bad limit", body = ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<UsersState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<UserSummary>>, IdentityError> {
    let query = ListQuery::<UserSortField>::from_request(
        params.search,
        params.sort.as_deref(),
        params.skip,
        params.limit,
        &state.listing,
    )?;
    Ok(Json(state.list.execute(&query).await?))
}

/// Create a user
#[utoipa::path(
    post,
    path = "",
    tag = "users",
    operation_id = "postApiIdentityUsers",
    request_body = CreateUserCommand,
    responses(
        (status = 201, description = "User created", body = UserCreated),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "User created but display name failed", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<UsersState>,
    Json(command): Json<CreateUserCommand>,
) -> Result<(StatusCode, Json<UserCreated>), IdentityError> {
    let created = state.create.execute(command).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a user
///
/// Roles and claims in the body are the desired final sets.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "users",
    operation_id = "putApiIdentityUsersById",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserCommand,
    responses(
        (status = 200, description = "User updated", body = UserUpdated),
        (status = 400, description = "Unknown claim key or rejected change", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Some changes applied, some rejected", body = ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<UsersState>,
    Path(id): Path<String>,
    Json(mut command): Json<UpdateUserCommand>,
) -> Result<Json<UserUpdated>, IdentityError> {
    command.id = id;
    Ok(Json(state.update.execute(command).await?))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "users",
    operation_id = "deleteApiIdentityUsersById",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = SuccessResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<UsersState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, IdentityError> {
    state.delete.execute(DeleteUserCommand { id }).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Reset a user's password
#[utoipa::path(
    post,
    path = "/{id}/password",
    tag = "users",
    operation_id = "postApiIdentityUsersByIdPassword",
    params(("id" = String, Path, description = "User ID")),
    request_body = ResetPasswordCommand,
    responses(
        (status = 200, description = "Password reset", body = SuccessResponse),
        (status = 400, description = "Mismatch or policy violation", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn reset_password(
    State(state): State<UsersState>,
    Path(id): Path<String>,
    Json(mut command): Json<ResetPasswordCommand>,
) -> Result<Json<SuccessResponse>, IdentityError> {
    command.id = id;
    state.reset_password.execute(command).await?;
    Ok(Json(SuccessResponse::with_message("Password reset")))
}

pub fn users_router(state: UsersState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_users, create_user))
        .routes(routes!(update_user, delete_user))
        .routes(routes!(reset_password))
        .with_state(state)
}

//! Claim Types API

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use super::ClaimTypeCatalog;

/// Catalog entry: short key and the claim type it stands for
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimTypeEntry {
    pub key: String,
    pub claim_type: String,
}

#[derive(Clone)]
pub struct ClaimTypesState {
    pub catalog: Arc<ClaimTypeCatalog>,
}

/// Supported claim types, sorted by key
#[utoipa::path(
    get,
    path = "",
    tag = "claim-types",
    operation_id = "getApiIdentityClaimTypes",
    responses(
        (status = 200, description = "Claim type catalog", body = Vec<ClaimTypeEntry>)
    )
)]
pub async fn list_claim_types(State(state): State<ClaimTypesState>) -> Json<Vec<ClaimTypeEntry>> {
    Json(
        state
            .catalog
            .entries()
            .map(|(key, claim_type)| ClaimTypeEntry {
                key: key.to_string(),
                claim_type: claim_type.to_string(),
            })
            .collect(),
    )
}

pub fn claim_types_router(state: ClaimTypesState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_claim_types))
        .with_state(state)
}

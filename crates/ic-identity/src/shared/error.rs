//! Identity Error Types

use thiserror::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response, Json},
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Unknown {what}: {key}")]
    InvalidKey { what: String, key: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Partially applied: {applied} change(s) succeeded, {} failed: {}", .failed.len(), .failed.join("; "))]
    PartialApply { applied: usize, failed: Vec<String> },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl IdentityError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn invalid_key(what: impl Into<String>, key: impl Into<String>) -> Self {
        Self::InvalidKey {
            what: what.into(),
            key: key.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed { message: message.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Stable machine-readable kind, used as the `error` field of responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidKey { .. } => "INVALID_KEY",
            Self::ValidationFailed { .. } => "VALIDATION_FAILED",
            Self::PartialApply { .. } => "PARTIAL_APPLY",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidKey { .. } | Self::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            Self::PartialApply { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, IdentityError>;

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<Vec<String>>,
}

impl From<&IdentityError> for ErrorResponse {
    fn from(err: &IdentityError) -> Self {
        let failed = match err {
            IdentityError::PartialApply { failed, .. } => Some(failed.clone()),
            _ => None,
        };
        Self {
            error: err.kind().to_string(),
            message: err.to_string(),
            failed,
        }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

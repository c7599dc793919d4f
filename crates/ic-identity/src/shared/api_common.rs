//! Common API types and utilities

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

mod string_or_number {
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize_usize_opt<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrNum {
            Num(usize),
            Str(String),
        }

        match Option::<StringOrNum>::deserialize(deserializer)? {
            Some(StringOrNum::Num(n)) => Ok(Some(n)),
            Some(StringOrNum::Str(s)) if s.trim().is_empty() => Ok(None),
            Some(StringOrNum::Str(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Listing parameters shared by the user and role lists
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Items to skip
    #[serde(default, deserialize_with = "string_or_number::deserialize_usize_opt")]
    pub skip: Option<usize>,

    /// Page size; defaults to `listing.default_limit`
    #[serde(default, deserialize_with = "string_or_number::deserialize_usize_opt")]
    pub limit: Option<usize>,

    /// Substring matched against email (users) or name (roles)
    pub search: Option<String>,

    /// `"<column> <ASC|DESC>"`
    pub sort: Option<String>,
}

/// Created response with ID
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    pub id: String,
}

impl CreatedResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Success response with optional message
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

//! Shared infrastructure: errors, surrogate keys, locks and API helpers.

pub mod api_common;
pub mod context;
pub mod error;
pub mod health_api;
pub mod principal_lock;
pub mod surrogate_key;

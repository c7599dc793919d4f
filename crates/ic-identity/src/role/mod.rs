//! Role aggregate: entity, use cases and admin API.

pub mod api;
pub mod entity;
pub mod operations;

pub use entity::{Role, RoleLookupEntry, RoleRecord, RoleSortField, RoleSummary};

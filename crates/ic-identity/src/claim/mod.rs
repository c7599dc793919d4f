//! Claim Aggregate
//!
//! Claims are immutable (type, value) pairs attached to users and roles.
//! The catalog maps short display keys to fully-qualified claim types.

pub mod api;
pub mod entity;
pub mod catalog;

pub use entity::{Claim, ClaimPair, ClaimRecord};
pub use catalog::ClaimTypeCatalog;

//! Role use cases

pub mod create;
pub mod delete;
pub mod list;
pub mod update;

pub use create::{CreateRoleCommand, CreateRoleUseCase};
pub use delete::{DeleteRoleCommand, DeleteRoleUseCase};
pub use list::{ListRolesUseCase, RoleLookupUseCase};
pub use update::{RoleUpdated, UpdateRoleCommand, UpdateRoleUseCase};

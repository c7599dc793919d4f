//! User use cases

pub mod create;
pub mod delete;
pub mod list;
pub mod reset_password;
pub mod update;

pub use create::{CreateUserCommand, CreateUserUseCase, UserCreated};
pub use delete::{DeleteUserCommand, DeleteUserUseCase};
pub use list::ListUsersUseCase;
pub use reset_password::{ResetPasswordCommand, ResetPasswordUseCase};
pub use update::{UpdateUserCommand, UpdateUserUseCase, UserUpdated};

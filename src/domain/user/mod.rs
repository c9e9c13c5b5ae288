//! User domain
//!
//! Domain types and traits for user accounts: the stored entity and its
//! client-facing profile, create/update payloads, the query allow-list and
//! the repository trait.

mod entity;
mod query;
mod repository;
mod request;
mod validation;

pub use entity::{AuditActor, NewUser, User, UserChanges, UserId, UserProfile};
pub use query::{USER_QUERY_SCHEMA, USER_QUERY_TRANSLATOR};
pub use repository::UserRepository;
pub use request::{CreateUserRequest, UpdateUserRequest};
pub use validation::{validate_user_id, validation_message, UserValidationError, PHONE_PATTERN};

#[cfg(test)]
pub use repository::MockUserRepository;

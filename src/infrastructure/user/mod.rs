//! User infrastructure module
//!
//! Argon2 password hashing, the storage-backed user repository and the
//! user service.

mod password;
mod repository;
mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use repository::StorageUserRepository;
pub use service::{DeleteOutcome, UserService, UserServiceTrait};

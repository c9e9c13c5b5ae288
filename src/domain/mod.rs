//! Domain layer - Core business logic and entities

pub mod error;
pub mod pagination;
pub mod query;
pub mod storage;
pub mod user;

pub use error::DomainError;
pub use pagination::{PageMeta, PageRequest, Paginated, DEFAULT_PAGE_SIZE};
pub use query::{FieldKind, ParsedQuery, QuerySchema, QueryTranslator};
pub use storage::{Storage, StorageEntity, StorageKey};
pub use user::{
    AuditActor, CreateUserRequest, UpdateUserRequest, User, UserChanges, UserId, UserProfile,
    UserRepository,
};

//! User repository trait

use async_trait::async_trait;

use super::entity::{AuditActor, User, UserChanges, UserId};
use crate::domain::storage::{Filter, FindOptions, UpdateOutcome};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Repository trait for user storage
///
/// Every read and write only sees live users; soft-deleted users are
/// invisible through this interface.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get a user by their ID
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Get a user by their email (for login)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Check if an email is taken
    async fn email_exists(&self, email: &str) -> Result<bool, DomainError>;

    /// Find users matching the options
    async fn find(&self, options: FindOptions) -> Result<Vec<User>, DomainError>;

    /// Count users matching the filter
    async fn count(&self, filter: Filter) -> Result<u64, DomainError>;

    /// Create a new user
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Apply a partial update to a user
    async fn update(&self, id: &UserId, changes: UserChanges)
        -> Result<UpdateOutcome, DomainError>;

    /// Soft-delete a user, returning how many users were deleted
    async fn soft_delete(
        &self,
        id: &UserId,
        actor: Option<AuditActor>,
    ) -> Result<u64, DomainError>;
}

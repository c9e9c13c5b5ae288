//! User service: account records and credential checks

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::pagination::{PageRequest, Paginated};
use crate::domain::storage::{Filter, FindOptions, UpdateOutcome};
use crate::domain::user::{
    AuditActor, CreateUserRequest, UpdateUserRequest, User, UserId, UserProfile, UserRepository,
    USER_QUERY_TRANSLATOR,
};
use crate::domain::DomainError;

use super::password::PasswordHasher;

/// Result of a soft delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub deleted: u64,
}

/// Trait for user service operations
#[async_trait::async_trait]
pub trait UserServiceTrait: Send + Sync {
    /// Create a user; the returned record still carries the password hash
    async fn create(
        &self,
        request: CreateUserRequest,
        actor: Option<AuditActor>,
    ) -> Result<User, DomainError>;

    /// One page of live users matching the query-string pairs
    async fn find_all(
        &self,
        page: PageRequest,
        query: &[(String, String)],
    ) -> Result<Paginated<UserProfile>, DomainError>;

    async fn find_one(&self, id: &str) -> Result<UserProfile, DomainError>;

    async fn update(
        &self,
        id: &str,
        request: UpdateUserRequest,
        actor: Option<AuditActor>,
    ) -> Result<UpdateOutcome, DomainError>;

    async fn remove(&self, id: &str, actor: Option<AuditActor>)
        -> Result<DeleteOutcome, DomainError>;

    /// Live user by login name (email), hash included
    async fn find_by_credential_name(&self, username: &str) -> Result<Option<User>, DomainError>;

    fn verify_credential(&self, password: &str, hash: &str) -> bool;

    /// User whose email and password both match, if any
    async fn authenticate(&self, email: &str, password: &str)
        -> Result<Option<User>, DomainError>;

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Number of live users
    async fn count(&self) -> Result<u64, DomainError>;
}

/// User service backed by a repository and a password hasher
#[derive(Debug)]
pub struct UserService<R: UserRepository, H: PasswordHasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
}

impl<R: UserRepository, H: PasswordHasher> UserService<R, H> {
    /// Create a new user service
    pub fn new(repository: Arc<R>, hasher: Arc<H>) -> Self {
        Self { repository, hasher }
    }
}

fn duplicate_email(email: &str) -> DomainError {
    DomainError::conflict(format!("Email {} is already exist", email))
}

#[async_trait::async_trait]
impl<R, H> UserServiceTrait for UserService<R, H>
where
    R: UserRepository + 'static,
    H: PasswordHasher + 'static,
{
    async fn create(
        &self,
        request: CreateUserRequest,
        actor: Option<AuditActor>,
    ) -> Result<User, DomainError> {
        let (fields, password) = request.into_new_user()?;

        if self.repository.email_exists(&fields.email).await? {
            return Err(duplicate_email(&fields.email));
        }

        let password_hash = self.hasher.hash(&password)?;
        let email = fields.email.clone();
        let user = User::new(fields, password_hash, actor);

        // a concurrent create can still win the race; the unique index reports it
        let user = self.repository.create(user).await.map_err(|e| match e {
            DomainError::Conflict { .. } => duplicate_email(&email),
            other => other,
        })?;

        info!(user_id = %user.id(), "User created");
        Ok(user)
    }

    async fn find_all(
        &self,
        page: PageRequest,
        query: &[(String, String)],
    ) -> Result<Paginated<UserProfile>, DomainError> {
        let parsed = USER_QUERY_TRANSLATOR.translate(query)?;

        if !parsed.population.is_empty() {
            debug!(population = ?parsed.population, "Population requested on inline fields");
        }

        let total = self.repository.count(parsed.filter.clone()).await?;

        let options = FindOptions::new(parsed.filter)
            .with_sort(parsed.sort)
            .with_skip(page.offset())
            .with_limit(page.effective_page_size());

        let users = self.repository.find(options).await?;

        Ok(Paginated {
            meta: page.meta(total),
            result: users,
        }
        .map(UserProfile::from))
    }

    async fn find_one(&self, id: &str) -> Result<UserProfile, DomainError> {
        let user_id = UserId::parse(id)?;

        self.repository
            .get(&user_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| DomainError::not_found("User not found"))
    }

    async fn update(
        &self,
        id: &str,
        request: UpdateUserRequest,
        actor: Option<AuditActor>,
    ) -> Result<UpdateOutcome, DomainError> {
        let user_id = UserId::parse(id)?;
        let changes = request.into_changes()?.touched_by(actor);

        self.repository.update(&user_id, changes).await
    }

    async fn remove(
        &self,
        id: &str,
        actor: Option<AuditActor>,
    ) -> Result<DeleteOutcome, DomainError> {
        let Ok(user_id) = UserId::parse(id) else {
            return Ok(DeleteOutcome { deleted: 0 });
        };

        let deleted = self.repository.soft_delete(&user_id, actor).await?;
        Ok(DeleteOutcome { deleted })
    }

    async fn find_by_credential_name(&self, username: &str) -> Result<Option<User>, DomainError> {
        self.repository.find_by_email(username).await
    }

    fn verify_credential(&self, password: &str, hash: &str) -> bool {
        self.hasher.verify(password, hash)
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        let Some(user) = self.find_by_credential_name(email).await? else {
            return Ok(None);
        };

        if !self.verify_credential(password, user.password_hash()) {
            return Ok(None);
        }

        Ok(Some(user))
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        self.repository.get(id).await
    }

    async fn count(&self) -> Result<u64, DomainError> {
        self.repository.count(Filter::new()).await
    }
}

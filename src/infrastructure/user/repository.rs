//! Storage-backed user repository implementation

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::storage::{Filter, FindOptions, Storage, UpdateOutcome};
use crate::domain::user::{AuditActor, User, UserChanges, UserId, UserRepository};
use crate::domain::DomainError;

const ID_FIELD: &str = "_id";
const EMAIL_FIELD: &str = "email";
const DELETED_FIELD: &str = "isDeleted";

/// Storage-backed implementation of UserRepository
///
/// Applies the soft-delete rule: every query is narrowed to documents whose
/// `isDeleted` flag is not `true`.
#[derive(Debug, Clone)]
pub struct StorageUserRepository {
    storage: Arc<dyn Storage<User>>,
}

impl StorageUserRepository {
    /// Create a new storage-backed repository
    pub fn new(storage: Arc<dyn Storage<User>>) -> Self {
        Self { storage }
    }

    fn live() -> Filter {
        Filter::new().ne(DELETED_FIELD, true)
    }

    fn live_by_id(id: &UserId) -> Filter {
        Filter::new().eq(ID_FIELD, id.as_str()).and(Self::live())
    }
}

#[async_trait]
impl UserRepository for StorageUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        self.storage.find_one(&Self::live_by_id(id)).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let filter = Filter::new().eq(EMAIL_FIELD, email).and(Self::live());
        self.storage.find_one(&filter).await
    }

    async fn email_exists(&self, email: &str) -> Result<bool, DomainError> {
        let filter = Filter::new().eq(EMAIL_FIELD, email).and(Self::live());
        self.storage.exists(&filter).await
    }

    async fn find(&self, options: FindOptions) -> Result<Vec<User>, DomainError> {
        let options = FindOptions {
            filter: options.filter.and(Self::live()),
            ..options
        };
        self.storage.find(&options).await
    }

    async fn count(&self, filter: Filter) -> Result<u64, DomainError> {
        self.storage.count(&filter.and(Self::live())).await
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        self.storage.insert(user).await
    }

    async fn update(
        &self,
        id: &UserId,
        changes: UserChanges,
    ) -> Result<UpdateOutcome, DomainError> {
        self.storage
            .update_one(&Self::live_by_id(id), &changes.to_patch())
            .await
    }

    async fn soft_delete(
        &self,
        id: &UserId,
        actor: Option<AuditActor>,
    ) -> Result<u64, DomainError> {
        let outcome = self
            .storage
            .update_one(&Self::live_by_id(id), &UserChanges::soft_delete(actor).to_patch())
            .await?;

        Ok(outcome.modified_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::SortField;
    use crate::domain::user::NewUser;
    use crate::infrastructure::storage::InMemoryStorage;

    fn user(email: &str, age: u32) -> User {
        User::new(
            NewUser {
                name: format!("User {}", age),
                email: email.to_string(),
                phone: "0912345678".to_string(),
                age,
                gender: "female".to_string(),
                address: "1 Street".to_string(),
                role: "USER".to_string(),
            },
            "hash",
            None,
        )
    }

    fn repository() -> StorageUserRepository {
        StorageUserRepository::new(Arc::new(InMemoryStorage::<User>::new()))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = repository();
        let created = repo.create(user("a@example.com", 20)).await.unwrap();

        let found = repo.get(created.id()).await.unwrap().unwrap();
        assert_eq!(found.email(), "a@example.com");

        let by_email = repo.find_by_email("a@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id().clone()), Some(created.id().clone()));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = repository();
        repo.create(user("a@example.com", 20)).await.unwrap();

        let err = repo.create(user("a@example.com", 30)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_soft_deleted_users_are_hidden() {
        let repo = repository();
        let created = repo.create(user("a@example.com", 20)).await.unwrap();
        repo.create(user("b@example.com", 30)).await.unwrap();

        let actor = AuditActor::new(UserId::generate(), "admin@example.com");
        assert_eq!(repo.soft_delete(created.id(), Some(actor)).await.unwrap(), 1);

        assert!(repo.get(created.id()).await.unwrap().is_none());
        assert!(!repo.email_exists("a@example.com").await.unwrap());
        assert_eq!(repo.count(Filter::new()).await.unwrap(), 1);
        assert_eq!(repo.find(FindOptions::default()).await.unwrap().len(), 1);

        // second delete is a no-op
        assert_eq!(repo.soft_delete(created.id(), None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleted_email_can_be_reused() {
        let repo = repository();
        let created = repo.create(user("a@example.com", 20)).await.unwrap();
        repo.soft_delete(created.id(), None).await.unwrap();

        assert!(repo.create(user("a@example.com", 21)).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_applies_changes() {
        let repo = repository();
        let created = repo.create(user("a@example.com", 20)).await.unwrap();

        let changes = UserChanges {
            age: Some(21),
            ..Default::default()
        }
        .touched_by(None);

        let outcome = repo.update(created.id(), changes).await.unwrap();
        assert_eq!(outcome.matched_count, 1);
        assert_eq!(outcome.modified_count, 1);

        let updated = repo.get(created.id()).await.unwrap().unwrap();
        assert_eq!(updated.age(), 21);
        assert_eq!(updated.email(), "a@example.com");
    }

    #[tokio::test]
    async fn test_find_with_sort_and_filter() {
        let repo = repository();
        for (i, age) in [30, 10, 20].iter().enumerate() {
            repo.create(user(&format!("u{}@example.com", i), *age))
                .await
                .unwrap();
        }

        let options = FindOptions::new(Filter::new().gte("age", 15i64))
            .with_sort(vec![SortField::ascending("age")]);

        let ages: Vec<u32> = repo
            .find(options)
            .await
            .unwrap()
            .iter()
            .map(User::age)
            .collect();

        assert_eq!(ages, vec![20, 30]);
    }
}

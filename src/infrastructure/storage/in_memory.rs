//! In-memory storage implementation

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::storage::{
    Filter, FindOptions, Patch, Storage, StorageEntity, StorageKey, UniqueIndex, UpdateOutcome,
};
use crate::domain::DomainError;

use super::document::{compare_documents, to_document, CompiledFilter, Document};

/// Thread-safe in-memory storage implementation
///
/// Useful for testing and development. Data is lost when the process terminates.
#[derive(Debug)]
pub struct InMemoryStorage<E>
where
    E: StorageEntity,
{
    inner: RwLock<Inner<E>>,
    unique_indexes: Vec<UniqueIndex>,
}

#[derive(Debug)]
struct Inner<E> {
    entries: HashMap<String, Entry<E>>,
    next_seq: u64,
}

#[derive(Debug, Clone)]
struct Entry<E> {
    seq: u64,
    entity: E,
    document: Document,
}

impl<E> Default for InMemoryStorage<E>
where
    E: StorageEntity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryStorage<E>
where
    E: StorageEntity,
{
    /// Creates a new empty in-memory storage
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                next_seq: 0,
            }),
            unique_indexes: E::unique_indexes(),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner<E>>, DomainError> {
        self.inner
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner<E>>, DomainError> {
        self.inner
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }

    fn insert_locked(&self, inner: &mut Inner<E>, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();

        if inner.entries.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "Entity with key '{}' already exists",
                key
            )));
        }

        let document = to_document(&entity)?;
        self.check_unique(inner, &key, &document)?;

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key,
            Entry {
                seq,
                entity: entity.clone(),
                document,
            },
        );

        Ok(entity)
    }

    /// Rejects a document whose indexed value is already taken by another live document
    fn check_unique(
        &self,
        inner: &Inner<E>,
        key: &str,
        document: &Document,
    ) -> Result<(), DomainError> {
        for index in &self.unique_indexes {
            if !is_indexed(index, document) {
                continue;
            }

            let Some(value) = document.get(&index.field) else {
                continue;
            };

            let taken = inner.entries.iter().any(|(other_key, other)| {
                other_key != key
                    && is_indexed(index, &other.document)
                    && other.document.get(&index.field) == Some(value)
            });

            if taken {
                return Err(DomainError::conflict(format!(
                    "Duplicate value for unique field '{}'",
                    index.field
                )));
            }
        }

        Ok(())
    }

    /// Matching entries in natural order
    fn matching<'a>(
        inner: &'a Inner<E>,
        filter: &Filter,
    ) -> Result<Vec<&'a Entry<E>>, DomainError> {
        let compiled = CompiledFilter::compile(filter)?;

        let mut entries: Vec<&Entry<E>> = inner
            .entries
            .values()
            .filter(|entry| compiled.matches(&entry.document))
            .collect();
        entries.sort_by_key(|entry| entry.seq);

        Ok(entries)
    }
}

fn is_indexed(index: &UniqueIndex, document: &Document) -> bool {
    let Some(flag) = &index.unless_true else {
        return !matches!(document.get(&index.field), None | Some(Value::Null));
    };

    document.get(flag) != Some(&Value::Bool(true))
        && !matches!(document.get(&index.field), None | Some(Value::Null))
}

#[async_trait]
impl<E> Storage<E> for InMemoryStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn find_one(&self, filter: &Filter) -> Result<Option<E>, DomainError> {
        let inner = self.read()?;
        let entries = Self::matching(&inner, filter)?;

        Ok(entries.first().map(|e| e.entity.clone()))
    }

    async fn find(&self, options: &FindOptions) -> Result<Vec<E>, DomainError> {
        if options.skip < 0 {
            return Err(DomainError::invalid_argument(format!(
                "skip must be non-negative, got {}",
                options.skip
            )));
        }

        if options.limit.is_some_and(|l| l < 0) {
            return Err(DomainError::invalid_argument("limit must be non-negative"));
        }

        let inner = self.read()?;
        let mut entries = Self::matching(&inner, &options.filter)?;

        if !options.sort.is_empty() {
            entries.sort_by(|a, b| compare_documents(&a.document, &b.document, &options.sort));
        }

        let skip = options.skip as usize;
        let limit = match options.limit {
            Some(l) if l > 0 => l as usize,
            _ => usize::MAX,
        };

        Ok(entries
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|e| e.entity.clone())
            .collect())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, DomainError> {
        let inner = self.read()?;
        Ok(Self::matching(&inner, filter)?.len() as u64)
    }

    async fn insert(&self, entity: E) -> Result<E, DomainError> {
        let mut inner = self.write()?;
        self.insert_locked(&mut inner, entity)
    }

    async fn update_one(
        &self,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<UpdateOutcome, DomainError> {
        let mut inner = self.write()?;

        let Some(target) = Self::matching(&inner, filter)?.first().map(|e| (*e).clone()) else {
            return Ok(UpdateOutcome::none());
        };

        let mut document = target.document.clone();
        for (field, value) in patch {
            document.insert(field.clone(), value.clone());
        }

        if document == target.document {
            return Ok(UpdateOutcome {
                matched_count: 1,
                modified_count: 0,
            });
        }

        let key = target.entity.key().as_str().to_string();
        self.check_unique(&inner, &key, &document)?;

        let entity: E = serde_json::from_value(Value::Object(document.clone())).map_err(|e| {
            DomainError::validation(format!("Update produces an invalid document: {}", e))
        })?;

        inner.entries.insert(
            key,
            Entry {
                seq: target.seq,
                entity,
                document,
            },
        );

        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::{SortField, StorageKey};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    struct TestId(String);

    impl StorageKey for TestId {
        fn as_str(&self) -> &str {
            &self.0
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct TestEntity {
        id: TestId,
        email: String,
        value: i32,
        #[serde(default)]
        is_deleted: bool,
    }

    impl StorageEntity for TestEntity {
        type Key = TestId;

        fn key(&self) -> &Self::Key {
            &self.id
        }

        fn unique_indexes() -> Vec<UniqueIndex> {
            vec![UniqueIndex::new("email").unless_true("isDeleted")]
        }
    }

    fn entity(id: &str, email: &str, value: i32) -> TestEntity {
        TestEntity {
            id: TestId(id.to_string()),
            email: email.to_string(),
            value,
            is_deleted: false,
        }
    }

    fn patch(value: serde_json::Value) -> Patch {
        value.as_object().cloned().unwrap()
    }

    async fn seeded() -> InMemoryStorage<TestEntity> {
        let storage = InMemoryStorage::new();
        for i in 0..5 {
            storage
                .insert(entity(&format!("{}", i), &format!("u{}@test.io", i), i))
                .await
                .unwrap();
        }
        storage
    }

    #[tokio::test]
    async fn test_insert_and_find_one() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();
        let e = entity("1", "a@test.io", 42);

        storage.insert(e.clone()).await.unwrap();

        let result = storage.find_one(&Filter::new().eq("id", "1")).await.unwrap();
        assert_eq!(result, Some(e));
    }

    #[tokio::test]
    async fn test_insert_key_conflict() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();

        storage.insert(entity("1", "a@test.io", 1)).await.unwrap();
        let result = storage.insert(entity("1", "b@test.io", 2)).await;

        assert!(matches!(result.unwrap_err(), DomainError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_unique_index_conflict() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();

        storage.insert(entity("1", "a@test.io", 1)).await.unwrap();
        let result = storage.insert(entity("2", "a@test.io", 2)).await;

        assert!(matches!(result.unwrap_err(), DomainError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_unique_index_ignores_flagged_documents() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();
        storage.insert(entity("1", "a@test.io", 1)).await.unwrap();

        storage
            .update_one(&Filter::new().eq("id", "1"), &patch(json!({"isDeleted": true})))
            .await
            .unwrap();

        assert!(storage.insert(entity("2", "a@test.io", 2)).await.is_ok());
    }

    #[tokio::test]
    async fn test_find_preserves_insertion_order() {
        let storage = seeded().await;

        let all = storage.find(&FindOptions::default()).await.unwrap();
        let values: Vec<i32> = all.iter().map(|e| e.value).collect();

        assert_eq!(values, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_find_sort_skip_limit() {
        let storage = seeded().await;

        let options = FindOptions::new(Filter::new().gte("value", 1i64))
            .with_sort(vec![SortField::descending("value")])
            .with_skip(1)
            .with_limit(2);

        let page = storage.find(&options).await.unwrap();
        let values: Vec<i32> = page.iter().map(|e| e.value).collect();

        assert_eq!(values, vec![3, 2]);
    }

    #[tokio::test]
    async fn test_find_rejects_negative_skip() {
        let storage = seeded().await;

        let result = storage.find(&FindOptions::default().with_skip(-10)).await;
        assert!(matches!(result, Err(DomainError::InvalidArgument { .. })));
    }

    #[tokio::test]
    async fn test_count_with_filter() {
        let storage = seeded().await;

        assert_eq!(storage.count(&Filter::new()).await.unwrap(), 5);
        assert_eq!(storage.count(&Filter::new().lt("value", 2i64)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_one_reports_counts() {
        let storage = seeded().await;
        let filter = Filter::new().eq("id", "3");

        let outcome = storage
            .update_one(&filter, &patch(json!({"value": 30})))
            .await
            .unwrap();
        assert_eq!(outcome.matched_count, 1);
        assert_eq!(outcome.modified_count, 1);

        let again = storage
            .update_one(&filter, &patch(json!({"value": 30})))
            .await
            .unwrap();
        assert_eq!(again.matched_count, 1);
        assert_eq!(again.modified_count, 0);

        let updated = storage.find_one(&filter).await.unwrap().unwrap();
        assert_eq!(updated.value, 30);
        assert_eq!(updated.email, "u3@test.io");
    }

    #[tokio::test]
    async fn test_update_one_without_match() {
        let storage = seeded().await;

        let outcome = storage
            .update_one(&Filter::new().eq("id", "missing"), &patch(json!({"value": 1})))
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::none());
    }

    #[tokio::test]
    async fn test_update_one_rejects_invalid_document() {
        let storage = seeded().await;

        let result = storage
            .update_one(&Filter::new().eq("id", "1"), &patch(json!({"value": "text"})))
            .await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_update_one_enforces_unique_index() {
        let storage = seeded().await;

        let result = storage
            .update_one(&Filter::new().eq("id", "1"), &patch(json!({"email": "u2@test.io"})))
            .await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_exists() {
        let storage = seeded().await;

        assert!(storage.exists(&Filter::new().eq("email", "u2@test.io")).await.unwrap());
        assert!(!storage.exists(&Filter::new().eq("email", "none@test.io")).await.unwrap());
    }
}

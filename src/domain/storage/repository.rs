//! Storage trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

use super::entity::StorageEntity;
use super::filter::Filter;
use super::query::{FindOptions, Patch, UpdateOutcome};

/// Generic document storage for any entity type
///
/// Documents come back in natural (insertion) order unless a sort is given.
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    /// Retrieves the first entity matching the filter
    async fn find_one(&self, filter: &Filter) -> Result<Option<E>, DomainError>;

    /// Retrieves entities matching the filter, sorted and windowed
    ///
    /// A negative `skip` is rejected with `InvalidArgument`.
    async fn find(&self, options: &FindOptions) -> Result<Vec<E>, DomainError>;

    /// Counts entities matching the filter
    async fn count(&self, filter: &Filter) -> Result<u64, DomainError>;

    /// Inserts a new entity; key or unique index collisions yield `Conflict`
    async fn insert(&self, entity: E) -> Result<E, DomainError>;

    /// Overwrites the patch fields on the first entity matching the filter
    async fn update_one(&self, filter: &Filter, patch: &Patch)
        -> Result<UpdateOutcome, DomainError>;

    /// Checks if any entity matches the filter
    async fn exists(&self, filter: &Filter) -> Result<bool, DomainError> {
        Ok(self.find_one(filter).await?.is_some())
    }
}

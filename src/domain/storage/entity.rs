//! Storage entity traits and types

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

use super::query::UniqueIndex;

/// Trait for types that can be used as storage keys
pub trait StorageKey: Clone + Debug + Send + Sync + Eq + std::hash::Hash {
    /// Returns the key as a string for storage backends that require string keys
    fn as_str(&self) -> &str;
}

/// Trait for types that can be stored as documents
///
/// The serialized JSON form of an entity is the document that filters,
/// sorts and partial updates operate on, so field names used in a
/// [`Filter`](super::Filter) must match the entity's serde field names.
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    /// The key type for this entity
    type Key: StorageKey;

    /// Returns the entity's key
    fn key(&self) -> &Self::Key;

    /// Unique constraints every backend must enforce on insert and update
    fn unique_indexes() -> Vec<UniqueIndex> {
        Vec::new()
    }
}

//! Storage domain - Generic document storage abstraction layer

mod entity;
mod filter;
mod query;
mod repository;
pub mod timestamp;

pub use entity::{StorageEntity, StorageKey};
pub use filter::{Filter, FilterCondition, FilterOperator, FilterValue};
pub use query::{FindOptions, Patch, SortDirection, SortField, UniqueIndex, UpdateOutcome};
pub use repository::Storage;

//! Storage infrastructure - Storage implementations

mod document;
mod factory;
mod in_memory;
pub mod migrations;
mod postgres;
mod sql;

pub use factory::{StorageConfig, StorageFactory, StorageType};
pub use in_memory::InMemoryStorage;
pub use migrations::{storage_migrations, Migration, Migrator, PostgresMigrator};
pub use postgres::{connect_pool, PostgresConfig, PostgresStorage};

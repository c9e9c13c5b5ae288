//! Storage factory for runtime storage selection

use std::str::FromStr;
use std::sync::Arc;

use crate::domain::storage::{Storage, StorageEntity};
use crate::domain::DomainError;

use super::in_memory::InMemoryStorage;
use super::postgres::{PostgresConfig, PostgresStorage};

/// Supported storage types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl FromStr for StorageType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            other => Err(DomainError::configuration(format!(
                "Unknown storage backend '{}'",
                other
            ))),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage configuration
    InMemory,
    /// PostgreSQL storage configuration
    Postgres(PostgresConfig),
}

impl StorageConfig {
    /// Creates an in-memory storage configuration
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Creates a PostgreSQL storage configuration
    pub fn postgres(config: PostgresConfig) -> Self {
        Self::Postgres(config)
    }

    /// Returns the storage type
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Factory for creating storage instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates a storage instance based on the configuration
    ///
    /// PostgreSQL tables and unique indexes are created when missing.
    pub async fn create<E>(
        config: &StorageConfig,
        table_name: &str,
    ) -> Result<Arc<dyn Storage<E>>, DomainError>
    where
        E: StorageEntity + 'static,
    {
        match config {
            StorageConfig::InMemory => Ok(Arc::new(InMemoryStorage::<E>::new())),
            StorageConfig::Postgres(pg_config) => {
                let storage = PostgresStorage::<E>::connect(pg_config, table_name).await?;
                storage.ensure_table().await?;
                Ok(Arc::new(storage))
            }
        }
    }
}

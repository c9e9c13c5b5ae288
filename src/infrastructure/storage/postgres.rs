//! PostgreSQL storage implementation with connection pooling

use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Row};

use crate::domain::storage::{
    Filter, FindOptions, Patch, Storage, StorageEntity, StorageKey, UpdateOutcome,
};
use crate::domain::DomainError;

use super::sql::{push_order_by, push_where, push_window, unique_index_ddl, validate_identifier};

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL storage configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/user_accounts".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn with_idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = secs;
        self
    }
}

/// PostgreSQL storage implementation with connection pooling
///
/// Stores entities as JSONB documents in a table with (seq, key, data) columns.
/// `seq` records insertion order and is the final tiebreaker of every sort.
pub struct PostgresStorage<E>
where
    E: StorageEntity,
{
    pool: PgPool,
    table_name: String,
    _phantom: PhantomData<E>,
}

impl<E> Debug for PostgresStorage<E>
where
    E: StorageEntity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStorage")
            .field("table_name", &self.table_name)
            .finish()
    }
}

/// Opens a connection pool
pub async fn connect_pool(config: &PostgresConfig) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
}

impl<E> PostgresStorage<E>
where
    E: StorageEntity,
{
    /// Creates a new PostgreSQL storage with the given pool and table name
    pub fn new(pool: PgPool, table_name: impl Into<String>) -> Result<Self, DomainError> {
        let table_name = table_name.into();
        validate_identifier(&table_name)?;

        Ok(Self {
            pool,
            table_name,
            _phantom: PhantomData,
        })
    }

    /// Creates a new PostgreSQL storage with connection pooling
    pub async fn connect(
        config: &PostgresConfig,
        table_name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let pool = connect_pool(config).await?;
        Self::new(pool, table_name)
    }

    /// Ensures the storage table and its unique indexes exist
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                seq BIGSERIAL,
                key VARCHAR(255) PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.table_name
        );

        sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        for index in E::unique_indexes() {
            let ddl = unique_index_ddl(&self.table_name, &index)?;

            sqlx::query(&ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to create index: {}", e)))?;
        }

        Ok(())
    }

    fn decode(row: &PgRow) -> Result<E, DomainError> {
        let data: serde_json::Value = row.get("data");
        serde_json::from_value(data)
            .map_err(|e| DomainError::storage(format!("Failed to deserialize entity: {}", e)))
    }
}

/// Maps unique violations to `Conflict`, everything else to `Storage`
fn map_write_error(error: sqlx::Error, context: &str) -> DomainError {
    let unique_violation = error
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION);

    if unique_violation {
        DomainError::conflict(format!("{}: duplicate value violates a unique constraint", context))
    } else {
        DomainError::storage(format!("{}: {}", context, error))
    }
}

#[async_trait]
impl<E> Storage<E> for PostgresStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn find_one(&self, filter: &Filter) -> Result<Option<E>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT data FROM {}", self.table_name));
        push_where(&mut builder, filter);
        builder.push(" ORDER BY seq ASC LIMIT 1");

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to find entity: {}", e)))?;

        row.as_ref().map(Self::decode).transpose()
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

        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT data FROM {}", self.table_name));
        push_where(&mut builder, &options.filter);
        push_order_by(&mut builder, &options.sort);
        push_window(&mut builder, options.skip, options.limit);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to find entities: {}", e)))?;

        rows.iter().map(Self::decode).collect()
    }

    async fn count(&self, filter: &Filter) -> Result<u64, DomainError> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) AS count FROM {}", self.table_name));
        push_where(&mut builder, filter);

        let row = builder
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count entities: {}", e)))?;

        let count: i64 = row.get("count");
        Ok(count.max(0) as u64)
    }

    async fn insert(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let data = serde_json::to_value(&entity)
            .map_err(|e| DomainError::storage(format!("Failed to serialize entity: {}", e)))?;

        let query = format!("INSERT INTO {} (key, data) VALUES ($1, $2)", self.table_name);

        sqlx::query(&query)
            .bind(&key)
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, &format!("Failed to insert entity '{}'", key)))?;

        Ok(entity)
    }

    async fn update_one(
        &self,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<UpdateOutcome, DomainError> {
        let table = &self.table_name;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "WITH target AS (SELECT key, data FROM {}",
            table
        ));
        push_where(&mut builder, filter);
        builder.push(" ORDER BY seq ASC LIMIT 1 FOR UPDATE), updated AS (UPDATE ");
        builder.push(table);
        builder.push(" AS t SET data = t.data || ");
        builder.push_bind(Json(serde_json::Value::Object(patch.clone())));
        builder.push(
            ", updated_at = NOW() FROM target WHERE t.key = target.key \
             RETURNING target.data AS old_data, t.data AS new_data) \
             SELECT COUNT(*) AS matched, \
             COUNT(*) FILTER (WHERE old_data IS DISTINCT FROM new_data) AS modified \
             FROM updated",
        );

        let row = builder
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "Failed to update entity"))?;

        let matched: i64 = row.get("matched");
        let modified: i64 = row.get("modified");

        Ok(UpdateOutcome {
            matched_count: matched.max(0) as u64,
            modified_count: modified.max(0) as u64,
        })
    }
}

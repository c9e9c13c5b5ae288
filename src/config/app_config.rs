use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::storage::{PostgresConfig, StorageConfig, StorageType};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted JSON body, in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Document storage selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory` or `postgres`
    pub backend: String,
    /// Connection URL; falls back to `DATABASE_URL` when unset
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_jwt_expiration_hours")]
    pub jwt_expiration_hours: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[hidden]"))
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .finish()
    }
}

/// Initial admin account created on an empty user collection
#[derive(Clone, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    #[serde(default)]
    pub admin_password: Option<String>,
}

impl std::fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("admin_email", &self.admin_email)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "[hidden]"),
            )
            .finish()
    }
}

/// Prometheus metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

fn default_body_limit() -> usize {
    1024 * 1024
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_jwt_expiration_hours() -> u64 {
    24
}

fn default_admin_email() -> String {
    "admin@example.com".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expiration_hours: default_jwt_expiration_hours(),
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_email: default_admin_email(),
            admin_password: None,
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}

impl StorageSettings {
    /// Resolves the backend selection into a storage configuration
    pub fn to_storage_config(&self) -> Result<StorageConfig, DomainError> {
        match self.backend.parse::<StorageType>()? {
            StorageType::InMemory => Ok(StorageConfig::in_memory()),
            StorageType::Postgres => Ok(StorageConfig::postgres(self.postgres_config()?)),
        }
    }

    /// PostgreSQL pool settings; requires `url` or `DATABASE_URL`
    pub fn postgres_config(&self) -> Result<PostgresConfig, DomainError> {
        let url = self
            .url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .ok_or_else(|| {
                DomainError::configuration(
                    "PostgreSQL storage requires storage.url or DATABASE_URL",
                )
            })?;

        Ok(PostgresConfig::new(url)
            .with_max_connections(self.max_connections)
            .with_min_connections(self.min_connections)
            .with_connect_timeout(self.connect_timeout_secs)
            .with_idle_timeout(self.idle_timeout_secs))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

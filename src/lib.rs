//! User Accounts API
//!
//! A REST backend for user accounts with:
//! - Create, paginated/filtered list, fetch, update and soft-delete
//! - Argon2id password hashing and JWT login
//! - In-memory or PostgreSQL JSONB document storage

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::user::{CreateUserRequest, User};
use infrastructure::{
    auth::{JwtConfig, JwtGenerator, JwtService},
    storage::StorageFactory,
    user::{Argon2Hasher, StorageUserRepository, UserService, UserServiceTrait},
};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::info;

const USERS_TABLE: &str = "users";

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = config.storage.to_storage_config()?;
    info!(backend = ?storage_config.storage_type(), "Storage backend selected");

    let storage = StorageFactory::create::<User>(&storage_config, USERS_TABLE).await?;
    let repository = Arc::new(StorageUserRepository::new(storage));
    let user_service: Arc<dyn UserServiceTrait> =
        Arc::new(UserService::new(repository, Arc::new(Argon2Hasher::new())));

    create_initial_admin_user(user_service.as_ref(), config).await?;

    Ok(AppState::new(user_service, create_jwt_service(config)))
}

/// JWT service from config, `JWT_SECRET`, or a generated secret
fn create_jwt_service(config: &AppConfig) -> Arc<dyn JwtGenerator> {
    let secret = config
        .auth
        .jwt_secret
        .clone()
        .or_else(|| std::env::var("JWT_SECRET").ok());

    Arc::new(JwtService::new(JwtConfig::from_optional_secret(
        secret.as_deref(),
        config.auth.jwt_expiration_hours,
    )))
}

fn generate_random_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// Create an initial admin user if no live users exist
async fn create_initial_admin_user(
    user_service: &dyn UserServiceTrait,
    config: &AppConfig,
) -> anyhow::Result<()> {
    if user_service.count().await? > 0 {
        return Ok(());
    }

    let configured = config
        .bootstrap
        .admin_password
        .clone()
        .or_else(|| std::env::var("ADMIN_DEFAULT_PASSWORD").ok())
        .filter(|p| !p.is_empty());
    let is_configured = configured.is_some();
    let password = configured.unwrap_or_else(generate_random_password);

    let request = CreateUserRequest {
        name: "Admin".to_string(),
        email: config.bootstrap.admin_email.clone(),
        password: password.clone(),
        phone: "0912345678".to_string(),
        age: Some(30),
        gender: "other".to_string(),
        address: "N/A".to_string(),
        role: "ADMIN".to_string(),
    };

    let admin = user_service.create(request, None).await?;

    info!("===========================================");
    info!("Initial admin user created!");
    info!("Email: {}", admin.email());

    if is_configured {
        info!("Password: (set via configuration)");
    } else {
        info!("Password: {}", password);
    }

    info!("Please change this password after first login.");
    info!("===========================================");

    Ok(())
}

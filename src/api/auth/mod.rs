//! Authentication API endpoints
//!
//! Login issues a JWT access token; `me` echoes the authenticated user.

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Envelope, Json};
use crate::domain::user::UserProfile;

/// Create the authentication router
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(get_current_user))
}

/// Login request; `username` is the account email
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserProfile,
    pub expires_at: String,
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Envelope<LoginResponse>, ApiError> {
    let user = state
        .user_service
        .authenticate(&request.username, &request.password)
        .await?
        .ok_or_else(|| {
            debug!("Login rejected");
            ApiError::unauthorized("Invalid username or password")
        })?;

    let (access_token, claims) = state.jwt_service.issue(&user)?;
    let expires_at = claims
        .expires_at()
        .ok_or_else(|| ApiError::internal("Token expiry out of range"))?;

    info!(user_id = %user.id(), "User logged in");

    Ok(Envelope::ok(
        "User login",
        LoginResponse {
            access_token,
            user: UserProfile::from(user),
            expires_at: expires_at.to_rfc3339(),
        },
    ))
}

/// GET /auth/me
pub async fn get_current_user(
    RequireUser(user): RequireUser,
) -> Result<Envelope<UserProfile>, ApiError> {
    Ok(Envelope::ok("Get user information", UserProfile::from(user)))
}

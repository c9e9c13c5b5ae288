//! Versioned API endpoints, mounted under `/api/v1`

pub mod users;

use axum::{routing::get, Router};

use super::auth;
use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::create_auth_router())
        .route("/user", get(users::list_users).post(users::create_user))
        .route(
            "/user/{id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
}

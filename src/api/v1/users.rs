//! User account endpoints

use axum::extract::{rejection::QueryRejection, Path, Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Envelope, Json};
use crate::domain::pagination::{PageRequest, Paginated};
use crate::domain::storage::timestamp::rfc3339;
use crate::domain::storage::UpdateOutcome;
use crate::domain::user::{CreateUserRequest, UpdateUserRequest, UserId, UserProfile};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_user_operation;
use crate::infrastructure::user::DeleteOutcome;

/// Body returned by a successful create
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(with = "rfc3339")]
    pub created_at: DateTime<Utc>,
}

fn observe<T>(operation: &'static str, result: Result<T, DomainError>) -> Result<T, ApiError> {
    record_user_operation(operation, result.is_ok());
    result.map_err(ApiError::from)
}

fn query_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// POST /user
pub async fn create_user(
    State(state): State<AppState>,
    auth: RequireUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<Envelope<CreatedUser>, ApiError> {
    debug!(email = ?request.email, "Creating user");

    let user = observe(
        "create",
        state.user_service.create(request, Some(auth.actor())).await,
    )?;

    Ok(Envelope::created(
        "User created successfully",
        CreatedUser {
            id: user.id().clone(),
            created_at: user.created_at(),
        },
    ))
}

/// GET /user?current=&pageSize=&...
pub async fn list_users(
    State(state): State<AppState>,
    _auth: RequireUser,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Envelope<Paginated<UserProfile>>, ApiError> {
    let Query(pairs) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let page = PageRequest::parse(
        query_value(&pairs, "current"),
        query_value(&pairs, "pageSize"),
    )?;

    debug!(current = page.current, page_size = ?page.page_size, "Listing users");

    let users = observe("find_all", state.user_service.find_all(page, &pairs).await)?;

    Ok(Envelope::ok("Fetch user with paginate", users))
}

/// GET /user/{id}
pub async fn get_user(
    State(state): State<AppState>,
    _auth: RequireUser,
    Path(id): Path<String>,
) -> Result<Envelope<UserProfile>, ApiError> {
    let user = observe("find_one", state.user_service.find_one(&id).await)?;

    Ok(Envelope::ok("Fetch user by id", user))
}

/// PATCH /user/{id}
pub async fn update_user(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Envelope<UpdateOutcome>, ApiError> {
    debug!(user_id = %id, "Updating user");

    let outcome = observe(
        "update",
        state
            .user_service
            .update(&id, request, Some(auth.actor()))
            .await,
    )?;

    Ok(Envelope::ok("Update user by id", outcome))
}

/// DELETE /user/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<String>,
) -> Result<Envelope<DeleteOutcome>, ApiError> {
    debug!(user_id = %id, "Deleting user");

    let outcome = observe(
        "remove",
        state.user_service.remove(&id, Some(auth.actor())).await,
    )?;

    Ok(Envelope::ok("Delete user by id", outcome))
}

//! User authentication middleware using JWT tokens

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::user::{AuditActor, User, UserId};

/// Extractor that requires a valid JWT token
///
/// Extracts the JWT token from:
/// - Authorization header: `Bearer <jwt_token>`
///
/// The token subject must resolve to a live (not soft-deleted) user.
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

impl RequireUser {
    /// Audit snapshot of the acting user
    pub fn actor(&self) -> AuditActor {
        self.0.actor()
    }
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_jwt_token(&parts.headers)?;

        debug!("Validating JWT token");

        let claims = state.jwt_service.validate(&token)?;

        let user_id = UserId::parse(claims.user_id())
            .map_err(|_| ApiError::unauthorized("Invalid token subject"))?;

        let user = state
            .user_service
            .get_user(&user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("User not found"))?;

        Ok(RequireUser(user))
    }
}

/// Extract JWT token from Authorization header
pub fn extract_jwt_token(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    Err(ApiError::unauthorized(
        "Authentication required. Provide JWT token via 'Authorization: Bearer <token>' header",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            "Bearer eyJhbGciOiJIUzI1NiJ9.test".parse().unwrap(),
        );

        assert_eq!(
            extract_jwt_token(&headers).unwrap(),
            "eyJhbGciOiJIUzI1NiJ9.test"
        );
    }

    #[test]
    fn test_missing_token() {
        let err = extract_jwt_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_invalid_auth_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());

        assert!(extract_jwt_token(&headers).is_err());
    }

    #[test]
    fn test_trimmed_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            "Bearer   token-with-spaces   ".parse().unwrap(),
        );

        assert_eq!(extract_jwt_token(&headers).unwrap(), "token-with-spaces");
    }
}

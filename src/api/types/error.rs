//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Error body: `{statusCode, message, error}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub status_code: u16,
    pub message: String,
    /// Reason phrase of the status code
    pub error: String,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                status_code: status.as_u16(),
                message: message.into(),
                error: status.canonical_reason().unwrap_or("Error").to_string(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Validation { message }
            | DomainError::InvalidArgument { message }
            | DomainError::Immutable { message, .. } => Self::bad_request(message),
            DomainError::Conflict { message } => Self::conflict(message),
            DomainError::Unauthorized { message } => Self::unauthorized(message),
            DomainError::Configuration { .. }
            | DomainError::Internal { .. }
            | DomainError::Storage { .. } => {
                tracing::error!(error = %err, "Request failed");
                Self::internal("Internal server error")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.response.error, self.response.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_creation() {
        let err = ApiError::bad_request("Invalid id");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.response.status_code, 400);
        assert_eq!(err.response.error, "Bad Request");
        assert_eq!(err.response.message, "Invalid id");
    }

    #[test]
    fn test_domain_error_conversion() {
        let cases = [
            (DomainError::conflict("dup"), StatusCode::CONFLICT),
            (DomainError::invalid_argument("bad"), StatusCode::BAD_REQUEST),
            (
                DomainError::immutable("email", "Email cannot be updated"),
                StatusCode::BAD_REQUEST,
            ),
            (DomainError::validation("Name is not empty"), StatusCode::BAD_REQUEST),
            (DomainError::not_found("User not found"), StatusCode::NOT_FOUND),
            (DomainError::unauthorized("nope"), StatusCode::UNAUTHORIZED),
            (DomainError::storage("down"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (domain_err, status) in cases {
            let api_err: ApiError = domain_err.into();
            assert_eq!(api_err.status, status);
        }
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let api_err: ApiError = DomainError::storage("connection refused at 10.0.0.5").into();
        assert_eq!(api_err.response.message, "Internal server error");
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::conflict("Email a@example.com is already exist");
        let json = serde_json::to_value(&err.response).unwrap();

        assert_eq!(json["statusCode"], 409);
        assert_eq!(json["error"], "Conflict");
        assert_eq!(json["message"], "Email a@example.com is already exist");
    }
}

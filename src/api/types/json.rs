//! Custom JSON extractor that returns errors as JSON

use axum::{
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// Custom JSON extractor that converts all rejection errors to JSON format
///
/// Body rejections come back in the same `{statusCode, message, error}`
/// shape as every other API error, always with status 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Consume the extractor and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// JSON body rejection in the API error format
#[derive(Debug)]
pub struct JsonRejection {
    message: String,
}

impl IntoResponse for JsonRejection {
    fn into_response(self) -> Response {
        ApiError::bad_request(self.message).into_response()
    }
}

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = JsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumJson::<T>::from_request(req, state).await {
            Ok(AxumJson(value)) => Ok(Json(value)),
            Err(rejection) => {
                tracing::debug!(status = %rejection.status(), "Rejected JSON body");

                Err(JsonRejection {
                    message: format_rejection_message(&rejection),
                })
            }
        }
    }
}

/// Format the rejection message to be more user-friendly
fn format_rejection_message(rejection: &axum::extract::rejection::JsonRejection) -> String {
    use axum::extract::rejection::JsonRejection::*;

    match rejection {
        JsonDataError(err) => {
            format!("Invalid JSON data: {}", err.body_text())
        }
        JsonSyntaxError(err) => {
            format!("Invalid JSON syntax: {}", err.body_text())
        }
        MissingJsonContentType(_) => {
            "Missing Content-Type header. Expected 'application/json'.".to_string()
        }
        BytesRejection(err) => {
            format!("Failed to read request body: {}", err.body_text())
        }
        _ => "Invalid JSON request".to_string(),
    }
}

impl<T> IntoResponse for Json<T>
where
    T: serde::Serialize,
{
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

impl<T> From<T> for Json<T> {
    fn from(value: T) -> Self {
        Json(value)
    }
}

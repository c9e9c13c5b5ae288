//! Success response envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::json::Json;

/// Wraps every successful body as `{statusCode, message, data}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage<T> {
    pub status_code: u16,
    pub message: String,
    pub data: T,
}

/// Typed handler output carrying its HTTP status alongside the envelope
#[derive(Debug)]
pub struct Envelope<T> {
    status: StatusCode,
    body: ResponseMessage<T>,
}

impl<T> Envelope<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status,
            body: ResponseMessage {
                status_code: status.as_u16(),
                message: message.into(),
                data,
            },
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::OK, message, data)
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::CREATED, message, data)
    }

    pub fn body(&self) -> &ResponseMessage<T> {
        &self.body
    }
}

impl<T> IntoResponse for Envelope<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

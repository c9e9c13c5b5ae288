//! Wire types shared by the HTTP handlers

pub mod envelope;
pub mod error;
pub mod json;

pub use envelope::{Envelope, ResponseMessage};
pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;

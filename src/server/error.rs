use axum::http::StatusCode;
use axum::response::{ IntoResponse, Response };
use axum::Json;

use crate::agent::AgentError;
use crate::models::recipe::ErrorResponse;

pub const MODEL_FAILURE: &str = "Failed to communicate with the model.";
pub const EMAIL_FIELDS_REQUIRED: &str = "Email and recipes are required";
pub const EMAIL_FAILURE: &str = "Failed to send email";
pub const RATE_LIMITED: &str = "Too many requests";

/// Error bodies returned to HTTP callers. Details stay in the server log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    BadRequest(&'static str),
    TooManyRequests,
    Internal(&'static str),
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::MissingEmailFields => ApiError::BadRequest(EMAIL_FIELDS_REQUIRED),
            AgentError::Llm(_) => ApiError::Internal(MODEL_FAILURE),
            AgentError::Mail(_) => ApiError::Internal(EMAIL_FAILURE),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::TooManyRequests => (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorResponse { error: message.to_string() })).into_response()
    }
}

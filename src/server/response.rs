use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::error::Error;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }
}

/// API error that converts to a proper HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "data": null, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::PermissionDenied | Error::ProtectedAccount => StatusCode::FORBIDDEN,
            Error::DuplicateUsername | Error::DuplicateTemplateName => StatusCode::CONFLICT,
            Error::InvalidPayload(_) | Error::InvalidInput(_) | Error::ImportError(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Unauthorized | Error::InvalidTokenFormat => StatusCode::UNAUTHORIZED,
            Error::Database(_)
            | Error::Io(_)
            | Error::Config(_)
            | Error::Credential(_)
            | Error::SessionLookupCollision => {
                tracing::error!("Request failed: {err}");
                return ApiError::internal("Internal server error");
            }
        };

        Self {
            status,
            message: err.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

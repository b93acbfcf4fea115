//! API error handling

use axum::{
    extract::rejection::{FormRejection, JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jingle_auth::AuthError;
use jingle_core::{CoreError, StoreError, UniqueField};
use serde::{Deserialize, Serialize};

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn unavailable() -> Self {
        Self::new("SERVICE_UNAVAILABLE", "Server is busy, try again later")
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    Auth(AuthError),
    Store(StoreError),
    BadRequest(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ApiError) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::bad_request(msg)),
            AppError::Auth(err) if err.is_unauthorized() => (
                StatusCode::UNAUTHORIZED,
                ApiError::unauthorized(err.to_string()),
            ),
            AppError::Auth(err) if err.is_validation() => (
                StatusCode::BAD_REQUEST,
                ApiError::bad_request(err.to_string()),
            ),
            AppError::Auth(AuthError::Overloaded) => {
                (StatusCode::SERVICE_UNAVAILABLE, ApiError::unavailable())
            }
            AppError::Auth(err) => {
                tracing::error!(error = %err, "Auth failure");
                (StatusCode::INTERNAL_SERVER_ERROR, ApiError::internal_error())
            }
            AppError::Store(err) => match err {
                StoreError::NotFound(_) => (
                    StatusCode::BAD_REQUEST,
                    ApiError::bad_request(err.to_string()),
                ),
                StoreError::Conflict(UniqueField::Username) => (
                    StatusCode::CONFLICT,
                    ApiError::conflict("Username already taken"),
                ),
                StoreError::Conflict(UniqueField::EmailAddress) => (
                    StatusCode::CONFLICT,
                    ApiError::conflict("Email address already taken"),
                ),
                StoreError::Backend(msg) => {
                    tracing::error!(error = %msg, "User store failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("DATABASE_ERROR", "Database operation failed"),
                    )
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_body();
        (status, Json(error)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => AppError::BadRequest(msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::fmt;

use crate::{attempts::AttemptError, store::StoreError, utils::clock::display_ist};

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden (wrong role, inactive quiz)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate username)
    Conflict(String),

    // 410 Gone (quiz session timed out before submit)
    Gone(String),

    // 429 Too Many Requests (attempt limit reached)
    TooManyRequests {
        message: String,
        blocked_until: DateTime<Utc>,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::Gone(msg) => (
                StatusCode::GONE,
                json!({
                    "error": "Session expired",
                    "message": msg,
                }),
            ),
            AppError::TooManyRequests {
                message,
                blocked_until,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "error": "Attempt limit reached",
                    "message": message,
                    "blockedUntil": blocked_until,
                    "blockedUntilDisplay": display_ist(blocked_until),
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Maps lifecycle failures onto HTTP semantics.
impl From<AttemptError> for AppError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::NoActiveAttempt => AppError::BadRequest(err.to_string()),
            AttemptError::SessionExpired => AppError::Gone(err.to_string()),
            AttemptError::RateLimitExceeded { blocked_until } => AppError::TooManyRequests {
                message: err.to_string(),
                blocked_until,
            },
            AttemptError::QuizInactive => AppError::Forbidden(err.to_string()),
            AttemptError::QuizNotFound => AppError::NotFound(err.to_string()),
            AttemptError::InvalidInput(msg) => AppError::BadRequest(msg),
            AttemptError::Store(e) => AppError::from(e),
        }
    }
}

/// Converts `StoreError` into `AppError::InternalServerError`.
/// Allows using `?` operator on store reads and writes.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_map_to_statuses() {
        let cases = [
            (AttemptError::NoActiveAttempt, StatusCode::BAD_REQUEST),
            (AttemptError::SessionExpired, StatusCode::GONE),
            (AttemptError::QuizInactive, StatusCode::FORBIDDEN),
            (AttemptError::QuizNotFound, StatusCode::NOT_FOUND),
            (
                AttemptError::RateLimitExceeded {
                    blocked_until: Utc::now(),
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
        ];

        for (err, status) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }
}

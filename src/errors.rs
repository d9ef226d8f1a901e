use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    // Bearer-middleware failures; rendered with a machine-readable `code`
    // because clients refresh-and-retry only on TokenExpired.
    NoToken,
    TokenExpired,
    InvalidToken,

    // Login failures
    UserNotFound,
    InvalidCredentials,

    // Refresh failures. InvalidRefreshToken covers bad signature and natural
    // expiry; TokenMismatch is a structurally valid token that no longer
    // matches the user's stored slot (superseded or logged out).
    MissingRefreshToken,
    InvalidRefreshToken,
    TokenMismatch,

    // Registration / input failures
    EmailTaken,
    Validation(String),

    TaskNotFound,

    // Infrastructure
    DatabaseError(sqlx::Error),
    PasswordHashError,
    TokenCreationError,
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        ApiError::TokenCreationError
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::NoToken => (StatusCode::UNAUTHORIZED, json!({ "code": "NO_TOKEN" })),
            ApiError::TokenExpired => {
                (StatusCode::UNAUTHORIZED, json!({ "code": "TOKEN_EXPIRED" }))
            }
            ApiError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, json!({ "code": "INVALID_TOKEN" }))
            }
            ApiError::UserNotFound => {
                (StatusCode::BAD_REQUEST, json!({ "error": "User not found" }))
            }
            ApiError::InvalidCredentials => {
                (StatusCode::BAD_REQUEST, json!({ "error": "Invalid password" }))
            }
            ApiError::MissingRefreshToken => {
                (StatusCode::UNAUTHORIZED, json!({ "error": "No refresh token" }))
            }
            ApiError::InvalidRefreshToken | ApiError::TokenMismatch => (
                StatusCode::FORBIDDEN,
                json!({ "error": "Invalid refresh token" }),
            ),
            ApiError::EmailTaken => {
                (StatusCode::CONFLICT, json!({ "error": "User already exists" }))
            }
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::TaskNotFound => (StatusCode::NOT_FOUND, json!({ "error": "Task not found" })),
            ApiError::DatabaseError(_)
            | ApiError::PasswordHashError
            | ApiError::TokenCreationError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

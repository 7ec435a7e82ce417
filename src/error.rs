use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Why a request was refused as unauthenticated.
///
/// Every variant renders as 401; the dashboard's only recovery is to log in
/// again, but the code lets it tell an expired session from a bad one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingToken,
    InvalidToken,
    TokenExpired,
    TokenRevoked,
    InvalidCredentials,
}

impl AuthFailure {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::InvalidToken => "invalid_token",
            Self::TokenExpired => "token_expired",
            Self::TokenRevoked => "token_revoked",
            Self::InvalidCredentials => "invalid_credentials",
        }
    }
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::MissingToken => "Missing bearer token",
            Self::InvalidToken => "Invalid token",
            Self::TokenExpired => "Session expired, please log in again",
            Self::TokenRevoked => "Session has been logged out",
            Self::InvalidCredentials => "Invalid email or password",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(AuthFailure),
    #[error("{0}")]
    AlreadyUsed(String),
    #[error("Device limit reached ({limit}/{limit}). Remove a device first.")]
    SlotLimitExceeded { limit: i32 },
    #[error("{0}")]
    Expired(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
    #[error("Database error: {0}")]
    Database(rusqlite::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::AlreadyUsed(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::SlotLimitExceeded { .. } | Self::Expired(_) => StatusCode::FORBIDDEN,
            Self::Internal(_)
            | Self::Database(_)
            | Self::Pool(_)
            | Self::Serialization(_)
            | Self::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(failure) => failure.code(),
            Self::AlreadyUsed(_) => "already_used",
            Self::SlotLimitExceeded { .. } => "slot_limit_exceeded",
            Self::Expired(_) => "license_expired",
            Self::Conflict(_) => "conflict",
            _ => "internal_error",
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref e, ref msg) = err
            && e.code == rusqlite::ErrorCode::ConstraintViolation
        {
            return AppError::Conflict(
                msg.clone()
                    .unwrap_or_else(|| "Conflicting concurrent change".into()),
            );
        }
        AppError::Database(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            axum::Json(json!({ "error": message, "code": self.code() })),
        )
            .into_response()
    }
}

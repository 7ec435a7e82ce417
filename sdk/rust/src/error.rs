//! Error types for the ShopSync admin SDK

use thiserror::Error;

/// Error codes for admin API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminErrorCode {
    /// Session token missing, invalid or logged out
    Unauthorized,
    /// Session token's exp has passed
    SessionExpired,
    /// Wrong email or password at login
    InvalidCredentials,
    /// Shop, key, device or subscription not found
    NotFound,
    /// Product key already redeemed
    AlreadyUsed,
    /// Shop has no free device slot
    SlotLimitExceeded,
    /// Device licence has expired
    LicenseExpired,
    /// Concurrent change or uniqueness clash
    Conflict,
    /// Invalid request parameters
    ValidationError,
    /// Server failed to handle the request
    ServerError,
    /// Network request failed
    NetworkError,
}

impl std::fmt::Display for AdminErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "UNAUTHORIZED"),
            Self::SessionExpired => write!(f, "SESSION_EXPIRED"),
            Self::InvalidCredentials => write!(f, "INVALID_CREDENTIALS"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::AlreadyUsed => write!(f, "ALREADY_USED"),
            Self::SlotLimitExceeded => write!(f, "SLOT_LIMIT_EXCEEDED"),
            Self::LicenseExpired => write!(f, "LICENSE_EXPIRED"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::ValidationError => write!(f, "VALIDATION_ERROR"),
            Self::ServerError => write!(f, "SERVER_ERROR"),
            Self::NetworkError => write!(f, "NETWORK_ERROR"),
        }
    }
}

/// ShopSync admin SDK error
#[derive(Debug, Error)]
#[error("{message} (code: {code})")]
pub struct AdminError {
    pub code: AdminErrorCode,
    /// Human-readable message
    pub message: String,
    /// HTTP status code (for API errors)
    pub status_code: Option<u16>,
}

impl AdminError {
    pub fn new(code: AdminErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(code: AdminErrorCode, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            code,
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AdminErrorCode::NetworkError, message)
    }

    /// The session is unusable; the only recovery is to log in again.
    pub fn requires_relogin(&self) -> bool {
        matches!(
            self.code,
            AdminErrorCode::Unauthorized | AdminErrorCode::SessionExpired
        )
    }
}

/// Result type for admin SDK operations
pub type Result<T> = std::result::Result<T, AdminError>;

/// Map HTTP status and the server's machine code to an error code.
pub(crate) fn map_status_to_error_code(status: u16, code: &str) -> AdminErrorCode {
    match (status, code) {
        (401, "token_expired") => AdminErrorCode::SessionExpired,
        (401, "invalid_credentials") => AdminErrorCode::InvalidCredentials,
        (401, _) => AdminErrorCode::Unauthorized,
        (403, "slot_limit_exceeded") => AdminErrorCode::SlotLimitExceeded,
        (403, _) => AdminErrorCode::LicenseExpired,
        (404, _) => AdminErrorCode::NotFound,
        (409, "already_used") => AdminErrorCode::AlreadyUsed,
        (409, _) => AdminErrorCode::Conflict,
        (400, _) => AdminErrorCode::ValidationError,
        (500..=599, _) => AdminErrorCode::ServerError,
        _ => AdminErrorCode::NetworkError,
    }
}

use serde::{Deserialize, Serialize};

/// Custom claims carried in an admin session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub email: String,
}

/// A verified admin session, flattened from the JWT.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub admin_id: String,
    pub email: String,
    pub jti: String,
    /// Token expiry, epoch milliseconds
    pub expires_at: i64,
}

#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_at: i64,
}

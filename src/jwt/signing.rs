use jwt_simple::JWTError;
use jwt_simple::prelude::*;
use uuid::Uuid;

use super::claims::{AdminClaims, AdminSession, IssuedToken};
use crate::error::{AppError, Result};
use crate::models::Admin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

/// Issues and verifies HS256 admin session tokens.
pub struct SessionSigner {
    key: HS256Key,
    ttl_secs: u64,
}

impl SessionSigner {
    pub fn new(secret: &[u8], ttl_hours: u64) -> Self {
        Self {
            key: HS256Key::from_bytes(secret),
            ttl_secs: ttl_hours * 3600,
        }
    }

    /// Signer with a random secret; sessions do not survive a restart.
    pub fn ephemeral(ttl_hours: u64) -> Self {
        Self {
            key: HS256Key::generate(),
            ttl_secs: ttl_hours * 3600,
        }
    }

    pub fn issue(&self, admin: &Admin) -> Result<IssuedToken> {
        let now = Clock::now_since_epoch().as_secs();
        self.issue_at(admin, now)
    }

    /// Issue a token as if the clock read `issued_at` (Unix seconds).
    pub fn issue_at(&self, admin: &Admin, issued_at: u64) -> Result<IssuedToken> {
        let jti = Uuid::new_v4().to_string();
        let mut claims = Claims::with_custom_claims(
            AdminClaims {
                email: admin.email.clone(),
            },
            Duration::from_secs(self.ttl_secs),
        )
        .with_subject(&admin.id)
        .with_jwt_id(&jti);

        let expires = issued_at + self.ttl_secs;
        claims.issued_at = Some(Duration::from_secs(issued_at));
        claims.invalid_before = Some(Duration::from_secs(issued_at));
        claims.expires_at = Some(Duration::from_secs(expires));

        let token = self
            .key
            .authenticate(claims)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))?;

        Ok(IssuedToken {
            token,
            jti,
            expires_at: (expires as i64) * 1000,
        })
    }

    pub fn verify(&self, token: &str) -> std::result::Result<AdminSession, TokenError> {
        let options = VerificationOptions {
            time_tolerance: Some(Duration::from_secs(0)),
            ..Default::default()
        };

        let claims = self
            .key
            .verify_token::<AdminClaims>(token, Some(options))
            .map_err(|e| match e.downcast_ref::<JWTError>() {
                Some(JWTError::TokenHasExpired) => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;

        let admin_id = claims.subject.ok_or(TokenError::Invalid)?;
        let jti = claims.jwt_id.ok_or(TokenError::Invalid)?;
        let expires_at = claims
            .expires_at
            .map(|exp| (exp.as_secs() as i64) * 1000)
            .ok_or(TokenError::Invalid)?;

        Ok(AdminSession {
            admin_id,
            email: claims.custom.email,
            jti,
            expires_at,
        })
    }
}

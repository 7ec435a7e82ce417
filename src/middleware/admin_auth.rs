use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::db::{AppState, queries};
use crate::error::{AppError, AuthFailure, Result};
use crate::jwt::{AdminSession, TokenError};
use crate::models::Admin;
use crate::util::extract_bearer_token;

#[derive(Clone)]
pub struct AdminContext {
    pub admin: Admin,
    pub session: AdminSession,
}

/// Authenticate an admin from the bearer session token.
fn authenticate_admin(state: &AppState, headers: &HeaderMap) -> Result<AdminContext> {
    let token = extract_bearer_token(headers)
        .ok_or(AppError::Unauthorized(AuthFailure::MissingToken))?;

    let session = state.sessions.verify(&token).map_err(|e| match e {
        TokenError::Expired => AppError::Unauthorized(AuthFailure::TokenExpired),
        TokenError::Invalid => AppError::Unauthorized(AuthFailure::InvalidToken),
    })?;

    let conn = state.db.get()?;

    if queries::is_token_revoked(&conn, &session.jti)? {
        return Err(AppError::Unauthorized(AuthFailure::TokenRevoked));
    }

    // Admin deleted since the token was issued
    let admin = queries::get_admin_by_id(&conn, &session.admin_id)?
        .ok_or(AppError::Unauthorized(AuthFailure::InvalidToken))?;

    Ok(AdminContext { admin, session })
}

pub async fn admin_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let ctx = authenticate_admin(&state, request.headers())?;
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

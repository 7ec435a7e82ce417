use axum::extract::{Extension, State};
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, AuthFailure, Result};
use crate::extractors::Json;
use crate::middleware::AdminContext;
use crate::models::{LoginRequest, LoginResponse};

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let conn = state.db.get()?;

    let admin = queries::verify_admin_login(&conn, &input.email, &input.password)?
        .ok_or(AppError::Unauthorized(AuthFailure::InvalidCredentials))?;

    let issued = state.sessions.issue(&admin)?;

    tracing::info!("Admin {} logged in", admin.email);

    Ok(Json(LoginResponse {
        token: issued.token,
        email: admin.email,
        expires_at: issued.expires_at,
    }))
}

#[derive(Serialize)]
pub struct LoggedOut {
    pub logged_out: bool,
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
) -> Result<Json<LoggedOut>> {
    let conn = state.db.get()?;
    queries::revoke_token(&conn, &ctx.session.jti, &ctx.admin.id, ctx.session.expires_at)?;

    tracing::info!("Admin {} logged out", ctx.admin.email);

    Ok(Json(LoggedOut { logged_out: true }))
}

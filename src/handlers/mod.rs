pub mod admin;
pub mod public;

use axum::Router;

use crate::db::AppState;

/// Full HTTP surface without the outer layers (tracing, CORS, rate limit).
pub fn router(state: AppState) -> Router {
    let api = public::router().merge(admin::router(state.clone()));
    Router::new().nest("/api", api).with_state(state)
}

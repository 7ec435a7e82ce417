mod devices;
mod shops;

pub use devices::*;
pub use shops::*;

use axum::{
    Router,
    routing::{get, post, put},
};
use serde::Serialize;

use crate::db::AppState;
use crate::extractors::Json;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Routes called by the shop application. Unauthenticated.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/shops", post(register_shop))
        .route("/shops/{shop_id}", get(get_shop))
        .route("/shops/{shop_id}", put(update_shop))
        .route("/shops/{shop_id}/devices", post(register_device))
        .route(
            "/shops/{shop_id}/product-keys/activate",
            post(activate_product_key),
        )
        .route(
            "/shops/{shop_id}/devices/{app_id}/renew",
            post(renew_license),
        )
        .route("/devices/{app_id}/heartbeat", post(heartbeat))
        .route("/devices/{app_id}/license", get(license_status))
}

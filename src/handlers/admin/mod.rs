mod auth;
mod devices;
mod product_keys;
mod shops;
mod stats;
mod subscriptions;

pub use auth::*;
pub use devices::*;
pub use product_keys::*;
pub use shops::*;
pub use stats::*;
pub use subscriptions::*;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::db::AppState;
use crate::middleware::admin_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/logout", post(logout))
        .route("/admin/stats", get(get_stats))
        .route("/admin/product-keys", get(list_product_keys))
        .route("/admin/product-keys", post(generate_product_key))
        .route("/admin/shops", get(list_shops))
        .route("/admin/shops/{id}", delete(delete_shop))
        .route("/admin/devices", get(list_devices))
        .route("/admin/subscriptions", get(list_subscriptions))
        .route(
            "/admin/subscriptions/{shop_id}/mark-paid",
            post(mark_subscription_paid),
        )
        .layer(middleware::from_fn_with_state(state, admin_auth))
        // Login is the only admin route reachable without a session
        .merge(Router::new().route("/admin/login", post(login)))
}

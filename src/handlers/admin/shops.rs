use axum::extract::{Extension, State};
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::middleware::AdminContext;
use crate::models::ShopWithCounts;

pub async fn list_shops(State(state): State<AppState>) -> Result<Json<Vec<ShopWithCounts>>> {
    let conn = state.db.get()?;
    let shops = queries::list_shops_with_counts(&conn)?;
    Ok(Json(shops))
}

#[derive(Serialize)]
pub struct ShopDeleted {
    pub deleted: bool,
}

pub async fn delete_shop(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Path(id): Path<String>,
) -> Result<Json<ShopDeleted>> {
    let mut conn = state.db.get()?;
    let deletion = queries::delete_shop_cascade(&mut conn, &id)?;

    tracing::info!(
        "Shop {} deleted by {} ({} devices, {} product keys, {} items, {} sales)",
        id,
        ctx.admin.email,
        deletion.count("devices"),
        deletion.count("product_keys"),
        deletion.count("items"),
        deletion.count("sales"),
    );

    Ok(Json(ShopDeleted { deleted: true }))
}

use axum::extract::{Extension, State};

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;
use crate::middleware::AdminContext;
use crate::models::{ProductKeyCreated, ProductKeyWithShop};

pub async fn list_product_keys(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductKeyWithShop>>> {
    let conn = state.db.get()?;
    let keys = queries::list_product_keys_with_shop(&conn)?;
    Ok(Json(keys))
}

pub async fn generate_product_key(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
) -> Result<Json<ProductKeyCreated>> {
    let conn = state.db.get()?;
    let key = queries::create_product_key(&conn)?;

    tracing::info!("Product key {} generated by {}", key.id, ctx.admin.email);

    Ok(Json(ProductKeyCreated {
        id: key.id,
        product_key: key.product_key,
        created_at: key.created_at,
    }))
}

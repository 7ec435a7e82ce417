use axum::extract::{Extension, State};

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::middleware::AdminContext;
use crate::models::{SubscriptionView, SubscriptionWithShop};
use crate::util::now_millis;

pub async fn list_subscriptions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SubscriptionWithShop>>> {
    let conn = state.db.get()?;
    let subscriptions = queries::list_subscriptions_with_shop(&conn, now_millis())?;
    Ok(Json(subscriptions))
}

pub async fn mark_subscription_paid(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Path(shop_id): Path<String>,
) -> Result<Json<SubscriptionView>> {
    let now = now_millis();
    let mut conn = state.db.get()?;
    let subscription = queries::mark_subscription_paid(
        &mut conn,
        &shop_id,
        state.policy.license_period_days,
        now,
    )?;

    tracing::info!(
        "Shop {} marked paid by {} until {:?}",
        shop_id,
        ctx.admin.email,
        subscription.subscription_end
    );

    Ok(Json(subscription.view_at(now)))
}

use axum::extract::State;
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::models::{DeviceStatus, SubscriptionStatus};
use crate::util::{days_remaining, mask_product_key, now_millis};

#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    pub app_id: String,
    pub status: DeviceStatus,
    pub last_seen: i64,
    pub expires_at: Option<i64>,
}

pub async fn heartbeat(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<Json<HeartbeatResponse>> {
    let now = now_millis();
    let conn = state.db.get()?;
    let device = queries::record_heartbeat(&conn, &app_id, now)?;

    Ok(Json(HeartbeatResponse {
        status: device.status_at(now),
        app_id: device.app_id,
        last_seen: now,
        expires_at: device.expires_at,
    }))
}

/// What the shop application shows on its licence screen.
#[derive(Debug, Serialize)]
pub struct LicenseStatus {
    pub app_id: String,
    pub shop_id: String,
    pub device_slot: i32,
    pub status: DeviceStatus,
    /// Masked, e.g. `ABCD-****-****-WXYZ`
    pub product_key: Option<String>,
    pub activated_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub days_remaining: Option<i64>,
    pub expired: bool,
    pub subscription_status: Option<SubscriptionStatus>,
}

pub async fn license_status(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<Json<LicenseStatus>> {
    let now = now_millis();
    let conn = state.db.get()?;

    let device = queries::get_device_by_app_id(&conn, &app_id)?
        .ok_or_else(|| AppError::NotFound("Device not found".into()))?;
    let subscription = queries::get_subscription(&conn, &device.shop_id)?;

    let status = device.status_at(now);

    Ok(Json(LicenseStatus {
        status,
        product_key: device.product_key.as_deref().map(mask_product_key),
        activated_at: device.activated_at,
        expires_at: device.expires_at,
        days_remaining: days_remaining(device.expires_at, now),
        expired: status == DeviceStatus::Expired,
        subscription_status: subscription.map(|s| s.status_at(now)),
        app_id: device.app_id,
        shop_id: device.shop_id,
        device_slot: device.device_slot,
    }))
}

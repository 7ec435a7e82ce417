use axum::{extract::State, http::StatusCode};
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::db::queries::DeviceRegistration;
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::models::{
    ActivateProductKey, CreateShop, RegisterDevice, RenewLicense, Shop, SubscriptionStatus,
    UpdateShop,
};
use crate::util::{mask_product_key, normalize_product_key, now_millis};

/// Blank app ids are treated as absent so the server generates one.
fn requested_app_id(app_id: &Option<String>) -> Option<&str> {
    app_id.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Serialize)]
pub struct ShopRegistered {
    pub shop_id: String,
    pub shop_name: String,
    pub app_id: String,
    pub device_slot: i32,
    pub created_at: i64,
}

pub async fn register_shop(
    State(state): State<AppState>,
    Json(input): Json<CreateShop>,
) -> Result<(StatusCode, Json<ShopRegistered>)> {
    let mut conn = state.db.get()?;
    let (shop, device) = queries::register_shop(&mut conn, &input, &state.policy, now_millis())?;

    tracing::info!(
        "Shop {} ({}) registered with device {}",
        shop.id,
        shop.name,
        device.app_id
    );

    Ok((
        StatusCode::CREATED,
        Json(ShopRegistered {
            shop_id: shop.id,
            shop_name: shop.name,
            app_id: device.app_id,
            device_slot: device.device_slot,
            created_at: shop.created_at,
        }),
    ))
}

pub async fn get_shop(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
) -> Result<Json<Shop>> {
    let conn = state.db.get()?;
    let shop = queries::get_shop_by_id(&conn, &shop_id)?
        .ok_or_else(|| AppError::NotFound("Shop not found".into()))?;
    Ok(Json(shop))
}

pub async fn update_shop(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
    Json(input): Json<UpdateShop>,
) -> Result<Json<Shop>> {
    let mut conn = state.db.get()?;
    let shop = queries::update_shop(&mut conn, &shop_id, &input, now_millis())?;

    tracing::info!("Shop {} profile updated", shop.id);
    Ok(Json(shop))
}

#[derive(Debug, Serialize)]
pub struct DeviceRegistered {
    pub shop_id: String,
    pub app_id: String,
    pub device_slot: i32,
    pub registered_at: i64,
}

pub async fn register_device(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
    Json(input): Json<RegisterDevice>,
) -> Result<(StatusCode, Json<DeviceRegistered>)> {
    let mut conn = state.db.get()?;
    let registration = queries::register_device(
        &mut conn,
        &shop_id,
        requested_app_id(&input.app_id),
        state.policy.max_devices_per_shop,
        now_millis(),
    )?;

    let status = match &registration {
        DeviceRegistration::Created(device) => {
            tracing::info!(
                "Device {} registered to shop {} in slot {}",
                device.app_id,
                shop_id,
                device.device_slot
            );
            StatusCode::CREATED
        }
        DeviceRegistration::Existing(_) => StatusCode::OK,
    };

    let device = registration.into_device();
    Ok((
        status,
        Json(DeviceRegistered {
            shop_id: device.shop_id,
            app_id: device.app_id,
            device_slot: device.device_slot,
            registered_at: device.registered_at,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct ActivationResponse {
    pub shop_id: String,
    pub app_id: String,
    pub product_key: String,
    pub device_slot: i32,
    pub activated_at: i64,
    pub expires_at: i64,
    pub subscription_status: SubscriptionStatus,
}

pub async fn activate_product_key(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
    Json(input): Json<ActivateProductKey>,
) -> Result<Json<ActivationResponse>> {
    redeem(&state, shop_id, &input.product_key, requested_app_id(&input.app_id)).map(Json)
}

/// Redeem a further key on a device the shop already registered.
pub async fn renew_license(
    State(state): State<AppState>,
    Path((shop_id, app_id)): Path<(String, String)>,
    Json(input): Json<RenewLicense>,
) -> Result<Json<ActivationResponse>> {
    {
        let conn = state.db.get()?;
        match queries::get_device_by_app_id(&conn, &app_id)? {
            Some(device) if device.shop_id == shop_id => {}
            _ => return Err(AppError::NotFound("Device not found".into())),
        }
    }

    redeem(&state, shop_id, &input.product_key, Some(&app_id)).map(Json)
}

fn redeem(
    state: &AppState,
    shop_id: String,
    product_key: &str,
    app_id: Option<&str>,
) -> Result<ActivationResponse> {
    let key = normalize_product_key(product_key)
        .ok_or_else(|| AppError::BadRequest("Invalid product key format".into()))?;

    let now = now_millis();
    let mut conn = state.db.get()?;
    let activation =
        queries::activate_product_key(&mut conn, &shop_id, &key, app_id, &state.policy, now)?;

    let device = activation.device;
    let expires_at = device.expires_at.unwrap_or(now);

    tracing::info!(
        "Product key {} activated for shop {} on device {} (slot {}), expires {}",
        activation.product_key.id,
        shop_id,
        device.app_id,
        device.device_slot,
        expires_at
    );

    Ok(ActivationResponse {
        shop_id,
        app_id: device.app_id,
        product_key: mask_product_key(&key),
        device_slot: device.device_slot,
        activated_at: device.activated_at.unwrap_or(now),
        expires_at,
        subscription_status: activation.subscription.status_at(now),
    })
}

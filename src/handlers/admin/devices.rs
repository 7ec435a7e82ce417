use axum::extract::State;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;
use crate::models::DeviceWithShop;
use crate::util::now_millis;

pub async fn list_devices(State(state): State<AppState>) -> Result<Json<Vec<DeviceWithShop>>> {
    let conn = state.db.get()?;
    let devices = queries::list_devices_with_shop(&conn, now_millis())?;
    Ok(Json(devices))
}

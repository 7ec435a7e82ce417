use axum::extract::State;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;
use crate::models::Stats;
use crate::util::now_millis;

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<Stats>> {
    let mut conn = state.db.get()?;
    let stats = queries::compute_stats(&mut conn, now_millis())?;
    Ok(Json(stats))
}

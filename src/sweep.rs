//! Periodic maintenance: report licences that lapsed since the last pass
//! and drop revocations whose tokens can no longer be presented anyway.

use std::time::Duration;

use rusqlite::Connection;

use crate::db::{DbPool, queries};
use crate::error::{AppError, Result};
use crate::util::now_millis;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_devices: usize,
    pub purged_revocations: usize,
}

/// One pass covering expiries in `(since, now]`.
pub fn sweep_once(conn: &Connection, since: i64, now: i64) -> Result<SweepReport> {
    let expired = queries::list_devices_expired_between(conn, since, now)?;
    for device in &expired {
        tracing::info!(
            "Licence expired for device {} (shop {}, slot {})",
            device.app_id,
            device.shop_id,
            device.device_slot
        );
    }

    let purged_revocations = queries::purge_expired_revocations(conn, now)?;
    if purged_revocations > 0 {
        tracing::debug!("Purged {} expired token revocations", purged_revocations);
    }

    Ok(SweepReport {
        expired_devices: expired.len(),
        purged_revocations,
    })
}

/// Run the sweep forever, every `interval_secs`.
pub async fn run(pool: DbPool, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    let mut since = now_millis();

    loop {
        interval.tick().await;
        let now = now_millis();

        let result = pool
            .get()
            .map_err(AppError::from)
            .and_then(|conn| sweep_once(&conn, since, now));

        match result {
            Ok(_) => since = now,
            Err(e) => tracing::error!("Expiry sweep failed: {}", e),
        }
    }
}

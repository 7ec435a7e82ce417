use serde::Serialize;

/// Dashboard counters, all taken from one read snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_shops: i64,
    pub total_devices: i64,
    pub active_devices: i64,
    pub unused_product_keys: i64,
    pub used_product_keys: i64,
    /// Shops whose subscription covers the snapshot time
    pub paid_shops: i64,
    pub unpaid_shops: i64,
    pub expired_subscriptions: i64,
    pub pending_subscriptions: i64,
}

//! Response types of the admin API

use serde::Deserialize;

/// A logged-in admin session. Pass it to every call.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub token: String,
    pub email: String,
    /// Token expiry, epoch milliseconds
    pub expires_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Stats {
    pub total_shops: i64,
    pub total_devices: i64,
    pub active_devices: i64,
    pub unused_product_keys: i64,
    pub used_product_keys: i64,
    pub paid_shops: i64,
    pub unpaid_shops: i64,
    pub expired_subscriptions: i64,
    pub pending_subscriptions: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductKey {
    pub id: String,
    pub product_key: String,
    /// `unused` or `used`
    pub status: String,
    pub shop_id: Option<String>,
    pub shop_name: Option<String>,
    pub app_id: Option<String>,
    pub created_at: i64,
    pub activated_at: Option<i64>,
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedKey {
    pub id: String,
    pub product_key: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Shop {
    pub id: String,
    pub name: String,
    pub owner_name: String,
    pub owner_surname: String,
    pub phone_number: String,
    pub services: String,
    pub address: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub device_count: i64,
    pub item_count: i64,
    pub sale_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    pub id: String,
    pub app_id: String,
    pub shop_id: String,
    pub shop_name: Option<String>,
    pub device_slot: i32,
    pub product_key: Option<String>,
    pub registered_at: i64,
    pub activated_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub last_seen: Option<i64>,
    /// `inactive`, `active` or `expired`
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub shop_id: String,
    pub subscription_start: Option<i64>,
    pub subscription_end: Option<i64>,
    pub last_payment_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    /// `pending_payment`, `active` or `expired`
    pub status: String,
    /// `paid` or `unpaid`
    pub payment_status: String,
    pub days_remaining: Option<i64>,
    #[serde(default)]
    pub shop_name: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub owner_surname: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub code: String,
}

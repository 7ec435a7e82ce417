use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Computed from `expires_at` on every read; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceStatus {
    /// Registered but no product key activated yet
    Inactive,
    Active,
    Expired,
}

impl DeviceStatus {
    pub fn at(expires_at: Option<i64>, now: i64) -> Self {
        match expires_at {
            None => Self::Inactive,
            Some(exp) if now < exp => Self::Active,
            Some(_) => Self::Expired,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub app_id: String,
    pub shop_id: String,
    pub device_slot: i32,
    pub product_key: Option<String>,
    pub registered_at: i64,
    pub activated_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub last_seen: Option<i64>,
}

impl Device {
    pub fn status_at(&self, now: i64) -> DeviceStatus {
        DeviceStatus::at(self.expires_at, now)
    }
}

/// Device as shown to admins: with its shop name and current status.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceWithShop {
    #[serde(flatten)]
    pub device: Device,
    pub shop_name: Option<String>,
    pub status: DeviceStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterDevice {
    #[serde(default)]
    pub app_id: Option<String>,
}

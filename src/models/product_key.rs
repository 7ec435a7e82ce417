use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProductKeyStatus {
    Unused,
    Used,
}

/// A licence token issued by an admin and redeemed once by a shop.
///
/// `status == Used` exactly when `shop_id` and `activated_at` are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductKey {
    pub id: String,
    pub product_key: String,
    pub status: ProductKeyStatus,
    pub shop_id: Option<String>,
    /// Installation that redeemed the key
    pub app_id: Option<String>,
    pub created_at: i64,
    pub activated_at: Option<i64>,
    pub expires_at: Option<i64>,
}

impl ProductKey {
    pub fn is_used(&self) -> bool {
        self.status == ProductKeyStatus::Used
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductKeyWithShop {
    #[serde(flatten)]
    pub key: ProductKey,
    pub shop_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductKeyCreated {
    pub id: String,
    pub product_key: String,
    pub created_at: i64,
}

/// Body of a licence renewal on an already registered device.
#[derive(Debug, Deserialize)]
pub struct RenewLicense {
    pub product_key: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivateProductKey {
    pub product_key: String,
    /// Installation to activate; a new device is registered when it is unknown
    #[serde(default)]
    pub app_id: Option<String>,
}

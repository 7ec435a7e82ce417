use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
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
}

/// Shop with counts owned by the device, inventory and sales tables.
#[derive(Debug, Clone, Serialize)]
pub struct ShopWithCounts {
    #[serde(flatten)]
    pub shop: Shop,
    pub device_count: i64,
    pub item_count: i64,
    pub sale_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateShop {
    pub name: String,
    pub owner_name: String,
    pub owner_surname: String,
    pub phone_number: String,
    #[serde(default)]
    pub services: String,
    #[serde(default)]
    pub address: String,
}

impl CreateShop {
    /// Reject blank required fields, naming the first one missing.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("name", &self.name),
            ("owner_name", &self.owner_name),
            ("owner_surname", &self.owner_surname),
            ("phone_number", &self.phone_number),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::BadRequest(format!("{} is required", field)));
            }
        }
        Ok(())
    }
}

/// Partial shop profile update. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateShop {
    pub name: Option<String>,
    pub owner_name: Option<String>,
    pub owner_surname: Option<String>,
    pub phone_number: Option<String>,
    pub services: Option<String>,
    pub address: Option<String>,
}

impl UpdateShop {
    pub fn is_empty(&self) -> bool {
        [
            &self.name,
            &self.owner_name,
            &self.owner_surname,
            &self.phone_number,
            &self.services,
            &self.address,
        ]
        .iter()
        .all(|field| field.is_none())
    }

    /// Overlay the provided fields on `shop`.
    pub fn merged(&self, shop: &Shop) -> CreateShop {
        let pick = |field: &Option<String>, current: &str| {
            field.clone().unwrap_or_else(|| current.to_string())
        };
        CreateShop {
            name: pick(&self.name, &shop.name),
            owner_name: pick(&self.owner_name, &shop.owner_name),
            owner_surname: pick(&self.owner_surname, &shop.owner_surname),
            phone_number: pick(&self.phone_number, &shop.phone_number),
            services: pick(&self.services, &shop.services),
            address: pick(&self.address, &shop.address),
        }
    }
}

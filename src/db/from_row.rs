//! Row mapping for the stored entities.
//!
//! Each `*_COLS` constant lists columns in the order `from_row` reads them,
//! so queries can write `SELECT {COLS} FROM ...` and stay in sync.

use rusqlite::{Connection, Params, Row, types::Type};

use crate::error::Result;
use crate::models::*;

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

pub const ADMIN_COLS: &str = "id, email, password_hash, created_at, last_login_at";

pub const SHOP_COLS: &str =
    "id, name, owner_name, owner_surname, phone_number, services, address, created_at, updated_at";

pub const PRODUCT_KEY_COLS: &str =
    "id, product_key, status, shop_id, app_id, created_at, activated_at, expires_at";

pub const DEVICE_COLS: &str = "id, app_id, shop_id, device_slot, product_key, registered_at, activated_at, expires_at, last_seen";

pub const SUBSCRIPTION_COLS: &str =
    "shop_id, subscription_start, subscription_end, last_payment_date, created_at, updated_at";

/// Prefix every column in a `*_COLS` list with a table alias.
pub fn prefixed(cols: &str, alias: &str) -> String {
    cols.split(", ")
        .map(|c| format!("{}.{}", alias, c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_enum<T: std::str::FromStr>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl FromRow for Admin {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Admin {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            created_at: row.get(3)?,
            last_login_at: row.get(4)?,
        })
    }
}

impl FromRow for Shop {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Shop {
            id: row.get(0)?,
            name: row.get(1)?,
            owner_name: row.get(2)?,
            owner_surname: row.get(3)?,
            phone_number: row.get(4)?,
            services: row.get(5)?,
            address: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

impl FromRow for ProductKey {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ProductKey {
            id: row.get(0)?,
            product_key: row.get(1)?,
            status: parse_enum(row, 2)?,
            shop_id: row.get(3)?,
            app_id: row.get(4)?,
            created_at: row.get(5)?,
            activated_at: row.get(6)?,
            expires_at: row.get(7)?,
        })
    }
}

impl FromRow for Device {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Device {
            id: row.get(0)?,
            app_id: row.get(1)?,
            shop_id: row.get(2)?,
            device_slot: row.get(3)?,
            product_key: row.get(4)?,
            registered_at: row.get(5)?,
            activated_at: row.get(6)?,
            expires_at: row.get(7)?,
            last_seen: row.get(8)?,
        })
    }
}

impl FromRow for Subscription {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Subscription {
            shop_id: row.get(0)?,
            subscription_start: row.get(1)?,
            subscription_end: row.get(2)?,
            last_payment_date: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

pub fn query_one<T: FromRow>(conn: &Connection, sql: &str, params: impl Params) -> Result<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => Ok(Some(T::from_row(row)?)),
        None => Ok(None),
    }
}

pub fn query_all<T: FromRow>(conn: &Connection, sql: &str, params: impl Params) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| T::from_row(row))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

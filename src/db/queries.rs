use rusqlite::{Connection, ErrorCode, TransactionBehavior, params};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::*;
use crate::util::{days_to_millis, generate_product_key, now_millis};

use super::LicensePolicy;
use super::from_row::{
    ADMIN_COLS, DEVICE_COLS, FromRow, PRODUCT_KEY_COLS, SHOP_COLS, SUBSCRIPTION_COLS, prefixed,
    query_all, query_one,
};

/// Prefixed short id, e.g. `SHOP_3f2a9c0d41be`.
fn gen_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &hex[..12])
}

pub fn generate_app_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("APP_{}", &hex[..16])
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

// ============ Admins ============

pub fn create_admin(conn: &Connection, email: &str, password: &str, cost: u32) -> Result<Admin> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("Email and password are required".into()));
    }

    let id = gen_id("ADM_");
    let now = now_millis();
    let password_hash = bcrypt::hash(password, cost)?;

    conn.execute(
        "INSERT INTO admins (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![&id, &email, &password_hash, now],
    )?;

    Ok(Admin {
        id,
        email,
        password_hash,
        created_at: now,
        last_login_at: None,
    })
}

pub fn get_admin_by_id(conn: &Connection, id: &str) -> Result<Option<Admin>> {
    query_one(
        conn,
        &format!("SELECT {} FROM admins WHERE id = ?1", ADMIN_COLS),
        params![id],
    )
}

pub fn get_admin_by_email(conn: &Connection, email: &str) -> Result<Option<Admin>> {
    query_one(
        conn,
        &format!("SELECT {} FROM admins WHERE email = ?1", ADMIN_COLS),
        params![email.trim().to_lowercase()],
    )
}

pub fn count_admins(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))
        .map_err(Into::into)
}

/// Check an email/password pair and record the login.
///
/// Unknown email and wrong password both return `None`.
pub fn verify_admin_login(conn: &Connection, email: &str, password: &str) -> Result<Option<Admin>> {
    let Some(admin) = get_admin_by_email(conn, email)? else {
        return Ok(None);
    };

    if !bcrypt::verify(password, &admin.password_hash)? {
        return Ok(None);
    }

    let now = now_millis();
    conn.execute(
        "UPDATE admins SET last_login_at = ?1 WHERE id = ?2",
        params![now, &admin.id],
    )?;

    Ok(Some(Admin {
        last_login_at: Some(now),
        ..admin
    }))
}

// ============ Revoked Tokens ============

pub fn revoke_token(conn: &Connection, jti: &str, admin_id: &str, expires_at: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO revoked_tokens (jti, admin_id, expires_at, revoked_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![jti, admin_id, expires_at, now_millis()],
    )?;
    Ok(())
}

pub fn is_token_revoked(conn: &Connection, jti: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM revoked_tokens WHERE jti = ?1",
        params![jti],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Drop revocations for tokens that have expired anyway.
pub fn purge_expired_revocations(conn: &Connection, now: i64) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM revoked_tokens WHERE expires_at < ?1",
        params![now],
    )?;
    Ok(deleted)
}

// ============ Shops ============

fn insert_shop(conn: &Connection, input: &CreateShop, now: i64) -> Result<Shop> {
    let id = gen_id("SHOP_");

    conn.execute(
        "INSERT INTO shops (id, name, owner_name, owner_surname, phone_number, services, address, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            &id,
            input.name.trim(),
            input.owner_name.trim(),
            input.owner_surname.trim(),
            input.phone_number.trim(),
            &input.services,
            &input.address,
            now,
            now
        ],
    )?;

    Ok(Shop {
        id,
        name: input.name.trim().to_string(),
        owner_name: input.owner_name.trim().to_string(),
        owner_surname: input.owner_surname.trim().to_string(),
        phone_number: input.phone_number.trim().to_string(),
        services: input.services.clone(),
        address: input.address.clone(),
        created_at: now,
        updated_at: now,
    })
}

/// Create a shop together with its first device (slot 1).
pub fn register_shop(
    conn: &mut Connection,
    input: &CreateShop,
    policy: &LicensePolicy,
    now: i64,
) -> Result<(Shop, Device)> {
    input.validate()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let shop = insert_shop(&tx, input, now)?;
    let device = allocate_device(&tx, &shop.id, &generate_app_id(), policy.max_devices_per_shop, now)?;
    tx.commit()?;

    Ok((shop, device))
}

pub fn get_shop_by_id(conn: &Connection, id: &str) -> Result<Option<Shop>> {
    query_one(
        conn,
        &format!("SELECT {} FROM shops WHERE id = ?1", SHOP_COLS),
        params![id],
    )
}

/// Apply a partial profile update and bump `updated_at`.
///
/// The merged profile must still pass [`CreateShop::validate`].
pub fn update_shop(
    conn: &mut Connection,
    shop_id: &str,
    input: &UpdateShop,
    now: i64,
) -> Result<Shop> {
    if input.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let shop = get_shop_by_id(&tx, shop_id)?
        .ok_or_else(|| AppError::NotFound("Shop not found".into()))?;

    let merged = input.merged(&shop);
    merged.validate()?;

    tx.execute(
        "UPDATE shops
         SET name = ?1, owner_name = ?2, owner_surname = ?3, phone_number = ?4,
             services = ?5, address = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            merged.name.trim(),
            merged.owner_name.trim(),
            merged.owner_surname.trim(),
            merged.phone_number.trim(),
            &merged.services,
            &merged.address,
            now,
            shop_id
        ],
    )?;
    tx.commit()?;

    Ok(Shop {
        name: merged.name.trim().to_string(),
        owner_name: merged.owner_name.trim().to_string(),
        owner_surname: merged.owner_surname.trim().to_string(),
        phone_number: merged.phone_number.trim().to_string(),
        services: merged.services,
        address: merged.address,
        updated_at: now,
        ..shop
    })
}

pub fn list_shops_with_counts(conn: &Connection) -> Result<Vec<ShopWithCounts>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {},
                (SELECT COUNT(*) FROM devices d WHERE d.shop_id = s.id),
                (SELECT COUNT(*) FROM items i WHERE i.shop_id = s.id),
                (SELECT COUNT(*) FROM sales x WHERE x.shop_id = s.id)
         FROM shops s
         ORDER BY s.created_at DESC, s.id",
        prefixed(SHOP_COLS, "s")
    ))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ShopWithCounts {
                shop: Shop::from_row(row)?,
                device_count: row.get(9)?,
                item_count: row.get(10)?,
                sale_count: row.get(11)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Tables holding rows owned by a shop, children before parents.
const SHOP_OWNED_TABLES: [&str; 7] = [
    "sync_logs",
    "debts",
    "sales",
    "items",
    "devices",
    "subscriptions",
    "product_keys",
];

/// Rows removed per table by a shop deletion.
#[derive(Debug, Default)]
pub struct ShopDeletion {
    pub removed: Vec<(&'static str, usize)>,
}

impl ShopDeletion {
    pub fn count(&self, table: &str) -> usize {
        self.removed
            .iter()
            .find(|(t, _)| *t == table)
            .map_or(0, |(_, n)| *n)
    }
}

/// Delete a shop and everything it owns in one transaction.
///
/// Keys the shop redeemed are deleted too; unused keys are untouched.
pub fn delete_shop_cascade(conn: &mut Connection, shop_id: &str) -> Result<ShopDeletion> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if get_shop_by_id(&tx, shop_id)?.is_none() {
        return Err(AppError::NotFound("Shop not found".into()));
    }

    let mut deletion = ShopDeletion::default();
    for table in SHOP_OWNED_TABLES {
        let sql = format!("DELETE FROM {} WHERE shop_id = ?1", table);
        let removed = tx.execute(&sql, params![shop_id])?;
        deletion.removed.push((table, removed));
    }

    tx.execute("DELETE FROM shops WHERE id = ?1", params![shop_id])?;
    tx.commit()?;

    Ok(deletion)
}

// ============ Product Keys ============

const KEY_INSERT_ATTEMPTS: usize = 5;

/// Issue a new unused product key.
pub fn create_product_key(conn: &Connection) -> Result<ProductKey> {
    let now = now_millis();

    for _ in 0..KEY_INSERT_ATTEMPTS {
        let id = gen_id("PK_");
        let key = generate_product_key();

        match conn.execute(
            "INSERT INTO product_keys (id, product_key, status, created_at) VALUES (?1, ?2, 'unused', ?3)",
            params![&id, &key, now],
        ) {
            Ok(_) => {
                return Ok(ProductKey {
                    id,
                    product_key: key,
                    status: ProductKeyStatus::Unused,
                    shop_id: None,
                    app_id: None,
                    created_at: now,
                    activated_at: None,
                    expires_at: None,
                });
            }
            Err(e) if is_constraint_violation(&e) => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Conflict(
        "Could not generate a unique product key".into(),
    ))
}

pub fn get_product_key(conn: &Connection, key: &str) -> Result<Option<ProductKey>> {
    query_one(
        conn,
        &format!("SELECT {} FROM product_keys WHERE product_key = ?1", PRODUCT_KEY_COLS),
        params![key],
    )
}

pub fn list_product_keys_with_shop(conn: &Connection) -> Result<Vec<ProductKeyWithShop>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {}, s.name
         FROM product_keys k
         LEFT JOIN shops s ON s.id = k.shop_id
         ORDER BY k.created_at DESC, k.id",
        prefixed(PRODUCT_KEY_COLS, "k")
    ))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ProductKeyWithShop {
                key: ProductKey::from_row(row)?,
                shop_name: row.get(8)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Result of redeeming a product key for a shop installation.
#[derive(Debug)]
pub struct Activation {
    pub product_key: ProductKey,
    pub device: Device,
    pub subscription: Subscription,
}

/// Expiry after redeeming one key on a device.
///
/// One period is added to the device's remaining time (or to `now` once it
/// has lapsed), and a paid subscription window is never cut short.
pub fn activation_expiry(
    device_expires: Option<i64>,
    subscription_end: Option<i64>,
    period_days: i64,
    now: i64,
) -> i64 {
    let base = device_expires.map_or(now, |exp| exp.max(now));
    let extended = base + days_to_millis(period_days);
    subscription_end.map_or(extended, |end| end.max(extended))
}

/// Redeem `key` for `shop_id` on the installation `app_id`.
///
/// In one IMMEDIATE transaction: marks the key used, registers the
/// installation if it is new, stamps the device's activation and expiry,
/// and opens the shop's subscription if it has none. Any failure rolls
/// everything back.
pub fn activate_product_key(
    conn: &mut Connection,
    shop_id: &str,
    key: &str,
    app_id: Option<&str>,
    policy: &LicensePolicy,
    now: i64,
) -> Result<Activation> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if get_shop_by_id(&tx, shop_id)?.is_none() {
        return Err(AppError::NotFound("Shop not found".into()));
    }

    let existing = get_product_key(&tx, key)?
        .ok_or_else(|| AppError::NotFound("Product key not found".into()))?;

    if existing.is_used() {
        return Err(AppError::AlreadyUsed("Product key has already been used".into()));
    }

    let generated;
    let app_id = match app_id {
        Some(id) => id,
        None => {
            generated = generate_app_id();
            generated.as_str()
        }
    };

    let device = register_device_in(&tx, shop_id, app_id, policy.max_devices_per_shop, now)?
        .into_device();

    let subscription = open_subscription_if_absent(&tx, shop_id, now)?;

    let expires_at = activation_expiry(
        device.expires_at,
        subscription.subscription_end,
        policy.license_period_days,
        now,
    );

    let updated = tx.execute(
        "UPDATE product_keys
         SET status = 'used', shop_id = ?1, app_id = ?2, activated_at = ?3, expires_at = ?4
         WHERE id = ?5 AND status = 'unused'",
        params![shop_id, app_id, now, expires_at, &existing.id],
    )?;
    if updated != 1 {
        return Err(AppError::Conflict("Product key changed during activation".into()));
    }

    tx.execute(
        "UPDATE devices SET product_key = ?1, activated_at = ?2, expires_at = ?3 WHERE id = ?4",
        params![key, now, expires_at, &device.id],
    )?;

    tx.commit()?;

    Ok(Activation {
        product_key: ProductKey {
            status: ProductKeyStatus::Used,
            shop_id: Some(shop_id.to_string()),
            app_id: Some(app_id.to_string()),
            activated_at: Some(now),
            expires_at: Some(expires_at),
            ..existing
        },
        device: Device {
            product_key: Some(key.to_string()),
            activated_at: Some(now),
            expires_at: Some(expires_at),
            ..device
        },
        subscription,
    })
}

// ============ Devices ============

/// Outcome of registering an installation with a shop.
#[derive(Debug)]
pub enum DeviceRegistration {
    /// The app id was already registered to this shop
    Existing(Device),
    Created(Device),
}

impl DeviceRegistration {
    pub fn into_device(self) -> Device {
        match self {
            Self::Existing(d) | Self::Created(d) => d,
        }
    }
}

/// Lowest 1-based slot not present in `taken` (sorted ascending).
pub fn lowest_free_slot(taken: &[i32]) -> i32 {
    let mut candidate = 1;
    for &slot in taken {
        if slot > candidate {
            break;
        }
        if slot == candidate {
            candidate += 1;
        }
    }
    candidate
}

/// Register an installation with a shop, allocating the lowest free slot.
///
/// The whole check-then-insert runs under an IMMEDIATE transaction, so two
/// registrations for the same shop cannot claim the same slot.
pub fn register_device(
    conn: &mut Connection,
    shop_id: &str,
    app_id: Option<&str>,
    max_slots: i32,
    now: i64,
) -> Result<DeviceRegistration> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if get_shop_by_id(&tx, shop_id)?.is_none() {
        return Err(AppError::NotFound("Shop not found".into()));
    }

    let generated;
    let app_id = match app_id {
        Some(id) => id,
        None => {
            generated = generate_app_id();
            generated.as_str()
        }
    };

    let registration = register_device_in(&tx, shop_id, app_id, max_slots, now)?;
    tx.commit()?;
    Ok(registration)
}

/// Registration steps, run inside a caller's transaction.
fn register_device_in(
    conn: &Connection,
    shop_id: &str,
    app_id: &str,
    max_slots: i32,
    now: i64,
) -> Result<DeviceRegistration> {
    if let Some(device) = get_device_by_app_id(conn, app_id)? {
        if device.shop_id != shop_id {
            return Err(AppError::Conflict(
                "App id is registered to another shop".into(),
            ));
        }
        return Ok(DeviceRegistration::Existing(device));
    }

    allocate_device(conn, shop_id, app_id, max_slots, now).map(DeviceRegistration::Created)
}

fn allocate_device(
    conn: &Connection,
    shop_id: &str,
    app_id: &str,
    max_slots: i32,
    now: i64,
) -> Result<Device> {
    let taken: Vec<i32> = {
        let mut stmt =
            conn.prepare("SELECT device_slot FROM devices WHERE shop_id = ?1 ORDER BY device_slot")?;
        stmt.query_map(params![shop_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?
    };

    if max_slots > 0 && taken.len() as i32 >= max_slots {
        return Err(AppError::SlotLimitExceeded { limit: max_slots });
    }

    let slot = lowest_free_slot(&taken);
    let id = gen_id("DEV_");

    conn.execute(
        "INSERT INTO devices (id, app_id, shop_id, device_slot, registered_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, app_id, shop_id, slot, now],
    )?;

    Ok(Device {
        id,
        app_id: app_id.to_string(),
        shop_id: shop_id.to_string(),
        device_slot: slot,
        product_key: None,
        registered_at: now,
        activated_at: None,
        expires_at: None,
        last_seen: None,
    })
}

pub fn get_device_by_app_id(conn: &Connection, app_id: &str) -> Result<Option<Device>> {
    query_one(
        conn,
        &format!("SELECT {} FROM devices WHERE app_id = ?1", DEVICE_COLS),
        params![app_id],
    )
}

pub fn list_devices_for_shop(conn: &Connection, shop_id: &str) -> Result<Vec<Device>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM devices WHERE shop_id = ?1 ORDER BY device_slot",
            DEVICE_COLS
        ),
        params![shop_id],
    )
}

pub fn list_devices_with_shop(conn: &Connection, now: i64) -> Result<Vec<DeviceWithShop>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {}, s.name
         FROM devices d
         LEFT JOIN shops s ON s.id = d.shop_id
         ORDER BY d.registered_at DESC, d.id",
        prefixed(DEVICE_COLS, "d")
    ))?;

    let rows = stmt
        .query_map([], |row| {
            let device = Device::from_row(row)?;
            Ok(DeviceWithShop {
                status: device.status_at(now),
                device,
                shop_name: row.get(9)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Record that an installation checked in.
///
/// Expired devices are refused with `Expired` and nothing is written.
pub fn record_heartbeat(conn: &Connection, app_id: &str, now: i64) -> Result<Device> {
    let device = get_device_by_app_id(conn, app_id)?
        .ok_or_else(|| AppError::NotFound("Device not found".into()))?;

    if device.status_at(now) == DeviceStatus::Expired {
        tracing::warn!(
            "Heartbeat from expired device {} (shop {}, slot {})",
            device.app_id,
            device.shop_id,
            device.device_slot
        );
        return Err(AppError::Expired("Licence for this device has expired".into()));
    }

    conn.execute(
        "UPDATE devices SET last_seen = ?1 WHERE id = ?2",
        params![now, &device.id],
    )?;

    Ok(Device {
        last_seen: Some(now),
        ..device
    })
}

/// Devices whose expiry fell in `(since, now]`.
pub fn list_devices_expired_between(conn: &Connection, since: i64, now: i64) -> Result<Vec<Device>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM devices WHERE expires_at > ?1 AND expires_at <= ?2 ORDER BY expires_at",
            DEVICE_COLS
        ),
        params![since, now],
    )
}

// ============ Subscriptions ============

pub fn get_subscription(conn: &Connection, shop_id: &str) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscriptions WHERE shop_id = ?1",
            SUBSCRIPTION_COLS
        ),
        params![shop_id],
    )
}

/// Return the shop's subscription, creating an unpaid one if it has none.
fn open_subscription_if_absent(conn: &Connection, shop_id: &str, now: i64) -> Result<Subscription> {
    if let Some(existing) = get_subscription(conn, shop_id)? {
        return Ok(existing);
    }

    conn.execute(
        "INSERT INTO subscriptions (shop_id, created_at, updated_at) VALUES (?1, ?2, ?3)",
        params![shop_id, now, now],
    )?;

    Ok(Subscription {
        shop_id: shop_id.to_string(),
        subscription_start: None,
        subscription_end: None,
        last_payment_date: None,
        created_at: now,
        updated_at: now,
    })
}

/// Record a payment for the shop and extend its window by one period.
///
/// The shop's activated devices and used keys are moved to the new end so
/// the licence the client checks follows the subscription.
pub fn mark_subscription_paid(
    conn: &mut Connection,
    shop_id: &str,
    period_days: i64,
    now: i64,
) -> Result<Subscription> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let current = get_subscription(&tx, shop_id)?
        .ok_or_else(|| AppError::NotFound("Subscription not found".into()))?;

    let new_end = current.extended_end(now, period_days);
    let start = current.subscription_start.unwrap_or(now);

    tx.execute(
        "UPDATE subscriptions
         SET subscription_start = ?1, subscription_end = ?2, last_payment_date = ?3, updated_at = ?4
         WHERE shop_id = ?5",
        params![start, new_end, now, now, shop_id],
    )?;

    tx.execute(
        "UPDATE devices SET expires_at = ?1 WHERE shop_id = ?2 AND activated_at IS NOT NULL",
        params![new_end, shop_id],
    )?;

    tx.execute(
        "UPDATE product_keys SET expires_at = ?1 WHERE shop_id = ?2",
        params![new_end, shop_id],
    )?;

    tx.commit()?;

    Ok(Subscription {
        subscription_start: Some(start),
        subscription_end: Some(new_end),
        last_payment_date: Some(now),
        updated_at: now,
        ..current
    })
}

pub fn list_subscriptions_with_shop(conn: &Connection, now: i64) -> Result<Vec<SubscriptionWithShop>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {}, s.name, s.owner_name, s.owner_surname, s.phone_number
         FROM subscriptions sub
         JOIN shops s ON s.id = sub.shop_id
         ORDER BY s.created_at DESC, s.id",
        prefixed(SUBSCRIPTION_COLS, "sub")
    ))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(SubscriptionWithShop {
                subscription: Subscription::from_row(row)?.view_at(now),
                shop_name: row.get(6)?,
                owner_name: row.get(7)?,
                owner_surname: row.get(8)?,
                phone_number: row.get(9)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

// ============ Stats ============

/// Dashboard counters from a single read transaction evaluated at `now`.
pub fn compute_stats(conn: &mut Connection, now: i64) -> Result<Stats> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;

    let total_shops: i64 = tx.query_row("SELECT COUNT(*) FROM shops", [], |row| row.get(0))?;

    let (total_devices, active_devices): (i64, i64) = tx.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(CASE WHEN expires_at IS NOT NULL AND expires_at > ?1 THEN 1 ELSE 0 END), 0)
         FROM devices",
        params![now],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let (unused_product_keys, used_product_keys): (i64, i64) = tx.query_row(
        "SELECT COALESCE(SUM(CASE WHEN status = 'unused' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'used' THEN 1 ELSE 0 END), 0)
         FROM product_keys",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let subscriptions: Vec<Subscription> = query_all(
        &tx,
        &format!("SELECT {} FROM subscriptions", SUBSCRIPTION_COLS),
        [],
    )?;

    tx.commit()?;

    let mut stats = Stats {
        total_shops,
        total_devices,
        active_devices,
        unused_product_keys,
        used_product_keys,
        ..Default::default()
    };

    for sub in &subscriptions {
        match sub.status_at(now) {
            SubscriptionStatus::Active => stats.paid_shops += 1,
            SubscriptionStatus::Expired => stats.expired_subscriptions += 1,
            SubscriptionStatus::PendingPayment => stats.pending_subscriptions += 1,
        }
    }
    stats.unpaid_shops = total_shops - stats.paid_shops;

    Ok(stats)
}

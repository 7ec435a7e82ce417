pub mod from_row;
pub mod queries;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::jwt::SessionSigner;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Licensing rules applied by the registries and the ledger.
#[derive(Debug, Clone, Copy)]
pub struct LicensePolicy {
    pub license_period_days: i64,
    /// 0 = unlimited
    pub max_devices_per_shop: i32,
}

impl Default for LicensePolicy {
    fn default() -> Self {
        Self {
            license_period_days: 30,
            max_devices_per_shop: 3,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub sessions: Arc<SessionSigner>,
    pub policy: LicensePolicy,
}

/// Open a pooled SQLite database file with WAL, foreign keys and a busy timeout.
pub fn create_pool(path: impl AsRef<Path>, max_size: u32) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")
    });
    Pool::builder().max_size(max_size).build(manager)
}

pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS admins (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            last_login_at INTEGER
        );

        CREATE TABLE IF NOT EXISTS revoked_tokens (
            jti TEXT PRIMARY KEY,
            admin_id TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            revoked_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS shops (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            owner_name TEXT NOT NULL,
            owner_surname TEXT NOT NULL,
            phone_number TEXT NOT NULL,
            services TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS product_keys (
            id TEXT PRIMARY KEY,
            product_key TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'unused' CHECK (status IN ('unused', 'used')),
            shop_id TEXT REFERENCES shops(id),
            app_id TEXT,
            created_at INTEGER NOT NULL,
            activated_at INTEGER,
            expires_at INTEGER,
            CHECK ((status = 'used') = (shop_id IS NOT NULL)),
            CHECK ((shop_id IS NULL) = (activated_at IS NULL))
        );

        CREATE TABLE IF NOT EXISTS devices (
            id TEXT PRIMARY KEY,
            app_id TEXT NOT NULL UNIQUE,
            shop_id TEXT NOT NULL REFERENCES shops(id),
            device_slot INTEGER NOT NULL CHECK (device_slot > 0),
            product_key TEXT,
            registered_at INTEGER NOT NULL,
            activated_at INTEGER,
            expires_at INTEGER,
            last_seen INTEGER,
            UNIQUE (shop_id, device_slot)
        );

        CREATE TABLE IF NOT EXISTS subscriptions (
            shop_id TEXT PRIMARY KEY REFERENCES shops(id),
            subscription_start INTEGER,
            subscription_end INTEGER,
            last_payment_date INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Owned by the inventory/sales subsystems; counted and cascade-deleted here.
        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            shop_id TEXT NOT NULL REFERENCES shops(id),
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sales (
            id TEXT PRIMARY KEY,
            shop_id TEXT NOT NULL REFERENCES shops(id),
            item_id TEXT,
            sale_date INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS debts (
            id TEXT PRIMARY KEY,
            shop_id TEXT NOT NULL REFERENCES shops(id),
            customer_name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sync_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            shop_id TEXT NOT NULL REFERENCES shops(id),
            sync_time INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_product_keys_status ON product_keys(status);
        CREATE INDEX IF NOT EXISTS idx_product_keys_shop ON product_keys(shop_id);
        CREATE INDEX IF NOT EXISTS idx_devices_shop ON devices(shop_id);
        CREATE INDEX IF NOT EXISTS idx_devices_expires ON devices(expires_at);
        CREATE INDEX IF NOT EXISTS idx_items_shop ON items(shop_id);
        CREATE INDEX IF NOT EXISTS idx_sales_shop ON sales(shop_id);
        CREATE INDEX IF NOT EXISTS idx_debts_shop ON debts(shop_id);
        CREATE INDEX IF NOT EXISTS idx_sync_logs_shop ON sync_logs(shop_id);
        CREATE INDEX IF NOT EXISTS idx_revoked_tokens_expires ON revoked_tokens(expires_at);
        "#,
    )
}

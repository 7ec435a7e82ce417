use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// HS256 secret for admin session tokens. Required outside dev mode.
    pub jwt_secret: Option<String>,
    pub dev_mode: bool,
    pub session_ttl_hours: u64,
    /// Length of one licence/subscription period in days
    pub license_period_days: i64,
    /// Device slots per shop (0 = unlimited)
    pub max_devices_per_shop: i32,
    pub expiry_sweep_secs: u64,
    pub bcrypt_cost: u32,
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
    /// Allowed CORS origin for the dashboard (None = any)
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("SHOPSYNC_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "shopsync.db".to_string()),
            jwt_secret: env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
            dev_mode,
            session_ttl_hours: parse_var("SESSION_TTL_HOURS", 12),
            license_period_days: parse_var("LICENSE_PERIOD_DAYS", 30),
            max_devices_per_shop: parse_var("MAX_DEVICES_PER_SHOP", 3),
            expiry_sweep_secs: parse_var("EXPIRY_SWEEP_SECS", 300),
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST),
            bootstrap_admin_email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            bootstrap_admin_password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok(),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|s| !s.is_empty()),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

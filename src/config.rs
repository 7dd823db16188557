use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,

    /// HMAC key for the signed session cookie.
    pub session_secret: String,
    /// Session cookie lifetime in seconds.
    pub session_ttl: usize,

    /// Minutes a generated QR code stays scannable.
    pub qr_ttl_minutes: i64,
    /// Fixed timezone of the deployment, minutes east of UTC.
    pub tz_offset_minutes: i32,

    /// Directory holding the QR image and backup CSVs.
    pub static_dir: String,
    /// Overrides the scheme://host derived from the request when set.
    pub base_url: Option<String>,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_scan_per_min: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            session_secret: env::var("SESSION_SECRET").expect("SESSION_SECRET must be set"),
            session_ttl: env::var("SESSION_TTL")
                .unwrap_or_else(|_| "86400".to_string()) // default 1 day
                .parse()
                .unwrap(),
            qr_ttl_minutes: env::var("QR_TTL_MINUTES")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap(),
            tz_offset_minutes: env::var("TZ_OFFSET_MINUTES")
                .unwrap_or_else(|_| "330".to_string()) // default IST
                .parse()
                .unwrap(),
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()),
            base_url: env::var("BASE_URL").ok(),

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_scan_per_min: env::var("RATE_SCAN_PER_MIN")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap(),
        }
    }
}

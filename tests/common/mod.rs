#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;

use actix_web::cookie::Cookie;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use qr_attendance::auth::session::SESSION_COOKIE;
use qr_attendance::auth::token::issue_session;
use qr_attendance::clock::Clock;
use qr_attendance::config::Config;
use qr_attendance::migrate;

pub const SECRET: &str = "test-secret";

pub fn test_config(static_dir: &str) -> Config {
    Config {
        server_addr: "127.0.0.1:0".to_string(),
        database_url: "sqlite::memory:".to_string(),
        session_secret: SECRET.to_string(),
        session_ttl: 86400,
        qr_ttl_minutes: 2,
        tz_offset_minutes: 330,
        static_dir: static_dir.to_string(),
        base_url: None,
        rate_login_per_min: 10_000,
        rate_scan_per_min: 10_000,
    }
}

pub async fn migrated_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate::run(&pool).await.unwrap();
    pool
}

pub fn admin_cookie(config: &Config) -> Cookie<'static> {
    Cookie::new(
        SESSION_COOKIE,
        issue_session(true, HashMap::new(), &config.session_secret, config.session_ttl),
    )
}

pub fn clock() -> Clock {
    Clock::from_offset_minutes(330)
}

pub fn peer() -> SocketAddr {
    "127.0.0.1:8080".parse().unwrap()
}

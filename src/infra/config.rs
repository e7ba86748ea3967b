use std::env;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use secrecy::SecretString;
use time::Duration;

pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub resend_api_key: SecretString,
    pub email_from: String,
    pub app_origin: String,
    pub cors_origin: HeaderValue,
    pub magic_link_ttl_minutes: i64,
    pub bind_addr: SocketAddr,
    pub redis_url: String,
    pub database_url: String,
    /// Idle guest devices are dropped after this many days; any write
    /// refreshes the clock.
    pub guest_ttl_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString =
            SecretString::new(env::var("JWT_SECRET").expect("JWT_SECRET must be set").into());

        let access_token_ttl_secs: i64 = env::var("ACCESS_TOKEN_TTL_SECS")
            .unwrap_or("86400".to_string())
            .parse()
            .expect("ACCESS_TOKEN_TTL_SECS must be a valid number");

        let refresh_token_ttl_days: i64 = env::var("REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or("30".to_string())
            .parse()
            .expect("REFRESH_TOKEN_TTL_DAYS must be a valid number");

        let resend_api_key: SecretString = SecretString::new(
            env::var("RESEND_API_KEY")
                .expect("RESEND_API_KEY must be set")
                .into(),
        );
        let email_from = env::var("EMAIL_FROM").expect("EMAIL_FROM must be set");
        let app_origin = env::var("APP_ORIGIN").expect("APP_ORIGIN must be set");
        let cors_origin: HeaderValue = env::var("CORS_ORIGIN")
            .unwrap_or("http://localhost:3000".to_string())
            .parse()
            .expect("CORS_ORIGIN must be a valid header value");

        let magic_link_ttl_minutes: i64 = env::var("MAGIC_LINK_TTL_MINUTES")
            .unwrap_or("15".to_string())
            .parse()
            .expect("MAGIC_LINK_TTL_MINUTES must be a valid number");

        let bind_addr: SocketAddr = env::var("BIND_ADDR")
            .unwrap_or("127.0.0.1:3001".to_string())
            .parse()
            .expect("BIND_ADDR must be a valid socket address");

        let redis_url =
            env::var("REDIS_URL").unwrap_or("redis://127.0.0.1:6379".to_string());
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let guest_ttl_days: i64 = env::var("GUEST_TTL_DAYS")
            .unwrap_or("90".to_string())
            .parse()
            .expect("GUEST_TTL_DAYS must be a valid number");

        Self {
            jwt_secret,
            access_token_ttl: Duration::seconds(access_token_ttl_secs),
            refresh_token_ttl: Duration::days(refresh_token_ttl_days),
            resend_api_key,
            email_from,
            app_origin,
            cors_origin,
            magic_link_ttl_minutes,
            bind_addr,
            redis_url,
            database_url,
            guest_ttl_days,
        }
    }
}

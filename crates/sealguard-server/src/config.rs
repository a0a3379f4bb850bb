//! Environment-driven server configuration.

use sealguard_auth::config::AuthConfig;
use sealguard_db::DbConfig;

/// Application configuration, populated from environment variables
/// with development defaults.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db: DbConfig,
    pub auth: AuthConfig,
    /// Max requests per rate-limit window.
    pub rate_limit_max: u64,
    /// Rate-limit window in milliseconds.
    pub rate_limit_window_ms: u64,
    /// Initial SUPER_ADMIN credentials, provisioned on boot when set.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        let db = DbConfig {
            url: env_or("DATABASE_URL", "ws://127.0.0.1:8000"),
            namespace: env_or("SURREAL_NAMESPACE", "sealguard"),
            database: env_or("SURREAL_DATABASE", "main"),
            username: env_or("SURREAL_USERNAME", "root"),
            password: env_or("SURREAL_PASSWORD", "root"),
        };

        let auth = AuthConfig {
            jwt_private_key_pem: env_or("JWT_PRIVATE_KEY_PEM", ""),
            jwt_public_key_pem: env_or("JWT_PUBLIC_KEY_PEM", ""),
            access_token_lifetime_secs: env_parse("JWT_EXPIRES_IN_SECS", 86_400),
            jwt_issuer: env_or("JWT_ISSUER", "sealguard"),
            pepper: std::env::var("PASSWORD_PEPPER").ok(),
            min_password_length: env_parse("MIN_PASSWORD_LENGTH", 8),
        };

        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse("PORT", 3000),
            db,
            auth,
            rate_limit_max: env_parse("RATE_LIMIT_MAX", 100),
            rate_limit_window_ms: env_parse("RATE_LIMIT_TIMEWINDOW", 60_000),
            admin_username: std::env::var("SEALGUARD_ADMIN_USERNAME").ok(),
            admin_password: std::env::var("SEALGUARD_ADMIN_PASSWORD").ok(),
        }
    }
}

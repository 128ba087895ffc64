use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
/// Largest TTL whose millisecond value still fits in an `i64`.
pub const MAX_TOKEN_TTL_HOURS: i64 = i64::MAX / MS_PER_HOUR;
const MS_PER_HOUR: i64 = 60 * 60 * 1000;
pub const DEFAULT_SESSION_STORE_PATH: &str = ".session.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub session_store_path: String,
    pub expose_demo_accounts: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            jwt_secret: String::new(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            session_store_path: DEFAULT_SESSION_STORE_PATH.to_string(),
            expose_demo_accounts: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty())
            .unwrap_or_else(|| {
                warn!("JWT_SECRET not set, generating an insecure development secret");
                format!("insecure-dev-key-change-in-production-{}", uuid::Uuid::new_v4())
            });

        let config = Self {
            port: parse_var("PORT", DEFAULT_PORT),
            jwt_secret,
            token_ttl_hours: checked_ttl_hours(parse_var(
                "TOKEN_TTL_HOURS",
                DEFAULT_TOKEN_TTL_HOURS,
            )),
            session_store_path: env::var("SESSION_STORE_PATH")
                .unwrap_or_else(|_| DEFAULT_SESSION_STORE_PATH.to_string()),
            expose_demo_accounts: parse_var("EXPOSE_DEMO_ACCOUNTS", true),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - check environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty() && self.token_ttl_hours > 0
    }

    /// Token lifetime in milliseconds. An out-of-range TTL falls back to the default.
    pub fn token_ttl_ms(&self) -> i64 {
        checked_ttl_hours(self.token_ttl_hours) * MS_PER_HOUR
    }
}

fn checked_ttl_hours(hours: i64) -> i64 {
    if (1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        hours
    } else {
        warn!(
            "TOKEN_TTL_HOURS must be between 1 and {} (got {}), using default",
            MAX_TOKEN_TTL_HOURS, hours
        );
        DEFAULT_TOKEN_TTL_HOURS
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value ({:?}), using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_day_long_tokens() {
        let config = AppConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.token_ttl_ms(), 86_400_000);
        assert!(!config.is_configured());
    }

    #[test]
    fn configured_once_secret_present() {
        let config = AppConfig {
            jwt_secret: "secret".to_string(),
            ..AppConfig::default()
        };
        assert!(config.is_configured());
    }

    #[test]
    fn out_of_range_ttl_falls_back_to_default() {
        assert_eq!(checked_ttl_hours(0), DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(checked_ttl_hours(-5), DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(checked_ttl_hours(9_000_000_000_000), DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(checked_ttl_hours(MAX_TOKEN_TTL_HOURS), MAX_TOKEN_TTL_HOURS);
        assert_eq!(checked_ttl_hours(2), 2);
    }

    #[test]
    fn token_ttl_ms_never_overflows_or_goes_negative() {
        let huge = AppConfig {
            token_ttl_hours: 9_000_000_000_000,
            ..AppConfig::default()
        };
        assert_eq!(huge.token_ttl_ms(), 86_400_000);

        let negative = AppConfig {
            token_ttl_hours: -5,
            ..AppConfig::default()
        };
        assert_eq!(negative.token_ttl_ms(), 86_400_000);

        let largest = AppConfig {
            token_ttl_hours: MAX_TOKEN_TTL_HOURS,
            ..AppConfig::default()
        };
        assert!(largest.token_ttl_ms() > 0);
    }
}

use chrono::Duration;

use shared_config::AppConfig;
use shared_models::auth::PublicUser;

use crate::token::{now_ms, HmacTokenCodec, TokenCodec, UnsignedTokenCodec};

pub const TEST_SECRET: &str = "test-secret-key-for-token-signing-must-be-long-enough";
pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "demo-password-change-me";

pub struct TestConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub expose_demo_accounts: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: TEST_SECRET.to_string(),
            token_ttl_hours: 24,
            expose_demo_accounts: true,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            jwt_secret: self.jwt_secret.clone(),
            token_ttl_hours: self.token_ttl_hours,
            expose_demo_accounts: self.expose_demo_accounts,
            ..AppConfig::default()
        }
    }
}

pub struct TestUser;

impl TestUser {
    pub fn demo() -> PublicUser {
        PublicUser {
            id: 1,
            email: DEMO_EMAIL.to_string(),
            name: "Demo User".to_string(),
        }
    }
}

pub struct TokenTestUtils;

impl TokenTestUtils {
    /// Signed token whose expiry lies `exp_hours` from now (negative for the past).
    pub fn create_test_token(user: &PublicUser, secret: &str, exp_hours: Option<i64>) -> String {
        let ttl = Duration::hours(24).num_milliseconds();
        let wanted = Duration::hours(exp_hours.unwrap_or(24)).num_milliseconds();
        let issued_at = now_ms() + wanted - ttl;

        HmacTokenCodec::new(secret, ttl)
            .encode_at(user, issued_at)
            .expect("test secret is non-empty")
    }

    pub fn create_expired_token(user: &PublicUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &PublicUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token".to_string()
    }

    /// Unsigned demo token that expired an hour ago.
    pub fn create_expired_unsigned_token(user: &PublicUser) -> String {
        let ttl = Duration::hours(24).num_milliseconds();
        let issued_at = now_ms() - ttl - Duration::hours(1).num_milliseconds();

        UnsignedTokenCodec::new(ttl)
            .encode_at(user, issued_at)
            .expect("unsigned encoding does not fail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();
        assert_eq!(config.jwt_secret, TEST_SECRET);
        assert!(config.is_configured());
    }

    #[test]
    fn test_token_creation() {
        let token = TokenTestUtils::create_test_token(&TestUser::demo(), TEST_SECRET, Some(1));
        assert_eq!(token.split('.').count(), 3);

        let codec = HmacTokenCodec::new(TEST_SECRET, 0);
        assert!(codec.decode(&token).is_ok());
        let expired = TokenTestUtils::create_expired_token(&TestUser::demo(), TEST_SECRET);
        assert!(codec.decode(&expired).is_err());
    }

    #[test]
    fn expired_unsigned_token_fails_decode() {
        let token = TokenTestUtils::create_expired_unsigned_token(&TestUser::demo());
        assert!(UnsignedTokenCodec::default().decode(&token).is_err());
    }
}

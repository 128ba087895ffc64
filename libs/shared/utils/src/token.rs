//! Three-segment session tokens: `header.payload.signature`.
//!
//! Two codecs share the same payload shape. [`UnsignedTokenCodec`] reproduces
//! the client-local demo format, whose signature segment is a placeholder that
//! is never checked; anyone can forge one. [`HmacTokenCodec`] signs
//! `header.payload` with HMAC-SHA256 and is what the REST routes hand out.
//! Callers only see the [`TokenCodec`] trait, so the two are interchangeable.

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use shared_models::auth::{PublicUser, TokenClaims, TokenHeader};

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_TTL_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token format - expected 3 parts, got {0}")]
    Malformed(usize),

    #[error("Invalid token encoding")]
    Encoding,

    #[error("Invalid token payload: {0}")]
    Payload(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token secret is not set")]
    MissingSecret,
}

pub trait TokenCodec: Send + Sync {
    fn encode_at(&self, user: &PublicUser, now_ms: i64) -> Result<String, TokenError>;

    fn decode_at(&self, token: &str, now_ms: i64) -> Result<TokenClaims, TokenError>;

    fn encode(&self, user: &PublicUser) -> Result<String, TokenError> {
        self.encode_at(user, now_ms())
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.decode_at(token, now_ms())
    }
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Leading characters of a token, for log lines.
pub fn token_preview(token: &str) -> String {
    let preview: String = token.chars().take(20).collect();
    format!("{}...", preview)
}

fn split_segments(token: &str) -> Result<[&str; 3], TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    match parts.as_slice() {
        [header, payload, signature] => Ok([*header, *payload, *signature]),
        _ => Err(TokenError::Malformed(parts.len())),
    }
}

fn encode_json<E: Engine, T: Serialize>(engine: &E, value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_string(value).map_err(|e| TokenError::Payload(e.to_string()))?;
    Ok(engine.encode(json))
}

fn decode_json<E: Engine, T: DeserializeOwned>(engine: &E, segment: &str) -> Result<T, TokenError> {
    let bytes = engine.decode(segment).map_err(|e| {
        debug!("Failed to decode token segment: {}", e);
        TokenError::Encoding
    })?;
    let json = String::from_utf8(bytes).map_err(|_| TokenError::Encoding)?;
    serde_json::from_str(&json).map_err(|e| TokenError::Payload(e.to_string()))
}

fn check_expiry(claims: TokenClaims, now_ms: i64) -> Result<TokenClaims, TokenError> {
    if claims.is_expired_at(now_ms) {
        debug!("Token expired at {} (now: {})", claims.exp, now_ms);
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

#[derive(Debug, Clone)]
pub struct UnsignedTokenCodec {
    ttl_ms: i64,
}

impl Default for UnsignedTokenCodec {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_MS)
    }
}

impl UnsignedTokenCodec {
    pub fn new(ttl_ms: i64) -> Self {
        Self { ttl_ms }
    }
}

impl TokenCodec for UnsignedTokenCodec {
    fn encode_at(&self, user: &PublicUser, now_ms: i64) -> Result<String, TokenError> {
        let header = encode_json(&STANDARD, &TokenHeader::default())?;
        let payload = encode_json(&STANDARD, &TokenClaims::new(user, now_ms, self.ttl_ms))?;
        let signature = STANDARD.encode(format!("mock-signature-{}", now_ms));

        Ok(format!("{}.{}.{}", header, payload, signature))
    }

    fn decode_at(&self, token: &str, now_ms: i64) -> Result<TokenClaims, TokenError> {
        let [_, payload, _] = split_segments(token)?;
        let claims: TokenClaims = decode_json(&STANDARD, payload)?;
        check_expiry(claims, now_ms)
    }
}

#[derive(Clone)]
pub struct HmacTokenCodec {
    secret: String,
    ttl_ms: i64,
}

impl std::fmt::Debug for HmacTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacTokenCodec")
            .field("ttl_ms", &self.ttl_ms)
            .finish_non_exhaustive()
    }
}

impl HmacTokenCodec {
    pub fn new(secret: impl Into<String>, ttl_ms: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_ms,
        }
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|_| TokenError::MissingSecret)
    }
}

impl TokenCodec for HmacTokenCodec {
    fn encode_at(&self, user: &PublicUser, now_ms: i64) -> Result<String, TokenError> {
        let header = encode_json(&URL_SAFE_NO_PAD, &TokenHeader::default())?;
        let payload = encode_json(&URL_SAFE_NO_PAD, &TokenClaims::new(user, now_ms, self.ttl_ms))?;
        let signing_input = format!("{}.{}", header, payload);

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }

    fn decode_at(&self, token: &str, now_ms: i64) -> Result<TokenClaims, TokenError> {
        let [header_b64, claims_b64, signature_b64] = split_segments(token)?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::InvalidSignature)?;

        let mut mac = self.mac()?;
        mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());
        if mac.verify_slice(&signature).is_err() {
            debug!("Token signature verification failed");
            return Err(TokenError::InvalidSignature);
        }

        let header: TokenHeader = decode_json(&URL_SAFE_NO_PAD, header_b64)?;
        if header.alg != "HS256" {
            return Err(TokenError::InvalidSignature);
        }

        let claims: TokenClaims = decode_json(&URL_SAFE_NO_PAD, claims_b64)?;
        check_expiry(claims, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn demo_user() -> PublicUser {
        PublicUser {
            id: 1,
            email: "demo@example.com".to_string(),
            name: "Demo User".to_string(),
        }
    }

    #[test]
    fn unsigned_token_decodes_back_to_user() {
        let codec = UnsignedTokenCodec::default();
        let token = codec.encode(&demo_user()).unwrap();

        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.user(), demo_user());
        assert_eq!(claims.exp - claims.iat, DEFAULT_TTL_MS);
    }

    #[test]
    fn unsigned_token_has_wire_header() {
        let token = UnsignedTokenCodec::default().encode(&demo_user()).unwrap();
        let header = STANDARD.decode(token.split('.').next().unwrap()).unwrap();
        let header: serde_json::Value = serde_json::from_slice(&header).unwrap();
        assert_eq!(header, serde_json::json!({"alg": "HS256", "typ": "JWT"}));
    }

    #[test]
    fn rejects_wrong_segment_count() {
        let codec = UnsignedTokenCodec::default();
        for token in ["", "abc", "a.b", "a.b.c.d", "a..b.c"] {
            assert_matches!(codec.decode(token), Err(TokenError::Malformed(_)), "{}", token);
        }
    }

    #[test]
    fn rejects_non_json_payload() {
        let codec = UnsignedTokenCodec::default();
        let token = format!("{}.{}.{}", STANDARD.encode("{}"), STANDARD.encode("not json"), "sig");
        assert_matches!(codec.decode(&token), Err(TokenError::Payload(_)));

        let token = "aGVhZGVy.!!!.c2ln";
        assert_matches!(codec.decode(token), Err(TokenError::Encoding));
    }

    #[test]
    fn rejects_expired_token() {
        let codec = UnsignedTokenCodec::default();
        let issued = now_ms() - DEFAULT_TTL_MS - 1_000;
        let token = codec.encode_at(&demo_user(), issued).unwrap();

        assert_matches!(codec.decode(&token), Err(TokenError::Expired));
        assert!(codec.decode_at(&token, issued + DEFAULT_TTL_MS).is_ok());
    }

    #[test]
    fn unsigned_signature_is_not_verified() {
        let codec = UnsignedTokenCodec::default();
        let token = codec.encode(&demo_user()).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[2] = "forged";

        assert!(codec.decode(&parts.join(".")).is_ok());
    }

    #[test]
    fn hmac_token_round_trips_with_same_secret() {
        let codec = HmacTokenCodec::new("secret", DEFAULT_TTL_MS);
        let token = codec.encode(&demo_user()).unwrap();
        assert_eq!(codec.decode(&token).unwrap().id, 1);
    }

    #[test]
    fn hmac_rejects_foreign_signature() {
        let token = HmacTokenCodec::new("other", DEFAULT_TTL_MS)
            .encode(&demo_user())
            .unwrap();
        let codec = HmacTokenCodec::new("secret", DEFAULT_TTL_MS);
        assert_matches!(codec.decode(&token), Err(TokenError::InvalidSignature));

        let unsigned = UnsignedTokenCodec::default().encode(&demo_user()).unwrap();
        assert_matches!(codec.decode(&unsigned), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn configured_ttl_extremes_still_encode() {
        use shared_config::{AppConfig, MAX_TOKEN_TTL_HOURS};

        for hours in [9_000_000_000_000, MAX_TOKEN_TTL_HOURS, -5] {
            let config = AppConfig {
                token_ttl_hours: hours,
                ..AppConfig::default()
            };
            let codec = HmacTokenCodec::new("secret", config.token_ttl_ms());
            let token = codec.encode(&demo_user()).unwrap();
            assert!(codec.decode(&token).is_ok());
        }
    }

    #[test]
    fn hmac_requires_secret() {
        let codec = HmacTokenCodec::new("", DEFAULT_TTL_MS);
        assert_matches!(codec.encode(&demo_user()), Err(TokenError::MissingSecret));
    }

    #[test]
    fn hmac_rejects_expired_token() {
        let codec = HmacTokenCodec::new("secret", 1_000);
        let token = codec.encode_at(&demo_user(), now_ms() - 5_000).unwrap();
        assert_matches!(codec.decode(&token), Err(TokenError::Expired));
    }
}

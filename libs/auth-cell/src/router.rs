use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;
use shared_utils::token::{HmacTokenCodec, TokenCodec};

use crate::credentials::CredentialStore;
use crate::handlers;

#[derive(Clone)]
pub struct AuthApiState {
    pub credentials: Arc<CredentialStore>,
    pub codec: Arc<dyn TokenCodec>,
}

impl AuthApiState {
    /// Demo credential table with HMAC-signed tokens from the configured secret.
    pub fn new(config: &AppConfig) -> Self {
        let codec = HmacTokenCodec::new(config.jwt_secret.clone(), config.token_ttl_ms());
        Self {
            credentials: Arc::new(CredentialStore::demo()),
            codec: Arc::new(codec),
        }
    }
}

pub fn auth_routes(state: AuthApiState) -> Router {
    let public_routes = Router::new()
        .route("/login", post(handlers::login))
        .route("/register", post(handlers::register))
        .route("/users", get(handlers::list_users))
        .route("/logout", post(handlers::logout));

    let protected_routes = Router::new()
        .route("/verify", get(handlers::verify))
        .layer(middleware::from_fn_with_state(state.codec.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

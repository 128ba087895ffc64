use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use auth_cell::router::{auth_routes, AuthApiState};
use listings_cell::{create_listings_router, ListingStore};
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(api_info))
        .nest("/api/auth", auth_routes(AuthApiState::new(&state)))
        .nest("/api/listings", create_listings_router(Arc::new(ListingStore::demo())))
}

async fn api_info() -> Json<Value> {
    Json(json!({
        "message": "Marketplace API Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": {
                "login": "POST /api/auth/login",
                "register": "POST /api/auth/register",
                "verify": "GET /api/auth/verify",
                "users": "GET /api/auth/users",
                "logout": "POST /api/auth/logout",
            },
            "listings": "GET /api/listings",
        },
    }))
}

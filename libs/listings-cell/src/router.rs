use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers::{create_listing, get_listings};
use crate::store::ListingStore;

pub fn create_listings_router(store: Arc<ListingStore>) -> Router {
    Router::new()
        .route("/", get(get_listings).post(create_listing))
        .with_state(store)
}

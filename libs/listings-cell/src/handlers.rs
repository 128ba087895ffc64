use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
};
use serde_json::{json, Value};
use tracing::info;

use shared_models::error::AppError;

use crate::models::{CreateListingRequest, Listing, ListingQuery};
use crate::store::ListingStore;

pub async fn get_listings(
    State(store): State<Arc<ListingStore>>,
    Query(query): Query<ListingQuery>,
) -> Json<Vec<Listing>> {
    Json(store.list(&query).await)
}

pub async fn create_listing(
    State(store): State<Arc<ListingStore>>,
    Json(request): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let listing = store
        .add(request)
        .await
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    info!("Listing received: {} ({})", listing.title, listing.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Listing received!", "listing": listing })),
    ))
}

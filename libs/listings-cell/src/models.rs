use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingImage {
    pub url: String,
    pub thumbnail_url: String,
}

impl ListingImage {
    pub fn placeholder(seed: i64) -> Self {
        Self {
            url: format!("https://picsum.photos/800/600?random={}", seed),
            thumbnail_url: format!("https://picsum.photos/200/150?random={}", seed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub images: Vec<ListingImage>,
    pub price: f64,
    pub category_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<i64>,
    pub user_id: Option<i64>,
    #[serde(default)]
    pub images: Vec<ListingImage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub user_id: Option<i64>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingError {
    #[error("Title is required")]
    MissingTitle,

    #[error("Price must be a non-negative number")]
    InvalidPrice,
}

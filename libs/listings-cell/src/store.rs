use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{CreateListingRequest, Listing, ListingError, ListingImage, ListingQuery};

#[derive(Debug, Default)]
pub struct ListingStore {
    listings: RwLock<Vec<Listing>>,
}

impl ListingStore {
    /// The demo catalogue.
    pub fn demo() -> Self {
        let seed: [(&str, f64, i64, i64); 20] = [
            ("Red Jacket", 100.0, 5, 1),
            ("Gray Couch", 1200.0, 1, 1),
            ("Wooden Chair", 150.0, 1, 2),
            ("MacBook Pro", 2200.0, 3, 3),
            ("iPhone 13", 900.0, 3, 2),
            ("Mountain Bike", 450.0, 4, 1),
            ("Leather Shoes", 120.0, 5, 2),
            ("Office Desk", 300.0, 1, 3),
            ("Gaming Chair", 350.0, 1, 2),
            ("DSLR Camera", 800.0, 3, 1),
            ("Smart Watch", 180.0, 3, 2),
            ("Bluetooth Headphones", 90.0, 3, 1),
            ("Microwave Oven", 250.0, 2, 3),
            ("Refrigerator", 1100.0, 2, 2),
            ("Running Shoes", 140.0, 5, 1),
            ("Coffee Table", 220.0, 1, 3),
            ("Electric Guitar", 600.0, 4, 2),
            ("Air Conditioner", 1300.0, 2, 1),
            ("Backpack", 70.0, 5, 3),
            ("Table Lamp", 60.0, 1, 2),
        ];

        let listings = seed
            .iter()
            .zip(1..)
            .map(|(&(title, price, category_id, user_id), id)| Listing {
                id,
                title: title.to_string(),
                images: vec![ListingImage::placeholder(id)],
                price,
                category_id,
                user_id,
            })
            .collect();

        Self {
            listings: RwLock::new(listings),
        }
    }

    pub async fn list(&self, query: &ListingQuery) -> Vec<Listing> {
        self.listings
            .read()
            .await
            .iter()
            .filter(|l| query.user_id.map_or(true, |id| l.user_id == id))
            .filter(|l| query.category_id.map_or(true, |id| l.category_id == id))
            .cloned()
            .collect()
    }

    pub async fn add(&self, request: CreateListingRequest) -> Result<Listing, ListingError> {
        let title = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ListingError::MissingTitle)?
            .to_string();

        let price = match request.price {
            Some(price) if price.is_finite() && price >= 0.0 => price,
            _ => return Err(ListingError::InvalidPrice),
        };

        let mut listings = self.listings.write().await;
        let listing = Listing {
            id: listings.len() as i64 + 1,
            title,
            images: request.images,
            price,
            category_id: request.category_id.unwrap_or_default(),
            user_id: request.user_id.unwrap_or_default(),
        };
        listings.push(listing.clone());

        debug!("Stored listing {} ({})", listing.id, listing.title);
        Ok(listing)
    }

    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.listings.read().await.is_empty()
    }
}

pub mod handlers;
pub mod models;
pub mod router;
pub mod store;

pub use models::*;
pub use router::create_listings_router;
pub use store::ListingStore;

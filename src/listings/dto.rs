use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::listings::model::{Category, Listing, PickupSlot, PickupStatus, Rating};

#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    pub owner_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub pickup_slots: Vec<PickupSlot>,
}

#[derive(Debug, Serialize)]
pub struct CreatedListingResponse {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct ListingDetails {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    pub pickup_slots: Vec<PickupSlot>,
    pub is_available: bool,
    pub ratings: Vec<Rating>,
    pub average_rating: Option<f64>,
    pub pickup_status: PickupStatus,
}

impl ListingDetails {
    pub fn from_listing(listing: Listing, now: OffsetDateTime) -> Self {
        let average_rating = listing.average_rating();
        let pickup_status = listing.pickup_status(now);
        Self {
            id: listing.id,
            owner_id: listing.owner_id,
            title: listing.title,
            description: listing.description,
            category: listing.category,
            latitude: listing.location.latitude,
            longitude: listing.location.longitude,
            address: listing.address,
            created_at: listing.created_at,
            expires_at: listing.expires_at,
            pickup_slots: listing.pickup_slots,
            is_available: listing.is_available,
            ratings: listing.ratings,
            average_rating,
            pickup_status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SavedListingsResponse {
    pub listing_ids: Vec<Uuid>,
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::FeedConfig;
use crate::geo::GeoPoint;
use crate::listings::model::{Category, Listing, PickupStatus};

use super::filter::FilterConfig;
use super::sort::SortPolicy;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub max_km: Option<f64>,
    /// Comma-separated category names.
    pub categories: Option<String>,
    #[serde(default)]
    pub include_expired: bool,
    #[serde(default)]
    pub sort: SortPolicy,
}

impl FeedQuery {
    /// Coordinates supplied with the request; the ambient location
    /// provider is only consulted when these are absent.
    pub fn explicit_reference(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }

    pub fn filter_config(
        &self,
        reference_point: Option<GeoPoint>,
        defaults: &FeedConfig,
    ) -> FilterConfig {
        let selected_categories = self
            .categories
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        FilterConfig {
            include_expired: self.include_expired,
            selected_categories,
            max_distance_km: self.max_km.unwrap_or(defaults.max_distance_km),
            reference_point,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct FeedItem {
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
    pub average_rating: Option<f64>,
    /// Distance from the request's reference point, when one was known.
    pub distance_km: Option<f64>,
    pub pickup_status: PickupStatus,
}

impl FeedItem {
    pub fn from_listing(
        listing: &Listing,
        reference_point: Option<&GeoPoint>,
        now: OffsetDateTime,
    ) -> Self {
        let distance_km = reference_point
            .filter(|_| listing.location.is_valid())
            .map(|reference| reference.distance_km(&listing.location));
        Self {
            id: listing.id,
            owner_id: listing.owner_id,
            title: listing.title.clone(),
            description: listing.description.clone(),
            category: listing.category.clone(),
            latitude: listing.location.latitude,
            longitude: listing.location.longitude,
            address: listing.address.clone(),
            created_at: listing.created_at,
            expires_at: listing.expires_at,
            average_rating: listing.average_rating(),
            distance_km,
            pickup_status: listing.pickup_status(now),
        }
    }
}

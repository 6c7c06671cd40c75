use serde::Deserialize;

use crate::feed::filter::DEFAULT_MAX_DISTANCE_KM;
use crate::geo::GeoPoint;

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Radius applied when a request does not specify one.
    pub max_distance_km: f64,
    /// Optional deployment-wide fallback reference point.
    pub reference_lat: Option<f64>,
    pub reference_lng: Option<f64>,
}

impl FeedConfig {
    pub fn reference_point(&self) -> Option<GeoPoint> {
        match (self.reference_lat, self.reference_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Absent means: run against the in-memory gateway.
    pub database_url: Option<String>,
    pub feed: FeedConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok();
        let feed = FeedConfig {
            max_distance_km: std::env::var("FEED_MAX_DISTANCE_KM")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(DEFAULT_MAX_DISTANCE_KM),
            reference_lat: std::env::var("FEED_REFERENCE_LAT")
                .ok()
                .and_then(|v| v.parse::<f64>().ok()),
            reference_lng: std::env::var("FEED_REFERENCE_LNG")
                .ok()
                .and_then(|v| v.parse::<f64>().ok()),
        };
        Ok(Self { database_url, feed })
    }
}

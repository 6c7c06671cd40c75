use async_trait::async_trait;

use crate::geo::GeoPoint;

/// Source of the fallback reference point when a request carries no
/// coordinates of its own. Explicit request coordinates always win; this
/// seam only replaces the ambient "current location" a device would
/// provide.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_reference_point(&self) -> Option<GeoPoint>;
}

/// Fixed point taken from configuration; None when the deployment has no
/// meaningful default location.
pub struct FixedLocation {
    point: Option<GeoPoint>,
}

impl FixedLocation {
    pub fn new(point: Option<GeoPoint>) -> Self {
        Self { point }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_reference_point(&self) -> Option<GeoPoint> {
        self.point
    }
}

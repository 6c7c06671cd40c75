use std::collections::HashSet;

use time::OffsetDateTime;

use crate::geo::GeoPoint;
use crate::listings::model::Listing;

/// Floor for the radius filter; smaller or negative configured values are
/// clamped up instead of rejected.
pub const MIN_DISTANCE_KM: f64 = 0.1;

pub const DEFAULT_MAX_DISTANCE_KM: f64 = 10.0;

/// User context the candidate set is narrowed against.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub include_expired: bool,
    /// Category names; empty means no category restriction.
    pub selected_categories: HashSet<String>,
    pub max_distance_km: f64,
    /// No reference point means no distance filter at all: a user with an
    /// unknown location sees listings at any distance.
    pub reference_point: Option<GeoPoint>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include_expired: false,
            selected_categories: HashSet::new(),
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            reference_point: None,
        }
    }
}

/// Narrows the candidate set by expiry, category membership and radius.
/// Produces a fresh sequence; ordering is left to the sort stage.
pub fn filter_listings(
    listings: &[Listing],
    config: &FilterConfig,
    now: OffsetDateTime,
) -> Vec<Listing> {
    let max_km = config.max_distance_km.max(MIN_DISTANCE_KM);
    listings
        .iter()
        .filter(|l| {
            if !config.include_expired && l.is_expired(now) {
                return false;
            }
            if !config.selected_categories.is_empty()
                && !config.selected_categories.contains(&l.category.name)
            {
                return false;
            }
            if let Some(reference) = &config.reference_point {
                // Fetch should have guaranteed structural validity; a
                // listing with unusable coordinates is dropped, not an error.
                if !l.location.is_valid() {
                    return false;
                }
                if reference.distance_km(&l.location) > max_km {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::model::fixtures::{category, id, listing, NOW};
    use time::Duration;

    #[test]
    fn expired_listings_are_dropped_with_strict_boundary() {
        let mut stale = listing(1, "Old bread");
        stale.expires_at = Some(NOW - Duration::minutes(1));
        let mut boundary = listing(2, "Boundary bread");
        boundary.expires_at = Some(NOW);
        let fresh = listing(3, "Fresh bread");

        let out = filter_listings(
            &[stale.clone(), boundary, fresh],
            &FilterConfig::default(),
            NOW,
        );
        let ids: Vec<_> = out.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![id(2), id(3)], "expiring exactly now survives");

        let all = filter_listings(
            &[stale],
            &FilterConfig {
                include_expired: true,
                ..FilterConfig::default()
            },
            NOW,
        );
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn null_expiry_is_unaffected_by_include_expired() {
        let l = listing(1, "Preserves");
        for include_expired in [false, true] {
            let out = filter_listings(
                &[l.clone()],
                &FilterConfig {
                    include_expired,
                    ..FilterConfig::default()
                },
                NOW + Duration::days(3650),
            );
            assert_eq!(out.len(), 1);
        }
    }

    #[test]
    fn category_filter_keeps_members_only() {
        let mut bakery = listing(1, "Rolls");
        bakery.category = category("Bakery");
        let meals = listing(2, "Stew");

        let config = FilterConfig {
            selected_categories: ["Bakery".to_string()].into_iter().collect(),
            ..FilterConfig::default()
        };
        let out = filter_listings(&[bakery, meals.clone()], &config, NOW);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, id(1));

        // Empty selection means no restriction
        let out = filter_listings(&[meals], &FilterConfig::default(), NOW);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn distance_filter_is_inclusive_at_the_boundary() {
        let reference = GeoPoint::new(52.5200, 13.4050);
        let mut near = listing(1, "Near");
        near.location = GeoPoint::new(52.3906, 13.0645); // Potsdam, ~27 km
        let mut far = listing(2, "Far");
        far.location = GeoPoint::new(53.5511, 9.9937); // Hamburg, ~255 km

        // Radius set to exactly the near listing's distance
        let config = FilterConfig {
            reference_point: Some(reference),
            max_distance_km: reference.distance_km(&near.location),
            ..FilterConfig::default()
        };
        let out = filter_listings(&[near, far], &config, NOW);
        assert_eq!(out.len(), 1, "exactly-at-radius listing is included");
        assert_eq!(out[0].id, id(1));
    }

    #[test]
    fn no_reference_point_means_no_distance_filter() {
        let mut far = listing(1, "Far");
        far.location = GeoPoint::new(-33.8688, 151.2093);
        let out = filter_listings(&[far], &FilterConfig::default(), NOW);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn unusable_coordinates_are_dropped_only_when_filtering_by_distance() {
        let mut broken = listing(1, "Broken");
        broken.location = GeoPoint::new(f64::NAN, 13.4);

        let out = filter_listings(&[broken.clone()], &FilterConfig::default(), NOW);
        assert_eq!(out.len(), 1);

        let config = FilterConfig {
            reference_point: Some(GeoPoint::new(52.52, 13.405)),
            ..FilterConfig::default()
        };
        let out = filter_listings(&[broken], &config, NOW);
        assert!(out.is_empty());
    }

    #[test]
    fn negative_radius_is_clamped_not_empty() {
        let reference = GeoPoint::new(52.5200, 13.4050);
        let here = listing(1, "Here");

        let config = FilterConfig {
            reference_point: Some(reference),
            max_distance_km: -5.0,
            ..FilterConfig::default()
        };
        // Clamped to the 0.1 km floor, so a listing at the reference
        // point itself still shows up.
        let out = filter_listings(&[here], &config, NOW);
        assert_eq!(out.len(), 1);
    }
}

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::listings::model::Listing;

/// Interchangeable feed orderings. Every policy ends in an id tiebreak so
/// identical inputs always produce the identical sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortPolicy {
    Distance,
    #[default]
    Newest,
    Expiry,
}

/// Imposes a strict total order on the filtered sequence. Consumes and
/// returns a fresh Vec; the caller's working set is never reordered in
/// place.
pub fn sort_listings(
    listings: Vec<Listing>,
    policy: SortPolicy,
    reference_point: Option<&GeoPoint>,
) -> Vec<Listing> {
    match policy {
        SortPolicy::Newest => {
            let mut out = listings;
            out.sort_by(newest_cmp);
            out
        }
        SortPolicy::Expiry => {
            let mut out = listings;
            out.sort_by(expiry_cmp);
            out
        }
        SortPolicy::Distance => match reference_point {
            // Without a reference point the policy degrades to a no-op.
            None => listings,
            Some(reference) => {
                let mut keyed: Vec<(f64, Listing)> = listings
                    .into_iter()
                    .map(|l| (reference.distance_km(&l.location), l))
                    .collect();
                keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
                keyed.into_iter().map(|(_, l)| l).collect()
            }
        },
    }
}

pub(crate) fn newest_cmp(a: &Listing, b: &Listing) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

fn expiry_cmp(a: &Listing, b: &Listing) -> Ordering {
    match (a.expires_at, b.expires_at) {
        // Urgency first: anything with an expiry precedes open-ended listings.
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => newest_cmp(a, b),
    }
}

use std::collections::HashSet;
use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::gateway::{GatewayError, StorageGateway};
use crate::listings::model::{Category, Listing};

use super::filter::{filter_listings, FilterConfig};
use super::session::{FeedCache, FeedSnapshot};
use super::sort::{newest_cmp, sort_listings, SortPolicy};

pub const RECOMMENDED_FEED_LIMIT: usize = 10;

/// Fetch stage: one round trip to the store, normalized and committed
/// through the cache's sequence guard. Returns whichever snapshot ends up
/// visible: this refresh's, or a newer one that beat it.
pub async fn refresh(
    gateway: &dyn StorageGateway,
    cache: &FeedCache,
) -> Result<Arc<FeedSnapshot>, GatewayError> {
    let ticket = cache.begin();
    let listings = gateway.fetch_available_listings().await?;
    let categories = gateway.fetch_categories().await?;
    let snapshot = FeedSnapshot {
        listings: normalize_listings(listings),
        categories: load_categories(categories),
        fetched_at: OffsetDateTime::now_utc(),
    };
    tracing::debug!(
        listings = snapshot.listings.len(),
        categories = snapshot.categories.len(),
        fetched_at = %snapshot.fetched_at,
        "feed snapshot fetched"
    );
    Ok(cache.commit(ticket, snapshot).snapshot())
}

/// Newest-first base ordering so downstream comparators that fall back to
/// recency start from a stable sequence.
pub fn normalize_listings(mut listings: Vec<Listing>) -> Vec<Listing> {
    listings.sort_by(newest_cmp);
    listings
}

/// The store permits duplicate category names; resolve them here. Sorting
/// by name then id before the dedup makes the surviving record the same on
/// every load of the same input. An empty store falls back to the default
/// set.
pub fn load_categories(fetched: Vec<Category>) -> Vec<Category> {
    let mut categories = if fetched.is_empty() {
        Category::default_set()
    } else {
        fetched
    };
    categories.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    categories.dedup_by(|a, b| a.name == b.name);
    categories
}

/// Filter then sort, always over a copy of the committed snapshot.
pub fn nearby_feed(
    snapshot: &FeedSnapshot,
    config: &FilterConfig,
    policy: SortPolicy,
    now: OffsetDateTime,
) -> Vec<Listing> {
    let filtered = filter_listings(&snapshot.listings, config, now);
    sort_listings(filtered, policy, config.reference_point.as_ref())
}

/// Listings the nearby feed did not show, newest first, capped. No
/// personalization; a plain difference-and-cap step.
pub fn recommended_feed(all: &[Listing], nearby: &[Listing]) -> Vec<Listing> {
    let shown: HashSet<Uuid> = nearby.iter().map(|l| l.id).collect();
    let rest: Vec<Listing> = all
        .iter()
        .filter(|l| !shown.contains(&l.id))
        .cloned()
        .collect();
    let mut out = sort_listings(rest, SortPolicy::Newest, None);
    out.truncate(RECOMMENDED_FEED_LIMIT);
    out
}

/// Case-insensitive substring match over title, description and category
/// name. An empty query yields an empty result; "no query entered" is a
/// distinct state the caller handles before getting here.
pub fn search(query: &str, within: &[Listing]) -> Vec<Listing> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    within
        .iter()
        .filter(|l| {
            l.title.to_lowercase().contains(&needle)
                || l.description.to_lowercase().contains(&needle)
                || l.category.name.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

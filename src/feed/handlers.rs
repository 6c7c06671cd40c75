use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, instrument};

use crate::geo::GeoPoint;
use crate::listings::model::Category;
use crate::state::AppState;

use super::dto::{FeedItem, FeedQuery, SearchQuery};
use super::services;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/feed", get(get_feed))
        .route("/feed/recommended", get(get_recommended))
        .route("/feed/search", get(search_feed))
        .route("/categories", get(list_categories))
}

async fn resolve_reference(query: &FeedQuery, state: &AppState) -> Option<GeoPoint> {
    match query.explicit_reference() {
        Some(point) => Some(point),
        None => state.location.current_reference_point().await,
    }
}

#[instrument(skip(state))]
pub async fn get_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<FeedItem>>, (StatusCode, String)> {
    let reference = resolve_reference(&query, &state).await;
    let snapshot = services::refresh(state.gateway.as_ref(), &state.feed)
        .await
        .map_err(store_unavailable)?;
    let config = query.filter_config(reference, &state.config.feed);
    let now = OffsetDateTime::now_utc();

    let nearby = services::nearby_feed(&snapshot, &config, query.sort, now);
    let items = nearby
        .iter()
        .map(|l| FeedItem::from_listing(l, reference.as_ref(), now))
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_recommended(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<FeedItem>>, (StatusCode, String)> {
    let reference = resolve_reference(&query, &state).await;
    let snapshot = services::refresh(state.gateway.as_ref(), &state.feed)
        .await
        .map_err(store_unavailable)?;
    let config = query.filter_config(reference, &state.config.feed);
    let now = OffsetDateTime::now_utc();

    let nearby = services::nearby_feed(&snapshot, &config, query.sort, now);
    let recommended = services::recommended_feed(&snapshot.listings, &nearby);
    let items = recommended
        .iter()
        .map(|l| FeedItem::from_listing(l, reference.as_ref(), now))
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn search_feed(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<FeedItem>>, (StatusCode, String)> {
    let snapshot = services::refresh(state.gateway.as_ref(), &state.feed)
        .await
        .map_err(store_unavailable)?;
    let now = OffsetDateTime::now_utc();

    let hits = services::search(&query.q, &snapshot.listings);
    let items = hits
        .iter()
        .map(|l| FeedItem::from_listing(l, None, now))
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, (StatusCode, String)> {
    let snapshot = services::refresh(state.gateway.as_ref(), &state.feed)
        .await
        .map_err(store_unavailable)?;
    Ok(Json(snapshot.categories.clone()))
}

fn store_unavailable<E: std::error::Error>(e: E) -> (StatusCode, String) {
    error!(error = %e, "storage gateway fetch failed");
    (StatusCode::BAD_GATEWAY, "store unavailable, retry".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;
    use crate::listings::model::fixtures::{id, listing};
    use crate::listings::model::Listing;
    use crate::location::FixedLocation;
    use std::sync::Arc;

    fn state_with(gateway: Arc<InMemoryGateway>) -> AppState {
        let fake = AppState::fake();
        AppState::from_parts(fake.config, gateway, Arc::new(FixedLocation::new(None)))
    }

    fn feed_query() -> FeedQuery {
        FeedQuery {
            lat: None,
            lng: None,
            max_km: None,
            categories: None,
            include_expired: false,
            sort: Default::default(),
        }
    }

    #[tokio::test]
    async fn feed_serves_available_listings() {
        let mut reserved = listing(2, "Gone");
        reserved.is_available = false;
        let listings: Vec<Listing> = vec![listing(1, "Soup"), reserved];
        let gateway = Arc::new(InMemoryGateway::new().with_listings(listings));
        let state = state_with(gateway);

        let Json(items) = get_feed(State(state), Query(feed_query()))
            .await
            .expect("feed");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, id(1));
        assert!(items[0].distance_km.is_none(), "no reference point known");
    }

    #[tokio::test]
    async fn recommended_is_disjoint_from_nearby() {
        let gateway = Arc::new(
            InMemoryGateway::new().with_listings(vec![listing(1, "Soup"), listing(2, "Rolls")]),
        );
        let state = state_with(gateway);

        let Json(nearby) = get_feed(State(state.clone()), Query(feed_query()))
            .await
            .expect("feed");
        let Json(recommended) = get_recommended(State(state), Query(feed_query()))
            .await
            .expect("recommended");
        // Everything is nearby here, so nothing is left to recommend
        assert_eq!(nearby.len(), 2);
        assert!(recommended.is_empty());
    }

    #[tokio::test]
    async fn search_on_empty_query_returns_empty() {
        let state = AppState::fake();
        let Json(items) = search_feed(
            State(state),
            Query(SearchQuery {
                q: String::new(),
            }),
        )
        .await
        .expect("search");
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn unreachable_store_maps_to_bad_gateway() {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway.set_offline(true);
        let state = state_with(Arc::clone(&gateway));

        let (status, _) = get_feed(State(state), Query(feed_query()))
            .await
            .expect_err("offline store should fail");
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn categories_fall_back_to_defaults() {
        let state = AppState::fake();
        let Json(categories) = list_categories(State(state)).await.expect("categories");
        assert!(categories.iter().any(|c| c.name == "Meals"));
    }
}

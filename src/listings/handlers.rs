use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::feed::services::load_categories;
use crate::geo::GeoPoint;
use crate::state::AppState;

use super::dto::{
    CreateListingRequest, CreatedListingResponse, ListingDetails, SavedListingsResponse,
};
use super::model::Listing;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/listings", post(create_listing))
        .route("/listings/:id", get(get_listing))
        .route("/listings/:id/reserve", post(reserve_listing))
        .route("/users/:id/saved", get(saved_listings))
        .route(
            "/users/:id/saved/:listing_id",
            put(save_listing).delete(unsave_listing),
        )
}

#[instrument(skip(state, body))]
pub async fn create_listing(
    State(state): State<AppState>,
    Json(body): Json<CreateListingRequest>,
) -> Result<(StatusCode, HeaderMap, Json<CreatedListingResponse>), (StatusCode, String)> {
    if body.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "title must be non-empty".into()));
    }
    let location = GeoPoint::new(body.latitude, body.longitude);
    if !location.is_valid() {
        return Err((StatusCode::BAD_REQUEST, "invalid coordinates".into()));
    }
    for slot in &body.pickup_slots {
        if slot.weekday > 6 {
            return Err((
                StatusCode::BAD_REQUEST,
                "pickup slot weekday must be 0-6".into(),
            ));
        }
        if slot.end < slot.start {
            return Err((
                StatusCode::BAD_REQUEST,
                "pickup slot must not end before it starts".into(),
            ));
        }
    }

    // Denormalize the category record into the listing, as the feed
    // serves it without a join.
    let categories = state
        .gateway
        .fetch_categories()
        .await
        .map(load_categories)
        .map_err(internal)?;
    let Some(category) = categories.into_iter().find(|c| c.id == body.category_id) else {
        return Err((StatusCode::BAD_REQUEST, "unknown category".into()));
    };

    let listing = Listing {
        id: Uuid::new_v4(),
        owner_id: body.owner_id,
        title: body.title,
        description: body.description,
        category,
        location,
        address: body.address,
        created_at: OffsetDateTime::now_utc(),
        expires_at: body.expires_at,
        pickup_slots: body.pickup_slots,
        is_available: true,
        ratings: Vec::new(),
    };
    state
        .gateway
        .insert_listing(&listing)
        .await
        .map_err(internal)?;

    let mut headers = HeaderMap::new();
    if let Ok(location_header) = format!("/api/v1/listings/{}", listing.id).parse() {
        headers.insert(axum::http::header::LOCATION, location_header);
    }
    Ok((
        StatusCode::CREATED,
        headers,
        Json(CreatedListingResponse {
            id: listing.id,
            created_at: listing.created_at,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ListingDetails>, (StatusCode, String)> {
    match state.gateway.fetch_listing(id).await {
        Ok(Some(listing)) => Ok(Json(ListingDetails::from_listing(
            listing,
            OffsetDateTime::now_utc(),
        ))),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Listing not found".into())),
        Err(e) => {
            error!(error = %e, %id, "get_listing failed");
            Err(internal(e))
        }
    }
}

#[instrument(skip(state))]
pub async fn reserve_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let found = state.gateway.set_unavailable(id).await.map_err(internal)?;
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Listing not found".into()))
    }
}

#[instrument(skip(state))]
pub async fn saved_listings(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SavedListingsResponse>, (StatusCode, String)> {
    let listing_ids = state.gateway.fetch_saved(user_id).await.map_err(internal)?;
    Ok(Json(SavedListingsResponse { listing_ids }))
}

#[instrument(skip(state))]
pub async fn save_listing(
    State(state): State<AppState>,
    Path((user_id, listing_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .gateway
        .save_listing(user_id, listing_id)
        .await
        .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn unsave_listing(
    State(state): State<AppState>,
    Path((user_id, listing_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .gateway
        .unsave_listing(user_id, listing_id)
        .await
        .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

fn internal<E: std::error::Error>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::model::fixtures::id;

    fn request() -> CreateListingRequest {
        CreateListingRequest {
            owner_id: id(0xFF),
            title: "Half a pumpkin".to_string(),
            description: "Cut this morning".to_string(),
            // "Meals" from the default category set
            category_id: Uuid::from_u128(0x01),
            latitude: 52.52,
            longitude: 13.405,
            address: None,
            expires_at: None,
            pickup_slots: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_rejects_blank_title_and_bad_slots() {
        let state = AppState::fake();

        let mut blank = request();
        blank.title = "   ".to_string();
        let (status, _) = create_listing(State(state.clone()), Json(blank))
            .await
            .expect_err("blank title");
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut bad_weekday = request();
        bad_weekday.pickup_slots = vec![crate::listings::model::PickupSlot {
            weekday: 7,
            start: time::macros::time!(09:00),
            end: time::macros::time!(12:00),
        }];
        let (status, _) = create_listing(State(state), Json(bad_weekday))
            .await
            .expect_err("weekday out of range");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_rejects_unknown_category() {
        let state = AppState::fake();
        let mut body = request();
        body.category_id = id(0xDEAD);
        let (status, msg) = create_listing(State(state), Json(body))
            .await
            .expect_err("unknown category");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(msg.contains("category"));
    }

    #[tokio::test]
    async fn create_then_fetch_and_reserve() {
        let state = AppState::fake();

        let (status, _, Json(created)) = create_listing(State(state.clone()), Json(request()))
            .await
            .expect("create");
        assert_eq!(status, StatusCode::CREATED);

        let Json(details) = get_listing(State(state.clone()), Path(created.id))
            .await
            .expect("fetch");
        assert_eq!(details.title, "Half a pumpkin");
        assert_eq!(details.category.name, "Meals");
        assert!(details.is_available);

        let status = reserve_listing(State(state.clone()), Path(created.id))
            .await
            .expect("reserve");
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(details) = get_listing(State(state), Path(created.id))
            .await
            .expect("fetch reserved");
        assert!(!details.is_available);
    }

    #[tokio::test]
    async fn missing_listing_is_not_found() {
        let state = AppState::fake();
        let (status, _) = get_listing(State(state.clone()), Path(id(0x123)))
            .await
            .expect_err("missing");
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = reserve_listing(State(state), Path(id(0x123)))
            .await
            .expect_err("missing");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn saved_listings_round_trip() {
        let state = AppState::fake();
        let user = id(0xAB);

        let status = save_listing(State(state.clone()), Path((user, id(1))))
            .await
            .expect("save");
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(saved) = saved_listings(State(state.clone()), Path(user))
            .await
            .expect("saved");
        assert_eq!(saved.listing_ids, vec![id(1)]);

        unsave_listing(State(state.clone()), Path((user, id(1))))
            .await
            .expect("unsave");
        let Json(saved) = saved_listings(State(state), Path(user))
            .await
            .expect("saved after unsave");
        assert!(saved.listing_ids.is_empty());
    }
}

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::listings::model::{Category, Listing, PickupSlot, Rating};

use super::{GatewayError, StorageGateway};

#[derive(Clone)]
pub struct PgStorageGateway {
    db: PgPool,
}

impl PgStorageGateway {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Raw listing row. Pickup slots and ratings stay `serde_json::Value`
/// here so one bad record can be skipped instead of failing the whole
/// fetch.
#[derive(Debug, FromRow)]
struct ListingRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: String,
    category_id: Uuid,
    category_name: String,
    category_icon: String,
    latitude: f64,
    longitude: f64,
    address: Option<String>,
    created_at: OffsetDateTime,
    expires_at: Option<OffsetDateTime>,
    pickup_slots: serde_json::Value,
    ratings: serde_json::Value,
    is_available: bool,
}

impl TryFrom<ListingRow> for Listing {
    type Error = GatewayError;

    fn try_from(row: ListingRow) -> Result<Self, GatewayError> {
        let pickup_slots: Vec<PickupSlot> =
            serde_json::from_value(row.pickup_slots).map_err(|e| GatewayError::RecordDecode {
                id: row.id,
                reason: format!("pickup_slots: {e}"),
            })?;
        let ratings: Vec<Rating> =
            serde_json::from_value(row.ratings).map_err(|e| GatewayError::RecordDecode {
                id: row.id,
                reason: format!("ratings: {e}"),
            })?;
        Ok(Listing {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            category: Category {
                id: row.category_id,
                name: row.category_name,
                icon: row.category_icon,
            },
            location: GeoPoint::new(row.latitude, row.longitude),
            address: row.address,
            created_at: row.created_at,
            expires_at: row.expires_at,
            pickup_slots,
            is_available: row.is_available,
            ratings,
        })
    }
}

const LISTING_COLUMNS: &str = r#"
    id, owner_id, title, description,
    category_id, category_name, category_icon,
    latitude, longitude, address,
    created_at, expires_at, pickup_slots, ratings, is_available
"#;

fn remote(e: sqlx::Error) -> GatewayError {
    GatewayError::RemoteFetch(e.into())
}

#[async_trait]
impl StorageGateway for PgStorageGateway {
    async fn fetch_available_listings(&self) -> Result<Vec<Listing>, GatewayError> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            r#"
            SELECT {LISTING_COLUMNS}
            FROM listings
            WHERE is_available = TRUE
            ORDER BY created_at DESC
            "#
        ))
        .fetch_all(&self.db)
        .await
        .map_err(remote)?;

        let mut listings = Vec::with_capacity(rows.len());
        for row in rows {
            match Listing::try_from(row) {
                Ok(l) => listings.push(l),
                Err(e) => warn!(error = %e, "skipping undecodable listing"),
            }
        }
        Ok(listings)
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, GatewayError> {
        let rows = sqlx::query_as::<_, (Uuid, String, String)>(
            r#"
            SELECT id, name, icon
            FROM categories
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(remote)?;

        Ok(rows
            .into_iter()
            .map(|(id, name, icon)| Category { id, name, icon })
            .collect())
    }

    async fn fetch_listing(&self, id: Uuid) -> Result<Option<Listing>, GatewayError> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            r#"
            SELECT {LISTING_COLUMNS}
            FROM listings
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(remote)?;

        row.map(Listing::try_from).transpose()
    }

    async fn insert_listing(&self, listing: &Listing) -> Result<(), GatewayError> {
        sqlx::query(
            r#"
            INSERT INTO listings (
                id, owner_id, title, description,
                category_id, category_name, category_icon,
                latitude, longitude, address,
                created_at, expires_at, pickup_slots, ratings, is_available
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(listing.id)
        .bind(listing.owner_id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.category.id)
        .bind(&listing.category.name)
        .bind(&listing.category.icon)
        .bind(listing.location.latitude)
        .bind(listing.location.longitude)
        .bind(&listing.address)
        .bind(listing.created_at)
        .bind(listing.expires_at)
        .bind(Json(&listing.pickup_slots))
        .bind(Json(&listing.ratings))
        .bind(listing.is_available)
        .execute(&self.db)
        .await
        .map_err(remote)?;
        Ok(())
    }

    async fn set_unavailable(&self, id: Uuid) -> Result<bool, GatewayError> {
        let result = sqlx::query(
            r#"
            UPDATE listings
            SET is_available = FALSE
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(remote)?;
        Ok(result.rows_affected() > 0)
    }

    async fn fetch_saved(&self, user_id: Uuid) -> Result<Vec<Uuid>, GatewayError> {
        let rows = sqlx::query_as::<_, (Uuid,)>(
            r#"
            SELECT listing_id
            FROM saved_items
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(remote)?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn save_listing(&self, user_id: Uuid, listing_id: Uuid) -> Result<(), GatewayError> {
        sqlx::query(
            r#"
            INSERT INTO saved_items (user_id, listing_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, listing_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(listing_id)
        .execute(&self.db)
        .await
        .map_err(remote)?;
        Ok(())
    }

    async fn unsave_listing(&self, user_id: Uuid, listing_id: Uuid) -> Result<(), GatewayError> {
        sqlx::query(
            r#"
            DELETE FROM saved_items
            WHERE user_id = $1 AND listing_id = $2
            "#,
        )
        .bind(user_id)
        .bind(listing_id)
        .execute(&self.db)
        .await
        .map_err(remote)?;
        Ok(())
    }
}

//! Storage gateway: the seam between the feed pipeline and whatever
//! document store actually holds users, listings and categories.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::listings::model::{Category, Listing};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryGateway;
pub use postgres::PgStorageGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The store is unreachable or returned a malformed top-level
    /// response. Recoverable: callers may retry.
    #[error("remote fetch failed: {0}")]
    RemoteFetch(#[source] anyhow::Error),

    /// A single record failed to decode. Absorbed inside the fetch
    /// implementations (the record is skipped); never escalated to a
    /// whole-fetch failure.
    #[error("record {id} failed to decode: {reason}")]
    RecordDecode { id: Uuid, reason: String },
}

#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// All listings still flagged available. Records that fail to decode
    /// are skipped, not fatal.
    async fn fetch_available_listings(&self) -> Result<Vec<Listing>, GatewayError>;

    /// The raw category set; duplicates by name are possible and left for
    /// the feed to resolve.
    async fn fetch_categories(&self) -> Result<Vec<Category>, GatewayError>;

    /// One listing by id, available or not.
    async fn fetch_listing(&self, id: Uuid) -> Result<Option<Listing>, GatewayError>;

    async fn insert_listing(&self, listing: &Listing) -> Result<(), GatewayError>;

    /// Flips `is_available` off (reserve/withdraw). Returns false when the
    /// listing does not exist.
    async fn set_unavailable(&self, id: Uuid) -> Result<bool, GatewayError>;

    /// Listing ids the user has bookmarked.
    async fn fetch_saved(&self, user_id: Uuid) -> Result<Vec<Uuid>, GatewayError>;

    async fn save_listing(&self, user_id: Uuid, listing_id: Uuid) -> Result<(), GatewayError>;

    async fn unsave_listing(&self, user_id: Uuid, listing_id: Uuid) -> Result<(), GatewayError>;
}

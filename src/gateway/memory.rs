use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use anyhow::anyhow;
use async_trait::async_trait;
use uuid::Uuid;

use crate::listings::model::{Category, Listing};

use super::{GatewayError, StorageGateway};

/// In-memory stand-in for the remote store. Backs tests and DB-less
/// local runs; data lives for the lifetime of the process.
#[derive(Default)]
pub struct InMemoryGateway {
    listings: RwLock<Vec<Listing>>,
    categories: RwLock<Vec<Category>>,
    saved: RwLock<HashMap<Uuid, Vec<Uuid>>>,
    offline: AtomicBool,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(self, listings: Vec<Listing>) -> Self {
        *self.listings.write().expect("listings lock") = listings;
        self
    }

    pub fn with_categories(self, categories: Vec<Category>) -> Self {
        *self.categories.write().expect("categories lock") = categories;
        self
    }

    /// Makes every operation fail with `RemoteFetch` until cleared, to
    /// exercise total-fetch-failure paths.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), GatewayError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(GatewayError::RemoteFetch(anyhow!("store unreachable")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StorageGateway for InMemoryGateway {
    async fn fetch_available_listings(&self) -> Result<Vec<Listing>, GatewayError> {
        self.ensure_online()?;
        let listings = self.listings.read().expect("listings lock");
        Ok(listings.iter().filter(|l| l.is_available).cloned().collect())
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, GatewayError> {
        self.ensure_online()?;
        Ok(self.categories.read().expect("categories lock").clone())
    }

    async fn fetch_listing(&self, id: Uuid) -> Result<Option<Listing>, GatewayError> {
        self.ensure_online()?;
        let listings = self.listings.read().expect("listings lock");
        Ok(listings.iter().find(|l| l.id == id).cloned())
    }

    async fn insert_listing(&self, listing: &Listing) -> Result<(), GatewayError> {
        self.ensure_online()?;
        self.listings
            .write()
            .expect("listings lock")
            .push(listing.clone());
        Ok(())
    }

    async fn set_unavailable(&self, id: Uuid) -> Result<bool, GatewayError> {
        self.ensure_online()?;
        let mut listings = self.listings.write().expect("listings lock");
        match listings.iter_mut().find(|l| l.id == id) {
            Some(l) => {
                l.is_available = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn fetch_saved(&self, user_id: Uuid) -> Result<Vec<Uuid>, GatewayError> {
        self.ensure_online()?;
        let saved = self.saved.read().expect("saved lock");
        Ok(saved.get(&user_id).cloned().unwrap_or_default())
    }

    async fn save_listing(&self, user_id: Uuid, listing_id: Uuid) -> Result<(), GatewayError> {
        self.ensure_online()?;
        let mut saved = self.saved.write().expect("saved lock");
        let entry = saved.entry(user_id).or_default();
        if !entry.contains(&listing_id) {
            entry.push(listing_id);
        }
        Ok(())
    }

    async fn unsave_listing(&self, user_id: Uuid, listing_id: Uuid) -> Result<(), GatewayError> {
        self.ensure_online()?;
        let mut saved = self.saved.write().expect("saved lock");
        if let Some(entry) = saved.get_mut(&user_id) {
            entry.retain(|id| *id != listing_id);
        }
        Ok(())
    }
}

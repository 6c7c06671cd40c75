use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::feed::session::FeedCache;
use crate::gateway::{InMemoryGateway, PgStorageGateway, StorageGateway};
use crate::location::{FixedLocation, LocationProvider};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gateway: Arc<dyn StorageGateway>,
    pub location: Arc<dyn LocationProvider>,
    pub feed: Arc<FeedCache>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let gateway: Arc<dyn StorageGateway> = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(PgStorageGateway::new(db))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory storage gateway");
                Arc::new(InMemoryGateway::new())
            }
        };
        let location = Arc::new(FixedLocation::new(config.feed.reference_point()));

        Ok(Self {
            config,
            gateway,
            location,
            feed: Arc::new(FeedCache::new()),
        })
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        gateway: Arc<dyn StorageGateway>,
        location: Arc<dyn LocationProvider>,
    ) -> Self {
        Self {
            config,
            gateway,
            location,
            feed: Arc::new(FeedCache::new()),
        }
    }

    /// State over an empty in-memory gateway, for tests.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            feed: crate::config::FeedConfig {
                max_distance_km: crate::feed::filter::DEFAULT_MAX_DISTANCE_KM,
                reference_lat: None,
                reference_lng: None,
            },
        });
        Self::from_parts(
            config,
            Arc::new(InMemoryGateway::new()),
            Arc::new(FixedLocation::new(None)),
        )
    }
}

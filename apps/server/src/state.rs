//! Shared application state

use anyhow::Context;
use std::sync::Arc;

use crate::{
    auth::AuthManager,
    config::{Config, StorageBackend},
    db::{DocumentStore, MemoryStore, PostgresStore},
    services::{AdmissionService, ListingService, RecordService},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn DocumentStore>,
    pub listings: ListingService,
    pub records: RecordService,
    pub admissions: AdmissionService,
    pub auth: AuthManager,
}

impl AppState {
    /// Open the configured backend and wire the services on top of it.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn DocumentStore> = match config.database.backend {
            StorageBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on shutdown");
                Arc::new(MemoryStore::new())
            }
            StorageBackend::Postgres => {
                let url = config
                    .database
                    .url
                    .as_deref()
                    .context("database.url is required for the postgres backend")?;
                let store = PostgresStore::connect(&config.database, url)
                    .await
                    .context("Failed to connect to database")?;
                tracing::info!(
                    pool_max = config.database.pool_max_size,
                    "Database pool created"
                );

                if config.database.run_migrations {
                    store
                        .migrate()
                        .await
                        .context("Failed to run database migrations")?;
                    tracing::info!("Database migrations applied");
                }
                Arc::new(store)
            }
        };

        Self::with_store(config, store)
    }

    /// Build the state around an already opened store.
    pub fn with_store(config: Config, store: Arc<dyn DocumentStore>) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let auth = AuthManager::new(config.clone()).context("Failed to initialize authentication")?;

        Ok(Self {
            listings: ListingService::new(store.clone()),
            records: RecordService::new(store.clone()),
            admissions: AdmissionService::new(store.clone()),
            auth,
            store,
            config,
        })
    }
}

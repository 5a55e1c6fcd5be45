use crate::config::{Config, SessionBackend, StorageBackend};
use crate::utils::retry::RetryConfig;
use std::sync::Arc;

use annotation_store::{AnnotationStore, MemoryAnnotationStore, MongoAnnotationStore};
use dataset_catalog::DatasetCatalog;
use session_store::{MemorySessionStore, RedisSessionStore, SessionStore};

pub struct AppState {
    pub config: Config,
    pub catalog: Arc<DatasetCatalog>,
    pub annotations: Arc<dyn AnnotationStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub retry: RetryConfig,
}

impl AppState {
    /// Loads the dataset catalog and connects the configured backends.
    /// Any failure here is fatal for the process.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let catalog = DatasetCatalog::load(config.dataset_profile, &config.datasets_dir)?;
        tracing::info!(
            "Dataset catalog loaded: profile={} datasets={:?}",
            catalog.profile(),
            catalog.names()
        );

        let annotations = connect_annotation_store(&config).await?;
        let sessions = connect_session_store(&config).await?;

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            annotations,
            sessions,
            retry: RetryConfig::default(),
        })
    }

    /// State over already constructed backends
    pub fn with_stores(
        config: Config,
        catalog: DatasetCatalog,
        annotations: Arc<dyn AnnotationStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            catalog: Arc::new(catalog),
            annotations,
            sessions,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

pub async fn connect_annotation_store(
    config: &Config,
) -> anyhow::Result<Arc<dyn AnnotationStore>> {
    match config.storage_backend {
        StorageBackend::Mongo => {
            let uri = config
                .mongo_uri
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("MONGO_URI is required for the mongo backend"))?;

            tracing::info!("Connecting to MongoDB...");
            let store = MongoAnnotationStore::connect(
                uri,
                &config.mongo_database,
                &config.annotations_collection,
            )
            .await?;
            store.ping().await?;
            tracing::info!(
                "MongoDB connection established (database: {})",
                config.mongo_database
            );
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory annotation store; annotations are lost on restart");
            Ok(Arc::new(MemoryAnnotationStore::new()))
        }
    }
}

async fn connect_session_store(config: &Config) -> anyhow::Result<Arc<dyn SessionStore>> {
    match config.session_backend {
        SessionBackend::Redis => {
            let uri = config
                .redis_uri
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("REDIS_URI is required for the redis backend"))?;
            let store = RedisSessionStore::connect(uri, config.session_ttl_seconds).await?;
            Ok(Arc::new(store))
        }
        SessionBackend::Memory => Ok(Arc::new(MemorySessionStore::new())),
    }
}

pub mod annotation_store;
pub mod dataset_catalog;
pub mod errors;
pub mod progress_tracker;
pub mod session_service;
pub mod session_store;
pub mod submission_service;

use std::env;
use std::path::PathBuf;

use crate::models::DatasetProfile;

/// Where annotations are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    /// Process-local store, lost on restart. Local runs and tests only.
    Memory,
}

/// Where annotation sessions are kept between requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub mongo_uri: Option<String>,
    pub mongo_database: String,
    pub annotations_collection: String,
    pub session_backend: SessionBackend,
    pub redis_uri: Option<String>,
    pub session_ttl_seconds: u64,
    pub dataset_profile: DatasetProfile,
    pub datasets_dir: PathBuf,
    pub bind_addr: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load environment variables from root .env file (two levels up)
        // Try root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let storage_backend = match setting(&settings, "storage.backend", "STORAGE_BACKEND")
            .as_deref()
            .unwrap_or("mongo")
        {
            "mongo" => StorageBackend::Mongo,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(config::ConfigError::Message(format!(
                    "Unknown storage backend: {}",
                    other
                )))
            }
        };

        let session_backend = match setting(&settings, "sessions.backend", "SESSION_BACKEND")
            .as_deref()
            .unwrap_or("redis")
        {
            "redis" => SessionBackend::Redis,
            "memory" => SessionBackend::Memory,
            other => {
                return Err(config::ConfigError::Message(format!(
                    "Unknown session backend: {}",
                    other
                )))
            }
        };

        let mongo_uri = setting(&settings, "database.mongo_uri", "MONGO_URI").or_else(|| {
            let user = env::var("MONGO_USER").ok()?;
            let password = env::var("MONGO_PASSWORD").ok()?;
            let host = env::var("MONGO_HOST").unwrap_or_else(|_| "localhost:27017".to_string());
            eprintln!("WARNING: Building MongoDB URI from MONGO_USER/MONGO_PASSWORD env vars");
            Some(format!(
                "mongodb://{}:{}@{}/?authSource=admin",
                user, password, host
            ))
        });

        // Annotations cannot be persisted without store credentials
        if storage_backend == StorageBackend::Mongo && mongo_uri.is_none() {
            return Err(config::ConfigError::Message(
                "MONGO_URI (or MONGO_USER and MONGO_PASSWORD) must be set".to_string(),
            ));
        }

        let redis_uri = setting(&settings, "redis.uri", "REDIS_URI").or_else(|| {
            let password = env::var("REDIS_PASSWORD").ok()?;
            let host = env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_string());
            eprintln!("WARNING: Building Redis URI from REDIS_PASSWORD env var");
            Some(format!("redis://:{}@{}:{}/0", password, host, port))
        });

        if session_backend == SessionBackend::Redis && redis_uri.is_none() {
            return Err(config::ConfigError::Message(
                "REDIS_URI (or REDIS_PASSWORD) must be set".to_string(),
            ));
        }

        let mongo_database = setting(&settings, "database.mongo_database", "MONGO_DATABASE")
            .unwrap_or_else(|| "feedback_annotation".to_string());

        let annotations_collection =
            setting(&settings, "database.annotations_collection", "ANNOTATIONS_COLLECTION")
                .unwrap_or_else(|| "annotations".to_string());

        let session_ttl_seconds = setting(&settings, "sessions.ttl_seconds", "SESSION_TTL_SECONDS")
            .map(|value| {
                value.parse::<u64>().map_err(|_| {
                    config::ConfigError::Message(format!(
                        "Invalid session TTL: {}",
                        value
                    ))
                })
            })
            .transpose()?
            .filter(|ttl| *ttl > 0)
            .unwrap_or(8 * 3600);

        let dataset_profile = setting(&settings, "datasets.profile", "DATASET_PROFILE")
            .map(|value| value.parse::<DatasetProfile>())
            .transpose()
            .map_err(config::ConfigError::Message)?
            .unwrap_or_default();

        let datasets_dir = setting(&settings, "datasets.dir", "DATASETS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        let bind_addr = setting(&settings, "server.bind_addr", "BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8081".to_string());

        Ok(Config {
            storage_backend,
            mongo_uri,
            mongo_database,
            annotations_collection,
            session_backend,
            redis_uri,
            session_ttl_seconds,
            dataset_profile,
            datasets_dir,
            bind_addr,
        })
    }

    /// Fully in-process configuration: memory stores, sample datasets
    pub fn in_memory(datasets_dir: impl Into<PathBuf>) -> Self {
        Config {
            storage_backend: StorageBackend::Memory,
            mongo_uri: None,
            mongo_database: "feedback_annotation".to_string(),
            annotations_collection: "annotations".to_string(),
            session_backend: SessionBackend::Memory,
            redis_uri: None,
            session_ttl_seconds: 3600,
            dataset_profile: DatasetProfile::Rag,
            datasets_dir: datasets_dir.into(),
            bind_addr: "127.0.0.1:0".to_string(),
        }
    }
}

/// Looks up `key` in the layered settings, then the plain `env_var`
fn setting(settings: &config::Config, key: &str, env_var: &str) -> Option<String> {
    settings
        .get_string(key)
        .ok()
        .or_else(|| env::var(env_var).ok())
        .filter(|value| !value.trim().is_empty())
}

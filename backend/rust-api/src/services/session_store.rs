use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::errors::StoreError;
use crate::metrics::track_store_operation;
use crate::models::AnnotationSession;

/// Keeps annotation sessions between requests
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<AnnotationSession>, StoreError>;

    async fn save(&self, session: &AnnotationSession) -> Result<(), StoreError>;

    /// Returns whether a session was removed
    async fn remove(&self, session_id: &str) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}

fn session_key(session_id: &str) -> String {
    format!("annotation_session:{}", session_id)
}

/// Sessions serialized as JSON under `annotation_session:{id}` with a TTL
/// refreshed on every save
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    pub async fn connect(redis_uri: &str, ttl_seconds: u64) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_uri)?;

        tracing::info!("Attempting to connect to Redis...");

        let redis = tokio::time::timeout(Duration::from_secs(30), ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Timeout(Duration::from_secs(30)))??;

        let store = Self { redis, ttl_seconds };
        tokio::time::timeout(Duration::from_secs(5), store.ping())
            .await
            .map_err(|_| StoreError::Timeout(Duration::from_secs(5)))??;

        tracing::info!("Redis connection established successfully");
        Ok(store)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<AnnotationSession>, StoreError> {
        let mut conn = self.redis.clone();
        let key = session_key(session_id);

        let json: Option<String> = track_store_operation("get_session", "redis", async {
            redis::cmd("GET")
                .arg(&key)
                .query_async(&mut conn)
                .await
                .map_err(StoreError::from)
        })
        .await?;

        json.map(|json| serde_json::from_str(&json).map_err(StoreError::from))
            .transpose()
    }

    async fn save(&self, session: &AnnotationSession) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        let key = session_key(&session.id);
        let json = serde_json::to_string(session)?;

        track_store_operation("save_session", "redis", async {
            redis::cmd("SETEX")
                .arg(&key)
                .arg(self.ttl_seconds)
                .arg(json)
                .query_async::<()>(&mut conn)
                .await
                .map_err(StoreError::from)
        })
        .await
    }

    async fn remove(&self, session_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.redis.clone();
        let key = session_key(session_id);

        let removed: i64 = track_store_operation("delete_session", "redis", async {
            redis::cmd("DEL")
                .arg(&key)
                .query_async(&mut conn)
                .await
                .map_err(StoreError::from)
        })
        .await?;

        Ok(removed > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

/// Process-local sessions without expiry
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, AnnotationSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, AnnotationSession>>, StoreError> {
        self.sessions
            .lock()
            .map_err(|_| StoreError::Unavailable("session store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<AnnotationSession>, StoreError> {
        Ok(self.lock()?.get(session_id).cloned())
    }

    async fn save(&self, session: &AnnotationSession) -> Result<(), StoreError> {
        self.lock()?.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.remove(session_id).is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

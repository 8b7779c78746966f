//! Durable storage port for the pending set.
//!
//! Each channel's pending set is one serialized value under one key; the
//! engine only ever reads and replaces it wholesale.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::RwLock;

use herald_common::error::AppError;

/// Storage key holding a channel's serialized pending set.
pub fn pending_key(channel_key: &str) -> String {
    format!("notifications:pending:{}", channel_key)
}

/// Key-value durable storage.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), AppError>;
}

/// In-memory store for development and tests. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), AppError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Redis-backed store; one GET/SET per pending-set read/replace.
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Connect to Redis and wrap the connection manager.
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        tracing::info!("Connected to Redis");
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl PersistentStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("missing").await.unwrap().is_none());

        store.put("k", b"v1".to_vec()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v1".to_vec()));

        store.put("k", b"v2".to_vec()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn test_pending_key_is_per_channel() {
        assert_eq!(pending_key("notification"), "notifications:pending:notification");
        assert_ne!(pending_key("alpha"), pending_key("beta"));
    }
}

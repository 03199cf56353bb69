use crate::{cache::PageCache, error::Result};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct RedisClient {
    manager: Arc<Mutex<ConnectionManager>>,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self {
            manager: Arc::new(Mutex::new(manager)),
        })
    }

    // Caching
    pub async fn cache_set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.manager.lock().await;
        let _: () = conn.set_ex(key, value, ttl_seconds).await?;
        Ok(())
    }

    pub async fn cache_get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.lock().await;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    pub async fn cache_delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.lock().await;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    // Counters
    pub async fn counter_get(&self, key: &str) -> Result<u64> {
        let mut conn = self.manager.lock().await;
        let value: Option<u64> = conn.get(key).await?;
        Ok(value.unwrap_or(0))
    }

    pub async fn counter_incr(&self, key: &str) -> Result<u64> {
        let mut conn = self.manager.lock().await;
        let value: u64 = conn.incr(key, 1u64).await?;
        Ok(value)
    }
}

fn generation_key(key: &str) -> String {
    format!("generation:{}", key)
}

#[async_trait]
impl PageCache for RedisClient {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.cache_get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        // SETEX rejects a zero TTL
        self.cache_set(key, value, ttl_seconds.max(1)).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache_delete(key).await
    }

    async fn generation(&self, key: &str) -> Result<u64> {
        self.counter_get(&generation_key(key)).await
    }

    async fn bump_generation(&self, key: &str) -> Result<u64> {
        self.counter_incr(&generation_key(key)).await
    }
}

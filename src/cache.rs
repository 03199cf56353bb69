use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::error::Result;

/// Cache for rendered listing/detail payloads, keyed by page path.
///
/// Each key also has an invalidation generation. It only ever grows, and
/// a payload is served only while the generation it was loaded under is
/// still current.
#[async_trait]
pub trait PageCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn generation(&self, key: &str) -> Result<u64>;
    async fn bump_generation(&self, key: &str) -> Result<u64>;
}

#[derive(Serialize, Deserialize)]
struct CachedPage<T> {
    generation: u64,
    value: T,
}

pub fn page_key(path: &str) -> String {
    format!("page:{}", path)
}

pub fn poll_path(poll_id: impl std::fmt::Display) -> String {
    format!("/polls/{}", poll_id)
}

pub const POLLS_PATH: &str = "/polls";

/// Drop the cached payload for a page after a write.
///
/// The write already succeeded, so a cache failure is only logged.
pub async fn revalidate_path(cache: &dyn PageCache, path: &str) {
    let key = page_key(path);

    // the bump is what turns away loads that started before the write
    match cache.bump_generation(&key).await {
        Ok(generation) => {
            tracing::debug!("Invalidated cache for {} (generation {})", path, generation)
        }
        Err(e) => tracing::warn!("Failed to invalidate cache for {}: {}", path, e),
    }

    if let Err(e) = cache.delete(&key).await {
        tracing::warn!("Failed to drop cached payload for {}: {}", path, e);
    }
}

/// Serve a page payload from cache, or load and cache it.
///
/// The payload is stored under the generation read before loading, so a
/// load that overlaps a revalidation is never served afterwards. Cache
/// errors fall through to the loader.
pub async fn cached_json<T, F, Fut>(
    cache: &dyn PageCache,
    path: &str,
    ttl_seconds: u64,
    load: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let key = page_key(path);

    let generation = match cache.generation(&key).await {
        Ok(generation) => Some(generation),
        Err(e) => {
            tracing::warn!("Cache generation read failed for {}: {}", key, e);
            None
        }
    };

    if let Some(generation) = generation {
        match cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<CachedPage<T>>(&raw) {
                Ok(page) if page.generation == generation => return Ok(page.value),
                Ok(_) => tracing::debug!("Ignoring superseded cache entry {}", key),
                Err(e) => tracing::warn!("Discarding unreadable cache entry {}: {}", key, e),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("Cache read failed for {}: {}", key, e),
        }
    }

    let value = load().await?;

    if let Some(generation) = generation {
        let raw = serde_json::to_string(&CachedPage {
            generation,
            value: &value,
        })?;
        if let Err(e) = cache.set(&key, &raw, ttl_seconds).await {
            tracing::warn!("Cache write failed for {}: {}", key, e);
        }
    }

    Ok(value)
}

/// In-process cache, used when no Redis URL is configured.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    generations: Mutex<HashMap<String, u64>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let expires_at = Instant::now() + Duration::from_secs(ttl_seconds);
        entries.insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        Ok(())
    }

    async fn generation(&self, key: &str) -> Result<u64> {
        let generations = self.generations.lock().await;
        Ok(generations.get(key).copied().unwrap_or(0))
    }

    async fn bump_generation(&self, key: &str) -> Result<u64> {
        let mut generations = self.generations.lock().await;
        let generation = generations.entry(key.to_string()).or_insert(0);
        *generation += 1;
        Ok(*generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn loads_once_then_serves_from_cache() {
        let cache = MemoryCache::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let value: Vec<u32> = cached_json(&cache, "/polls", 60, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1, 2, 3])
            })
            .await
            .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn revalidate_forces_a_reload() {
        let cache = MemoryCache::new();
        cache.set(&page_key("/polls"), "[1]", 60).await.unwrap();

        revalidate_path(&cache, "/polls").await;

        assert_eq!(cache.get(&page_key("/polls")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn load_overlapping_a_revalidation_is_not_served_later() {
        let cache = MemoryCache::new();
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let slow_read = async {
            cached_json(&cache, "/polls", 60, move || async move {
                let _ = started_tx.send(());
                let _ = release_rx.await;
                // data as it was before the write
                Ok(vec![1u32])
            })
            .await
            .unwrap()
        };
        let write = async {
            started_rx.await.unwrap();
            revalidate_path(&cache, "/polls").await;
            release_tx.send(()).unwrap();
        };
        let (stale, ()) = tokio::join!(slow_read, write);
        assert_eq!(stale, vec![1]);

        let fresh: Vec<u32> = cached_json(&cache, "/polls", 60, || async { Ok(vec![1, 2]) })
            .await
            .unwrap();
        assert_eq!(fresh, vec![1, 2]);
    }

    #[tokio::test]
    async fn generations_only_grow() {
        let cache = MemoryCache::new();
        assert_eq!(cache.generation("page:/polls").await.unwrap(), 0);
        assert_eq!(cache.bump_generation("page:/polls").await.unwrap(), 1);
        assert_eq!(cache.bump_generation("page:/polls").await.unwrap(), 2);
        assert_eq!(cache.generation("page:/polls/x").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn expired_entries_are_misses() {
        let cache = MemoryCache::new();
        cache.set("k", "v", 0).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}

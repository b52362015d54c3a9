//! Read-through TTL cache for listing endpoints.
//!
//! Entries are overwritten on miss (last writer wins) and never invalidated by
//! writes; staleness is bounded by the TTL. Every insert sweeps expired
//! entries, so the map only holds keys requested within the last TTL window.
//! The lock is never held while the loader runs.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use crate::models::{Cadence, Farm, PremadePackage, Product};

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<K, CacheEntry<V>>>>,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            ttl: self.ttl,
            entries: self.entries.clone(),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the cached value if it has not expired yet.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: K, value: V) {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| now < entry.expires_at);
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Serves a fresh hit, otherwise runs `load` and stores its successful result.
    pub async fn get_or_load<E, F, Fut>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        let value = load().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackageFilter {
    pub farm_id: Option<Uuid>,
    pub cadence: Option<Cadence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProductFilter {
    pub farm_id: Option<Uuid>,
}

/// Caches behind the farm, product and package listings.
#[derive(Clone)]
pub struct ListingCache {
    pub farms: TtlCache<(), Vec<Farm>>,
    pub products: TtlCache<ProductFilter, Vec<Product>>,
    pub packages: TtlCache<PackageFilter, Vec<PremadePackage>>,
}

impl ListingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            farms: TtlCache::new(ttl),
            products: TtlCache::new(ttl),
            packages: TtlCache::new(ttl),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    async fn load_counted(
        cache: &TtlCache<PackageFilter, Vec<u32>>,
        key: PackageFilter,
        calls: &AtomicU32,
    ) -> Vec<u32> {
        cache
            .get_or_load(key, || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<_, ()>(vec![n])
            })
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn hits_within_ttl_skip_the_loader() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicU32::new(0);
        let key = PackageFilter {
            farm_id: Some(Uuid::new_v4()),
            cadence: Some(Cadence::Weekly),
        };

        let first = load_counted(&cache, key, &calls).await;
        tokio::time::advance(Duration::from_secs(59)).await;
        let second = load_counted(&cache, key, &calls).await;

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_reloaded() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicU32::new(0);
        let key = PackageFilter {
            farm_id: None,
            cadence: None,
        };

        load_counted(&cache, key, &calls).await;
        tokio::time::advance(Duration::from_secs(61)).await;
        let reloaded = load_counted(&cache, key, &calls).await;

        assert_eq!(reloaded, vec![2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_isolated_and_failures_are_not_cached() {
        let cache: TtlCache<PackageFilter, Vec<u32>> = TtlCache::new(Duration::from_secs(60));
        let weekly = PackageFilter {
            farm_id: None,
            cadence: Some(Cadence::Weekly),
        };
        let monthly = PackageFilter {
            farm_id: None,
            cadence: Some(Cadence::Monthly),
        };

        let failed = cache
            .get_or_load(weekly, || async { Err::<Vec<u32>, _>("store down") })
            .await;
        assert!(failed.is_err());
        assert_eq!(cache.len().await, 0);

        cache.insert(weekly, vec![1]).await;
        assert_eq!(cache.get(&weekly).await, Some(vec![1]));
        assert_eq!(cache.get(&monthly).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_keys_are_swept_on_insert() {
        let cache: TtlCache<PackageFilter, Vec<u32>> = TtlCache::new(Duration::from_secs(60));
        for _ in 0..1000 {
            let key = PackageFilter {
                farm_id: Some(Uuid::new_v4()),
                cadence: None,
            };
            cache.insert(key, vec![1]).await;
        }
        assert_eq!(cache.len().await, 1000);

        tokio::time::advance(Duration::from_secs(30)).await;
        let recent = PackageFilter {
            farm_id: None,
            cadence: Some(Cadence::Monthly),
        };
        cache.insert(recent, vec![2]).await;
        assert_eq!(cache.len().await, 1001);

        tokio::time::advance(Duration::from_secs(31)).await;
        let latest = PackageFilter {
            farm_id: None,
            cadence: Some(Cadence::Weekly),
        };
        cache.insert(latest, vec![3]).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get(&recent).await, Some(vec![2]));
        assert_eq!(cache.get(&latest).await, Some(vec![3]));
    }
}

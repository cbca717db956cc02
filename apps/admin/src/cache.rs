//! Keyed read cache with stale-while-revalidate semantics.
//!
//! Entries are keyed by resource plus the serialized list parameters. A fresh
//! entry is returned as-is; a stale one is returned immediately while a
//! background task refetches it. Concurrent misses on the same key share a
//! single fetch. Errors are never cached.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::errors::ApiError;

/// Server resource a cache key belongs to; invalidation works per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    UserActivities,
    Templates,
    Categories,
    Subscriptions,
    Plans,
    Transactions,
    AtsScores,
}

impl Resource {
    /// How long a fetched value counts as fresh.
    pub fn stale_time(self) -> Duration {
        match self {
            Resource::Plans | Resource::Categories => Duration::from_secs(10 * 60),
            _ => Duration::from_secs(5 * 60),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub resource: Resource,
    pub params: String,
}

impl QueryKey {
    pub fn new(resource: Resource, params: impl Into<String>) -> Self {
        Self {
            resource,
            params: params.into(),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?{}", self.resource, self.params)
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub revalidations: u64,
}

struct Inner {
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
    /// One async lock per key; holding it means "a fetch for this key is running".
    /// Entries are removed again once the last holder is done.
    in_flight: Mutex<HashMap<QueryKey, Arc<tokio::sync::Mutex<()>>>>,
    /// Bumped on invalidation so fetches started earlier do not repopulate.
    generations: Mutex<HashMap<Resource, u64>>,
    stale_override: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
    revalidations: AtomicU64,
}

#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

enum Lookup<T> {
    Fresh(T),
    Stale(T),
    Miss,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Uses `stale_time` for every resource instead of the per-resource defaults.
    #[cfg(test)]
    pub fn with_stale_time(stale_time: Duration) -> Self {
        Self::build(Some(stale_time))
    }

    fn build(stale_override: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                generations: Mutex::new(HashMap::new()),
                stale_override,
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                revalidations: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the cached value for `key`, or runs `fetcher` to obtain it.
    ///
    /// A stale hit is served immediately and a refresh is spawned on the
    /// current runtime; its failure only logs.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        match self.lookup::<T>(&key) {
            Lookup::Fresh(value) => {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(value);
            }
            Lookup::Stale(value) => {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                self.revalidate(key, fetcher);
                return Ok(value);
            }
            Lookup::Miss => {}
        }

        let lock = self.key_lock(&key);
        let guard = lock.lock().await;
        let result = self.fetch_locked(&key, &fetcher).await;
        drop(guard);
        self.release_key(&key, lock);
        result
    }

    async fn fetch_locked<T, F, Fut>(&self, key: &QueryKey, fetcher: &F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        // Another caller may have filled the entry while we waited.
        if let Lookup::Fresh(value) | Lookup::Stale(value) = self.lookup::<T>(key) {
            self.inner.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }

        self.inner.misses.fetch_add(1, Ordering::Relaxed);
        let generation = self.generation(key.resource);
        debug!("Cache miss for {key}");
        let value = fetcher().await?;
        self.store(key, generation, value.clone());
        Ok(value)
    }

    fn revalidate<T, F, Fut>(&self, key: QueryKey, fetcher: F)
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let cache = self.clone();
        tokio::spawn(async move {
            let lock = cache.key_lock(&key);
            // a held lock means a fetch for this key is already running
            if let Ok(_guard) = lock.try_lock() {
                cache.refresh_entry::<T, F, Fut>(&key, &fetcher).await;
            }
            cache.release_key(&key, lock);
        });
    }

    async fn refresh_entry<T, F, Fut>(&self, key: &QueryKey, fetcher: &F)
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if matches!(self.lookup::<T>(key), Lookup::Fresh(_)) {
            return;
        }
        self.inner.revalidations.fetch_add(1, Ordering::Relaxed);
        let generation = self.generation(key.resource);
        debug!("Revalidating {key}");
        match fetcher().await {
            Ok(value) => self.store(key, generation, value),
            Err(e) => warn!("Background refresh of {key} failed: {e}"),
        }
    }

    fn lookup<T: Clone + 'static>(&self, key: &QueryKey) -> Lookup<T> {
        let entries = self.inner.entries.read();
        let Some(entry) = entries.get(key) else {
            return Lookup::Miss;
        };
        let Some(value) = entry.value.downcast_ref::<T>() else {
            return Lookup::Miss;
        };
        if entry.fetched_at.elapsed() < self.stale_time(key.resource) {
            Lookup::Fresh(value.clone())
        } else {
            Lookup::Stale(value.clone())
        }
    }

    fn store<T: Send + Sync + 'static>(&self, key: &QueryKey, generation: u64, value: T) {
        if self.generation(key.resource) != generation {
            debug!("Dropping result for {key}: invalidated while in flight");
            return;
        }
        self.inner.entries.write().insert(
            key.clone(),
            CacheEntry {
                value: Arc::new(value),
                fetched_at: Instant::now(),
            },
        );
    }

    fn key_lock(&self, key: &QueryKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut in_flight = self.inner.in_flight.lock();
        Arc::clone(in_flight.entry(key.clone()).or_default())
    }

    /// Hands back a handle from `key_lock`. Handles are only created and
    /// dropped under the map lock, so the last one out sees a count of 1.
    fn release_key(&self, key: &QueryKey, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = self.inner.in_flight.lock();
        drop(lock);
        if in_flight.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
            in_flight.remove(key);
        }
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.inner.in_flight.lock().len()
    }

    fn generation(&self, resource: Resource) -> u64 {
        self.inner
            .generations
            .lock()
            .get(&resource)
            .copied()
            .unwrap_or(0)
    }

    fn stale_time(&self, resource: Resource) -> Duration {
        self.inner
            .stale_override
            .unwrap_or_else(|| resource.stale_time())
    }

    /// Drops every entry of `resource`; the next read fetches again.
    pub fn invalidate(&self, resource: Resource) {
        *self.inner.generations.lock().entry(resource).or_insert(0) += 1;
        let mut entries = self.inner.entries.write();
        let before = entries.len();
        entries.retain(|key, _| key.resource != resource);
        debug!(
            "Invalidated {resource}: {} entries dropped",
            before - entries.len()
        );
    }

    pub fn clear(&self) {
        let mut generations = self.inner.generations.lock();
        for generation in generations.values_mut() {
            *generation += 1;
        }
        drop(generations);
        self.inner.entries.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.inner.entries.read().len(),
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            revalidations: self.inner.revalidations.load(Ordering::Relaxed),
        }
    }
}

// Copyright 2026 glint Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{fmt::Debug, hash::Hash, sync::Arc};

use glint_common::{
    event::{Event, EventListener},
    metrics::model::Metrics,
    strict_assert,
    trim::TrimLevel,
};
use hashlink::LinkedHashMap;
use parking_lot::{Mutex, RwLock};

/// A decoded resource that can be held by a memory cache.
pub trait Resource: Send + 'static {
    /// Bytes accounted against the cache budget.
    fn size(&self) -> usize;
}

/// Shared listener that receives resources leaving a memory cache.
pub type ResourceRemovedListener<K, R> = Arc<dyn EventListener<Key = K, Value = R>>;

/// An in-memory cache of decoded resources.
pub trait MemoryCache<K, R>: Send + Sync + 'static
where
    K: Hash + Eq + Send + 'static,
    R: Resource,
{
    /// Bytes of all cached resources.
    fn current_size(&self) -> usize;

    /// Current max size in bytes.
    fn max_size(&self) -> usize;

    /// Scale the initial max size by `multiplier` and evict to fit.
    ///
    /// # Panics
    ///
    /// Panics if `multiplier` is negative.
    fn set_size_multiplier(&self, multiplier: f64);

    /// Get a resource and mark it as most recently used.
    fn get(&self, key: &K) -> Option<R>
    where
        R: Clone;

    /// Insert a resource, returning the previous resource of the same key.
    ///
    /// The previous resource is handed back to the caller and not reported to the listener.
    fn put(&self, key: K, resource: R) -> Option<R>;

    /// Take a resource out of the cache.
    fn remove(&self, key: &K) -> Option<R>;

    /// Returns `true` if the key is cached. Does not affect recency.
    fn contains(&self, key: &K) -> bool;

    /// Set the listener that receives evicted, rejected and cleared resources.
    fn set_resource_removed_listener(&self, listener: ResourceRemovedListener<K, R>);

    /// Drop all resources.
    fn clear_memory(&self);

    /// Drop resources according to the memory pressure `level`.
    fn trim_memory(&self, level: TrimLevel);
}

struct CacheInner<K, R> {
    map: LinkedHashMap<K, (R, usize)>,
    initial_max_size: usize,
    max_size: usize,
    current_size: usize,

    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K, R> CacheInner<K, R>
where
    K: Hash + Eq,
{
    fn evict(&mut self, target: usize, event: Event, metrics: &Metrics, garbages: &mut Vec<(Event, K, R)>) {
        while self.current_size > target {
            let (key, (resource, size)) = match self.map.pop_front() {
                Some(evicted) => evicted,
                None => break,
            };
            strict_assert!(self.current_size >= size);
            self.current_size = self.current_size.saturating_sub(size);
            if event == Event::Evict {
                self.evictions += 1;
                metrics.memory_evict.increase(1);
            }
            garbages.push((event, key, resource));
        }
        metrics.memory_usage.absolute(self.current_size as _);
    }
}

/// An LRU cache of resources under a byte budget.
///
/// Resources are evicted least recently used first. Evicted, rejected and cleared resources are handed to the
/// listener after the cache lock is released, so the listener may put them into a pool.
pub struct LruResourceCache<K, R> {
    inner: Mutex<CacheInner<K, R>>,
    listener: RwLock<Option<ResourceRemovedListener<K, R>>>,
    metrics: Arc<Metrics>,
}

impl<K, R> Debug for LruResourceCache<K, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("LruResourceCache")
            .field("entries", &inner.map.len())
            .field("current_size", &inner.current_size)
            .field("max_size", &inner.max_size)
            .finish()
    }
}

impl<K, R> LruResourceCache<K, R>
where
    K: Hash + Eq + Send + 'static,
    R: Resource,
{
    /// Create a cache with the given budget in bytes.
    pub fn new(max_size: usize) -> Self {
        Self::with_metrics(max_size, Arc::new(Metrics::noop()))
    }

    /// Create a cache with the given budget in bytes and metrics.
    pub fn with_metrics(max_size: usize, metrics: Arc<Metrics>) -> Self {
        let inner = CacheInner {
            map: LinkedHashMap::new(),
            initial_max_size: max_size,
            max_size,
            current_size: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        };
        Self {
            inner: Mutex::new(inner),
            listener: RwLock::new(None),
            metrics,
        }
    }

    /// Count of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    /// Returns `true` if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count of successful [`MemoryCache::get`] calls.
    pub fn hit_count(&self) -> u64 {
        self.inner.lock().hits
    }

    /// Count of failed [`MemoryCache::get`] calls.
    pub fn miss_count(&self) -> u64 {
        self.inner.lock().misses
    }

    /// Count of resources evicted to fit the budget.
    pub fn eviction_count(&self) -> u64 {
        self.inner.lock().evictions
    }

    fn notify(&self, garbages: Vec<(Event, K, R)>) {
        if garbages.is_empty() {
            return;
        }
        let listener = self.listener.read().clone();
        match listener {
            Some(listener) => {
                for (event, key, resource) in garbages {
                    listener.on_leave(event, key, resource);
                }
            }
            None => drop(garbages),
        }
    }

    fn evict_to(&self, event: Event, target: impl FnOnce(usize) -> usize) {
        let mut garbages = vec![];
        {
            let mut inner = self.inner.lock();
            let target = target(inner.max_size);
            inner.evict(target, event, &self.metrics, &mut garbages);
        }
        self.notify(garbages);
    }
}

impl<K, R> MemoryCache<K, R> for LruResourceCache<K, R>
where
    K: Hash + Eq + Send + 'static,
    R: Resource,
{
    fn current_size(&self) -> usize {
        self.inner.lock().current_size
    }

    fn max_size(&self) -> usize {
        self.inner.lock().max_size
    }

    fn set_size_multiplier(&self, multiplier: f64) {
        assert!(multiplier >= 0.0, "size multiplier must be >= 0, given: {multiplier}");
        let mut garbages = vec![];
        {
            let mut inner = self.inner.lock();
            inner.max_size = (inner.initial_max_size as f64 * multiplier).round() as usize;
            let max_size = inner.max_size;
            inner.evict(max_size, Event::Evict, &self.metrics, &mut garbages);
        }
        self.notify(garbages);
    }

    fn get(&self, key: &K) -> Option<R>
    where
        R: Clone,
    {
        let mut inner = self.inner.lock();
        match inner.map.to_back(key).map(|(resource, _)| resource.clone()) {
            Some(resource) => {
                inner.hits += 1;
                self.metrics.memory_hit.increase(1);
                Some(resource)
            }
            None => {
                inner.misses += 1;
                self.metrics.memory_miss.increase(1);
                None
            }
        }
    }

    fn put(&self, key: K, resource: R) -> Option<R> {
        let size = resource.size();
        let mut garbages = vec![];
        let old = {
            let mut inner = self.inner.lock();
            if size >= inner.max_size {
                tracing::debug!(
                    "[resource cache]: Reject resource of {size} bytes, max size: {}",
                    inner.max_size
                );
                self.metrics.memory_reject.increase(1);
                garbages.push((Event::Reject, key, resource));
                None
            } else {
                let old = match inner.map.remove(&key) {
                    Some((old, old_size)) => {
                        inner.current_size = inner.current_size.saturating_sub(old_size);
                        self.metrics.memory_replace.increase(1);
                        Some(old)
                    }
                    None => {
                        self.metrics.memory_insert.increase(1);
                        None
                    }
                };
                inner.map.insert(key, (resource, size));
                inner.current_size += size;

                let max_size = inner.max_size;
                inner.evict(max_size, Event::Evict, &self.metrics, &mut garbages);
                old
            }
        };
        self.notify(garbages);
        old
    }

    fn remove(&self, key: &K) -> Option<R> {
        let mut inner = self.inner.lock();
        let (resource, size) = inner.map.remove(key)?;
        inner.current_size = inner.current_size.saturating_sub(size);
        self.metrics.memory_remove.increase(1);
        self.metrics.memory_usage.absolute(inner.current_size as _);
        Some(resource)
    }

    fn contains(&self, key: &K) -> bool {
        self.inner.lock().map.contains_key(key)
    }

    fn set_resource_removed_listener(&self, listener: ResourceRemovedListener<K, R>) {
        *self.listener.write() = Some(listener);
    }

    fn clear_memory(&self) {
        tracing::debug!("[resource cache]: clear memory");
        self.evict_to(Event::Clear, |_| 0);
    }

    fn trim_memory(&self, level: TrimLevel) {
        tracing::debug!("[resource cache]: trim memory, level: {level:?}");
        self.evict_to(Event::Evict, |max_size| level.target_size(max_size).unwrap_or(usize::MAX));
    }
}

/// A memory cache that caches nothing. Every put hands the resource straight to the listener.
pub struct NoopMemoryCache<K, R> {
    listener: RwLock<Option<ResourceRemovedListener<K, R>>>,
}

impl<K, R> Debug for NoopMemoryCache<K, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoopMemoryCache").finish()
    }
}

impl<K, R> Default for NoopMemoryCache<K, R> {
    fn default() -> Self {
        Self {
            listener: RwLock::new(None),
        }
    }
}

impl<K, R> MemoryCache<K, R> for NoopMemoryCache<K, R>
where
    K: Hash + Eq + Send + 'static,
    R: Resource,
{
    fn current_size(&self) -> usize {
        0
    }

    fn max_size(&self) -> usize {
        0
    }

    fn set_size_multiplier(&self, _: f64) {}

    fn get(&self, _: &K) -> Option<R>
    where
        R: Clone,
    {
        None
    }

    fn put(&self, key: K, resource: R) -> Option<R> {
        let listener = self.listener.read().clone();
        if let Some(listener) = listener {
            listener.on_leave(Event::Reject, key, resource);
        }
        None
    }

    fn remove(&self, _: &K) -> Option<R> {
        None
    }

    fn contains(&self, _: &K) -> bool {
        false
    }

    fn set_resource_removed_listener(&self, listener: ResourceRemovedListener<K, R>) {
        *self.listener.write() = Some(listener);
    }

    fn clear_memory(&self) {}

    fn trim_memory(&self, _: TrimLevel) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Blob(usize);

    impl Resource for Blob {
        fn size(&self) -> usize {
            self.0
        }
    }

    #[derive(Debug, Default)]
    struct Recorder {
        events: Mutex<Vec<(Event, u64, usize)>>,
    }

    impl EventListener for Recorder {
        type Key = u64;
        type Value = Blob;

        fn on_leave(&self, reason: Event, key: u64, value: Blob) {
            self.events.lock().push((reason, key, value.0));
        }
    }

    fn cache(max_size: usize) -> (LruResourceCache<u64, Blob>, Arc<Recorder>) {
        let cache = LruResourceCache::new(max_size);
        let recorder = Arc::new(Recorder::default());
        cache.set_resource_removed_listener(recorder.clone());
        (cache, recorder)
    }

    #[test_log::test]
    fn test_put_get() {
        let (cache, _) = cache(100);
        assert_eq!(cache.put(1, Blob(10)), None);
        assert_eq!(cache.get(&1), Some(Blob(10)));
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.hit_count(), 1);
        assert_eq!(cache.miss_count(), 1);
        assert_eq!(cache.current_size(), 10);
    }

    #[test_log::test]
    fn test_replace_returns_previous() {
        let (cache, recorder) = cache(100);
        cache.put(1, Blob(10));
        assert_eq!(cache.put(1, Blob(20)), Some(Blob(10)));
        assert_eq!(cache.current_size(), 20);
        assert_eq!(cache.len(), 1);
        assert!(recorder.events.lock().is_empty());
    }

    #[test_log::test]
    fn test_reject_too_large() {
        let (cache, recorder) = cache(100);
        assert_eq!(cache.put(1, Blob(100)), None);
        assert!(!cache.contains(&1));
        assert_eq!(cache.current_size(), 0);
        assert_eq!(*recorder.events.lock(), vec![(Event::Reject, 1, 100)]);
    }

    #[test_log::test]
    fn test_evict_least_recently_used() {
        let (cache, recorder) = cache(100);
        cache.put(1, Blob(40));
        cache.put(2, Blob(40));
        // Promote 1, so 2 becomes the least recently used.
        assert!(cache.get(&1).is_some());
        cache.put(3, Blob(40));

        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&3));
        assert_eq!(cache.current_size(), 80);
        assert_eq!(cache.eviction_count(), 1);
        assert_eq!(*recorder.events.lock(), vec![(Event::Evict, 2, 40)]);
    }

    #[test_log::test]
    fn test_remove_takes_without_callback() {
        let (cache, recorder) = cache(100);
        cache.put(1, Blob(40));
        assert_eq!(cache.remove(&1), Some(Blob(40)));
        assert_eq!(cache.remove(&1), None);
        assert_eq!(cache.current_size(), 0);
        assert!(recorder.events.lock().is_empty());
    }

    #[test_log::test]
    fn test_clear_and_trim() {
        let (cache, recorder) = cache(100);
        for key in 0..4 {
            cache.put(key, Blob(25));
        }
        cache.trim_memory(TrimLevel::Moderate);
        assert_eq!(cache.current_size(), 50);
        assert!(!cache.contains(&0) && !cache.contains(&1));

        cache.clear_memory();
        assert_eq!(cache.current_size(), 0);
        assert_eq!(
            *recorder.events.lock(),
            vec![
                (Event::Evict, 0, 25),
                (Event::Evict, 1, 25),
                (Event::Clear, 2, 25),
                (Event::Clear, 3, 25)
            ]
        );

        cache.trim_memory(TrimLevel::Complete);
        assert_eq!(cache.current_size(), 0);
    }

    #[test_log::test]
    fn test_size_multiplier() {
        let (cache, _) = cache(100);
        for key in 0..4 {
            cache.put(key, Blob(25));
        }
        cache.set_size_multiplier(0.5);
        assert_eq!(cache.max_size(), 50);
        assert_eq!(cache.current_size(), 50);
        cache.set_size_multiplier(2.0);
        assert_eq!(cache.max_size(), 200);
    }

    #[test_log::test]
    fn test_listener_may_reenter_cache() {
        struct Reinsert(Arc<LruResourceCache<u64, Blob>>);

        impl EventListener for Reinsert {
            type Key = u64;
            type Value = Blob;

            fn on_leave(&self, _: Event, key: u64, value: Blob) {
                // Would deadlock if called within the lock section.
                let _ = self.0.contains(&key);
                drop(value);
            }
        }

        let cache = Arc::new(LruResourceCache::new(50));
        cache.set_resource_removed_listener(Arc::new(Reinsert(cache.clone())));
        cache.put(1, Blob(30));
        cache.put(2, Blob(30));
        assert_eq!(cache.len(), 1);
        cache.set_resource_removed_listener(Arc::new(Recorder::default()));
    }

    #[test_log::test]
    fn test_noop_cache() {
        let cache = NoopMemoryCache::<u64, Blob>::default();
        let recorder = Arc::new(Recorder::default());
        cache.set_resource_removed_listener(recorder.clone());
        assert_eq!(cache.put(1, Blob(1)), None);
        assert_eq!(cache.get(&1), None);
        assert_eq!(*recorder.events.lock(), vec![(Event::Reject, 1, 1)]);
    }
}

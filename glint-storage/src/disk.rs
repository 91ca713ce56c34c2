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

use std::{
    fmt::Debug,
    io::Write,
    marker::PhantomData,
    path::PathBuf,
    sync::{Arc, OnceLock},
    time::Instant,
};

use glint_common::{code::CacheKey, metrics::model::Metrics};
use parking_lot::Mutex;

use crate::{
    error::{StoreError, StoreResult},
    factory::DiskCacheFactory,
    locker::WriteLocker,
    safe_key::SafeKeyGenerator,
    store::DiskLruStore,
};

/// Writes the content of an entry into the sink of the disk cache.
///
/// Returns `true` if the content is complete and should be committed.
pub trait Writer: Send + 'static {
    /// Write the content into `sink`.
    fn write(self: Box<Self>, sink: &mut dyn Write) -> bool;
}

impl<F> Writer for F
where
    F: FnOnce(&mut dyn Write) -> bool + Send + 'static,
{
    fn write(self: Box<Self>, sink: &mut dyn Write) -> bool {
        (*self)(sink)
    }
}

/// Boxed [`Writer`].
pub type BoxedWriter = Box<dyn Writer>;

/// A persistent cache of encoded data.
///
/// Storage faults never propagate, they are logged and surface as a miss or a no-op.
pub trait DiskCache<K>: Send + Sync + Debug + 'static {
    /// Get the path of the file holding the data of `key`.
    fn get(&self, key: &K) -> Option<PathBuf>;

    /// Write the data of `key` with `writer`, unless the key already has data.
    fn put(&self, key: &K, writer: BoxedWriter);

    /// Delete the data of `key`.
    fn delete(&self, key: &K);

    /// Delete all data.
    fn clear(&self);
}

/// A [`DiskCache`] backed by a [`DiskLruStore`] opened on first access.
pub struct DiskLruCacheWrapper<K> {
    dir: PathBuf,
    max_size: u64,
    store: Mutex<Option<Arc<DiskLruStore>>>,
    safe_key: SafeKeyGenerator<K>,
    locker: WriteLocker,
    metrics: Arc<Metrics>,
}

impl<K> Debug for DiskLruCacheWrapper<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskLruCacheWrapper")
            .field("dir", &self.dir)
            .field("max_size", &self.max_size)
            .field("store", &*self.store.lock())
            .field("locker", &self.locker)
            .finish()
    }
}

impl<K> DiskLruCacheWrapper<K>
where
    K: CacheKey,
{
    /// Create a disk cache in `dir` with a budget of `max_size` bytes.
    ///
    /// Nothing is touched on disk until the first access. Do not create two disk caches on the same directory.
    pub fn new(dir: impl Into<PathBuf>, max_size: u64) -> Self {
        Self::with_metrics(dir, max_size, Arc::new(Metrics::noop()))
    }

    /// Create a disk cache in `dir` with a budget of `max_size` bytes and metrics.
    pub fn with_metrics(dir: impl Into<PathBuf>, max_size: u64, metrics: Arc<Metrics>) -> Self {
        Self {
            dir: dir.into(),
            max_size,
            store: Mutex::new(None),
            safe_key: SafeKeyGenerator::new(),
            locker: WriteLocker::new(),
            metrics,
        }
    }

    fn store(&self) -> StoreResult<Arc<DiskLruStore>> {
        let mut store = self.store.lock();
        if let Some(store) = store.as_ref() {
            return Ok(store.clone());
        }
        let opened = DiskLruStore::open(&self.dir, self.max_size)?;
        *store = Some(opened.clone());
        Ok(opened)
    }

    fn try_put(&self, safe_key: &str, writer: BoxedWriter) -> StoreResult<()> {
        let store = self.store()?;
        // A racing writer may have already succeeded.
        if store.get(safe_key)?.is_some() {
            self.metrics.disk_write_skip.increase(1);
            return Ok(());
        }
        let mut editor = match store.edit(safe_key)? {
            Some(editor) => editor,
            None => return Err(StoreError::EditInProgress(safe_key.to_string())),
        };
        if Writer::write(writer, editor.sink()) {
            let commit = editor.commit()?;
            self.metrics.disk_write.increase(1);
            self.metrics.disk_write_bytes.increase(commit.len);
            self.metrics.disk_evict.increase(commit.evicted as u64);
            self.metrics.disk_usage.absolute(store.size());
        } else {
            self.metrics.disk_write_abort.increase(1);
        }
        Ok(())
    }
}

impl<K> DiskCache<K> for DiskLruCacheWrapper<K>
where
    K: CacheKey,
{
    fn get(&self, key: &K) -> Option<PathBuf> {
        let now = Instant::now();
        let safe_key = self.safe_key.safe_key(key);
        tracing::trace!("[disk cache]: Get: obtained safe key: {safe_key} for key: {key:?}");
        let res = match self.store().and_then(|store| store.get(&safe_key)) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("[disk cache]: Unable to get from disk cache, error: {e}");
                None
            }
        };
        match res {
            Some(_) => self.metrics.disk_hit.increase(1),
            None => self.metrics.disk_miss.increase(1),
        }
        self.metrics.disk_read_duration.record(now.elapsed().as_secs_f64());
        res
    }

    fn put(&self, key: &K, writer: BoxedWriter) {
        let now = Instant::now();
        let safe_key = self.safe_key.safe_key(key);
        let _guard = self.locker.lock(&safe_key);
        tracing::trace!("[disk cache]: Put: obtained safe key: {safe_key} for key: {key:?}");
        if let Err(e) = self.try_put(&safe_key, writer) {
            tracing::warn!("[disk cache]: Unable to put to disk cache, error: {e}");
        }
        self.metrics.disk_write_duration.record(now.elapsed().as_secs_f64());
    }

    fn delete(&self, key: &K) {
        let safe_key = self.safe_key.safe_key(key);
        let _guard = self.locker.lock(&safe_key);
        match self.store().and_then(|store| store.remove(&safe_key)) {
            Ok(true) => self.metrics.disk_delete.increase(1),
            Ok(false) => {}
            Err(e) => tracing::warn!("[disk cache]: Unable to delete from disk cache, error: {e}"),
        }
    }

    fn clear(&self) {
        let mut store = self.store.lock();
        let res = match store.take() {
            Some(store) => store.delete(),
            None => DiskLruStore::open(&self.dir, self.max_size).and_then(|store| store.delete()),
        };
        if let Err(e) = res {
            tracing::warn!("[disk cache]: Unable to clear disk cache or disk cache cleared externally, error: {e}");
        }
        self.metrics.disk_usage.absolute(0);
    }
}

/// A [`DiskCache`] that stores nothing.
pub struct NoopDiskCache<K> {
    _marker: PhantomData<fn() -> K>,
}

impl<K> Debug for NoopDiskCache<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoopDiskCache").finish()
    }
}

impl<K> Default for NoopDiskCache<K> {
    fn default() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<K> DiskCache<K> for NoopDiskCache<K>
where
    K: CacheKey,
{
    fn get(&self, _: &K) -> Option<PathBuf> {
        None
    }

    fn put(&self, _: &K, _: BoxedWriter) {}

    fn delete(&self, _: &K) {}

    fn clear(&self) {}
}

/// A [`DiskCache`] built by a [`DiskCacheFactory`] on first access.
///
/// Falls back to [`NoopDiskCache`] if the factory cannot build a disk cache.
pub struct LazyDiskCache<K> {
    factory: DiskCacheFactory,
    metrics: Arc<Metrics>,
    cache: OnceLock<Arc<dyn DiskCache<K>>>,
}

impl<K> Debug for LazyDiskCache<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyDiskCache")
            .field("factory", &self.factory)
            .field("cache", &self.cache.get())
            .finish()
    }
}

impl<K> LazyDiskCache<K>
where
    K: CacheKey,
{
    /// Create a lazy disk cache from the factory.
    pub fn new(factory: DiskCacheFactory, metrics: Arc<Metrics>) -> Self {
        Self {
            factory,
            metrics,
            cache: OnceLock::new(),
        }
    }

    /// Get the underlying disk cache, build it if not built yet.
    pub fn cache(&self) -> &Arc<dyn DiskCache<K>> {
        self.cache.get_or_init(|| {
            let cache: Arc<dyn DiskCache<K>> = match self.factory.build_with_metrics::<K>(self.metrics.clone()) {
                Some(cache) => Arc::new(cache),
                None => {
                    tracing::warn!("[disk cache]: Fall back to noop disk cache, factory: {:?}", self.factory);
                    Arc::new(NoopDiskCache::<K>::default())
                }
            };
            cache
        })
    }
}

impl<K> DiskCache<K> for LazyDiskCache<K>
where
    K: CacheKey,
{
    fn get(&self, key: &K) -> Option<PathBuf> {
        self.cache().get(key)
    }

    fn put(&self, key: &K, writer: BoxedWriter) {
        self.cache().put(key, writer)
    }

    fn delete(&self, key: &K) {
        self.cache().delete(key)
    }

    fn clear(&self) {
        self.cache().clear()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test_log::test]
    fn test_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskLruCacheWrapper::<String>::new(dir.path().join("cache"), 1024);

        assert!(cache.get(&"a".to_string()).is_none());
        cache.put(&"a".to_string(), Box::new(|sink: &mut dyn Write| sink.write_all(b"hello").is_ok()));
        let path = cache.get(&"a".to_string()).unwrap();
        assert_eq!(fs::read(path).unwrap(), b"hello");

        cache.delete(&"a".to_string());
        assert!(cache.get(&"a".to_string()).is_none());
    }

    #[test_log::test]
    fn test_writer_declines() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskLruCacheWrapper::<&'static str>::new(dir.path(), 1024);

        cache.put(&"a", Box::new(|sink: &mut dyn Write| {
            let _ = sink.write_all(b"half");
            false
        }));
        assert!(cache.get(&"a").is_none());
        assert!(cache.locker.is_empty());
    }

    #[test_log::test]
    fn test_existing_entry_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskLruCacheWrapper::<&'static str>::new(dir.path(), 1024);

        cache.put(&"a", Box::new(|sink: &mut dyn Write| sink.write_all(b"first").is_ok()));
        cache.put(&"a", Box::new(|_: &mut dyn Write| -> bool { unreachable!("the entry exists") }));
        assert_eq!(fs::read(cache.get(&"a").unwrap()).unwrap(), b"first");
    }

    #[test_log::test]
    fn test_clear_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("cache");
        let cache = DiskLruCacheWrapper::<&'static str>::new(&root, 1024);

        cache.put(&"a", Box::new(|sink: &mut dyn Write| sink.write_all(b"1").is_ok()));
        cache.clear();
        assert!(!root.exists());

        assert!(cache.get(&"a").is_none());
        cache.put(&"a", Box::new(|sink: &mut dyn Write| sink.write_all(b"2").is_ok()));
        assert_eq!(fs::read(cache.get(&"a").unwrap()).unwrap(), b"2");
    }

    #[test_log::test]
    fn test_unusable_dir_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"not a dir").unwrap();

        let cache = DiskLruCacheWrapper::<&'static str>::new(&file, 1024);
        assert!(cache.get(&"a").is_none());
        cache.put(&"a", Box::new(|sink: &mut dyn Write| sink.write_all(b"1").is_ok()));
        assert!(cache.get(&"a").is_none());
        cache.delete(&"a");
        cache.clear();
    }

    #[test_log::test]
    fn test_concurrent_put_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskLruCacheWrapper::<&'static str>::new(dir.path(), 1024);

        std::thread::scope(|s| {
            for _ in 0..2 {
                s.spawn(|| {
                    for _ in 0..300 {
                        cache.put(&"a", Box::new(|sink: &mut dyn Write| sink.write_all(b"1234").is_ok()));
                    }
                });
            }
            s.spawn(|| {
                for _ in 0..300 {
                    cache.delete(&"a");
                }
            });
        });

        if let Some(path) = cache.get(&"a") {
            assert_eq!(fs::read(path).unwrap(), b"1234");
        }
        assert!(cache.locker.is_empty());
    }

    #[test]
    fn test_noop() {
        let cache = NoopDiskCache::<&'static str>::default();
        cache.put(&"a", Box::new(|_: &mut dyn Write| true));
        assert!(cache.get(&"a").is_none());
    }
}

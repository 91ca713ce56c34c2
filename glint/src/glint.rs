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

use std::{fmt::Debug, path::PathBuf, sync::Arc};

use glint_common::{
    asyncify::asyncify_with_runtime, code::CacheKey, error::Result, spawn::Spawner, trim::TrimLevel,
};
use glint_memory::{
    array::LruArrayPool,
    bitmap::Bitmap,
    cache::{LruResourceCache, MemoryCache},
    pool::BitmapPool,
};
use glint_storage::disk::{BoxedWriter, DiskCache};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{
    prefill::{BitmapPreFiller, PreFillTypeBuilder},
    resource::{BitmapResource, MemoryKey},
};

/// How much memory the memory cache and the bitmap pool may use, relative to their initial sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum MemoryCategory {
    /// Half of the initial sizes.
    Low,
    /// The initial sizes.
    #[default]
    Normal,
    /// One and a half of the initial sizes.
    High,
}

impl MemoryCategory {
    /// Multiplier of the initial sizes.
    pub fn multiplier(self) -> f64 {
        match self {
            MemoryCategory::Low => 0.5,
            MemoryCategory::Normal => 1.0,
            MemoryCategory::High => 1.5,
        }
    }
}

/// Owner of the bitmap pool, the array pool, the memory cache, the disk cache and the pre-filler.
///
/// Components are handed out as shared handles.
pub struct Glint<K> {
    name: &'static str,
    bitmap_pool: Arc<dyn BitmapPool<Bitmap>>,
    array_pool: Arc<LruArrayPool>,
    memory_cache: Arc<LruResourceCache<MemoryKey, BitmapResource>>,
    disk_cache: Arc<dyn DiskCache<K>>,
    pre_filler: BitmapPreFiller,
    spawner: Spawner,
    memory_category: Mutex<MemoryCategory>,
}

impl<K> Debug for Glint<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Glint")
            .field("name", &self.name)
            .field("bitmap_pool", &self.bitmap_pool)
            .field("array_pool", &self.array_pool)
            .field("disk_cache", &self.disk_cache)
            .field("pre_filler", &self.pre_filler)
            .field("memory_category", &*self.memory_category.lock())
            .finish()
    }
}

impl<K> Glint<K>
where
    K: CacheKey,
{
    #[expect(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: &'static str,
        bitmap_pool: Arc<dyn BitmapPool<Bitmap>>,
        array_pool: Arc<LruArrayPool>,
        memory_cache: Arc<LruResourceCache<MemoryKey, BitmapResource>>,
        disk_cache: Arc<dyn DiskCache<K>>,
        pre_filler: BitmapPreFiller,
        spawner: Spawner,
        memory_category: MemoryCategory,
    ) -> Self {
        Self {
            name,
            bitmap_pool,
            array_pool,
            memory_cache,
            disk_cache,
            pre_filler,
            spawner,
            memory_category: Mutex::new(memory_category),
        }
    }

    /// Name of the instance.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The bitmap pool.
    pub fn bitmap_pool(&self) -> &Arc<dyn BitmapPool<Bitmap>> {
        &self.bitmap_pool
    }

    /// The array pool.
    pub fn array_pool(&self) -> &Arc<LruArrayPool> {
        &self.array_pool
    }

    /// The memory cache. Bitmaps leaving it are recycled into the bitmap pool.
    pub fn memory_cache(&self) -> &Arc<LruResourceCache<MemoryKey, BitmapResource>> {
        &self.memory_cache
    }

    /// The disk cache. Its methods block on disk I/O.
    pub fn disk_cache(&self) -> &Arc<dyn DiskCache<K>> {
        &self.disk_cache
    }

    /// The pre-filler.
    pub fn pre_filler(&self) -> &BitmapPreFiller {
        &self.pre_filler
    }

    /// Start pre-filling the memory cache and the bitmap pool. See [`BitmapPreFiller::pre_fill`].
    pub fn pre_fill(&self, types: impl IntoIterator<Item = PreFillTypeBuilder>) -> Result<()> {
        self.pre_filler.pre_fill(types)
    }

    /// Drop everything held in memory.
    pub fn clear_memory(&self) {
        tracing::debug!("[glint]: clear memory");
        self.memory_cache.clear_memory();
        self.bitmap_pool.clear_memory();
        self.array_pool.clear_memory();
    }

    /// Release memory according to the memory pressure `level`.
    ///
    /// The memory cache is trimmed first, so bitmaps it releases can be trimmed from the bitmap pool right after.
    pub fn trim_memory(&self, level: TrimLevel) {
        tracing::debug!("[glint]: trim memory, level: {level:?}");
        self.memory_cache.trim_memory(level);
        self.bitmap_pool.trim_memory(level);
        self.array_pool.trim_memory(level);
    }

    /// Resize the memory cache and the bitmap pool, returning the previous category.
    pub fn set_memory_category(&self, category: MemoryCategory) -> MemoryCategory {
        let mut current = self.memory_category.lock();
        let multiplier = category.multiplier();
        self.memory_cache.set_size_multiplier(multiplier);
        self.bitmap_pool.set_size_multiplier(multiplier);
        std::mem::replace(&mut *current, category)
    }

    /// Current memory category.
    pub fn memory_category(&self) -> MemoryCategory {
        *self.memory_category.lock()
    }

    /// Get the path of the disk cache file of `key` on the blocking pool.
    pub async fn disk_get(&self, key: K) -> Result<Option<PathBuf>> {
        let disk_cache = self.disk_cache.clone();
        asyncify_with_runtime(&self.spawner, move || disk_cache.get(&key)).await
    }

    /// Write the disk cache entry of `key` with `writer` on the blocking pool.
    pub async fn disk_put(&self, key: K, writer: BoxedWriter) -> Result<()> {
        let disk_cache = self.disk_cache.clone();
        asyncify_with_runtime(&self.spawner, move || disk_cache.put(&key, writer)).await
    }

    /// Delete the disk cache entry of `key` on the blocking pool.
    pub async fn disk_delete(&self, key: K) -> Result<()> {
        let disk_cache = self.disk_cache.clone();
        asyncify_with_runtime(&self.spawner, move || disk_cache.delete(&key)).await
    }

    /// Delete all disk cache entries on the blocking pool.
    pub async fn clear_disk_cache(&self) -> Result<()> {
        let disk_cache = self.disk_cache.clone();
        asyncify_with_runtime(&self.spawner, move || disk_cache.clear()).await
    }
}

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

use std::{collections::HashSet, fmt::Debug, marker::PhantomData, sync::Arc};

use glint_common::{
    code::CacheKey,
    error::{Error, Result},
    metrics::{model::Metrics, registry::noop::NoopMetricsRegistry, BoxedRegistry},
    spawn::Spawner,
};
use glint_memory::{
    array::LruArrayPool,
    bitmap::{Bitmap, PixelFormat},
    cache::{LruResourceCache, MemoryCache},
    calculator::{MemorySizeCalculator, MemorySizeCalculatorBuilder},
    pool::{default_allowed_formats, BitmapPool, LruBitmapPoolBuilder, NoopBitmapPool},
    strategy::StrategyKind,
};
use glint_storage::{
    disk::{DiskCache, LazyDiskCache, NoopDiskCache},
    factory::DiskCacheFactory,
};

use crate::{
    glint::{Glint, MemoryCategory},
    prefill::{BitmapPreFiller, Scheduler, TokioScheduler},
    resource::{BitmapResource, MemoryKey, PoolRecycler},
};

/// Memory class assumed when no calculator is given.
pub const DEFAULT_MEMORY_CLASS_BYTES: usize = 256 * 1024 * 1024;
/// Screen width assumed when no calculator is given.
pub const DEFAULT_SCREEN_WIDTH: u32 = 1080;
/// Screen height assumed when no calculator is given.
pub const DEFAULT_SCREEN_HEIGHT: u32 = 1920;

/// Builder of [`Glint`].
pub struct GlintBuilder<K> {
    name: &'static str,
    registry: BoxedRegistry,
    calculator: Option<MemorySizeCalculator>,
    bitmap_pool_size: Option<usize>,
    memory_cache_size: Option<usize>,
    array_pool_size: Option<usize>,
    strategy: StrategyKind,
    allowed_formats: HashSet<PixelFormat>,
    disk_cache_factory: Option<DiskCacheFactory>,
    spawner: Option<Spawner>,
    default_format: PixelFormat,
    _marker: PhantomData<fn() -> K>,
}

impl<K> Debug for GlintBuilder<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlintBuilder")
            .field("name", &self.name)
            .field("registry", &self.registry)
            .field("calculator", &self.calculator)
            .field("bitmap_pool_size", &self.bitmap_pool_size)
            .field("memory_cache_size", &self.memory_cache_size)
            .field("array_pool_size", &self.array_pool_size)
            .field("strategy", &self.strategy)
            .field("allowed_formats", &self.allowed_formats)
            .field("disk_cache_factory", &self.disk_cache_factory)
            .field("spawner", &self.spawner)
            .field("default_format", &self.default_format)
            .finish()
    }
}

impl<K> Default for GlintBuilder<K>
where
    K: CacheKey,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> GlintBuilder<K>
where
    K: CacheKey,
{
    /// Create a builder with default configurations.
    pub fn new() -> Self {
        Self {
            name: "glint",
            registry: Box::new(NoopMetricsRegistry),
            calculator: None,
            bitmap_pool_size: None,
            memory_cache_size: None,
            array_pool_size: None,
            strategy: StrategyKind::default(),
            allowed_formats: default_allowed_formats(),
            disk_cache_factory: Some(DiskCacheFactory::default()),
            spawner: None,
            default_format: PixelFormat::default(),
            _marker: PhantomData,
        }
    }

    /// Set the name of the instance. The name is used as a label of the metrics.
    ///
    /// Default: `glint`.
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Set the metrics registry.
    ///
    /// Default: [`NoopMetricsRegistry`].
    pub fn with_metrics_registry(mut self, registry: BoxedRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the calculator of the bitmap pool, memory cache and array pool sizes.
    ///
    /// Default: calculated for a device with a memory class of 256 MiB and a 1080 x 1920 screen.
    pub fn with_memory_size_calculator(mut self, calculator: MemorySizeCalculator) -> Self {
        self.calculator = Some(calculator);
        self
    }

    /// Set the bitmap pool size in bytes, overriding the calculator. `0` disables pooling.
    pub fn with_bitmap_pool_size(mut self, size: usize) -> Self {
        self.bitmap_pool_size = Some(size);
        self
    }

    /// Set the memory cache size in bytes, overriding the calculator.
    pub fn with_memory_cache_size(mut self, size: usize) -> Self {
        self.memory_cache_size = Some(size);
        self
    }

    /// Set the array pool size in bytes, overriding the calculator.
    pub fn with_array_pool_size(mut self, size: usize) -> Self {
        self.array_pool_size = Some(size);
        self
    }

    /// Set the bucketing strategy of the bitmap pool.
    ///
    /// Default: [`StrategyKind::SizeFormat`].
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the formats the bitmap pool accepts.
    ///
    /// Default: all formats but [`PixelFormat::Hardware`].
    pub fn with_allowed_formats(mut self, formats: impl IntoIterator<Item = PixelFormat>) -> Self {
        self.allowed_formats = formats.into_iter().collect();
        self
    }

    /// Set the factory of the disk cache. The disk cache is built on first access.
    ///
    /// Default: [`DiskCacheFactory::default`].
    pub fn with_disk_cache_factory(mut self, factory: DiskCacheFactory) -> Self {
        self.disk_cache_factory = Some(factory);
        self
    }

    /// Disable the disk cache.
    pub fn without_disk_cache(mut self) -> Self {
        self.disk_cache_factory = None;
        self
    }

    /// Set the spawner of disk operations and pre-fill bursts.
    ///
    /// Default: the current tokio runtime.
    pub fn with_spawner(mut self, spawner: Spawner) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Set the format of pre-filled bitmaps that do not specify one.
    ///
    /// Default: [`PixelFormat::Argb8888`].
    pub fn with_default_format(mut self, format: PixelFormat) -> Self {
        self.default_format = format;
        self
    }

    /// Build the instance.
    pub fn build(self) -> Result<Glint<K>> {
        let spawner = match self.spawner.or_else(Spawner::try_current) {
            Some(spawner) => spawner,
            None => {
                return Err(Error::config(
                    "spawner",
                    "none",
                    "no tokio runtime found, set one with `with_spawner`",
                ))
            }
        };

        let calculator = match self.calculator {
            Some(calculator) => calculator,
            None => {
                MemorySizeCalculatorBuilder::new(DEFAULT_MEMORY_CLASS_BYTES, DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT)
                    .build()?
            }
        };
        let bitmap_pool_size = self.bitmap_pool_size.unwrap_or(calculator.bitmap_pool_size());
        let memory_cache_size = self.memory_cache_size.unwrap_or(calculator.memory_cache_size());
        let array_pool_size = self.array_pool_size.unwrap_or(calculator.array_pool_size());

        let metrics = Arc::new(Metrics::new(self.name, &*self.registry));

        let bitmap_pool: Arc<dyn BitmapPool<Bitmap>> = match bitmap_pool_size {
            0 => Arc::new(NoopBitmapPool::default()),
            size => Arc::new(
                LruBitmapPoolBuilder::new(size)
                    .with_strategy(self.strategy)
                    .with_allowed_formats(self.allowed_formats)
                    .with_metrics(metrics.clone())
                    .build(),
            ),
        };
        let array_pool = Arc::new(LruArrayPool::with_metrics(array_pool_size, metrics.clone()));
        let memory_cache: Arc<LruResourceCache<MemoryKey, BitmapResource>> =
            Arc::new(LruResourceCache::with_metrics(memory_cache_size, metrics.clone()));
        memory_cache.set_resource_removed_listener(Arc::new(PoolRecycler::new(bitmap_pool.clone())));

        let disk_cache: Arc<dyn DiskCache<K>> = match self.disk_cache_factory {
            Some(factory) => Arc::new(LazyDiskCache::new(factory, metrics.clone())),
            None => Arc::new(NoopDiskCache::default()),
        };

        let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::new(spawner.clone()));
        let pre_filler = BitmapPreFiller::new(
            bitmap_pool.clone(),
            memory_cache.clone(),
            self.default_format,
            scheduler,
        )
        .with_metrics(metrics.clone());

        tracing::debug!(
            "[glint]: Build instance {}, bitmap pool size: {bitmap_pool_size}, memory cache size: {memory_cache_size}, array pool size: {array_pool_size}",
            self.name
        );

        Ok(Glint::new(
            self.name,
            bitmap_pool,
            array_pool,
            memory_cache,
            disk_cache,
            pre_filler,
            spawner,
            MemoryCategory::default(),
        ))
    }
}

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

use glint_common::{metrics::model::Metrics, strict_assert, trim::TrimLevel};
use parking_lot::Mutex;

use crate::{
    bitmap::{PixelBuffer, PixelFormat},
    strategy::{BoxedPoolStrategy, StrategyKind},
};

/// A pool of reusable pixel buffers.
pub trait BitmapPool<B>: Send + Sync + Debug + 'static
where
    B: PixelBuffer,
{
    /// Current max size of the pool in bytes.
    fn max_size(&self) -> usize;

    /// Bytes of all pooled buffers.
    fn current_size(&self) -> usize;

    /// Scale the initial max size by `multiplier` and evict to fit.
    ///
    /// # Panics
    ///
    /// Panics if `multiplier` is negative.
    fn set_size_multiplier(&self, multiplier: f64);

    /// Give a buffer to the pool. The pool may drop it instead.
    fn put(&self, buffer: B);

    /// Get a zeroed buffer with the exact width, height and format, allocating if nothing fits.
    ///
    /// # Panics
    ///
    /// Panics if `format` is [`PixelFormat::Hardware`].
    fn get(&self, width: u32, height: u32, format: PixelFormat) -> B;

    /// Like [`BitmapPool::get`], but a reused buffer keeps its previous content.
    fn get_dirty(&self, width: u32, height: u32, format: PixelFormat) -> B;

    /// Drop all pooled buffers.
    fn clear_memory(&self);

    /// Drop pooled buffers according to the memory pressure `level`.
    fn trim_memory(&self, level: TrimLevel);
}

fn assert_not_hardware(format: PixelFormat) {
    assert_ne!(
        format,
        PixelFormat::Hardware,
        "cannot create a mutable pixel buffer with hardware format"
    );
}

/// Formats accepted by [`LruBitmapPool`] by default: all but [`PixelFormat::Hardware`].
pub fn default_allowed_formats() -> HashSet<PixelFormat> {
    PixelFormat::ALL
        .into_iter()
        .filter(|format| *format != PixelFormat::Hardware)
        .collect()
}

/// Builder of [`LruBitmapPool`].
pub struct LruBitmapPoolBuilder {
    max_size: usize,
    strategy: StrategyKind,
    allowed_formats: HashSet<PixelFormat>,
    metrics: Option<Arc<Metrics>>,
}

impl LruBitmapPoolBuilder {
    /// Create a builder for a pool of `max_size` bytes.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            strategy: StrategyKind::default(),
            allowed_formats: default_allowed_formats(),
            metrics: None,
        }
    }

    /// Set the bucketing strategy.
    ///
    /// Default: [`StrategyKind::SizeFormat`].
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the formats the pool accepts. Buffers of other formats are dropped on put.
    ///
    /// Default: all formats but [`PixelFormat::Hardware`].
    pub fn with_allowed_formats(mut self, formats: impl IntoIterator<Item = PixelFormat>) -> Self {
        self.allowed_formats = formats.into_iter().collect();
        self
    }

    /// Set the metrics.
    ///
    /// Default: noop metrics.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the pool.
    pub fn build<B>(self) -> LruBitmapPool<B>
    where
        B: PixelBuffer,
    {
        let inner = PoolInner {
            strategy: self.strategy.build(),
            initial_max_size: self.max_size,
            max_size: self.max_size,
            current_size: 0,
            hits: 0,
            misses: 0,
            puts: 0,
            evictions: 0,
        };
        LruBitmapPool {
            inner: Mutex::new(inner),
            allowed_formats: self.allowed_formats,
            metrics: self.metrics.unwrap_or_else(|| Arc::new(Metrics::noop())),
        }
    }
}

struct PoolInner<B> {
    strategy: BoxedPoolStrategy<B>,
    initial_max_size: usize,
    max_size: usize,
    current_size: usize,

    hits: u64,
    misses: u64,
    puts: u64,
    evictions: u64,
}

impl<B> Debug for PoolInner<B>
where
    B: PixelBuffer,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Hits={}, misses={}, puts={}, evictions={}, currentSize={}, maxSize={}\nStrategy={:?}",
            self.hits, self.misses, self.puts, self.evictions, self.current_size, self.max_size, self.strategy
        )
    }
}

impl<B> PoolInner<B>
where
    B: PixelBuffer,
{
    /// Evict buffers until the pool fits `size`, evicted buffers are pushed into `garbages`.
    fn trim_to_size(&mut self, size: usize, metrics: &Metrics, garbages: &mut Vec<B>) {
        while self.current_size > size {
            let removed = match self.strategy.remove_last() {
                Some(removed) => removed,
                None => {
                    tracing::warn!("[bitmap pool]: Size mismatch, resetting. {self:?}");
                    self.current_size = 0;
                    break;
                }
            };
            let removed_size = self.strategy.size_of(&removed);
            strict_assert!(self.current_size >= removed_size);
            self.current_size = self.current_size.saturating_sub(removed_size);
            self.evictions += 1;
            metrics.bitmap_pool_evict.increase(1);
            tracing::trace!(
                "[bitmap pool]: Evicting bitmap={}",
                self.strategy.describe(&removed)
            );
            garbages.push(removed);
        }
        metrics.bitmap_pool_usage.absolute(self.current_size as _);
    }
}

/// An LRU pool of pixel buffers under a byte budget.
///
/// Buffers are bucketed by a [`StrategyKind`] strategy. When the pool is over budget, buffers of the least recently
/// used bucket are dropped first.
pub struct LruBitmapPool<B> {
    inner: Mutex<PoolInner<B>>,
    allowed_formats: HashSet<PixelFormat>,
    metrics: Arc<Metrics>,
}

impl<B> Debug for LruBitmapPool<B>
where
    B: PixelBuffer,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruBitmapPool")
            .field("inner", &*self.inner.lock())
            .finish()
    }
}

impl<B> LruBitmapPool<B>
where
    B: PixelBuffer,
{
    /// Create a pool of `max_size` bytes with the default strategy and allowed formats.
    pub fn new(max_size: usize) -> Self {
        LruBitmapPoolBuilder::new(max_size).build()
    }

    /// Count of requests served from the pool.
    pub fn hit_count(&self) -> u64 {
        self.inner.lock().hits
    }

    /// Count of requests that had to allocate.
    pub fn miss_count(&self) -> u64 {
        self.inner.lock().misses
    }

    /// Count of buffers accepted by [`BitmapPool::put`].
    pub fn put_count(&self) -> u64 {
        self.inner.lock().puts
    }

    /// Count of buffers evicted from the pool.
    pub fn eviction_count(&self) -> u64 {
        self.inner.lock().evictions
    }

    /// Count of pooled buffers.
    pub fn len(&self) -> usize {
        self.inner.lock().strategy.len()
    }

    /// Returns `true` if no buffer is pooled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_dirty_or_none(&self, width: u32, height: u32, format: PixelFormat) -> Option<B> {
        assert_not_hardware(format);

        let mut inner = self.inner.lock();
        let result = inner.strategy.get(width, height, format);
        match result.as_ref() {
            None => {
                tracing::trace!(
                    "[bitmap pool]: Missing bitmap={}",
                    inner.strategy.describe_request(width, height, format)
                );
                inner.misses += 1;
                self.metrics.bitmap_pool_miss.increase(1);
            }
            Some(buffer) => {
                let size = inner.strategy.size_of(buffer);
                strict_assert!(inner.current_size >= size);
                inner.hits += 1;
                inner.current_size = inner.current_size.saturating_sub(size);
                self.metrics.bitmap_pool_hit.increase(1);
                self.metrics.bitmap_pool_usage.absolute(inner.current_size as _);
            }
        }
        tracing::trace!("[bitmap pool]: {inner:?}");
        result
    }

    fn trim_to_size(&self, size: impl FnOnce(&PoolInner<B>) -> usize) {
        let mut garbages = vec![];
        {
            let mut inner = self.inner.lock();
            let size = size(&inner);
            inner.trim_to_size(size, &self.metrics, &mut garbages);
        }
        // Do not deallocate buffers within the lock section.
        drop(garbages);
    }
}

impl<B> BitmapPool<B> for LruBitmapPool<B>
where
    B: PixelBuffer,
{
    fn max_size(&self) -> usize {
        self.inner.lock().max_size
    }

    fn current_size(&self) -> usize {
        self.inner.lock().current_size
    }

    fn set_size_multiplier(&self, multiplier: f64) {
        assert!(multiplier >= 0.0, "size multiplier must be >= 0, given: {multiplier}");
        let mut garbages = vec![];
        {
            let mut inner = self.inner.lock();
            inner.max_size = (inner.initial_max_size as f64 * multiplier).round() as usize;
            let max_size = inner.max_size;
            inner.trim_to_size(max_size, &self.metrics, &mut garbages);
        }
        drop(garbages);
    }

    fn put(&self, buffer: B) {
        let mut garbages = vec![];
        {
            let mut inner = self.inner.lock();
            let size = inner.strategy.size_of(&buffer);
            let allowed = self.allowed_formats.contains(&buffer.format());
            if !buffer.is_mutable() || size > inner.max_size || !allowed {
                tracing::debug!(
                    "[bitmap pool]: Reject bitmap from pool, bitmap: {}, is mutable: {}, is allowed format: {}",
                    inner.strategy.describe(&buffer),
                    buffer.is_mutable(),
                    allowed
                );
                self.metrics.bitmap_pool_reject.increase(1);
                garbages.push(buffer);
            } else {
                tracing::trace!("[bitmap pool]: Put bitmap in pool={}", inner.strategy.describe(&buffer));
                inner.strategy.put(buffer);
                inner.puts += 1;
                inner.current_size += size;
                self.metrics.bitmap_pool_put.increase(1);

                let max_size = inner.max_size;
                inner.trim_to_size(max_size, &self.metrics, &mut garbages);
            }
        }
        drop(garbages);
    }

    fn get(&self, width: u32, height: u32, format: PixelFormat) -> B {
        match self.get_dirty_or_none(width, height, format) {
            Some(mut buffer) => {
                // Pooled buffers hold content of previous images.
                buffer.erase();
                buffer
            }
            None => B::allocate(width, height, format),
        }
    }

    fn get_dirty(&self, width: u32, height: u32, format: PixelFormat) -> B {
        self.get_dirty_or_none(width, height, format)
            .unwrap_or_else(|| B::allocate(width, height, format))
    }

    fn clear_memory(&self) {
        tracing::debug!("[bitmap pool]: clear memory");
        self.trim_to_size(|_| 0);
    }

    fn trim_memory(&self, level: TrimLevel) {
        tracing::debug!("[bitmap pool]: trim memory, level: {level:?}");
        self.trim_to_size(|inner| level.target_size(inner.max_size).unwrap_or(usize::MAX));
    }
}

/// A pool that pools nothing: puts drop the buffer and gets always allocate.
///
/// Used when the pool budget is zero.
pub struct NoopBitmapPool<B> {
    _marker: PhantomData<fn() -> B>,
}

impl<B> Debug for NoopBitmapPool<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoopBitmapPool").finish()
    }
}

impl<B> Default for NoopBitmapPool<B> {
    fn default() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<B> BitmapPool<B> for NoopBitmapPool<B>
where
    B: PixelBuffer,
{
    fn max_size(&self) -> usize {
        0
    }

    fn current_size(&self) -> usize {
        0
    }

    fn set_size_multiplier(&self, _: f64) {}

    fn put(&self, buffer: B) {
        drop(buffer);
    }

    fn get(&self, width: u32, height: u32, format: PixelFormat) -> B {
        assert_not_hardware(format);
        B::allocate(width, height, format)
    }

    fn get_dirty(&self, width: u32, height: u32, format: PixelFormat) -> B {
        self.get(width, height, format)
    }

    fn clear_memory(&self) {}

    fn trim_memory(&self, _: TrimLevel) {}
}

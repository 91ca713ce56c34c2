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

//! Pre-fill of the memory cache and the bitmap pool.
//!
//! Allocating many bitmaps at once may stall the process. The pre-filler allocates them in short bursts scheduled
//! with backoff, filling free space of the memory cache first and spilling the rest into the bitmap pool.

mod queue;
mod runner;
mod scheduler;
mod ty;

use std::{fmt::Debug, sync::Arc, time::Duration};

use glint_common::{error::Result, metrics::model::Metrics};
use glint_memory::{
    bitmap::{Bitmap, PixelFormat},
    cache::MemoryCache,
    pool::BitmapPool,
};
use parking_lot::Mutex;

pub use self::{
    queue::PreFillQueue,
    runner::{BitmapCache, PreFillRunner, BACKOFF_RATIO, INITIAL_BACKOFF, MAX_BACKOFF, MAX_DURATION},
    scheduler::{Clock, Scheduler, SystemClock, Task, TaskHandle, TokioScheduler},
    ty::{PreFillType, PreFillTypeBuilder, DEFAULT_WEIGHT},
};

/// Pre-fills the memory cache and the bitmap pool with bitmaps of given types.
pub struct BitmapPreFiller {
    pool: Arc<dyn BitmapPool<Bitmap>>,
    cache: BitmapCache,
    default_format: PixelFormat,
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,

    current: Mutex<Option<Arc<PreFillRunner>>>,
}

impl Debug for BitmapPreFiller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitmapPreFiller")
            .field("default_format", &self.default_format)
            .field("scheduler", &self.scheduler)
            .field("current", &*self.current.lock())
            .finish()
    }
}

impl BitmapPreFiller {
    /// Create a pre-filler. Types without a format use `default_format`.
    pub fn new(
        pool: Arc<dyn BitmapPool<Bitmap>>,
        cache: BitmapCache,
        default_format: PixelFormat,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            pool,
            cache,
            default_format,
            scheduler,
            clock: Arc::new(SystemClock),
            metrics: Arc::new(Metrics::noop()),
            current: Mutex::new(None),
        }
    }

    /// Set the clock that bounds bursts.
    ///
    /// Default: [`SystemClock`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the metrics.
    ///
    /// Default: no metrics.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Default format of pre-filled bitmaps.
    pub fn default_format(&self) -> PixelFormat {
        self.default_format
    }

    /// Cancel the current pre-fill and start a new one with `types`.
    ///
    /// Fails if any of the types is invalid, the current pre-fill is cancelled anyway.
    pub fn pre_fill(&self, types: impl IntoIterator<Item = PreFillTypeBuilder>) -> Result<()> {
        self.cancel();

        let types = types
            .into_iter()
            .map(|builder| builder.with_format_if_unset(self.default_format).build())
            .collect::<Result<Vec<_>>>()?;
        let queue = self.allocation_order(&types);
        tracing::debug!("[prefill]: Pre-fill {} bitmaps of {} types", queue.len(), types.len());

        let runner = Arc::new(PreFillRunner::new(
            self.pool.clone(),
            self.cache.clone(),
            queue,
            self.clock.clone(),
            self.metrics.clone(),
        ));
        *self.current.lock() = Some(runner.clone());

        let r = runner.clone();
        let scheduler = self.scheduler.clone();
        let handle = self
            .scheduler
            .schedule(Duration::ZERO, Box::new(move || r.run(&scheduler)));
        runner.set_pending(handle);
        Ok(())
    }

    /// Cancel the current pre-fill, if any.
    pub fn cancel(&self) {
        if let Some(runner) = self.current.lock().take() {
            runner.cancel();
        }
    }

    /// Split the free bytes of the memory cache plus the bitmap pool budget between `types` by weight.
    pub fn allocation_order(&self, types: &[PreFillType]) -> PreFillQueue {
        let budget = self.cache.max_size().saturating_sub(self.cache.current_size()) + self.pool.max_size();
        let total_weight = types.iter().map(|ty| ty.weight() as u64).sum::<u64>();
        if total_weight == 0 {
            return PreFillQueue::default();
        }
        let bytes_per_weight = budget as f64 / total_weight as f64;
        PreFillQueue::new(types.iter().map(|ty| {
            let bytes = (bytes_per_weight * ty.weight() as f64).round() as usize;
            (*ty, bytes / ty.byte_size())
        }))
    }
}

#[cfg(test)]
mod tests {
    use glint_memory::{cache::LruResourceCache, pool::LruBitmapPool};

    use super::{
        runner::tests::{ManualScheduler, StepClock},
        *,
    };
    use crate::resource::{BitmapResource, MemoryKey};

    fn filler() -> (BitmapPreFiller, Arc<ManualScheduler>) {
        let pool = Arc::new(LruBitmapPool::<Bitmap>::new(1000));
        let cache: Arc<LruResourceCache<MemoryKey, BitmapResource>> = Arc::new(LruResourceCache::new(1000));
        let scheduler = Arc::new(ManualScheduler::default());
        let filler = BitmapPreFiller::new(pool, cache, PixelFormat::Argb8888, scheduler.clone())
            .with_clock(Arc::new(StepClock::new(Duration::ZERO)));
        (filler, scheduler)
    }

    #[test_log::test]
    fn test_allocation_order() {
        let (filler, _) = filler();
        let types = [
            PreFillTypeBuilder::square(10).build().unwrap(),
            PreFillTypeBuilder::square(5).with_weight(3).build().unwrap(),
        ];
        // Budget 2000 bytes, 500 per weight: one 400 byte bitmap and fifteen 100 byte bitmaps.
        let mut queue = filler.allocation_order(&types);
        assert_eq!(queue.len(), 16);
        let mut large = 0;
        while let Some(ty) = queue.pop() {
            if ty.width() == 10 {
                large += 1;
            }
        }
        assert_eq!(large, 1);
        assert!(filler.allocation_order(&[]).is_empty());
    }

    #[test_log::test]
    fn test_pre_fill_runs_on_scheduler() {
        let (filler, scheduler) = filler();
        filler.pre_fill([PreFillTypeBuilder::square(10)]).unwrap();
        assert_eq!(scheduler.run_next(), Some(Duration::ZERO));

        let runner = filler.current.lock().clone().unwrap();
        assert_eq!(runner.remaining(), 0);
        assert_eq!(filler.cache.current_size(), 800);
        assert_eq!(filler.pool.current_size(), 800);
    }

    #[test_log::test]
    fn test_pre_fill_cancels_previous() {
        let (filler, scheduler) = filler();
        filler.pre_fill([PreFillTypeBuilder::square(10)]).unwrap();
        let first = filler.current.lock().clone().unwrap();

        filler.pre_fill([PreFillTypeBuilder::square(5)]).unwrap();
        assert!(first.is_cancelled());

        // The second runner runs first, the first one has been cancelled before it started.
        assert_eq!(scheduler.run_next(), Some(Duration::ZERO));
        assert_eq!(scheduler.run_next(), Some(Duration::ZERO));
        assert_eq!(first.remaining(), 5);
    }

    #[test_log::test]
    fn test_invalid_type() {
        let (filler, scheduler) = filler();
        assert!(filler.pre_fill([PreFillTypeBuilder::new(0, 10)]).is_err());
        assert_eq!(scheduler.run_next(), None);
    }

    #[test_log::test]
    fn test_hardware_format_rejected() {
        let (filler, scheduler) = filler();
        let err = filler
            .pre_fill([
                PreFillTypeBuilder::square(10),
                PreFillTypeBuilder::square(10).with_format(PixelFormat::Hardware),
            ])
            .unwrap_err();
        assert_eq!(err.kind(), glint_common::error::ErrorKind::Config);
        // Nothing is scheduled, so no burst ever asks the pool for a hardware buffer.
        assert_eq!(scheduler.run_next(), None);
        assert!(filler.current.lock().is_none());
    }
}

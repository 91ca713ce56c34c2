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
    collections::HashSet,
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use glint_common::metrics::model::Metrics;
use glint_memory::{
    bitmap::{Bitmap, PixelBuffer},
    cache::MemoryCache,
    pool::BitmapPool,
};
use parking_lot::Mutex;

use super::{
    queue::PreFillQueue,
    scheduler::{Clock, Scheduler, TaskHandle},
    ty::PreFillType,
};
use crate::resource::{BitmapResource, MemoryKey};

/// A burst running longer than this is taken as an allocation stall and yields.
pub const MAX_DURATION: Duration = Duration::from_millis(32);
/// Delay before the burst after the first stall.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(40);
/// Growth of the delay after each stall.
pub const BACKOFF_RATIO: u32 = 4;
/// Max delay between bursts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(1);

/// Shared handle of the memory cache pre-filled with bitmaps.
pub type BitmapCache = Arc<dyn MemoryCache<MemoryKey, BitmapResource>>;

struct RunnerState {
    queue: PreFillQueue,
    seen: HashSet<PreFillType>,
    delay: Duration,
}

/// Allocates bitmaps in short bursts to populate the memory cache and the bitmap pool.
///
/// Bursts are capped by [`MAX_DURATION`]. A burst that leaves work schedules the next one with a growing delay.
pub struct PreFillRunner {
    pool: Arc<dyn BitmapPool<Bitmap>>,
    cache: BitmapCache,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,

    state: Mutex<RunnerState>,
    cancelled: AtomicBool,
    pending: Mutex<Option<TaskHandle>>,
}

impl Debug for PreFillRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PreFillRunner")
            .field("remaining", &state.queue.len())
            .field("delay", &state.delay)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl PreFillRunner {
    /// Create a runner that allocates the bitmaps of `queue`.
    pub fn new(
        pool: Arc<dyn BitmapPool<Bitmap>>,
        cache: BitmapCache,
        queue: PreFillQueue,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            pool,
            cache,
            clock,
            metrics,
            state: Mutex::new(RunnerState {
                queue,
                seen: HashSet::new(),
                delay: INITIAL_BACKOFF,
            }),
            cancelled: AtomicBool::new(false),
            pending: Mutex::new(None),
        }
    }

    /// Stop scheduling bursts. A running burst finishes.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(handle) = self.pending.lock().take() {
            handle.cancel();
        }
    }

    /// Returns `true` if the runner has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Count of bitmaps left to allocate.
    pub fn remaining(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Run one burst. Returns `true` if work remains and the runner is not cancelled.
    pub fn allocate(&self) -> bool {
        let start = self.clock.now();
        let mut state = self.state.lock();

        while !state.queue.is_empty() && self.clock.now().duration_since(start) < MAX_DURATION {
            let Some(ty) = state.queue.pop() else {
                break;
            };
            // Serve the first bitmap of each type from the pool, the pool has nothing more of it afterwards.
            let bitmap = if state.seen.insert(ty) {
                self.pool.get_dirty(ty.width(), ty.height(), ty.format())
            } else {
                Bitmap::allocate(ty.width(), ty.height(), ty.format())
            };
            let size = bitmap.allocation_size();

            // Do not evict useful resources from the cache, spill to the pool instead.
            let free = self.cache.max_size().saturating_sub(self.cache.current_size());
            if free >= size {
                self.cache.put(MemoryKey::unique(), BitmapResource::new(bitmap));
            } else {
                self.pool.put(bitmap);
            }
            self.metrics.prefill_allocate.increase(1);

            tracing::debug!(
                "[prefill]: Allocated [{}x{}] {} size: {size}",
                ty.width(),
                ty.height(),
                ty.format()
            );
        }

        self.metrics
            .prefill_burst_duration
            .record(self.clock.now().duration_since(start).as_secs_f64());

        !self.is_cancelled() && !state.queue.is_empty()
    }

    /// Run one burst and schedule the next one on `scheduler` if work remains.
    pub fn run(self: &Arc<Self>, scheduler: &Arc<dyn Scheduler>) {
        if self.is_cancelled() || !self.allocate() {
            return;
        }
        let delay = self.next_delay();
        let this = self.clone();
        let s = scheduler.clone();
        let handle = scheduler.schedule(delay, Box::new(move || this.run(&s)));
        self.set_pending(handle);
    }

    pub(crate) fn set_pending(&self, handle: TaskHandle) {
        let mut pending = self.pending.lock();
        // Cancelled between the burst and the scheduling.
        if self.is_cancelled() {
            handle.cancel();
        }
        *pending = Some(handle);
    }

    fn next_delay(&self) -> Duration {
        let mut state = self.state.lock();
        let delay = state.delay;
        state.delay = (state.delay * BACKOFF_RATIO).min(MAX_BACKOFF);
        delay
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Instant;

    use glint_memory::{bitmap::PixelFormat, cache::LruResourceCache, pool::LruBitmapPool};

    use super::*;
    use crate::prefill::{scheduler::Task, ty::PreFillTypeBuilder};

    /// A clock that advances by `step` on every read.
    #[derive(Debug)]
    pub(crate) struct StepClock {
        base: Instant,
        step: Duration,
        ticks: Mutex<u32>,
    }

    impl StepClock {
        pub(crate) fn new(step: Duration) -> Self {
            Self {
                base: Instant::now(),
                step,
                ticks: Mutex::new(0),
            }
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> Instant {
            let mut ticks = self.ticks.lock();
            *ticks += 1;
            self.base + self.step * *ticks
        }
    }

    /// A scheduler that keeps tasks until the test runs them.
    #[derive(Default)]
    pub(crate) struct ManualScheduler {
        tasks: Mutex<Vec<(Duration, TaskHandle, Task)>>,
    }

    impl Debug for ManualScheduler {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ManualScheduler")
                .field("tasks", &self.tasks.lock().len())
                .finish()
        }
    }

    impl Scheduler for ManualScheduler {
        fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
            let handle = TaskHandle::new();
            self.tasks.lock().push((delay, handle.clone(), task));
            handle
        }
    }

    impl ManualScheduler {
        pub(crate) fn run_next(&self) -> Option<Duration> {
            let (delay, handle, task) = self.tasks.lock().pop()?;
            if !handle.is_cancelled() {
                task();
            }
            Some(delay)
        }
    }

    fn runner(
        count: usize,
        clock: Arc<dyn Clock>,
    ) -> (Arc<PreFillRunner>, Arc<LruBitmapPool<Bitmap>>, Arc<LruResourceCache<MemoryKey, BitmapResource>>) {
        let pool = Arc::new(LruBitmapPool::<Bitmap>::new(1000));
        let cache: Arc<LruResourceCache<MemoryKey, BitmapResource>> = Arc::new(LruResourceCache::new(1000));
        let ty = PreFillTypeBuilder::square(10)
            .with_format(PixelFormat::Argb8888)
            .build()
            .unwrap();
        let runner = PreFillRunner::new(
            pool.clone(),
            cache.clone(),
            PreFillQueue::new([(ty, count)]),
            clock,
            Arc::new(Metrics::noop()),
        );
        (Arc::new(runner), pool, cache)
    }

    #[test_log::test]
    fn test_fill_cache_then_pool() {
        let (runner, pool, cache) = runner(4, Arc::new(StepClock::new(Duration::ZERO)));

        assert!(!runner.allocate());
        assert_eq!(runner.remaining(), 0);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.current_size(), 800);
        assert_eq!(pool.current_size(), 800);
        // Only the first bitmap is requested from the pool.
        assert_eq!(pool.miss_count(), 1);
    }

    #[test_log::test]
    fn test_burst_yields_on_stall() {
        let (runner, _, _) = runner(10, Arc::new(StepClock::new(Duration::from_millis(10))));

        assert!(runner.allocate());
        assert_eq!(runner.remaining(), 7);
    }

    #[test_log::test]
    fn test_cancelled_runner_stops() {
        let (runner, _, _) = runner(10, Arc::new(StepClock::new(Duration::from_millis(10))));
        runner.cancel();
        assert!(!runner.allocate());
        assert_eq!(runner.remaining(), 7);
    }

    #[test_log::test]
    fn test_backoff() {
        let (runner, _, _) = runner(100, Arc::new(StepClock::new(Duration::from_millis(10))));
        let scheduler = Arc::new(ManualScheduler::default());
        let s: Arc<dyn Scheduler> = scheduler.clone();

        runner.run(&s);
        let mut delays = vec![];
        while let Some(delay) = scheduler.run_next() {
            delays.push(delay);
            if delays.len() == 5 {
                break;
            }
        }
        assert_eq!(
            delays,
            [40, 160, 640, 1000, 1000].map(Duration::from_millis).to_vec()
        );

        runner.cancel();
        let remaining = runner.remaining();
        while scheduler.run_next().is_some() {}
        assert_eq!(runner.remaining(), remaining);
    }
}

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
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use glint_common::spawn::Spawner;

/// A task to run later.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Handle of a scheduled task.
#[derive(Debug, Clone, Default)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    /// Create a handle that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prevent the task from running if it has not started yet.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` if the task has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Runs tasks after a delay.
pub trait Scheduler: Send + Sync + Debug + 'static {
    /// Run `task` after `delay` unless the returned handle is cancelled first.
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle;
}

/// A [`Scheduler`] on a tokio runtime.
///
/// Tasks run on the blocking pool of the runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    spawner: Spawner,
}

impl TokioScheduler {
    /// Create a scheduler on the runtime of `spawner`.
    pub fn new(spawner: Spawner) -> Self {
        Self { spawner }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        let h = handle.clone();
        let spawner = self.spawner.clone();
        // The timer task is detached, cancellation is observed by the flag.
        let _ = self.spawner.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if h.is_cancelled() {
                return;
            }
            if let Err(e) = spawner.spawn_blocking(task).await {
                tracing::warn!("[prefill]: Scheduled task failed, error: {e}");
            }
        });
        handle
    }
}

/// Source of time of the pre-fill runner.
pub trait Clock: Send + Sync + Debug + 'static {
    /// Current time.
    fn now(&self) -> Instant;
}

/// The monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_schedule() {
        let scheduler = TokioScheduler::new(Spawner::current());
        let (tx, rx) = mpsc::channel();
        let start = Instant::now();
        scheduler.schedule(
            Duration::from_millis(20),
            Box::new(move || {
                let _ = tx.send(start.elapsed());
            }),
        );
        let elapsed = tokio::task::spawn_blocking(move || rx.recv().unwrap()).await.unwrap();
        assert!(elapsed >= Duration::from_millis(20));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel() {
        let scheduler = TokioScheduler::new(Spawner::current());
        let ran = Arc::new(AtomicBool::new(false));
        let r = ran.clone();
        let handle = scheduler.schedule(
            Duration::from_millis(20),
            Box::new(move || r.store(true, Ordering::SeqCst)),
        );
        handle.cancel();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!ran.load(Ordering::SeqCst));
    }
}

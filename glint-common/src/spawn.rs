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
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tokio::{
    runtime::{Handle, Runtime},
    task::JoinHandle,
};

use crate::error::{Error, ErrorKind, Result};

/// An owned runtime that is shut down in the background on drop.
///
/// Dropping a runtime from inside an async context panics, and the last spawner may well be dropped there.
struct OwnedRuntime(Option<Runtime>);

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

/// Handle of a task spawned by [`Spawner`].
///
/// Awaiting it yields the task output, or an [`ErrorKind::Join`] error if the task panicked or was aborted.
#[derive(Debug)]
pub struct SpawnHandle<T> {
    join: JoinHandle<T>,
}

impl<T> SpawnHandle<T> {
    /// Abort the task. A blocking task that has started runs to completion.
    pub fn abort(&self) {
        self.join.abort();
    }

    /// Returns `true` if the task has finished.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl<T> Future for SpawnHandle<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.join)
            .poll(cx)
            .map_err(|e| Error::new(ErrorKind::Join, "task failed to complete").with_source(e))
    }
}

/// Where glint runs its background and blocking work.
///
/// Built from a [`Handle`] of a runtime owned by the caller, or from a [`Runtime`] that the spawner keeps alive
/// until the last clone is dropped.
#[derive(Clone)]
pub struct Spawner {
    handle: Handle,
    owned: Option<Arc<OwnedRuntime>>,
}

impl Debug for Spawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spawner")
            .field("flavor", &self.handle.runtime_flavor())
            .field("owned", &self.owned.is_some())
            .finish()
    }
}

impl From<Runtime> for Spawner {
    fn from(runtime: Runtime) -> Self {
        Self {
            handle: runtime.handle().clone(),
            owned: Some(Arc::new(OwnedRuntime(Some(runtime)))),
        }
    }
}

impl From<Handle> for Spawner {
    fn from(handle: Handle) -> Self {
        Self { handle, owned: None }
    }
}

impl Spawner {
    /// Spawn a future on the runtime.
    pub fn spawn<F>(&self, future: F) -> SpawnHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        SpawnHandle {
            join: self.handle.spawn(future),
        }
    }

    /// Run a blocking closure on the blocking pool of the runtime.
    pub fn spawn_blocking<F, R>(&self, func: F) -> SpawnHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        SpawnHandle {
            join: self.handle.spawn_blocking(func),
        }
    }

    /// Handle of the runtime.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Spawner of the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn current() -> Self {
        Handle::current().into()
    }

    /// Spawner of the current tokio runtime, or `None` outside of one.
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::from)
    }
}

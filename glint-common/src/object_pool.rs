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
    mem::ManuallyDrop,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use crossbeam::queue::ArrayQueue;

type Create<T> = Arc<dyn Fn() -> T + Send + Sync + 'static>;

/// A bounded, lock-free pool of reusable objects.
///
/// Acquiring from an empty pool builds a fresh object. Objects released into a full pool are dropped, so the pool
/// never holds more than `capacity` idle objects. Clones share the same idle set.
pub struct ObjectPool<T> {
    /// `None` if the pool keeps nothing.
    idle: Option<Arc<ArrayQueue<T>>>,
    create: Create<T>,
}

impl<T> Clone for ObjectPool<T> {
    fn clone(&self) -> Self {
        Self {
            idle: self.idle.clone(),
            create: self.create.clone(),
        }
    }
}

impl<T> Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPool")
            .field("idle", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl<T> ObjectPool<T>
where
    T: Default + 'static,
{
    /// Create a pool that keeps up to `capacity` idle objects, built with [`Default`].
    pub fn new(capacity: usize) -> Self {
        Self::new_with_create(capacity, T::default)
    }
}

impl<T> ObjectPool<T> {
    /// Create a pool that keeps up to `capacity` idle objects, built with `create`.
    pub fn new_with_create(capacity: usize, create: impl Fn() -> T + Send + Sync + 'static) -> Self {
        let idle = (capacity > 0).then(|| Arc::new(ArrayQueue::new(capacity)));
        Self {
            idle,
            create: Arc::new(create),
        }
    }

    /// Take an idle object, or build one.
    pub fn acquire(&self) -> T {
        self.idle
            .as_deref()
            .and_then(ArrayQueue::pop)
            .unwrap_or_else(|| (self.create)())
    }

    /// Return an object for reuse.
    pub fn release(&self, item: T) {
        if let Some(idle) = self.idle.as_deref() {
            // Full, drop it.
            let _ = idle.push(item);
        }
    }

    /// Take an object that is released when the guard drops.
    pub fn pooled(&self) -> Pooled<'_, T> {
        Pooled {
            item: ManuallyDrop::new(self.acquire()),
            pool: self,
        }
    }

    /// Max count of idle objects.
    pub fn capacity(&self) -> usize {
        self.idle.as_deref().map_or(0, ArrayQueue::capacity)
    }

    /// Count of idle objects.
    pub fn len(&self) -> usize {
        self.idle.as_deref().map_or(0, ArrayQueue::len)
    }

    /// Returns `true` if there is no idle object.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Guard of an object taken by [`ObjectPool::pooled`].
pub struct Pooled<'a, T> {
    item: ManuallyDrop<T>,
    pool: &'a ObjectPool<T>,
}

impl<T> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.item
    }
}

impl<T> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        // SAFETY: `item` is not touched after this.
        let item = unsafe { ManuallyDrop::take(&mut self.item) };
        self.pool.release(item);
    }
}

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
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    sync::Arc,
};

use glint_common::{metrics::model::Metrics, strict_assert, trim::TrimLevel};
use parking_lot::Mutex;

use crate::grouped::GroupedLinkedMap;

/// Default budget of [`LruArrayPool`]: 4 MiB.
pub const DEFAULT_ARRAY_POOL_SIZE: usize = 4 * 1024 * 1024;

/// A standard size to use to increase hit rates when the required size isn't defined: 64 KiB.
pub const STANDARD_BUFFER_SIZE_BYTES: usize = 64 * 1024;

/// A pooled array larger than `max_size / SINGLE_ARRAY_MAX_SIZE_DIVISOR` bytes is dropped.
const SINGLE_ARRAY_MAX_SIZE_DIVISOR: usize = 2;

/// A larger pooled array may serve a request this many times smaller, unless the pool is at most half full.
const MAX_OVER_SIZE_MULTIPLE: usize = 8;

/// Element kind of a pooled array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayKind {
    /// `Vec<u8>`.
    Byte,
    /// `Vec<i32>`.
    Int,
}

/// A type-erased pooled array.
#[derive(Debug)]
pub enum PooledArray {
    /// A byte array.
    Byte(Vec<u8>),
    /// An int array.
    Int(Vec<i32>),
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for i32 {}
}

/// Element types [`LruArrayPool`] can pool.
pub trait ArrayElement: sealed::Sealed + Copy + Default + Send + 'static {
    /// Element kind.
    const KIND: ArrayKind;
    /// Size of one element in bytes.
    const ELEMENT_SIZE: usize;
    /// Tag for logging.
    const TAG: &'static str;

    /// Erase the element type.
    fn wrap(array: Vec<Self>) -> PooledArray;

    /// Restore the element type.
    fn unwrap(array: PooledArray) -> Option<Vec<Self>>;
}

impl ArrayElement for u8 {
    const KIND: ArrayKind = ArrayKind::Byte;
    const ELEMENT_SIZE: usize = 1;
    const TAG: &'static str = "ByteArrayPool";

    fn wrap(array: Vec<Self>) -> PooledArray {
        PooledArray::Byte(array)
    }

    fn unwrap(array: PooledArray) -> Option<Vec<Self>> {
        match array {
            PooledArray::Byte(v) => Some(v),
            PooledArray::Int(_) => None,
        }
    }
}

impl ArrayElement for i32 {
    const KIND: ArrayKind = ArrayKind::Int;
    const ELEMENT_SIZE: usize = 4;
    const TAG: &'static str = "IntegerArrayPool";

    fn wrap(array: Vec<Self>) -> PooledArray {
        PooledArray::Int(array)
    }

    fn unwrap(array: PooledArray) -> Option<Vec<Self>> {
        match array {
            PooledArray::Int(v) => Some(v),
            PooledArray::Byte(_) => None,
        }
    }
}

impl PooledArray {
    fn byte_size(&self) -> usize {
        match self {
            PooledArray::Byte(v) => v.len() * u8::ELEMENT_SIZE,
            PooledArray::Int(v) => v.len() * i32::ELEMENT_SIZE,
        }
    }

    fn key(&self) -> ArrayKey {
        match self {
            PooledArray::Byte(v) => ArrayKey {
                len: v.len(),
                kind: ArrayKind::Byte,
            },
            PooledArray::Int(v) => ArrayKey {
                len: v.len(),
                kind: ArrayKind::Int,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ArrayKey {
    len: usize,
    kind: ArrayKind,
}

#[derive(Debug)]
struct ArrayPoolInner {
    grouped: GroupedLinkedMap<ArrayKey, PooledArray>,
    sorted_sizes: HashMap<ArrayKind, BTreeMap<usize, usize>>,
    max_size: usize,
    current_size: usize,
}

impl ArrayPoolInner {
    fn is_no_more_than_half_full(&self) -> bool {
        self.current_size == 0 || self.max_size / self.current_size >= 2
    }

    fn may_fill_request(&self, requested: usize, actual: usize) -> bool {
        self.is_no_more_than_half_full() || actual <= MAX_OVER_SIZE_MULTIPLE * requested
    }

    fn take(&mut self, key: ArrayKey) -> Option<PooledArray> {
        let array = self.grouped.get(&key)?;
        self.decrement(key);
        let size = array.byte_size();
        strict_assert!(self.current_size >= size);
        self.current_size = self.current_size.saturating_sub(size);
        Some(array)
    }

    fn decrement(&mut self, key: ArrayKey) {
        match self
            .sorted_sizes
            .get_mut(&key.kind)
            .and_then(|sizes| sizes.get_mut(&key.len))
        {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                if let Some(sizes) = self.sorted_sizes.get_mut(&key.kind) {
                    sizes.remove(&key.len);
                }
            }
            None => panic!("tried to decrement empty size, key: {key:?}, this: {self:?}"),
        }
    }

    fn evict_to_size(&mut self, size: usize, metrics: &Metrics, garbages: &mut Vec<PooledArray>) {
        while self.current_size > size {
            let evicted = match self.grouped.remove_last() {
                Some(evicted) => evicted,
                None => {
                    tracing::warn!("[array pool]: Size mismatch, resetting. {self:?}");
                    self.current_size = 0;
                    break;
                }
            };
            self.decrement(evicted.key());
            self.current_size = self.current_size.saturating_sub(evicted.byte_size());
            metrics.array_pool_evict.increase(1);
            garbages.push(evicted);
        }
        metrics.array_pool_usage.absolute(self.current_size as _);
    }
}

/// An LRU pool of `Vec<u8>` and `Vec<i32>` scratch buffers under a byte budget.
///
/// Contents of returned arrays are unspecified.
pub struct LruArrayPool {
    inner: Mutex<ArrayPoolInner>,
    metrics: Arc<Metrics>,
}

impl Debug for LruArrayPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruArrayPool").field("inner", &*self.inner.lock()).finish()
    }
}

impl Default for LruArrayPool {
    fn default() -> Self {
        Self::new(DEFAULT_ARRAY_POOL_SIZE)
    }
}

impl LruArrayPool {
    /// Create an array pool with the given budget in bytes.
    pub fn new(max_size: usize) -> Self {
        Self::with_metrics(max_size, Arc::new(Metrics::noop()))
    }

    /// Create an array pool with the given budget in bytes and metrics.
    pub fn with_metrics(max_size: usize, metrics: Arc<Metrics>) -> Self {
        let inner = ArrayPoolInner {
            grouped: GroupedLinkedMap::new(),
            sorted_sizes: HashMap::new(),
            max_size,
            current_size: 0,
        };
        Self {
            inner: Mutex::new(inner),
            metrics,
        }
    }

    /// Get an array with a length of at least `size`.
    ///
    /// A pooled array is reused if it is at most 8 times larger than requested, or if the pool is no more than half
    /// full. On miss, an array of the next power of two length is allocated so it can serve nearby sizes later.
    pub fn get<T>(&self, size: usize) -> Vec<T>
    where
        T: ArrayElement,
    {
        let array = {
            let mut inner = self.inner.lock();
            let possible = inner
                .sorted_sizes
                .get(&T::KIND)
                .and_then(|sizes| sizes.range(size..).next())
                .map(|(len, _)| *len);
            let key = match possible {
                Some(len) if inner.may_fill_request(size, len) => ArrayKey { len, kind: T::KIND },
                _ => ArrayKey { len: size, kind: T::KIND },
            };
            let array = inner.take(key).and_then(T::unwrap);
            self.metrics.array_pool_usage.absolute(inner.current_size as _);
            array
        };
        self.hit_or_allocate(array, size.next_power_of_two())
    }

    /// Get an array with a length of exactly `size`.
    pub fn get_exact<T>(&self, size: usize) -> Vec<T>
    where
        T: ArrayElement,
    {
        let array = {
            let mut inner = self.inner.lock();
            let array = inner.take(ArrayKey { len: size, kind: T::KIND }).and_then(T::unwrap);
            self.metrics.array_pool_usage.absolute(inner.current_size as _);
            array
        };
        self.hit_or_allocate(array, size)
    }

    fn hit_or_allocate<T>(&self, array: Option<Vec<T>>, len: usize) -> Vec<T>
    where
        T: ArrayElement,
    {
        match array {
            Some(array) => {
                self.metrics.array_pool_hit.increase(1);
                array
            }
            None => {
                tracing::trace!("[array pool]: Allocated {len} bytes, tag: {}", T::TAG);
                self.metrics.array_pool_miss.increase(1);
                vec![T::default(); len]
            }
        }
    }

    /// Give an array to the pool. Arrays larger than half of the budget are dropped.
    pub fn put<T>(&self, array: Vec<T>)
    where
        T: ArrayElement,
    {
        let array = T::wrap(array);
        let size = array.byte_size();
        let mut garbages = vec![];
        {
            let mut inner = self.inner.lock();
            if size > inner.max_size / SINGLE_ARRAY_MAX_SIZE_DIVISOR {
                tracing::trace!("[array pool]: Reject array of {size} bytes, tag: {}", T::TAG);
                self.metrics.array_pool_reject.increase(1);
                garbages.push(array);
            } else {
                let key = array.key();
                inner.grouped.put(key, array);
                *inner
                    .sorted_sizes
                    .entry(key.kind)
                    .or_default()
                    .entry(key.len)
                    .or_default() += 1;
                inner.current_size += size;
                self.metrics.array_pool_put.increase(1);

                let max_size = inner.max_size;
                inner.evict_to_size(max_size, &self.metrics, &mut garbages);
            }
        }
        drop(garbages);
    }

    /// Drop all pooled arrays.
    pub fn clear_memory(&self) {
        self.evict_to(|_| 0);
    }

    /// Drop pooled arrays according to the memory pressure `level`.
    pub fn trim_memory(&self, level: TrimLevel) {
        self.evict_to(|max_size| level.target_size(max_size).unwrap_or(usize::MAX));
    }

    fn evict_to(&self, size: impl FnOnce(usize) -> usize) {
        let mut garbages = vec![];
        {
            let mut inner = self.inner.lock();
            let size = size(inner.max_size);
            inner.evict_to_size(size, &self.metrics, &mut garbages);
        }
        drop(garbages);
    }

    /// Bytes of all pooled arrays.
    pub fn current_size(&self) -> usize {
        self.inner.lock().current_size
    }

    /// Budget in bytes.
    pub fn max_size(&self) -> usize {
        self.inner.lock().max_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_reuse_same_kind_only() {
        let pool = LruArrayPool::new(1024);
        pool.put(vec![7u8; 64]);
        assert_eq!(pool.current_size(), 64);

        let ints = pool.get::<i32>(16);
        assert_eq!(ints.len(), 16);
        assert_eq!(pool.current_size(), 64);

        let bytes = pool.get::<u8>(64);
        assert_eq!(bytes.len(), 64);
        assert_eq!(bytes[0], 7);
        assert_eq!(pool.current_size(), 0);
    }

    #[test_log::test]
    fn test_int_arrays_account_element_size() {
        let pool = LruArrayPool::new(1024);
        pool.put(vec![0i32; 32]);
        assert_eq!(pool.current_size(), 128);
        assert_eq!(pool.get_exact::<i32>(32).len(), 32);
        assert_eq!(pool.current_size(), 0);
    }

    #[test_log::test]
    fn test_large_arrays_are_dropped() {
        let pool = LruArrayPool::new(1024);
        pool.put(vec![0u8; 513]);
        assert_eq!(pool.current_size(), 0);
        pool.put(vec![0u8; 512]);
        assert_eq!(pool.current_size(), 512);
    }

    #[test_log::test]
    fn test_get_at_least_requested() {
        let pool = LruArrayPool::new(1024);
        pool.put(vec![0u8; 100]);
        assert!(pool.get::<u8>(200).len() >= 200);
        // The pool is no more than half full, so a much larger array can be used.
        assert_eq!(pool.get::<u8>(5).len(), 100);
    }

    #[test_log::test]
    fn test_oversized_reuse_needs_room() {
        let pool = LruArrayPool::new(1024);
        pool.put(vec![0u8; 400]);
        pool.put(vec![0u8; 400]);
        // 800 of 1024 bytes in use: a 400 byte array is more than 8 times a 10 byte request.
        assert_eq!(pool.get::<u8>(10).len(), 16);
        assert_eq!(pool.get::<u8>(50).len(), 400);
    }

    #[test_log::test]
    fn test_get_exact() {
        let pool = LruArrayPool::new(1024);
        pool.put(vec![0u8; 100]);
        assert_eq!(pool.get_exact::<u8>(99).len(), 99);
        assert_eq!(pool.current_size(), 100);
        assert_eq!(pool.get_exact::<u8>(100).len(), 100);
        assert_eq!(pool.current_size(), 0);
    }

    #[test_log::test]
    fn test_evict_lru_first() {
        let pool = LruArrayPool::new(1000);
        pool.put(vec![1u8; 400]);
        pool.put(vec![2u8; 300]);
        pool.put(vec![3u8; 400]);
        // The second put refreshes the 400 byte group, so the 300 byte array is evicted.
        assert_eq!(pool.current_size(), 800);
        assert_eq!(pool.get_exact::<u8>(400)[0], 3);
        assert_eq!(pool.get_exact::<u8>(400)[0], 1);
        assert_eq!(pool.get_exact::<u8>(300)[0], 0);
        assert_eq!(pool.current_size(), 0);
    }

    #[test_log::test]
    fn test_trim_memory() {
        let pool = LruArrayPool::new(1000);
        for _ in 0..4 {
            pool.put(vec![0u8; 250]);
        }
        pool.trim_memory(TrimLevel::Moderate);
        assert_eq!(pool.current_size(), 500);
        pool.trim_memory(TrimLevel::Complete);
        assert_eq!(pool.current_size(), 0);
        pool.trim_memory(TrimLevel::Complete);
        assert_eq!(pool.current_size(), 0);
    }
}

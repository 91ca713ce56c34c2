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

use std::{sync::Arc, thread};

use glint_memory::{prelude::*, strategy::MAX_SIZE_MULTIPLE};
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn bitmap(width: u32, height: u32, format: PixelFormat) -> Bitmap {
    Bitmap::allocate(width, height, format)
}

#[test_log::test]
fn test_pool_evicts_once_when_over_budget() {
    let pool = LruBitmapPool::<Bitmap>::new(100);

    for _ in 0..3 {
        // 10 x 1 x 4 = 40 bytes
        pool.put(bitmap(10, 1, PixelFormat::Argb8888));
    }

    assert_eq!(pool.eviction_count(), 1);
    assert!(pool.current_size() <= 100);
    assert_eq!(pool.current_size(), 80);
    assert_eq!(pool.put_count(), 3);
}

#[test_log::test]
fn test_pool_trim_is_idempotent() {
    let pool = LruBitmapPool::<Bitmap>::new(1000);
    for i in 1..=5 {
        pool.put(bitmap(10 * i, 1, PixelFormat::Argb8888));
    }
    assert_eq!(pool.current_size(), 40 + 80 + 120 + 160 + 200);

    pool.trim_memory(TrimLevel::Moderate);
    let size = pool.current_size();
    let evictions = pool.eviction_count();
    assert!(size <= 500);

    pool.trim_memory(TrimLevel::Moderate);
    assert_eq!(pool.current_size(), size);
    assert_eq!(pool.eviction_count(), evictions);

    pool.trim_memory(TrimLevel::Complete);
    assert_eq!(pool.current_size(), 0);
    pool.trim_memory(TrimLevel::Complete);
    assert_eq!(pool.current_size(), 0);
}

#[test_log::test]
fn test_pool_never_exceeds_budget() {
    const MAX: usize = 4096;

    let pool = LruBitmapPoolBuilder::new(MAX)
        .with_strategy(StrategyKind::Size)
        .build::<Bitmap>();
    let mut rng = SmallRng::seed_from_u64(114514);

    for _ in 0..2000 {
        let width = rng.random_range(1..=24);
        let height = rng.random_range(1..=24);
        let format = [PixelFormat::Alpha8, PixelFormat::Rgb565, PixelFormat::Argb8888][rng.random_range(0..3)];
        if rng.random_bool(0.5) {
            pool.put(bitmap(width, height, format));
        } else {
            let buffer = pool.get(width, height, format);
            assert_eq!(buffer.width(), width);
            assert_eq!(buffer.height(), height);
            assert_eq!(buffer.format(), format);
            assert!(buffer.allocation_size() >= bitmap_byte_size(width, height, format));
            assert!(buffer.allocation_size() <= MAX_SIZE_MULTIPLE * bitmap_byte_size(width, height, format));
            assert!(buffer.pixels().iter().all(|b| *b == 0));
        }
        assert!(pool.current_size() <= MAX);
    }
}

#[test_log::test]
fn test_pool_concurrent_access() {
    let pool = Arc::new(LruBitmapPool::<Bitmap>::new(64 * 1024));

    let handles = (0..4)
        .map(|seed| {
            let pool = pool.clone();
            thread::spawn(move || {
                let mut rng = SmallRng::seed_from_u64(seed);
                for _ in 0..1000 {
                    let width = rng.random_range(1..=32);
                    let height = rng.random_range(1..=32);
                    let buffer = pool.get_dirty(width, height, PixelFormat::Argb8888);
                    pool.put(buffer);
                }
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(pool.current_size() <= 64 * 1024);
    assert_eq!(pool.hit_count() + pool.miss_count(), 4000);
}

#[test_log::test]
fn test_array_pool_serves_pooled_arrays() {
    let pool = LruArrayPool::new(64 * 1024);

    let bytes = pool.get::<u8>(1000);
    assert!(bytes.len() >= 1000);
    let capacity = bytes.len();
    pool.put(bytes);
    assert_eq!(pool.current_size(), capacity);

    let reused = pool.get::<u8>(900);
    assert_eq!(reused.len(), capacity);
    assert_eq!(pool.current_size(), 0);

    let ints = pool.get_exact::<i32>(10);
    assert_eq!(ints.len(), 10);
}

#[test_log::test]
fn test_calculator_feeds_pools() {
    let calculator = MemorySizeCalculatorBuilder::new(256 * 1024 * 1024, 1080, 1920)
        .build()
        .unwrap();

    let pool = LruBitmapPool::<Bitmap>::new(calculator.bitmap_pool_size());
    let arrays = LruArrayPool::new(calculator.array_pool_size());
    assert_eq!(pool.max_size(), calculator.bitmap_pool_size());
    assert_eq!(arrays.max_size(), calculator.array_pool_size());
}

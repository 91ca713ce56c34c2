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
    fs,
    io::Write,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
};

use glint_common::code::{DataCacheKey, ObjectKey, VersionSignature};
use glint_storage::prelude::*;
use rand::{rngs::SmallRng, RngCore, SeedableRng};

type Key = DataCacheKey<ObjectKey<String>, VersionSignature>;

fn key(url: &str, version: u32) -> Key {
    DataCacheKey::new(ObjectKey(url.to_string()), VersionSignature(version))
}

#[test_log::test]
fn test_disk_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DiskLruCacheWrapper::<Key>::new(dir.path(), 1024 * 1024);

    let mut rng = SmallRng::seed_from_u64(42);
    let mut data = vec![0u8; 64 * 1024];
    rng.fill_bytes(&mut data);

    let k = key("https://example.com/a.png", 1);
    let payload = data.clone();
    cache.put(&k, Box::new(move |sink: &mut dyn Write| sink.write_all(&payload).is_ok()));

    let path = cache.get(&k).unwrap();
    assert_eq!(fs::read(&path).unwrap(), data);
    assert!(cache.get(&key("https://example.com/a.png", 2)).is_none());

    // A new cache over the same directory sees the entry after the first one is gone.
    drop(cache);
    let cache = DiskLruCacheWrapper::<Key>::new(dir.path(), 1024 * 1024);
    assert_eq!(cache.get(&k), Some(path));
}

#[test_log::test]
fn test_concurrent_puts_of_same_key() {
    const THREADS: usize = 8;

    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(DiskLruCacheWrapper::<Key>::new(dir.path(), 1024 * 1024));
    let barrier = Arc::new(Barrier::new(THREADS));
    let writes = Arc::new(AtomicUsize::new(0));

    let handles = (0..THREADS)
        .map(|i| {
            let cache = cache.clone();
            let barrier = barrier.clone();
            let writes = writes.clone();
            thread::spawn(move || {
                barrier.wait();
                cache.put(
                    &key("https://example.com/race.png", 0),
                    Box::new(move |sink: &mut dyn Write| {
                        writes.fetch_add(1, Ordering::SeqCst);
                        sink.write_all(format!("writer-{i}").as_bytes()).is_ok()
                    }),
                );
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(writes.load(Ordering::SeqCst), 1);
    let content = fs::read_to_string(cache.get(&key("https://example.com/race.png", 0)).unwrap()).unwrap();
    assert!(content.starts_with("writer-"));
    // Only the committed entry is left, no unfinished edits.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test_log::test]
fn test_disk_budget_is_respected() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DiskLruCacheWrapper::<Key>::new(dir.path(), 4096);

    for i in 0..16 {
        cache.put(
            &key("https://example.com/item.png", i),
            Box::new(|sink: &mut dyn Write| sink.write_all(&[7u8; 1024]).is_ok()),
        );
    }

    let total = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().metadata().unwrap().len())
        .sum::<u64>();
    assert!(total <= 4096);
    for i in 12..16 {
        assert!(cache.get(&key("https://example.com/item.png", i)).is_some());
    }
    assert!(cache.get(&key("https://example.com/item.png", 0)).is_none());
}

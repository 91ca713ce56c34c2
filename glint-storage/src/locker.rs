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

use std::{collections::HashMap, fmt::Debug, sync::Arc};

use glint_common::{object_pool::ObjectPool, strict_assert};
use parking_lot::{Condvar, Mutex};

/// Count of idle key locks kept for reuse.
pub const WRITE_LOCK_POOL_CAPACITY: usize = 10;

#[derive(Debug, Default)]
struct KeyLock {
    locked: Mutex<bool>,
    cond: Condvar,
}

impl KeyLock {
    fn lock(&self) {
        let mut locked = self.locked.lock();
        while *locked {
            self.cond.wait(&mut locked);
        }
        *locked = true;
    }

    fn unlock(&self) {
        let mut locked = self.locked.lock();
        strict_assert!(*locked);
        *locked = false;
        self.cond.notify_one();
    }
}

struct Entry {
    lock: Arc<KeyLock>,
    interested: usize,
}

/// Serializes writers of the same hashed key, writers of different keys run in parallel.
///
/// Key locks are reference counted by interested threads and returned to a small pool when idle.
pub struct WriteLocker {
    locks: Mutex<HashMap<String, Entry>>,
    pool: ObjectPool<Arc<KeyLock>>,
}

impl Debug for WriteLocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteLocker")
            .field("locks", &self.locks.lock().len())
            .field("pool", &self.pool)
            .finish()
    }
}

impl Default for WriteLocker {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteLocker {
    /// Create a write locker.
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            pool: ObjectPool::new(WRITE_LOCK_POOL_CAPACITY),
        }
    }

    /// Block until the write lock of `key` is acquired. The lock is released when the guard drops.
    pub fn lock(&self, key: &str) -> WriteGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock();
            let entry = locks.entry(key.to_string()).or_insert_with(|| Entry {
                lock: self.pool.acquire(),
                interested: 0,
            });
            entry.interested += 1;
            entry.lock.clone()
        };
        lock.lock();
        WriteGuard {
            locker: self,
            key: key.to_string(),
            lock,
        }
    }

    /// Count of keys that are locked or waited on.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Returns `true` if no key is locked or waited on.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, key: &str) {
        let idle = {
            let mut locks = self.locks.lock();
            let entry = match locks.get_mut(key) {
                Some(entry) => entry,
                None => panic!("releasing a write lock that is not held, key: {key}"),
            };
            strict_assert!(entry.interested > 0);
            entry.interested -= 1;
            match entry.interested {
                0 => locks.remove(key),
                _ => None,
            }
        };
        if let Some(entry) = idle {
            self.pool.release(entry.lock);
        }
    }
}

/// Guard of a write lock acquired by [`WriteLocker::lock`].
#[must_use]
pub struct WriteGuard<'a> {
    locker: &'a WriteLocker,
    key: String,
    lock: Arc<KeyLock>,
}

impl Debug for WriteGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteGuard").field("key", &self.key).finish()
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock();
        self.locker.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
        time::Duration,
    };

    use super::*;

    #[test]
    fn test_same_key_is_exclusive() {
        let locker = Arc::new(WriteLocker::new());
        let inside = Arc::new(AtomicUsize::new(0));

        let handles = (0..8)
            .map(|_| {
                let locker = locker.clone();
                let inside = inside.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        let _guard = locker.lock("key");
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(locker.is_empty());
    }

    #[test]
    fn test_different_keys_are_parallel() {
        let locker = Arc::new(WriteLocker::new());
        let _a = locker.lock("a");

        let other = locker.clone();
        let handle = thread::spawn(move || {
            let _b = other.lock("b");
        });
        // Would hang if "b" waited for "a".
        handle.join().unwrap();
        assert_eq!(locker.len(), 1);
    }

    #[test]
    fn test_locks_are_recycled() {
        let locker = WriteLocker::new();
        for i in 0..WRITE_LOCK_POOL_CAPACITY * 2 {
            drop(locker.lock(&i.to_string()));
        }
        assert!(locker.is_empty());
        assert_eq!(locker.pool.len(), 1);

        let guards = (0..WRITE_LOCK_POOL_CAPACITY * 2)
            .map(|i| locker.lock(&i.to_string()))
            .collect::<Vec<_>>();
        drop(guards);
        assert_eq!(locker.pool.len(), WRITE_LOCK_POOL_CAPACITY);
    }

    #[test]
    fn test_waiter_wakes_up() {
        let locker = Arc::new(WriteLocker::new());
        let guard = locker.lock("key");

        let other = locker.clone();
        let handle = thread::spawn(move || {
            let _guard = other.lock("key");
        });
        thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());
        drop(guard);
        handle.join().unwrap();
        assert!(locker.is_empty());
    }
}

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

use std::fmt::Debug;

use glint_common::{code::CacheKey, object_pool::ObjectPool};
use hashlink::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

/// Count of memoized safe keys.
pub const SAFE_KEY_CACHE_CAPACITY: usize = 1000;
/// Count of idle digest contexts kept for reuse.
pub const DIGEST_POOL_CAPACITY: usize = 10;

/// Turns cache keys into 64 character lower-case hex strings that are safe to use as file names.
pub struct SafeKeyGenerator<K> {
    keys: Mutex<LruCache<K, String>>,
    digests: ObjectPool<Sha256>,
}

impl<K> Debug for SafeKeyGenerator<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeKeyGenerator")
            .field("memoized", &self.keys.lock().len())
            .field("digests", &self.digests)
            .finish()
    }
}

impl<K> Default for SafeKeyGenerator<K>
where
    K: CacheKey,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> SafeKeyGenerator<K>
where
    K: CacheKey,
{
    /// Create a generator.
    pub fn new() -> Self {
        Self {
            keys: Mutex::new(LruCache::new(SAFE_KEY_CACHE_CAPACITY)),
            digests: ObjectPool::new(DIGEST_POOL_CAPACITY),
        }
    }

    /// Get the SHA-256 hex digest of the key.
    pub fn safe_key(&self, key: &K) -> String {
        if let Some(safe) = self.keys.lock().get(key) {
            return safe.clone();
        }
        let safe = self.calculate(key);
        self.keys.lock().insert(key.clone(), safe.clone());
        safe
    }

    fn calculate(&self, key: &K) -> String {
        let mut hasher = self.digests.pooled();
        // A context given back by a panicking key may hold partial input.
        Digest::reset(&mut *hasher);
        key.update_disk_cache_key(&mut hasher);
        format!("{:x}", hasher.finalize_reset())
    }
}

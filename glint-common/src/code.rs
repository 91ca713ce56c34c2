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
    fmt::{Debug, Display},
    hash::Hash,
};

use sha2::{Digest, Sha256};

/// Key of the disk cache.
///
/// Besides identity (`Hash` + `Eq`) a key feeds its canonical bytes into a SHA-256 digest, the digest names the
/// entry on disk. Two keys that are equal must feed identical bytes.
pub trait CacheKey: Hash + Eq + Clone + Debug + Send + Sync + 'static {
    /// Feed the canonical bytes of the key into `hasher`.
    fn update_disk_cache_key(&self, hasher: &mut Sha256);
}

impl CacheKey for String {
    fn update_disk_cache_key(&self, hasher: &mut Sha256) {
        hasher.update(self.as_bytes());
    }
}

impl CacheKey for &'static str {
    fn update_disk_cache_key(&self, hasher: &mut Sha256) {
        hasher.update(self.as_bytes());
    }
}

/// A key built from any displayable model, e.g. a url or a file path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey<T>(pub T);

impl<T> CacheKey for ObjectKey<T>
where
    T: Display + Hash + Eq + Clone + Debug + Send + Sync + 'static,
{
    fn update_disk_cache_key(&self, hasher: &mut Sha256) {
        hasher.update(self.0.to_string().as_bytes());
    }
}

/// A signature that adds nothing to the key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EmptySignature;

impl CacheKey for EmptySignature {
    fn update_disk_cache_key(&self, _: &mut Sha256) {}
}

/// A signature that invalidates cached data whenever the version changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VersionSignature(pub u32);

impl CacheKey for VersionSignature {
    fn update_disk_cache_key(&self, hasher: &mut Sha256) {
        hasher.update(self.0.to_be_bytes());
    }
}

/// Key of original source data: the source key followed by its signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataCacheKey<K, S = EmptySignature> {
    /// Key of the source.
    pub source: K,
    /// Signature of the source.
    pub signature: S,
}

impl<K, S> DataCacheKey<K, S> {
    /// Create a data cache key.
    pub fn new(source: K, signature: S) -> Self {
        Self { source, signature }
    }
}

impl<K, S> CacheKey for DataCacheKey<K, S>
where
    K: CacheKey,
    S: CacheKey,
{
    fn update_disk_cache_key(&self, hasher: &mut Sha256) {
        self.source.update_disk_cache_key(hasher);
        self.signature.update_disk_cache_key(hasher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(key: &impl CacheKey) -> Vec<u8> {
        let mut hasher = Sha256::new();
        key.update_disk_cache_key(&mut hasher);
        hasher.finalize().to_vec()
    }

    #[test]
    fn test_object_key_matches_display() {
        assert_eq!(
            digest(&ObjectKey("https://example.com/a.png")),
            digest(&"https://example.com/a.png".to_string())
        );
    }

    #[test]
    fn test_signatures() {
        let k1 = DataCacheKey::new(ObjectKey(42u64), VersionSignature(1));
        let k2 = DataCacheKey::new(ObjectKey(42u64), VersionSignature(2));
        let k3 = DataCacheKey::new(ObjectKey(42u64), EmptySignature);
        assert_ne!(digest(&k1), digest(&k2));
        assert_eq!(digest(&k3), digest(&ObjectKey(42u64)));
    }
}

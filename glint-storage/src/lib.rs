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

#![cfg_attr(docsrs, feature(doc_cfg))]

//! Disk cache of glint.
//!
//! Entries are files in one directory named by the SHA-256 digest of their [`glint_common::code::CacheKey`]. The
//! directory is bounded by bytes and evicts the least recently used files first.

/// Disk cache trait and implementations.
pub mod disk;
/// Error of the disk store.
pub mod error;
/// Lazy construction of disk caches.
pub mod factory;
/// Per-key write serialization.
pub mod locker;
/// Digest based file names of keys.
pub mod safe_key;
/// Size-bounded LRU file store.
pub mod store;

/// Re-exports of the commonly used types.
pub mod prelude {
    pub use crate::{
        disk::{BoxedWriter, DiskCache, DiskLruCacheWrapper, LazyDiskCache, NoopDiskCache, Writer},
        error::{StoreError, StoreResult},
        factory::{DiskCacheFactory, DEFAULT_DISK_CACHE_DIR, DEFAULT_DISK_CACHE_SIZE},
        safe_key::SafeKeyGenerator,
        store::{Commit, DiskLruStore, Editor},
    };
}

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

use std::{fmt::Debug, path::PathBuf, sync::Arc};

use glint_common::{code::CacheKey, metrics::model::Metrics};

use crate::disk::DiskLruCacheWrapper;

/// Default budget of the disk cache in bytes.
pub const DEFAULT_DISK_CACHE_SIZE: u64 = 250 * 1024 * 1024;
/// Default name of the disk cache directory.
pub const DEFAULT_DISK_CACHE_DIR: &str = "image_manager_disk_cache";

type DirGetter = Arc<dyn Fn() -> Option<PathBuf> + Send + Sync + 'static>;

/// Builds [`DiskLruCacheWrapper`]s.
///
/// The directory getter is only called when a disk cache is built, so it may do slow work like resolving platform
/// directories.
#[derive(Clone)]
pub struct DiskCacheFactory {
    dir: DirGetter,
    max_size: u64,
}

impl Debug for DiskCacheFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskCacheFactory")
            .field("max_size", &self.max_size)
            .finish()
    }
}

impl Default for DiskCacheFactory {
    /// A disk cache of [`DEFAULT_DISK_CACHE_SIZE`] bytes named [`DEFAULT_DISK_CACHE_DIR`] in the temporary directory.
    fn default() -> Self {
        Self::in_dir(std::env::temp_dir(), DEFAULT_DISK_CACHE_DIR, DEFAULT_DISK_CACHE_SIZE)
    }
}

impl DiskCacheFactory {
    /// Create a factory with a lazy directory getter. A getter that returns `None` disables the disk cache.
    pub fn new<F>(dir: F, max_size: u64) -> Self
    where
        F: Fn() -> Option<PathBuf> + Send + Sync + 'static,
    {
        Self {
            dir: Arc::new(dir),
            max_size,
        }
    }

    /// Create a factory for the directory `name` under `parent`.
    pub fn in_dir(parent: impl Into<PathBuf>, name: impl Into<String>, max_size: u64) -> Self {
        let parent = parent.into();
        let name = name.into();
        Self::new(move || Some(parent.join(&name)), max_size)
    }

    /// Budget of built disk caches in bytes.
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Build a disk cache. Returns `None` if the directory is unavailable or cannot be created.
    pub fn build<K>(&self) -> Option<DiskLruCacheWrapper<K>>
    where
        K: CacheKey,
    {
        self.build_with_metrics(Arc::new(Metrics::noop()))
    }

    /// Build a disk cache with metrics. Returns `None` if the directory is unavailable or cannot be created.
    pub fn build_with_metrics<K>(&self, metrics: Arc<Metrics>) -> Option<DiskLruCacheWrapper<K>>
    where
        K: CacheKey,
    {
        let dir = (self.dir)()?;
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!("[disk cache]: Unable to create disk cache directory: {dir:?}, error: {e}");
            return None;
        }
        Some(DiskLruCacheWrapper::with_metrics(dir, self.max_size, metrics))
    }
}

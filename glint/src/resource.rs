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
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use glint_common::event::{Event, EventListener};
use glint_memory::{
    bitmap::{Bitmap, PixelBuffer},
    cache::Resource,
    pool::BitmapPool,
};

/// Key of the memory cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemoryKey {
    /// A decoded image of a source at a target size.
    Image {
        /// Identity of the source, e.g. a url.
        source: String,
        /// Target width in pixels.
        width: u32,
        /// Target height in pixels.
        height: u32,
    },
    /// A key that equals no other key.
    Unique(u64),
}

impl MemoryKey {
    /// Key of a decoded image of `source` at `width` x `height`.
    pub fn image(source: impl Into<String>, width: u32, height: u32) -> Self {
        Self::Image {
            source: source.into(),
            width,
            height,
        }
    }

    /// A fresh key that equals no other key.
    pub fn unique() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self::Unique(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for MemoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryKey::Image { source, width, height } => write!(f, "{source}@{width}x{height}"),
            MemoryKey::Unique(id) => write!(f, "unique#{id}"),
        }
    }
}

/// A bitmap held by the memory cache.
///
/// Cache hits hand out clones that share the bitmap. The bitmap goes back to the pool when it leaves the cache
/// while nobody else holds it.
#[derive(Debug, Clone)]
pub struct BitmapResource {
    bitmap: Arc<Bitmap>,
}

impl BitmapResource {
    /// Wrap a bitmap.
    pub fn new(bitmap: Bitmap) -> Self {
        Self {
            bitmap: Arc::new(bitmap),
        }
    }

    /// The shared bitmap.
    pub fn bitmap(&self) -> &Arc<Bitmap> {
        &self.bitmap
    }

    /// Take the bitmap back if this is the only holder.
    pub fn into_inner(self) -> Option<Bitmap> {
        Arc::into_inner(self.bitmap)
    }
}

impl Resource for BitmapResource {
    fn size(&self) -> usize {
        self.bitmap.allocation_size()
    }
}

/// Returns bitmaps leaving the memory cache to the bitmap pool.
pub struct PoolRecycler {
    pool: Arc<dyn BitmapPool<Bitmap>>,
}

impl Debug for PoolRecycler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolRecycler").field("pool", &self.pool).finish()
    }
}

impl PoolRecycler {
    /// Create a recycler that puts bitmaps into `pool`.
    pub fn new(pool: Arc<dyn BitmapPool<Bitmap>>) -> Self {
        Self { pool }
    }
}

impl EventListener for PoolRecycler {
    type Key = MemoryKey;
    type Value = BitmapResource;

    fn on_leave(&self, reason: Event, key: MemoryKey, resource: BitmapResource) {
        tracing::trace!("[resource cache]: Resource left cache, key: {key}, reason: {reason:?}");
        if let Some(bitmap) = resource.into_inner() {
            self.pool.put(bitmap);
        }
    }
}

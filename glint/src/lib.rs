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

//! glint pools and caches the memory of image loading.
//!
//! A [`Glint`] instance owns:
//!
//! - a bitmap pool that recycles pixel buffers,
//! - an array pool that recycles scratch arrays,
//! - a memory cache of decoded bitmaps that recycles evicted bitmaps into the bitmap pool,
//! - a lazily opened disk cache of encoded data,
//! - a pre-filler that warms the memory cache and the bitmap pool up in the background.
//!
//! ```rust
//! use glint::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let glint: Glint<String> = GlintBuilder::new()
//!     .with_memory_cache_size(64 * 1024 * 1024)
//!     .with_bitmap_pool_size(32 * 1024 * 1024)
//!     .without_disk_cache()
//!     .build()?;
//!
//! let bitmap = glint.bitmap_pool().get(100, 100, PixelFormat::Argb8888);
//! glint.memory_cache().put(MemoryKey::image("https://example.com/a.png", 100, 100), BitmapResource::new(bitmap));
//! glint.trim_memory(TrimLevel::Moderate);
//! # Ok(())
//! # }
//! ```

mod builder;
mod glint;
/// Pre-fill of the memory cache and the bitmap pool.
pub mod prefill;
mod resource;

pub use glint_common as common;
pub use glint_memory as memory;
pub use glint_storage as storage;

pub use crate::{
    builder::{GlintBuilder, DEFAULT_MEMORY_CLASS_BYTES, DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH},
    glint::{Glint, MemoryCategory},
    resource::{BitmapResource, MemoryKey, PoolRecycler},
};

/// Re-exports of the commonly used types.
pub mod prelude {
    pub use glint_common::{
        code::{CacheKey, DataCacheKey, EmptySignature, ObjectKey, VersionSignature},
        error::{Error, ErrorKind, Result},
        event::{Event, EventListener},
        metrics::{registry::noop::NoopMetricsRegistry, BoxedRegistry, RegistryOps},
        spawn::Spawner,
        trim::TrimLevel,
    };
    #[cfg(feature = "prometheus")]
    pub use glint_common::metrics::registry::prometheus::PrometheusMetricsRegistry;
    pub use glint_memory::prelude::*;
    pub use glint_storage::prelude::*;

    pub use crate::{
        prefill::{BitmapPreFiller, PreFillType, PreFillTypeBuilder},
        BitmapResource, Glint, GlintBuilder, MemoryCategory, MemoryKey,
    };
}

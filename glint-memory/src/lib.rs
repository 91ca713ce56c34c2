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

//! In-memory pools and caches of glint.
//!
//! - [`pool::LruBitmapPool`] recycles pixel buffers bucketed by a [`strategy::PoolStrategy`].
//! - [`array::LruArrayPool`] recycles scratch arrays of primitive elements.
//! - [`cache::LruResourceCache`] holds decoded resources bounded by their byte sizes.
//! - [`calculator::MemorySizeCalculator`] derives the budgets of all three from device characteristics.

/// Pool of primitive scratch arrays.
pub mod array;
/// Pixel buffer abstraction and the in-memory bitmap.
pub mod bitmap;
/// Size-bounded LRU resource cache.
pub mod cache;
/// Memory budget calculation.
pub mod calculator;
/// Multimap with LRU order over its groups.
pub mod grouped;
/// Size-bounded LRU bitmap pool.
pub mod pool;
/// Bucketing policies of the bitmap pool.
pub mod strategy;

/// Re-exports of the commonly used types.
pub mod prelude;

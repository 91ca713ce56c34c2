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

pub use glint_common::{event::Event, trim::TrimLevel};

pub use crate::{
    array::{ArrayElement, ArrayKind, LruArrayPool, PooledArray},
    bitmap::{bitmap_byte_size, Bitmap, PixelBuffer, PixelFormat},
    cache::{LruResourceCache, MemoryCache, NoopMemoryCache, Resource, ResourceRemovedListener},
    calculator::{MemorySizeCalculator, MemorySizeCalculatorBuilder},
    grouped::GroupedLinkedMap,
    pool::{BitmapPool, LruBitmapPool, LruBitmapPoolBuilder, NoopBitmapPool},
    strategy::{
        AttributeKey, AttributeStrategy, BoxedPoolStrategy, PoolStrategy, SizeFormatKey, SizeFormatStrategy, SizeKey,
        SizeStrategy, StrategyKind,
    },
};

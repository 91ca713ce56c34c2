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

use serde::{Deserialize, Serialize};

use crate::bitmap::{PixelBuffer, PixelFormat};

mod attribute;
mod size;
mod size_format;

pub use attribute::{AttributeKey, AttributeStrategy};
pub use size::{SizeKey, SizeStrategy};
pub use size_format::{SizeFormatKey, SizeFormatStrategy};

/// Size-tolerant strategies reuse a pooled buffer at most this many times larger than requested.
pub const MAX_SIZE_MULTIPLE: usize = 8;

/// A bucketing policy that maps pixel buffers to pool keys.
pub trait PoolStrategy<B>: Send + Debug + 'static
where
    B: PixelBuffer,
{
    /// Add a buffer to the bucket of its key.
    fn put(&mut self, buffer: B);

    /// Take a buffer that can hold `width` x `height` pixels of `format`.
    ///
    /// A returned buffer has already been reconfigured to the request.
    fn get(&mut self, width: u32, height: u32, format: PixelFormat) -> Option<B>;

    /// Take a buffer from the least recently used bucket.
    fn remove_last(&mut self) -> Option<B>;

    /// Size of the buffer as accounted by the pool.
    fn size_of(&self, buffer: &B) -> usize {
        buffer.allocation_size()
    }

    /// Describe a buffer for logging.
    fn describe(&self, buffer: &B) -> String;

    /// Describe a request for logging.
    fn describe_request(&self, width: u32, height: u32, format: PixelFormat) -> String;

    /// Count of pooled buffers.
    fn len(&self) -> usize;

    /// Returns `true` if no buffer is pooled.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Boxed generic pool strategy.
pub type BoxedPoolStrategy<B> = Box<dyn PoolStrategy<B>>;

/// Which bucketing policy a pool uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Exact (width, height, format) matches only. For platforms that cannot reconfigure buffers.
    Attribute,
    /// Byte size only, any format.
    Size,
    /// Byte size and compatible formats.
    #[default]
    SizeFormat,
}

impl StrategyKind {
    /// Build a strategy of this kind.
    pub fn build<B>(self) -> BoxedPoolStrategy<B>
    where
        B: PixelBuffer,
    {
        match self {
            StrategyKind::Attribute => Box::new(AttributeStrategy::new()),
            StrategyKind::Size => Box::new(SizeStrategy::new()),
            StrategyKind::SizeFormat => Box::new(SizeFormatStrategy::new()),
        }
    }
}

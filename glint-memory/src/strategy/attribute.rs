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

use std::fmt::{Debug, Display};

use crate::{
    bitmap::{PixelBuffer, PixelFormat},
    grouped::GroupedLinkedMap,
    strategy::PoolStrategy,
};

/// Bucket key of [`AttributeStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeKey {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: PixelFormat,
}

impl Display for AttributeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}x{}], {}", self.width, self.height, self.format)
    }
}

/// Reuses a buffer only if width, height and format all match the request.
pub struct AttributeStrategy<B> {
    grouped: GroupedLinkedMap<AttributeKey, B>,
}

impl<B> Debug for AttributeStrategy<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AttributeStrategy:\n  {:?}", self.grouped)
    }
}

impl<B> Default for AttributeStrategy<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> AttributeStrategy<B> {
    /// Create an empty strategy.
    pub fn new() -> Self {
        Self {
            grouped: GroupedLinkedMap::new(),
        }
    }
}

fn key_of(buffer: &impl PixelBuffer) -> AttributeKey {
    AttributeKey {
        width: buffer.width(),
        height: buffer.height(),
        format: buffer.format(),
    }
}

impl<B> PoolStrategy<B> for AttributeStrategy<B>
where
    B: PixelBuffer,
{
    fn put(&mut self, buffer: B) {
        self.grouped.put(key_of(&buffer), buffer);
    }

    fn get(&mut self, width: u32, height: u32, format: PixelFormat) -> Option<B> {
        self.grouped.get(&AttributeKey { width, height, format })
    }

    fn remove_last(&mut self) -> Option<B> {
        self.grouped.remove_last()
    }

    fn describe(&self, buffer: &B) -> String {
        key_of(buffer).to_string()
    }

    fn describe_request(&self, width: u32, height: u32, format: PixelFormat) -> String {
        AttributeKey { width, height, format }.to_string()
    }

    fn len(&self) -> usize {
        self.grouped.len()
    }
}

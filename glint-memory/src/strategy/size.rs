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
    collections::BTreeMap,
    fmt::{Debug, Display},
};

use itertools::Itertools;

use crate::{
    bitmap::{bitmap_byte_size, PixelBuffer, PixelFormat},
    grouped::GroupedLinkedMap,
    strategy::{PoolStrategy, MAX_SIZE_MULTIPLE},
};

/// Bucket key of [`SizeStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeKey {
    /// Allocation size in bytes.
    pub size: usize,
}

impl Display for SizeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.size)
    }
}

/// Reuses the smallest pooled buffer that is large enough and at most [`MAX_SIZE_MULTIPLE`] times the requested
/// size, regardless of its format.
pub struct SizeStrategy<B> {
    grouped: GroupedLinkedMap<SizeKey, B>,
    sorted_sizes: BTreeMap<usize, usize>,
}

impl<B> Debug for SizeStrategy<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SizeStrategy:\n  {:?}\n  SortedSizes( {} )",
            self.grouped,
            self.sorted_sizes.iter().map(|(size, count)| format!("{{{size}:{count}}}")).join(", ")
        )
    }
}

impl<B> Default for SizeStrategy<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> SizeStrategy<B> {
    /// Create an empty strategy.
    pub fn new() -> Self {
        Self {
            grouped: GroupedLinkedMap::new(),
            sorted_sizes: BTreeMap::new(),
        }
    }

    fn decrement(&mut self, size: usize) {
        match self.sorted_sizes.get_mut(&size) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.sorted_sizes.remove(&size);
            }
            None => panic!("tried to decrement empty size, size: {size}, this: {self:?}"),
        }
    }
}

impl<B> PoolStrategy<B> for SizeStrategy<B>
where
    B: PixelBuffer,
{
    fn put(&mut self, buffer: B) {
        let size = buffer.allocation_size();
        self.grouped.put(SizeKey { size }, buffer);
        *self.sorted_sizes.entry(size).or_default() += 1;
    }

    fn get(&mut self, width: u32, height: u32, format: PixelFormat) -> Option<B> {
        let size = bitmap_byte_size(width, height, format);
        let possible = self
            .sorted_sizes
            .range(size..)
            .next()
            .map(|(possible, _)| *possible)
            .filter(|possible| *possible <= size * MAX_SIZE_MULTIPLE)?;

        let mut buffer = self.grouped.get(&SizeKey { size: possible })?;
        self.decrement(possible);
        buffer.reconfigure(width, height, format);
        Some(buffer)
    }

    fn remove_last(&mut self) -> Option<B> {
        let removed = self.grouped.remove_last()?;
        self.decrement(removed.allocation_size());
        Some(removed)
    }

    fn describe(&self, buffer: &B) -> String {
        SizeKey {
            size: buffer.allocation_size(),
        }
        .to_string()
    }

    fn describe_request(&self, width: u32, height: u32, format: PixelFormat) -> String {
        SizeKey {
            size: bitmap_byte_size(width, height, format),
        }
        .to_string()
    }

    fn len(&self) -> usize {
        self.grouped.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;

    #[test]
    fn test_reuse_any_format_of_same_size() {
        let mut strategy = SizeStrategy::new();
        strategy.put(Bitmap::allocate(10, 10, PixelFormat::Argb8888));

        let bitmap = strategy.get(20, 10, PixelFormat::Rgb565).unwrap();
        assert_eq!(bitmap.format(), PixelFormat::Rgb565);
        assert_eq!((bitmap.width(), bitmap.height()), (20, 10));
        assert_eq!(bitmap.allocation_size(), 400);
        assert!(strategy.is_empty());
    }

    #[test]
    fn test_tolerance_window() {
        let mut strategy = SizeStrategy::new();
        // 800 bytes.
        strategy.put(Bitmap::allocate(10, 20, PixelFormat::Argb8888));

        // 800 > 8 * 64.
        assert!(strategy.get(8, 8, PixelFormat::Alpha8).is_none());
        // 800 <= 8 * 100.
        assert!(strategy.get(10, 10, PixelFormat::Alpha8).is_some());
    }

    #[test]
    fn test_never_smaller_than_requested() {
        let mut strategy = SizeStrategy::new();
        strategy.put(Bitmap::allocate(10, 10, PixelFormat::Argb8888));
        assert!(strategy.get(11, 10, PixelFormat::Argb8888).is_none());
        assert_eq!(strategy.len(), 1);
    }

    #[test]
    fn test_smallest_eligible_first() {
        let mut strategy = SizeStrategy::new();
        for side in [40, 20, 30] {
            strategy.put(Bitmap::allocate(side, side, PixelFormat::Alpha8));
        }

        let sizes = (0..3)
            .map(|_| strategy.get(15, 15, PixelFormat::Alpha8).unwrap().allocation_size())
            .collect_vec();
        assert_eq!(sizes, vec![400, 900, 1600]);
    }

    #[test]
    fn test_remove_last_keeps_index_consistent() {
        let mut strategy = SizeStrategy::new();
        strategy.put(Bitmap::allocate(10, 10, PixelFormat::Alpha8));
        strategy.put(Bitmap::allocate(10, 10, PixelFormat::Alpha8));
        assert!(strategy.remove_last().is_some());
        assert!(strategy.get(10, 10, PixelFormat::Alpha8).is_some());
        assert!(strategy.get(10, 10, PixelFormat::Alpha8).is_none());
        assert!(strategy.remove_last().is_none());
    }
}

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

use glint_common::error::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::array::DEFAULT_ARRAY_POOL_SIZE;

/// Default screens worth of pixels held by the memory cache.
pub const MEMORY_CACHE_TARGET_SCREENS: f64 = 2.0;
/// Default screens worth of pixels held by the bitmap pool when opaque buffers dominate.
pub const BITMAP_POOL_TARGET_SCREENS: f64 = 1.0;
/// Default screens worth of pixels held by the bitmap pool when buffers are mostly reusable.
pub const BITMAP_POOL_TARGET_SCREENS_LEGACY: f64 = 4.0;
/// Default share of the memory class used by caches and pools.
pub const MAX_SIZE_MULTIPLIER: f64 = 0.4;
/// Default share of the memory class used by caches and pools on low memory devices.
pub const LOW_MEMORY_MAX_SIZE_MULTIPLIER: f64 = 0.33;
/// Screen budgets assume 32-bit pixels.
pub const BYTES_PER_ARGB_8888_PIXEL: usize = 4;

const LOW_MEMORY_BYTE_ARRAY_POOL_DIVISOR: usize = 2;

/// Inputs of [`MemorySizeCalculator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySizeCalculatorBuilder {
    memory_class_bytes: usize,
    is_low_memory_device: bool,
    screen_width: u32,
    screen_height: u32,
    memory_cache_screens: f64,
    bitmap_pool_screens: Option<f64>,
    max_size_multiplier: f64,
    low_memory_max_size_multiplier: f64,
    array_pool_size: usize,
    opaque_buffers_dominate: bool,
}

impl MemorySizeCalculatorBuilder {
    /// Create a builder for a device with the given per-app memory class and screen size.
    pub fn new(memory_class_bytes: usize, screen_width: u32, screen_height: u32) -> Self {
        Self {
            memory_class_bytes,
            is_low_memory_device: false,
            screen_width,
            screen_height,
            memory_cache_screens: MEMORY_CACHE_TARGET_SCREENS,
            bitmap_pool_screens: None,
            max_size_multiplier: MAX_SIZE_MULTIPLIER,
            low_memory_max_size_multiplier: LOW_MEMORY_MAX_SIZE_MULTIPLIER,
            array_pool_size: DEFAULT_ARRAY_POOL_SIZE,
            opaque_buffers_dominate: true,
        }
    }

    /// Mark the device as a low memory device.
    ///
    /// Default: `false`.
    pub fn with_low_memory_device(mut self, is_low_memory_device: bool) -> Self {
        self.is_low_memory_device = is_low_memory_device;
        self
    }

    /// Set how many screens worth of pixels the memory cache should hold.
    ///
    /// Default: `2`.
    pub fn with_memory_cache_screens(mut self, screens: f64) -> Self {
        self.memory_cache_screens = screens;
        self
    }

    /// Set how many screens worth of pixels the bitmap pool should hold.
    ///
    /// Default: `1` if opaque buffers dominate, else `4`. `0` on low memory devices where opaque buffers dominate.
    pub fn with_bitmap_pool_screens(mut self, screens: f64) -> Self {
        self.bitmap_pool_screens = Some(screens);
        self
    }

    /// Set the share of the memory class that caches and pools may use together.
    ///
    /// Default: `0.4`.
    pub fn with_max_size_multiplier(mut self, multiplier: f64) -> Self {
        self.max_size_multiplier = multiplier;
        self
    }

    /// Set the share of the memory class that caches and pools may use together on low memory devices.
    ///
    /// Default: `0.33`.
    pub fn with_low_memory_max_size_multiplier(mut self, multiplier: f64) -> Self {
        self.low_memory_max_size_multiplier = multiplier;
        self
    }

    /// Set the array pool size in bytes. Halved on low memory devices.
    ///
    /// Default: 4 MiB.
    pub fn with_array_pool_size(mut self, size: usize) -> Self {
        self.array_pool_size = size;
        self
    }

    /// Set whether most images are decoded into buffers owned by the graphics device, which makes pooling less
    /// valuable.
    ///
    /// Default: `true`.
    pub fn with_opaque_buffers_dominate(mut self, dominate: bool) -> Self {
        self.opaque_buffers_dominate = dominate;
        self
    }

    fn bitmap_pool_screens(&self) -> f64 {
        match self.bitmap_pool_screens {
            Some(screens) => screens,
            None if self.opaque_buffers_dominate && self.is_low_memory_device => 0.0,
            None if self.opaque_buffers_dominate => BITMAP_POOL_TARGET_SCREENS,
            None => BITMAP_POOL_TARGET_SCREENS_LEGACY,
        }
    }

    /// Validate the inputs and compute the budgets.
    pub fn build(self) -> Result<MemorySizeCalculator> {
        let bitmap_pool_screens = self.bitmap_pool_screens();
        if self.memory_cache_screens.is_nan() || self.memory_cache_screens < 0.0 {
            return Err(Error::config(
                "memory_cache_screens",
                self.memory_cache_screens,
                "memory cache screens must be greater than or equal to 0",
            ));
        }
        if bitmap_pool_screens.is_nan() || bitmap_pool_screens < 0.0 {
            return Err(Error::config(
                "bitmap_pool_screens",
                bitmap_pool_screens,
                "bitmap pool screens must be greater than or equal to 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.max_size_multiplier) {
            return Err(Error::config(
                "max_size_multiplier",
                self.max_size_multiplier,
                "size multiplier must be between 0 and 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.low_memory_max_size_multiplier) {
            return Err(Error::config(
                "low_memory_max_size_multiplier",
                self.low_memory_max_size_multiplier,
                "low memory max size multiplier must be between 0 and 1",
            ));
        }

        let multiplier = if self.is_low_memory_device {
            self.low_memory_max_size_multiplier
        } else {
            self.max_size_multiplier
        };
        let max_size = (self.memory_class_bytes as f64 * multiplier).round() as usize;

        let array_pool_size = if self.is_low_memory_device {
            self.array_pool_size / LOW_MEMORY_BYTE_ARRAY_POOL_DIVISOR
        } else {
            self.array_pool_size
        };
        // The array pool takes its share first and never more than the whole budget.
        let array_pool_size = array_pool_size.min(max_size);

        let screen_size = self.screen_width as usize * self.screen_height as usize * BYTES_PER_ARGB_8888_PIXEL;
        let target_bitmap_pool_size = (screen_size as f64 * bitmap_pool_screens).round() as usize;
        let target_memory_cache_size = (screen_size as f64 * self.memory_cache_screens).round() as usize;
        let available = max_size - array_pool_size;

        let mut calculator = MemorySizeCalculator::from_budget(
            available,
            target_bitmap_pool_size,
            target_memory_cache_size,
            bitmap_pool_screens,
            self.memory_cache_screens,
        );
        calculator.array_pool_size = array_pool_size;

        tracing::debug!(
            "[memory size calculator]: Calculation complete, memory cache size: {}, pool size: {}, array pool size: {}, memory class limited: {}, max size: {}, memory class: {}, is low memory device: {}",
            calculator.memory_cache_size,
            calculator.bitmap_pool_size,
            calculator.array_pool_size,
            target_bitmap_pool_size + target_memory_cache_size > max_size,
            max_size,
            self.memory_class_bytes,
            self.is_low_memory_device,
        );

        Ok(calculator)
    }
}

/// Byte budgets of the memory cache, the bitmap pool and the array pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySizeCalculator {
    bitmap_pool_size: usize,
    memory_cache_size: usize,
    array_pool_size: usize,
}

impl MemorySizeCalculator {
    /// Split `available` bytes between the bitmap pool and the memory cache.
    ///
    /// If both targets fit they are used as is, otherwise `available` is split in proportion to the screens of each
    /// and the two sizes add up to at most `available`.
    /// The array pool size of the result is zero.
    pub fn from_budget(
        available: usize,
        bitmap_pool_target: usize,
        memory_cache_target: usize,
        bitmap_pool_screens: f64,
        memory_cache_screens: f64,
    ) -> Self {
        let (bitmap_pool_size, memory_cache_size) = if bitmap_pool_target.saturating_add(memory_cache_target) <= available {
            (bitmap_pool_target, memory_cache_target)
        } else {
            let screens = bitmap_pool_screens + memory_cache_screens;
            if screens > 0.0 {
                let part = available as f64 / screens;
                // The pool gets the remainder so that rounding never exceeds `available`.
                let memory_cache_size = ((part * memory_cache_screens).round() as usize).min(available);
                (available - memory_cache_size, memory_cache_size)
            } else {
                (0, 0)
            }
        };
        Self {
            bitmap_pool_size,
            memory_cache_size,
            array_pool_size: 0,
        }
    }

    /// Recommended bitmap pool size in bytes.
    pub fn bitmap_pool_size(&self) -> usize {
        self.bitmap_pool_size
    }

    /// Recommended memory cache size in bytes.
    pub fn memory_cache_size(&self) -> usize {
        self.memory_cache_size
    }

    /// Recommended array pool size in bytes.
    pub fn array_pool_size(&self) -> usize {
        self.array_pool_size
    }
}

#[cfg(test)]
mod tests {
    use glint_common::error::ErrorKind;

    use super::*;

    const MIB: usize = 1024 * 1024;

    #[test]
    fn test_proportional_split() {
        let calculator = MemorySizeCalculator::from_budget(1000, 500, 1000, 1.0, 2.0);
        assert_eq!(calculator.bitmap_pool_size(), 333);
        assert_eq!(calculator.memory_cache_size(), 667);
    }

    #[test]
    fn test_targets_fit() {
        // 1080 x 1920 x 4 = 8294400 bytes per screen.
        let calculator = MemorySizeCalculatorBuilder::new(256 * MIB, 1080, 1920).build().unwrap();
        assert_eq!(calculator.bitmap_pool_size(), 8294400);
        assert_eq!(calculator.memory_cache_size(), 2 * 8294400);
        assert_eq!(calculator.array_pool_size(), 4 * MIB);
    }

    #[test]
    fn test_memory_class_limited() {
        let calculator = MemorySizeCalculatorBuilder::new(32 * MIB, 1080, 1920)
            .with_opaque_buffers_dominate(false)
            .build()
            .unwrap();
        let max_size = (32.0 * MIB as f64 * 0.4).round() as usize;
        let available = max_size - 4 * MIB;
        assert_eq!(calculator.bitmap_pool_size() + calculator.memory_cache_size(), available);
        // Pool screens 4, cache screens 2.
        assert_eq!(
            calculator.memory_cache_size(),
            (available as f64 / 6.0 * 2.0).round() as usize
        );
    }

    #[test]
    fn test_split_rounding_stays_in_budget() {
        // Both halves of 1001 round up to 501.
        let calculator = MemorySizeCalculator::from_budget(1001, 1000, 1000, 1.0, 1.0);
        assert!(calculator.bitmap_pool_size() + calculator.memory_cache_size() <= 1001);

        for available in [1, 7, 999, 1001, 12345] {
            for (pool, cache) in [(1.0, 1.0), (4.0, 2.0), (0.5, 2.5), (1.0, 0.0), (0.0, 3.0)] {
                let calculator = MemorySizeCalculator::from_budget(available, usize::MAX / 4, 0, pool, cache);
                assert!(
                    calculator.bitmap_pool_size() + calculator.memory_cache_size() <= available,
                    "available: {available}, screens: {pool}/{cache}"
                );
            }
        }
    }

    #[test]
    fn test_array_pool_larger_than_budget() {
        // 1 MiB * 0.4 is below the default 4 MiB array pool.
        let calculator = MemorySizeCalculatorBuilder::new(MIB, 1080, 1920).build().unwrap();
        let max_size = (MIB as f64 * 0.4).round() as usize;
        assert_eq!(calculator.array_pool_size(), max_size);
        assert_eq!(calculator.bitmap_pool_size(), 0);
        assert_eq!(calculator.memory_cache_size(), 0);
    }

    #[test]
    fn test_low_memory_device() {
        let calculator = MemorySizeCalculatorBuilder::new(128 * MIB, 720, 1280)
            .with_low_memory_device(true)
            .build()
            .unwrap();
        assert_eq!(calculator.bitmap_pool_size(), 0);
        assert_eq!(calculator.array_pool_size(), 2 * MIB);
        assert_eq!(calculator.memory_cache_size(), 720 * 1280 * 4 * 2);
    }

    #[test]
    fn test_invalid_inputs() {
        let err = MemorySizeCalculatorBuilder::new(128 * MIB, 720, 1280)
            .with_max_size_multiplier(1.5)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = MemorySizeCalculatorBuilder::new(128 * MIB, 720, 1280)
            .with_memory_cache_screens(-1.0)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}

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
use glint_memory::bitmap::{bitmap_byte_size, PixelFormat};

/// Default weight of a [`PreFillType`].
pub const DEFAULT_WEIGHT: u32 = 1;

/// Size, format and share of the budget of bitmaps to pre-fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreFillType {
    width: u32,
    height: u32,
    format: PixelFormat,
    weight: u32,
}

impl PreFillType {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Share of the budget relative to other types.
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Bytes of one bitmap of this type.
    pub fn byte_size(&self) -> usize {
        bitmap_byte_size(self.width, self.height, self.format)
    }
}

/// Builder of [`PreFillType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreFillTypeBuilder {
    width: u32,
    height: u32,
    format: Option<PixelFormat>,
    weight: u32,
}

impl PreFillTypeBuilder {
    /// Pre-fill bitmaps of `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: None,
            weight: DEFAULT_WEIGHT,
        }
    }

    /// Pre-fill bitmaps of `size` x `size` pixels.
    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    /// Set the pixel format.
    ///
    /// Default: the default format of the pre-filler.
    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Set the weight. A type of weight 2 gets twice the bytes of a type of weight 1.
    ///
    /// Default: `1`.
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub(crate) fn with_format_if_unset(mut self, format: PixelFormat) -> Self {
        self.format.get_or_insert(format);
        self
    }

    /// Validate and build the type. The format falls back to [`PixelFormat::default`] if unset.
    ///
    /// Fails on a zero dimension or weight, or on [`PixelFormat::Hardware`].
    pub fn build(self) -> Result<PreFillType> {
        if self.width == 0 {
            return Err(Error::config("width", self.width, "width must be greater than 0"));
        }
        if self.height == 0 {
            return Err(Error::config("height", self.height, "height must be greater than 0"));
        }
        if self.weight == 0 {
            return Err(Error::config("weight", self.weight, "weight must be greater than 0"));
        }
        let format = self.format.unwrap_or_default();
        if format == PixelFormat::Hardware {
            return Err(Error::config(
                "format",
                format,
                "hardware bitmaps cannot be pre-filled, use a mutable format",
            ));
        }
        Ok(PreFillType {
            width: self.width,
            height: self.height,
            format,
            weight: self.weight,
        })
    }
}

#[cfg(test)]
mod tests {
    use glint_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_build() {
        let ty = PreFillTypeBuilder::new(10, 20).with_weight(3).build().unwrap();
        assert_eq!(ty.format(), PixelFormat::Argb8888);
        assert_eq!(ty.byte_size(), 800);
        assert_eq!(ty.weight(), 3);

        let ty = PreFillTypeBuilder::square(10)
            .with_format(PixelFormat::Rgb565)
            .with_format_if_unset(PixelFormat::Argb8888)
            .build()
            .unwrap();
        assert_eq!(ty.format(), PixelFormat::Rgb565);
    }

    #[test]
    fn test_invalid() {
        for builder in [
            PreFillTypeBuilder::new(0, 1),
            PreFillTypeBuilder::new(1, 0),
            PreFillTypeBuilder::new(1, 1).with_weight(0),
            PreFillTypeBuilder::new(1, 1).with_format(PixelFormat::Hardware),
        ] {
            assert_eq!(builder.build().unwrap_err().kind(), ErrorKind::Config);
        }
    }
}

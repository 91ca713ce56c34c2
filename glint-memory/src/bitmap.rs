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

use serde::{Deserialize, Serialize};

/// Pixel format of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Single 8-bit alpha channel.
    Alpha8,
    /// 16-bit opaque RGB.
    Rgb565,
    /// 16-bit RGBA with 4 bits per channel.
    Argb4444,
    /// 32-bit RGBA with 8 bits per channel.
    #[default]
    Argb8888,
    /// 64-bit RGBA with half-float channels.
    RgbaF16,
    /// A native 32-bit format without a public name, e.g. frames of animated images. Reusable.
    Unspecified,
    /// Memory owned by the graphics device. Never pooled.
    Hardware,
}

impl PixelFormat {
    /// All formats, in declaration order.
    pub const ALL: [PixelFormat; 7] = [
        PixelFormat::Alpha8,
        PixelFormat::Rgb565,
        PixelFormat::Argb4444,
        PixelFormat::Argb8888,
        PixelFormat::RgbaF16,
        PixelFormat::Unspecified,
        PixelFormat::Hardware,
    ];

    /// Bytes used by a single pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Alpha8 => 1,
            PixelFormat::Rgb565 | PixelFormat::Argb4444 => 2,
            PixelFormat::Argb8888 | PixelFormat::Unspecified | PixelFormat::Hardware => 4,
            PixelFormat::RgbaF16 => 8,
        }
    }
}

impl Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PixelFormat::Alpha8 => "ALPHA_8",
            PixelFormat::Rgb565 => "RGB_565",
            PixelFormat::Argb4444 => "ARGB_4444",
            PixelFormat::Argb8888 => "ARGB_8888",
            PixelFormat::RgbaF16 => "RGBA_F16",
            PixelFormat::Unspecified => "UNSPECIFIED",
            PixelFormat::Hardware => "HARDWARE",
        };
        f.write_str(s)
    }
}

/// Logical byte size of a `width` x `height` image in `format`.
pub fn bitmap_byte_size(width: u32, height: u32, format: PixelFormat) -> usize {
    width as usize * height as usize * format.bytes_per_pixel()
}

/// An in-memory image surface that can be pooled.
///
/// A pixel buffer is owned by exactly one layer at a time, pools and caches take it by value. Releasing a buffer is
/// dropping it.
pub trait PixelBuffer: Send + Debug + 'static {
    /// Allocate a zeroed, mutable buffer.
    fn allocate(width: u32, height: u32, format: PixelFormat) -> Self
    where
        Self: Sized;

    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Pixel format.
    fn format(&self) -> PixelFormat;

    /// Immutable buffers cannot be reused for new content.
    fn is_mutable(&self) -> bool;

    /// Capacity of the backing allocation in bytes.
    ///
    /// Never smaller than [`PixelBuffer::byte_size`], may be larger after a [`PixelBuffer::reconfigure`].
    fn allocation_size(&self) -> usize;

    /// Change the logical dimensions and format without reallocating.
    ///
    /// # Panics
    ///
    /// Panics if the new configuration does not fit in the allocation.
    fn reconfigure(&mut self, width: u32, height: u32, format: PixelFormat);

    /// Clear the content to transparent.
    fn erase(&mut self);

    /// Logical byte size.
    fn byte_size(&self) -> usize {
        bitmap_byte_size(self.width(), self.height(), self.format())
    }
}

/// A heap-backed [`PixelBuffer`].
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    format: PixelFormat,
    mutable: bool,
    data: Vec<u8>,
}

impl Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("mutable", &self.mutable)
            .field("allocation_size", &self.data.len())
            .finish()
    }
}

impl Bitmap {
    /// Mark the bitmap immutable. Immutable bitmaps are rejected by pools.
    pub fn into_immutable(mut self) -> Self {
        self.mutable = false;
        self
    }

    /// Pixels in the logical region.
    pub fn pixels(&self) -> &[u8] {
        &self.data[..self.byte_size()]
    }

    /// Mutable pixels in the logical region.
    ///
    /// # Panics
    ///
    /// Panics if the bitmap is immutable.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        assert!(self.mutable, "cannot write to an immutable bitmap");
        let len = self.byte_size();
        &mut self.data[..len]
    }
}

impl PixelBuffer for Bitmap {
    fn allocate(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            mutable: true,
            data: vec![0; bitmap_byte_size(width, height, format)],
        }
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn is_mutable(&self) -> bool {
        self.mutable
    }

    fn allocation_size(&self) -> usize {
        self.data.len()
    }

    fn reconfigure(&mut self, width: u32, height: u32, format: PixelFormat) {
        let size = bitmap_byte_size(width, height, format);
        assert!(
            size <= self.data.len(),
            "cannot reconfigure {self:?} to {width}x{height} {format}: {size} bytes required"
        );
        self.width = width;
        self.height = height;
        self.format = format;
    }

    fn erase(&mut self) {
        self.data.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_size() {
        assert_eq!(bitmap_byte_size(10, 10, PixelFormat::Alpha8), 100);
        assert_eq!(bitmap_byte_size(10, 10, PixelFormat::Rgb565), 200);
        assert_eq!(bitmap_byte_size(10, 10, PixelFormat::Argb8888), 400);
        assert_eq!(bitmap_byte_size(10, 10, PixelFormat::RgbaF16), 800);
    }

    #[test]
    fn test_reconfigure_keeps_allocation() {
        let mut bitmap = Bitmap::allocate(20, 20, PixelFormat::Argb8888);
        bitmap.pixels_mut().fill(0xff);
        bitmap.reconfigure(10, 10, PixelFormat::Rgb565);
        assert_eq!(bitmap.byte_size(), 200);
        assert_eq!(bitmap.allocation_size(), 1600);
        assert_eq!(bitmap.pixels().len(), 200);

        bitmap.erase();
        assert!(bitmap.pixels().iter().all(|b| *b == 0));
    }

    #[test]
    #[should_panic]
    fn test_reconfigure_too_large() {
        let mut bitmap = Bitmap::allocate(10, 10, PixelFormat::Rgb565);
        bitmap.reconfigure(10, 10, PixelFormat::Argb8888);
    }
}

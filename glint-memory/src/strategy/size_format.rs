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
    collections::{BTreeMap, HashMap},
    fmt::{Debug, Display},
};

use itertools::Itertools;

use crate::{
    bitmap::{bitmap_byte_size, PixelBuffer, PixelFormat},
    grouped::GroupedLinkedMap,
    strategy::{PoolStrategy, MAX_SIZE_MULTIPLE},
};

/// Bucket key of [`SizeFormatStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeFormatKey {
    /// Allocation size in bytes.
    pub size: usize,
    /// Pixel format.
    pub format: PixelFormat,
}

impl Display for SizeFormatKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]({})", self.size, self.format)
    }
}

const ARGB_8888_IN_FORMATS: &[PixelFormat] = &[PixelFormat::Argb8888, PixelFormat::Unspecified, PixelFormat::RgbaF16];
const RGB_565_IN_FORMATS: &[PixelFormat] = &[PixelFormat::Rgb565];
const ARGB_4444_IN_FORMATS: &[PixelFormat] = &[PixelFormat::Argb4444];
const ALPHA_8_IN_FORMATS: &[PixelFormat] = &[PixelFormat::Alpha8];
const UNSPECIFIED_IN_FORMATS: &[PixelFormat] = &[PixelFormat::Unspecified];
const HARDWARE_IN_FORMATS: &[PixelFormat] = &[PixelFormat::Hardware];

/// Formats whose pooled buffers may be reconfigured to serve a request of `requested`, in preference order.
pub fn in_formats(requested: PixelFormat) -> &'static [PixelFormat] {
    match requested {
        PixelFormat::Argb8888 | PixelFormat::RgbaF16 => ARGB_8888_IN_FORMATS,
        PixelFormat::Rgb565 => RGB_565_IN_FORMATS,
        PixelFormat::Argb4444 => ARGB_4444_IN_FORMATS,
        PixelFormat::Alpha8 => ALPHA_8_IN_FORMATS,
        PixelFormat::Unspecified => UNSPECIFIED_IN_FORMATS,
        PixelFormat::Hardware => HARDWARE_IN_FORMATS,
    }
}

/// Keys buffers by allocation size and format.
///
/// A request may be served by a larger buffer (up to [`MAX_SIZE_MULTIPLE`] times) of the requested format or of a
/// compatible one, see [`in_formats`].
pub struct SizeFormatStrategy<B> {
    grouped: GroupedLinkedMap<SizeFormatKey, B>,
    sorted_sizes: HashMap<PixelFormat, BTreeMap<usize, usize>>,
}

impl<B> Debug for SizeFormatStrategy<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SizeFormatStrategy{{grouped={:?}, sorted_sizes=(", self.grouped)?;
        let sizes = self
            .sorted_sizes
            .iter()
            .sorted_by_key(|(format, _)| **format)
            .map(|(format, sizes)| {
                let sizes = sizes.iter().map(|(size, count)| format!("{{{size}:{count}}}")).join(", ");
                format!("{format}[( {sizes} )]")
            })
            .join(", ");
        write!(f, "{sizes})}}")
    }
}

impl<B> Default for SizeFormatStrategy<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> SizeFormatStrategy<B> {
    /// Create an empty strategy.
    pub fn new() -> Self {
        Self {
            grouped: GroupedLinkedMap::new(),
            sorted_sizes: HashMap::new(),
        }
    }

    fn find_best_key(&self, size: usize, format: PixelFormat) -> SizeFormatKey {
        for possible_format in in_formats(format) {
            let possible_size = self
                .sorted_sizes
                .get(possible_format)
                .and_then(|sizes| sizes.range(size..).next())
                .map(|(possible_size, _)| *possible_size);
            if let Some(possible_size) = possible_size {
                if possible_size <= size * MAX_SIZE_MULTIPLE {
                    return SizeFormatKey {
                        size: possible_size,
                        format: *possible_format,
                    };
                }
            }
        }
        SizeFormatKey { size, format }
    }

    fn decrement(&mut self, key: SizeFormatKey) {
        match self
            .sorted_sizes
            .get_mut(&key.format)
            .and_then(|sizes| sizes.get_mut(&key.size))
        {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                if let Some(sizes) = self.sorted_sizes.get_mut(&key.format) {
                    sizes.remove(&key.size);
                }
            }
            None => panic!("tried to decrement empty size, key: {key}, this: {self:?}"),
        }
    }
}

impl<B> PoolStrategy<B> for SizeFormatStrategy<B>
where
    B: PixelBuffer,
{
    fn put(&mut self, buffer: B) {
        let key = SizeFormatKey {
            size: buffer.allocation_size(),
            format: buffer.format(),
        };
        self.grouped.put(key, buffer);
        *self
            .sorted_sizes
            .entry(key.format)
            .or_default()
            .entry(key.size)
            .or_default() += 1;
    }

    fn get(&mut self, width: u32, height: u32, format: PixelFormat) -> Option<B> {
        let size = bitmap_byte_size(width, height, format);
        let best = self.find_best_key(size, format);
        let mut buffer = self.grouped.get(&best)?;
        // The index is keyed by the pooled format, decrement before reconfiguring.
        self.decrement(best);
        buffer.reconfigure(width, height, format);
        Some(buffer)
    }

    fn remove_last(&mut self) -> Option<B> {
        let removed = self.grouped.remove_last()?;
        self.decrement(SizeFormatKey {
            size: removed.allocation_size(),
            format: removed.format(),
        });
        Some(removed)
    }

    fn describe(&self, buffer: &B) -> String {
        SizeFormatKey {
            size: buffer.allocation_size(),
            format: buffer.format(),
        }
        .to_string()
    }

    fn describe_request(&self, width: u32, height: u32, format: PixelFormat) -> String {
        SizeFormatKey {
            size: bitmap_byte_size(width, height, format),
            format,
        }
        .to_string()
    }

    fn len(&self) -> usize {
        self.grouped.len()
    }
}

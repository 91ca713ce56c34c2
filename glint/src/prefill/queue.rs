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

use std::collections::HashMap;

use super::ty::PreFillType;

/// Hands out pre-fill types round-robin until the count of every type is exhausted.
#[derive(Debug, Default)]
pub struct PreFillQueue {
    counts: HashMap<PreFillType, usize>,
    types: Vec<PreFillType>,
    index: usize,
    len: usize,
}

impl PreFillQueue {
    /// Create a queue from the count of bitmaps of each type. Types with a zero count are skipped.
    pub fn new(counts: impl IntoIterator<Item = (PreFillType, usize)>) -> Self {
        let counts = counts
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .collect::<HashMap<_, _>>();
        // Sort to make the order deterministic.
        let mut types = counts.keys().copied().collect::<Vec<_>>();
        types.sort_by_key(|ty| (ty.width(), ty.height(), ty.format(), ty.weight()));
        let len = counts.values().sum();
        Self {
            counts,
            types,
            index: 0,
            len,
        }
    }

    /// Take the next type.
    pub fn pop(&mut self) -> Option<PreFillType> {
        if self.types.is_empty() {
            return None;
        }
        let ty = self.types[self.index];
        match self.counts.get_mut(&ty) {
            Some(count) if *count > 1 => {
                *count -= 1;
                self.index += 1;
            }
            _ => {
                self.counts.remove(&ty);
                self.types.remove(self.index);
            }
        }
        self.len -= 1;
        if self.types.is_empty() {
            self.index = 0;
        } else {
            self.index %= self.types.len();
        }
        Some(ty)
    }

    /// Count of remaining bitmaps.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no bitmap remains.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

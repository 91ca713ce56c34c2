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

use std::{fmt::Debug, hash::Hash};

use hashlink::LinkedHashMap;

/// An LRU ordered map from a key to a stack of values.
///
/// Used by pools to keep several values under one bucket key. Recency is refreshed by [`GroupedLinkedMap::put`] only,
/// so [`GroupedLinkedMap::remove_last`] drains the group with the oldest insertion first.
pub struct GroupedLinkedMap<K, V> {
    groups: LinkedHashMap<K, Vec<V>>,
    len: usize,
}

impl<K, V> Default for GroupedLinkedMap<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> GroupedLinkedMap<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            groups: LinkedHashMap::new(),
            len: 0,
        }
    }

    /// Push `value` onto the group of `key` and make the group the most recently used.
    pub fn put(&mut self, key: K, value: V) {
        match self.groups.get_mut(&key) {
            Some(group) => {
                group.push(value);
                self.groups.to_back(&key);
            }
            None => {
                self.groups.insert(key, vec![value]);
            }
        }
        self.len += 1;
    }

    /// Pop the most recently added value of the group of `key`.
    ///
    /// The group keeps its position in the LRU order.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let group = self.groups.get_mut(key)?;
        let value = group.pop();
        if group.is_empty() {
            self.groups.remove(key);
        }
        if value.is_some() {
            self.len -= 1;
        }
        value
    }

    /// Pop one value from the least recently used group.
    pub fn remove_last(&mut self) -> Option<V> {
        let key = self.groups.front()?.0.clone();
        self.get(&key)
    }

    /// Count of values in all groups.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there is no value.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Count of non-empty groups.
    pub fn groups(&self) -> usize {
        self.groups.len()
    }
}

impl<K, V> Debug for GroupedLinkedMap<K, V>
where
    K: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GroupedLinkedMap( ")?;
        let mut iter = self.groups.iter().peekable();
        while let Some((key, group)) = iter.next() {
            write!(f, "{{{key:?}:{}}}", group.len())?;
            if iter.peek().is_some() {
                write!(f, ", ")?;
            }
        }
        write!(f, " )")
    }
}

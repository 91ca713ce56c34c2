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

/// The reason an entry left a pool or cache without being taken by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// Evicted to make room or to satisfy a trim request.
    Evict,
    /// Rejected on insertion, e.g. too large for the whole budget.
    Reject,
    /// Dropped by an explicit clear.
    Clear,
}

/// Trait for the customized event listener.
///
/// The listener receives ownership of the leaving entry, so it can recycle the value instead of dropping it.
/// Listeners are always called after the owner has released its lock, so they may call back into any pool or cache.
pub trait EventListener: Send + Sync + 'static {
    /// Associated key type.
    type Key;
    /// Associated value type.
    type Value;

    /// Called when an entry leaves the owner with the reason.
    fn on_leave(&self, reason: Event, key: Self::Key, value: Self::Value) {
        let _ = reason;
        drop(key);
        drop(value);
    }
}

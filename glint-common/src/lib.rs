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

#![cfg_attr(docsrs, feature(doc_cfg))]

//! Shared components for glint.

/// Allow to enable debug assertions in release profile with feature "strict_assertions".
pub mod assert;
/// Bridge blocking calls into async contexts.
pub mod asyncify;
/// Disk cache key abstraction and provided keys.
pub mod code;
/// The error type of glint.
pub mod error;
/// Event listener for entries leaving pools and caches.
pub mod event;
/// Metrics model and registries.
pub mod metrics;
/// A bounded pool of reusable objects.
pub mod object_pool;
/// Tokio runtime wrappers to spawn tasks.
pub mod spawn;
/// Memory pressure levels.
pub mod trim;

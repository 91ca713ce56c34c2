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

use super::{BoxedCounter, BoxedGauge, BoxedHistogram, RegistryOps};
use crate::metrics::registry::noop::NoopMetricsRegistry;

/// Metrics of one glint instance. Every metric is labeled with the instance name.
#[derive(Debug)]
pub struct Metrics {
    /* bitmap pool metrics */
    /// ... ...
    pub bitmap_pool_hit: BoxedCounter,
    /// ... ...
    pub bitmap_pool_miss: BoxedCounter,
    /// ... ...
    pub bitmap_pool_put: BoxedCounter,
    /// ... ...
    pub bitmap_pool_reject: BoxedCounter,
    /// ... ...
    pub bitmap_pool_evict: BoxedCounter,

    /// ... ...
    pub bitmap_pool_usage: BoxedGauge,

    /* array pool metrics */
    /// ... ...
    pub array_pool_hit: BoxedCounter,
    /// ... ...
    pub array_pool_miss: BoxedCounter,
    /// ... ...
    pub array_pool_put: BoxedCounter,
    /// ... ...
    pub array_pool_reject: BoxedCounter,
    /// ... ...
    pub array_pool_evict: BoxedCounter,

    /// ... ...
    pub array_pool_usage: BoxedGauge,

    /* resource cache metrics */
    /// ... ...
    pub memory_insert: BoxedCounter,
    /// ... ...
    pub memory_replace: BoxedCounter,
    /// ... ...
    pub memory_hit: BoxedCounter,
    /// ... ...
    pub memory_miss: BoxedCounter,
    /// ... ...
    pub memory_remove: BoxedCounter,
    /// ... ...
    pub memory_evict: BoxedCounter,
    /// ... ...
    pub memory_reject: BoxedCounter,

    /// ... ...
    pub memory_usage: BoxedGauge,

    /* disk cache metrics */
    /// ... ...
    pub disk_hit: BoxedCounter,
    /// ... ...
    pub disk_miss: BoxedCounter,
    /// ... ...
    pub disk_write: BoxedCounter,
    /// ... ...
    pub disk_write_skip: BoxedCounter,
    /// ... ...
    pub disk_write_abort: BoxedCounter,
    /// ... ...
    pub disk_delete: BoxedCounter,
    /// ... ...
    pub disk_evict: BoxedCounter,

    /// ... ...
    pub disk_write_bytes: BoxedCounter,

    /// ... ...
    pub disk_write_duration: BoxedHistogram,
    /// ... ...
    pub disk_read_duration: BoxedHistogram,

    /// ... ...
    pub disk_usage: BoxedGauge,

    /* pre-fill metrics */
    /// ... ...
    pub prefill_allocate: BoxedCounter,
    /// ... ...
    pub prefill_burst_duration: BoxedHistogram,
}

impl Metrics {
    /// Create a new metric with the given name.
    pub fn new(name: &'static str, registry: &dyn RegistryOps) -> Self {
        /* bitmap pool metrics */

        let glint_bitmap_pool_op_total =
            registry.counter_family("glint_bitmap_pool_op_total", "glint bitmap pool operations", &["name", "op"]);
        let glint_bitmap_pool_usage =
            registry.gauge_family("glint_bitmap_pool_usage", "glint bitmap pool usage in bytes", &["name"]);

        let bitmap_pool_hit = glint_bitmap_pool_op_total.with_labels(&[name, "hit"]);
        let bitmap_pool_miss = glint_bitmap_pool_op_total.with_labels(&[name, "miss"]);
        let bitmap_pool_put = glint_bitmap_pool_op_total.with_labels(&[name, "put"]);
        let bitmap_pool_reject = glint_bitmap_pool_op_total.with_labels(&[name, "reject"]);
        let bitmap_pool_evict = glint_bitmap_pool_op_total.with_labels(&[name, "evict"]);

        let bitmap_pool_usage = glint_bitmap_pool_usage.with_labels(&[name]);

        /* array pool metrics */

        let glint_array_pool_op_total =
            registry.counter_family("glint_array_pool_op_total", "glint array pool operations", &["name", "op"]);
        let glint_array_pool_usage =
            registry.gauge_family("glint_array_pool_usage", "glint array pool usage in bytes", &["name"]);

        let array_pool_hit = glint_array_pool_op_total.with_labels(&[name, "hit"]);
        let array_pool_miss = glint_array_pool_op_total.with_labels(&[name, "miss"]);
        let array_pool_put = glint_array_pool_op_total.with_labels(&[name, "put"]);
        let array_pool_reject = glint_array_pool_op_total.with_labels(&[name, "reject"]);
        let array_pool_evict = glint_array_pool_op_total.with_labels(&[name, "evict"]);

        let array_pool_usage = glint_array_pool_usage.with_labels(&[name]);

        /* resource cache metrics */

        let glint_memory_op_total = registry.counter_family(
            "glint_memory_op_total",
            "glint in-memory resource cache operations",
            &["name", "op"],
        );
        let glint_memory_usage = registry.gauge_family(
            "glint_memory_usage",
            "glint in-memory resource cache usage in bytes",
            &["name"],
        );

        let memory_insert = glint_memory_op_total.with_labels(&[name, "insert"]);
        let memory_replace = glint_memory_op_total.with_labels(&[name, "replace"]);
        let memory_hit = glint_memory_op_total.with_labels(&[name, "hit"]);
        let memory_miss = glint_memory_op_total.with_labels(&[name, "miss"]);
        let memory_remove = glint_memory_op_total.with_labels(&[name, "remove"]);
        let memory_evict = glint_memory_op_total.with_labels(&[name, "evict"]);
        let memory_reject = glint_memory_op_total.with_labels(&[name, "reject"]);

        let memory_usage = glint_memory_usage.with_labels(&[name]);

        /* disk cache metrics */

        let glint_disk_op_total =
            registry.counter_family("glint_disk_op_total", "glint disk cache operations", &["name", "op"]);
        let glint_disk_io_bytes =
            registry.counter_family("glint_disk_io_bytes", "glint disk cache io bytes", &["name", "op"]);
        let glint_disk_op_duration = registry.histogram_family(
            "glint_disk_op_duration",
            "glint disk cache operation durations",
            &["name", "op"],
        );
        let glint_disk_usage =
            registry.gauge_family("glint_disk_usage", "glint disk cache usage in bytes", &["name"]);

        let disk_hit = glint_disk_op_total.with_labels(&[name, "hit"]);
        let disk_miss = glint_disk_op_total.with_labels(&[name, "miss"]);
        let disk_write = glint_disk_op_total.with_labels(&[name, "write"]);
        let disk_write_skip = glint_disk_op_total.with_labels(&[name, "write_skip"]);
        let disk_write_abort = glint_disk_op_total.with_labels(&[name, "write_abort"]);
        let disk_delete = glint_disk_op_total.with_labels(&[name, "delete"]);
        let disk_evict = glint_disk_op_total.with_labels(&[name, "evict"]);

        let disk_write_bytes = glint_disk_io_bytes.with_labels(&[name, "write"]);

        let disk_write_duration = glint_disk_op_duration.with_labels(&[name, "write"]);
        let disk_read_duration = glint_disk_op_duration.with_labels(&[name, "read"]);

        let disk_usage = glint_disk_usage.with_labels(&[name]);

        /* pre-fill metrics */

        let glint_prefill_op_total =
            registry.counter_family("glint_prefill_op_total", "glint pre-fill operations", &["name", "op"]);
        let glint_prefill_op_duration = registry.histogram_family(
            "glint_prefill_op_duration",
            "glint pre-fill operation durations",
            &["name", "op"],
        );

        let prefill_allocate = glint_prefill_op_total.with_labels(&[name, "allocate"]);
        let prefill_burst_duration = glint_prefill_op_duration.with_labels(&[name, "burst"]);

        Self {
            bitmap_pool_hit,
            bitmap_pool_miss,
            bitmap_pool_put,
            bitmap_pool_reject,
            bitmap_pool_evict,
            bitmap_pool_usage,

            array_pool_hit,
            array_pool_miss,
            array_pool_put,
            array_pool_reject,
            array_pool_evict,
            array_pool_usage,

            memory_insert,
            memory_replace,
            memory_hit,
            memory_miss,
            memory_remove,
            memory_evict,
            memory_reject,
            memory_usage,

            disk_hit,
            disk_miss,
            disk_write,
            disk_write_skip,
            disk_write_abort,
            disk_delete,
            disk_evict,
            disk_write_bytes,
            disk_write_duration,
            disk_read_duration,
            disk_usage,

            prefill_allocate,
            prefill_burst_duration,
        }
    }

    /// Build noop metrics.
    ///
    /// Note: `noop` is only supposed to be called by other glint components.
    #[doc(hidden)]
    pub fn noop() -> Self {
        Self::new("test", &NoopMetricsRegistry)
    }
}

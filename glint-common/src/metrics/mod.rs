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


//! Metrics are grouped into families: metrics that share a name, a help text and label names, one metric per set of
//! label values. A [`RegistryOps`] creates families, [`model::Metrics`] resolves the metrics of one glint instance
//! from them.

use std::fmt::Debug;

/// A monotonic counter.
pub trait CounterOps: Send + Sync + 'static + Debug {
    /// Add `val`.
    fn increase(&self, val: u64);
}

/// A gauge that goes up and down.
pub trait GaugeOps: Send + Sync + 'static + Debug {
    /// Add `val`.
    fn increase(&self, val: u64);
    /// Subtract `val`.
    fn decrease(&self, val: u64);
    /// Overwrite with `val`.
    fn absolute(&self, val: u64);
}

/// A distribution of observed values.
pub trait HistogramOps: Send + Sync + 'static + Debug {
    /// Observe `val`.
    fn record(&self, val: f64);
}

/// A family of metrics of type `M`.
pub trait FamilyOps<M: ?Sized>: Send + Sync + 'static + Debug {
    /// The metric of the family labeled with `labels`, in the order of the label names of the family.
    fn with_labels(&self, labels: &[&'static str]) -> Box<M>;
}

/// Creates metric families.
///
/// Object safe, so the composition root can hold any registry as a [`BoxedRegistry`].
pub trait RegistryOps: Send + Sync + 'static + Debug {
    /// Create a family of counters.
    fn counter_family(
        &self,
        name: &'static str,
        help: &'static str,
        label_names: &'static [&'static str],
    ) -> BoxedFamily<dyn CounterOps>;

    /// Create a family of gauges.
    fn gauge_family(
        &self,
        name: &'static str,
        help: &'static str,
        label_names: &'static [&'static str],
    ) -> BoxedFamily<dyn GaugeOps>;

    /// Create a family of histograms.
    fn histogram_family(
        &self,
        name: &'static str,
        help: &'static str,
        label_names: &'static [&'static str],
    ) -> BoxedFamily<dyn HistogramOps>;
}

/// Boxed counter.
pub type BoxedCounter = Box<dyn CounterOps>;
/// Boxed gauge.
pub type BoxedGauge = Box<dyn GaugeOps>;
/// Boxed histogram.
pub type BoxedHistogram = Box<dyn HistogramOps>;
/// Boxed family of metrics of type `M`.
pub type BoxedFamily<M> = Box<dyn FamilyOps<M>>;
/// Boxed registry.
pub type BoxedRegistry = Box<dyn RegistryOps>;

/// Metrics of a glint instance.
pub mod model;
/// Provided registries.
pub mod registry;

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

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use prometheus::{
    core::Collector, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry,
};

use crate::metrics::{
    registry::noop::NoopMetricsRegistry, BoxedCounter, BoxedFamily, BoxedGauge, BoxedHistogram, CounterOps,
    FamilyOps, GaugeOps, HistogramOps, RegistryOps,
};

/// A registered family, kept to hand out the same family on later registrations of the same name.
#[derive(Debug, Clone)]
enum Family {
    Counter(IntCounterVec),
    Gauge(IntGaugeVec),
    Histogram(HistogramVec),
}

impl Family {
    fn collector(&self) -> Box<dyn Collector> {
        match self {
            Family::Counter(v) => Box::new(v.clone()),
            Family::Gauge(v) => Box::new(v.clone()),
            Family::Histogram(v) => Box::new(v.clone()),
        }
    }
}

impl CounterOps for IntCounter {
    fn increase(&self, val: u64) {
        self.inc_by(val);
    }
}

impl GaugeOps for IntGauge {
    fn increase(&self, val: u64) {
        self.add(val as i64);
    }

    fn decrease(&self, val: u64) {
        self.sub(val as i64);
    }

    fn absolute(&self, val: u64) {
        self.set(val as i64);
    }
}

impl HistogramOps for Histogram {
    fn record(&self, val: f64) {
        self.observe(val);
    }
}

impl FamilyOps<dyn CounterOps> for IntCounterVec {
    fn with_labels(&self, labels: &[&'static str]) -> BoxedCounter {
        Box::new(self.with_label_values(labels))
    }
}

impl FamilyOps<dyn GaugeOps> for IntGaugeVec {
    fn with_labels(&self, labels: &[&'static str]) -> BoxedGauge {
        Box::new(self.with_label_values(labels))
    }
}

impl FamilyOps<dyn HistogramOps> for HistogramVec {
    fn with_labels(&self, labels: &[&'static str]) -> BoxedHistogram {
        Box::new(self.with_label_values(labels))
    }
}

/// Prometheus metric registry with lib `prometheus`.
///
/// The [`PrometheusMetricsRegistry`] can be cloned and shared by multiple glint instances. Metric vectors are
/// registered once per registry, later registrations with the same name reuse the registered vector.
#[derive(Debug, Clone)]
pub struct PrometheusMetricsRegistry {
    registry: Arc<Registry>,
    families: Arc<Mutex<HashMap<&'static str, Family>>>,
}

impl PrometheusMetricsRegistry {
    /// Create an Prometheus metrics registry.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
            families: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get the inner prometheus registry, for gathering.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn family(&self, name: &'static str, create: impl FnOnce() -> prometheus::Result<Family>) -> Option<Family> {
        let mut families = self.families.lock();
        if let Some(family) = families.get(name) {
            return Some(family.clone());
        }
        let family = create().and_then(|family| self.registry.register(family.collector()).map(|_| family));
        match family {
            Ok(family) => {
                families.insert(name, family.clone());
                Some(family)
            }
            Err(e) => {
                tracing::warn!("[metrics]: Failed to register metric {name}, fall back to noop: {e}");
                None
            }
        }
    }
}

impl RegistryOps for PrometheusMetricsRegistry {
    fn counter_family(
        &self,
        name: &'static str,
        help: &'static str,
        label_names: &'static [&'static str],
    ) -> BoxedFamily<dyn CounterOps> {
        match self.family(name, || IntCounterVec::new(Opts::new(name, help), label_names).map(Family::Counter)) {
            Some(Family::Counter(v)) => Box::new(v),
            _ => NoopMetricsRegistry.counter_family(name, help, label_names),
        }
    }

    fn gauge_family(
        &self,
        name: &'static str,
        help: &'static str,
        label_names: &'static [&'static str],
    ) -> BoxedFamily<dyn GaugeOps> {
        match self.family(name, || IntGaugeVec::new(Opts::new(name, help), label_names).map(Family::Gauge)) {
            Some(Family::Gauge(v)) => Box::new(v),
            _ => NoopMetricsRegistry.gauge_family(name, help, label_names),
        }
    }

    fn histogram_family(
        &self,
        name: &'static str,
        help: &'static str,
        label_names: &'static [&'static str],
    ) -> BoxedFamily<dyn HistogramOps> {
        match self.family(name, || {
            HistogramVec::new(HistogramOpts::new(name, help), label_names).map(Family::Histogram)
        }) {
            Some(Family::Histogram(v)) => Box::new(v),
            _ => NoopMetricsRegistry.histogram_family(name, help, label_names),
        }
    }
}

#[cfg(test)]
mod tests {
    use prometheus::Encoder;

    use super::*;
    use crate::metrics::model::Metrics;

    fn case(registry: &PrometheusMetricsRegistry) {
        let metrics = Metrics::new("pool", registry);
        metrics.bitmap_pool_hit.increase(42);
        metrics.bitmap_pool_usage.increase(514);
        metrics.bitmap_pool_usage.decrease(114);
        metrics.disk_write_duration.record(0.032);
    }

    #[test]
    fn test_prometheus_metrics_registry() {
        let registry = PrometheusMetricsRegistry::new(Registry::new());
        case(&registry);
        // A second instance on the same registry reuses the families.
        case(&registry.clone());

        let mut buf = vec![];
        prometheus::TextEncoder::new()
            .encode(&registry.registry().gather(), &mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(r#"glint_bitmap_pool_op_total{name="pool",op="hit"} 84"#));
        assert!(text.contains(r#"glint_bitmap_pool_usage{name="pool"} 800"#));
    }
}

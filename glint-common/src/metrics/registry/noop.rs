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


use crate::metrics::{
    BoxedCounter, BoxedFamily, BoxedGauge, BoxedHistogram, CounterOps, FamilyOps, GaugeOps, HistogramOps, RegistryOps,
};

/// A registry whose metrics record nothing.
///
/// Used when no registry is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetricsRegistry;

#[derive(Debug)]
struct Noop;

impl CounterOps for Noop {
    fn increase(&self, _: u64) {}
}

impl GaugeOps for Noop {
    fn increase(&self, _: u64) {}
    fn decrease(&self, _: u64) {}
    fn absolute(&self, _: u64) {}
}

impl HistogramOps for Noop {
    fn record(&self, _: f64) {}
}

impl FamilyOps<dyn CounterOps> for Noop {
    fn with_labels(&self, _: &[&'static str]) -> BoxedCounter {
        Box::new(Noop)
    }
}

impl FamilyOps<dyn GaugeOps> for Noop {
    fn with_labels(&self, _: &[&'static str]) -> BoxedGauge {
        Box::new(Noop)
    }
}

impl FamilyOps<dyn HistogramOps> for Noop {
    fn with_labels(&self, _: &[&'static str]) -> BoxedHistogram {
        Box::new(Noop)
    }
}

impl RegistryOps for NoopMetricsRegistry {
    fn counter_family(
        &self,
        _: &'static str,
        _: &'static str,
        _: &'static [&'static str],
    ) -> BoxedFamily<dyn CounterOps> {
        Box::new(Noop)
    }

    fn gauge_family(&self, _: &'static str, _: &'static str, _: &'static [&'static str]) -> BoxedFamily<dyn GaugeOps> {
        Box::new(Noop)
    }

    fn histogram_family(
        &self,
        _: &'static str,
        _: &'static str,
        _: &'static [&'static str],
    ) -> BoxedFamily<dyn HistogramOps> {
        Box::new(Noop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::model::Metrics;

    #[test]
    fn test_noop_metrics_accept_everything() {
        let metrics = Metrics::new("noop", &NoopMetricsRegistry);
        metrics.bitmap_pool_hit.increase(1);
        metrics.memory_usage.increase(514);
        metrics.memory_usage.decrease(114);
        metrics.memory_usage.absolute(400);
        metrics.disk_write_duration.record(0.032);
    }
}

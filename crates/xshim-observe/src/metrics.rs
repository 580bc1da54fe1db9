//! Per-export call metrics.

use std::collections::BTreeMap;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use xshim_core::XResult;

use crate::events::{EventSubscriber, ShimEvent};

/// Collects call counts and timings per export.
///
/// Counters are sharded by export, so concurrent guest threads calling
/// different exports do not contend. The collector is also an
/// [`EventSubscriber`] and can be fed straight from an event dispatcher.
#[derive(Default)]
pub struct MetricsCollector {
    exports: DashMap<String, ExportMetrics>,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed call.
    pub fn record_call(&self, module: &str, name: &str, result: XResult, duration: Duration) {
        let mut entry = self.exports.entry(export_key(module, name)).or_default();
        entry.calls += 1;
        if result.failed() {
            entry.failures += 1;
        }
        if result == XResult::BAD_ARGUMENTS {
            entry.bad_arguments += 1;
        }
        entry.total_duration += duration;
    }

    /// Metrics for one export, if it has been called.
    pub fn export(&self, module: &str, name: &str) -> Option<ExportMetrics> {
        self.exports
            .get(&export_key(module, name))
            .map(|entry| entry.value().clone())
    }

    /// Total calls across all exports.
    pub fn total_calls(&self) -> u64 {
        self.exports.iter().map(|entry| entry.calls).sum()
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let exports: BTreeMap<String, ExportMetrics> = self
            .exports
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        MetricsSnapshot {
            total_calls: exports.values().map(|m| m.calls).sum(),
            total_failures: exports.values().map(|m| m.failures).sum(),
            exports,
        }
    }

    /// Reset all metrics.
    pub fn reset(&self) {
        self.exports.clear();
    }
}

impl EventSubscriber for MetricsCollector {
    fn on_event(&self, event: &ShimEvent) {
        if let ShimEvent::ShimCalled {
            module,
            name,
            result,
            duration,
            ..
        } = event
        {
            self.record_call(module, name, *result, *duration);
        }
    }

    fn event_filter(&self) -> Option<Vec<&'static str>> {
        Some(vec!["shim_called"])
    }
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("exports", &self.exports.len())
            .field("total_calls", &self.total_calls())
            .finish()
    }
}

fn export_key(module: &str, name: &str) -> String {
    format!("{module}!{name}")
}

/// Snapshot of collected metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Calls across all exports.
    pub total_calls: u64,
    /// Failed calls across all exports.
    pub total_failures: u64,
    /// Per-export metrics keyed by `module!name`.
    pub exports: BTreeMap<String, ExportMetrics>,
}

impl MetricsSnapshot {
    /// Render the snapshot as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Metrics for a single export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetrics {
    /// Number of calls.
    pub calls: u64,
    /// Calls that returned a failure code.
    pub failures: u64,
    /// Calls rejected for bad arguments.
    pub bad_arguments: u64,
    /// Time spent in the handler.
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Custom serde for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_nanos().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = u128::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos as u64))
    }
}

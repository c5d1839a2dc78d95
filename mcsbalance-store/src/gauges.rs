//! Balance gauges.
//!
//! One gauge series, `balance_mcs`, with a `project` label holding the
//! project title. Each update overwrites the previous value for that label;
//! no history is kept.

use std::collections::BTreeMap;

use prometheus::core::Collector;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TEXT_FORMAT, TextEncoder};
use tracing::debug;

use crate::error::StoreError;

/// Full metric name as exposed.
pub const METRIC_NAME: &str = "balance_mcs";

/// Label carrying the project title.
pub const PROJECT_LABEL: &str = "project";

const SUBSYSTEM: &str = "balance";
const NAME: &str = "mcs";
const HELP: &str = "Balance in mcs account";

/// Last known balance per project.
///
/// Safe to share: one writer (the poller) and any number of readers
/// (metrics requests) may use it concurrently.
#[derive(Clone)]
pub struct BalanceGauges {
    registry: Registry,
    gauge: GaugeVec,
}

impl BalanceGauges {
    /// Creates the gauges in a fresh registry.
    ///
    /// # Errors
    ///
    /// Fails if the metric cannot be registered.
    pub fn new() -> Result<Self, StoreError> {
        let gauge = GaugeVec::new(Opts::new(NAME, HELP).subsystem(SUBSYSTEM), &[PROJECT_LABEL])?;
        let registry = Registry::new();
        registry.register(Box::new(gauge.clone()))?;

        Ok(Self { registry, gauge })
    }

    /// Sets the balance of `project`.
    pub fn set(&self, project: &str, value: f64) {
        debug!(project, value, "Gauge updated");
        self.gauge.with_label_values(&[project]).set(value);
    }

    /// Returns the balance of `project`, if one was ever set.
    pub fn get(&self, project: &str) -> Option<f64> {
        self.snapshot().get(project).copied()
    }

    /// Returns every project's balance at this moment.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        let mut values = BTreeMap::new();
        for family in self.gauge.collect() {
            for metric in family.get_metric() {
                let label = metric
                    .get_label()
                    .iter()
                    .find(|pair| pair.get_name() == PROJECT_LABEL)
                    .map(|pair| pair.get_value().to_string());
                if let Some(label) = label {
                    values.insert(label, metric.get_gauge().get_value());
                }
            }
        }
        values
    }

    /// Returns the number of projects with a published balance.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Returns true if nothing has been published yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the registry in the Prometheus text format.
    ///
    /// # Errors
    ///
    /// Fails if encoding fails.
    pub fn render(&self) -> Result<String, StoreError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Content type of [`render`](Self::render)'s output.
    pub fn content_type(&self) -> &'static str {
        TEXT_FORMAT
    }

    /// Returns the underlying registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

// ============================================================================
// Tests
// ============================================================================

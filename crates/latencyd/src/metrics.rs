//! Prometheus metrics for latencyd

use anyhow::Result;
use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    IntCounter, IntCounterVec, IntGauge, Registry, TextEncoder,
};
use std::sync::Arc;

/// Request outcome label for accepted aggregate requests
pub const OUTCOME_OK: &str = "ok";

/// Request outcome label for rejected aggregate requests
pub const OUTCOME_INVALID: &str = "invalid_request";

/// Service metrics for Prometheus
#[derive(Clone)]
pub struct ServiceMetrics {
    pub requests_total: IntCounterVec,
    pub regions_aggregated_total: IntCounter,
    pub dataset_records: IntGauge,
    pub aggregate_duration_seconds: Histogram,

    registry: Arc<Registry>,
}

impl ServiceMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests_total = register_int_counter_vec_with_registry!(
            "latencyd_requests_total",
            "Aggregate requests handled, by outcome",
            &["outcome"],
            registry
        )?;

        let regions_aggregated_total = register_int_counter_with_registry!(
            "latencyd_regions_aggregated_total",
            "Region entries returned across all aggregate requests",
            registry
        )?;

        let dataset_records = register_int_gauge_with_registry!(
            "latencyd_dataset_records",
            "Telemetry records held in memory",
            registry
        )?;

        let aggregate_duration_seconds = register_histogram_with_registry!(
            "latencyd_aggregate_duration_seconds",
            "Time spent computing region metrics per request",
            vec![0.00001, 0.0001, 0.001, 0.01, 0.1, 1.0],
            registry
        )?;

        Ok(Self {
            requests_total,
            regions_aggregated_total,
            dataset_records,
            aggregate_duration_seconds,
            registry: Arc::new(registry),
        })
    }

    pub fn record_request(&self, outcome: &str) {
        self.requests_total.with_label_values(&[outcome]).inc();
    }

    /// Record an accepted aggregate request returning `regions` entries
    pub fn record_aggregation(&self, regions: usize, duration_secs: f64) {
        self.record_request(OUTCOME_OK);
        self.regions_aggregated_total.inc_by(regions as u64);
        self.aggregate_duration_seconds.observe(duration_secs);
    }

    pub fn set_dataset_records(&self, records: usize) {
        self.dataset_records.set(records as i64);
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

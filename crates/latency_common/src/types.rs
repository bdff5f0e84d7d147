//! Core data types shared by the store and the aggregator.

use serde::{Deserialize, Serialize};

/// One telemetry observation for a region.
///
/// Source rows may carry extra fields (service, timestamp, ...); only these
/// three are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub region: String,
    pub latency_ms: f64,
    pub uptime_pct: f64,
}

impl TelemetryRecord {
    pub fn new(region: impl Into<String>, latency_ms: f64, uptime_pct: f64) -> Self {
        Self {
            region: region.into(),
            latency_ms,
            uptime_pct,
        }
    }
}

/// Aggregated figures for one region.
///
/// A region without records has every figure set to `None` (serialized as
/// `null`) and zero breaches.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub avg_latency: Option<f64>,
    pub p95_latency: Option<f64>,
    pub avg_uptime: Option<f64>,
    pub breaches: u64,
}

impl Metrics {
    /// Metrics for a region with no matching records.
    pub const EMPTY: Metrics = Metrics {
        avg_latency: None,
        p95_latency: None,
        avg_uptime: None,
        breaches: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.avg_latency.is_none()
    }
}

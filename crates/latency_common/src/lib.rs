//! Latency Common - telemetry store, region aggregator and wire schemas.
//!
//! Everything here is synchronous and free of per-request I/O. The daemon
//! loads a [`TelemetryStore`] once and hands it to [`aggregate`].

pub mod aggregator;
pub mod error;
pub mod schemas;
pub mod store;
pub mod types;

pub use aggregator::{aggregate, percentile, region_metrics, round_to};
pub use error::{LoadError, RequestValidationError};
pub use schemas::*;
pub use store::TelemetryStore;
pub use types::*;

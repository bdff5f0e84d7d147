//! Error types for telemetry loading and request validation.

use std::path::PathBuf;
use thiserror::Error;

/// The dataset could not be loaded. Fatal at startup.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("telemetry dataset not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read telemetry dataset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed telemetry dataset {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// An aggregate request body was rejected before reaching the aggregator.
///
/// The display text is what the caller sees in the `error` field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("Invalid JSON")]
    InvalidJson,

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("regions must be a list")]
    RegionsNotAList,

    #[error("regions[{index}] must be a string")]
    RegionNotAString { index: usize },

    #[error("threshold_ms must be a number")]
    ThresholdNotANumber,
}

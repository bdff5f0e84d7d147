//! JSON schemas for the latencyd API

use crate::error::RequestValidationError;
use crate::types::Metrics;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Threshold applied when a request omits `threshold_ms`.
///
/// Zero is the conservative choice: every record above 0 ms is a breach.
pub const DEFAULT_THRESHOLD_MS: f64 = 0.0;

/// Aggregate request body: `{"regions": [...], "threshold_ms": 180}`
///
/// Built only through [`from_slice`](Self::from_slice) / [`from_value`](Self::from_value).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateRequest {
    pub regions: Vec<String>,
    pub threshold_ms: Option<f64>,
}

impl AggregateRequest {
    /// Parse and validate a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, RequestValidationError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|_| RequestValidationError::InvalidJson)?;
        Self::from_value(value)
    }

    /// Validate an already-parsed body.
    ///
    /// A missing `regions` key means no regions; a `null` threshold means
    /// no threshold.
    pub fn from_value(value: Value) -> Result<Self, RequestValidationError> {
        let Value::Object(mut body) = value else {
            return Err(RequestValidationError::NotAnObject);
        };

        let regions = match body.remove("regions") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::String(region) => Ok(region),
                    _ => Err(RequestValidationError::RegionNotAString { index }),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(RequestValidationError::RegionsNotAList),
        };

        let threshold_ms = match body.remove("threshold_ms") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(
                n.as_f64()
                    .ok_or(RequestValidationError::ThresholdNotANumber)?,
            ),
            Some(_) => return Err(RequestValidationError::ThresholdNotANumber),
        };

        Ok(Self {
            regions,
            threshold_ms,
        })
    }

    pub fn threshold_or(&self, default_ms: f64) -> f64 {
        self.threshold_ms.unwrap_or(default_ms)
    }
}

/// Aggregate response: region name -> metrics, in request order.
pub type AggregateResponse = IndexMap<String, Metrics>;

/// Body of every 4xx/5xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Answer to `GET /` and `GET /api`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub records: usize,
    pub regions: usize,
}

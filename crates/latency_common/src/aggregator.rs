//! Region aggregator.
//!
//! Pure computation over a [`TelemetryStore`]: mean latency, p95 latency,
//! mean uptime and a breach count per requested region.
//!
//! The 95th percentile uses linear interpolation between the two nearest
//! ranks: values are sorted ascending and interpolated at rank `0.95 * (n - 1)`.
//! This is the `linear` method that numpy and most numeric libraries default to,
//! and the interpolation step is carried out the way numpy does it so results
//! agree to the last bit.
//!
//! Rounding works on the exact binary value of each figure, like Python's
//! `round`, so a value just below a half-way point is never rounded up.

use crate::store::TelemetryStore;
use crate::types::Metrics;
use indexmap::IndexMap;

/// Quantile reported as `p95_latency`.
pub const P95: f64 = 0.95;

/// Decimal places kept for latency figures.
pub const LATENCY_DECIMALS: u32 = 2;

/// Decimal places kept for uptime figures.
pub const UPTIME_DECIMALS: u32 = 3;

/// Aggregate every requested region against `threshold_ms`.
///
/// The result holds one entry per distinct region, keyed in the order the
/// regions were first requested. Regions without records yield
/// [`Metrics::EMPTY`].
pub fn aggregate<S: AsRef<str>>(
    store: &TelemetryStore,
    regions: &[S],
    threshold_ms: f64,
) -> IndexMap<String, Metrics> {
    let mut results = IndexMap::with_capacity(regions.len());
    for region in regions {
        let region = region.as_ref();
        if results.contains_key(region) {
            continue;
        }
        results.insert(region.to_string(), region_metrics(store, region, threshold_ms));
    }
    results
}

/// Metrics for a single region.
pub fn region_metrics(store: &TelemetryStore, region: &str, threshold_ms: f64) -> Metrics {
    let mut latencies = Vec::new();
    let mut uptime_sum = 0.0;
    for record in store.records_for_region(region) {
        latencies.push(record.latency_ms);
        uptime_sum += record.uptime_pct;
    }

    if latencies.is_empty() {
        return Metrics::EMPTY;
    }

    let n = latencies.len() as f64;
    let avg_latency = latencies.iter().sum::<f64>() / n;
    let avg_uptime = uptime_sum / n;
    // strict: a record exactly at the threshold is not a breach
    let breaches = latencies.iter().filter(|&&l| l > threshold_ms).count() as u64;

    latencies.sort_by(f64::total_cmp);
    let p95 = percentile(&latencies, P95);

    Metrics {
        avg_latency: Some(round_to(avg_latency, LATENCY_DECIMALS)),
        p95_latency: p95.map(|v| round_to(v, LATENCY_DECIMALS)),
        avg_uptime: Some(round_to(avg_uptime, UPTIME_DECIMALS)),
        breaches,
    }
}

/// Quantile `q` (clamped to `[0, 1]`) of ascending-sorted `sorted`, linearly
/// interpolated. Returns `None` for an empty slice.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = q.clamp(0.0, 1.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = (rank.ceil() as usize).min(last);
    let fraction = rank - lo as f64;
    let (a, b) = (sorted[lo], sorted[hi]);
    let diff = b - a;
    // interpolate from the nearer end
    if fraction >= 0.5 {
        Some(b - diff * (1.0 - fraction))
    } else {
        Some(a + diff * fraction)
    }
}

/// Round `value` to `decimals` places, judged on its exact binary value.
///
/// Ties go to even. Values too large to carry that many decimals come back
/// unchanged.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    if !(value * factor).is_finite() {
        return value;
    }
    // float formatting rounds the exact decimal expansion
    format!("{:.*}", decimals as usize, value)
        .parse()
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TelemetryRecord;
    use approx::assert_relative_eq;

    fn store(records: &[(&str, f64, f64)]) -> TelemetryStore {
        TelemetryStore::from_records(
            records
                .iter()
                .map(|&(region, latency, uptime)| TelemetryRecord::new(region, latency, uptime))
                .collect(),
        )
    }

    #[test]
    fn test_two_record_example() {
        let store = store(&[("us-east", 100.0, 99.9), ("us-east", 200.0, 99.0)]);
        let result = aggregate(&store, &["us-east"], 150.0);

        let metrics = result["us-east"];
        assert_eq!(metrics.avg_latency, Some(150.0));
        assert_eq!(metrics.p95_latency, Some(195.0));
        assert_eq!(metrics.avg_uptime, Some(99.45));
        assert_eq!(metrics.breaches, 1);
    }

    #[test]
    fn test_absent_region_is_empty() {
        let store = store(&[("us-east", 100.0, 99.9)]);
        let result = aggregate(&store, &["mars"], 150.0);
        assert_eq!(result.len(), 1);
        assert_eq!(result["mars"], Metrics::EMPTY);
    }

    #[test]
    fn test_empty_request_yields_empty_result() {
        let store = store(&[("us-east", 100.0, 99.9)]);
        let regions: [&str; 0] = [];
        assert!(aggregate(&store, &regions, 0.0).is_empty());
    }

    #[test]
    fn test_result_keeps_request_order_and_collapses_duplicates() {
        let store = store(&[("a", 1.0, 90.0), ("b", 2.0, 90.0), ("c", 3.0, 90.0)]);
        let result = aggregate(&store, &["c", "a", "c", "zz", "a"], 0.0);
        let keys: Vec<&str> = result.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["c", "a", "zz"]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let store = store(&[("r", 150.0, 99.0), ("r", 150.1, 99.0), ("r", 149.9, 99.0)]);
        assert_eq!(region_metrics(&store, "r", 150.0).breaches, 1);
    }

    #[test]
    fn test_zero_threshold_counts_every_positive_latency() {
        let store = store(&[("r", 0.0, 99.0), ("r", 0.5, 99.0), ("r", 12.0, 99.0)]);
        assert_eq!(region_metrics(&store, "r", 0.0).breaches, 2);
    }

    #[test]
    fn test_single_record_region() {
        let store = store(&[("solo", 42.123, 97.12345)]);
        let metrics = region_metrics(&store, "solo", 50.0);
        assert_eq!(metrics.avg_latency, Some(42.12));
        assert_eq!(metrics.p95_latency, Some(42.12));
        assert_eq!(metrics.avg_uptime, Some(97.123));
        assert_eq!(metrics.breaches, 0);
    }

    #[test]
    fn test_p95_unsorted_input() {
        // sorted: 10..=100 step 10, rank 0.95 * 9 = 8.55 -> 100 - 0.45 * 10
        let latencies = [70.0, 10.0, 100.0, 40.0, 20.0, 90.0, 30.0, 60.0, 80.0, 50.0];
        let records: Vec<_> = latencies.iter().map(|&l| ("r", l, 99.0)).collect();
        let store = store(&records);
        assert_eq!(region_metrics(&store, "r", 0.0).p95_latency, Some(95.5));
    }

    #[test]
    fn test_percentile_linear_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(percentile(&values, 0.0).unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(percentile(&values, 0.5).unwrap(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(percentile(&values, 0.95).unwrap(), 4.8, epsilon = 1e-9);
        assert_relative_eq!(percentile(&values, 1.0).unwrap(), 5.0, epsilon = 1e-9);
        assert_eq!(percentile(&[], 0.95), None);
    }

    #[test]
    fn test_percentile_clamps_quantile() {
        let values = [1.0, 2.0];
        assert_relative_eq!(percentile(&values, -1.0).unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(percentile(&values, 3.0).unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.234567, 2), 1.23);
        assert_eq!(round_to(1.235001, 2), 1.24);
        assert_eq!(round_to(99.45, 3), 99.45);
        assert_eq!(round_to(-1.23456, 2), -1.23);
    }

    #[test]
    fn test_round_to_below_half_rounds_down() {
        // stored values sit just under the half-way point
        assert_eq!(round_to(115.88499999999999, 2), 115.88);
        assert_eq!(round_to(53.5965, 3), 53.596);
    }

    #[test]
    fn test_round_to_huge_values_unchanged() {
        assert_eq!(round_to(1e307, 2), 1e307);
        assert_eq!(round_to(f64::MAX, 3), f64::MAX);
        assert_eq!(round_to(-1e307, 2), -1e307);
    }

    #[test]
    fn test_p95_interpolates_from_upper_rank() {
        // 118.14 - 45.1 * 0.05 lands at 115.8850000000000051 in binary
        let store = store(&[("r", 73.04, 99.0), ("r", 118.14, 99.0)]);
        assert_eq!(region_metrics(&store, "r", 0.0).p95_latency, Some(115.89));
    }

    #[test]
    fn test_uptime_just_below_half_rounds_down() {
        let store = store(&[("r", 10.0, 53.5965)]);
        assert_eq!(region_metrics(&store, "r", 0.0).avg_uptime, Some(53.596));
    }

    #[test]
    fn test_huge_latency_stays_numeric() {
        let store = TelemetryStore::from_json_str(
            r#"[{"region":"r","latency_ms":1e307,"uptime_pct":99.0}]"#,
        )
        .unwrap();
        let metrics = region_metrics(&store, "r", 0.0);
        assert_eq!(metrics.avg_latency, Some(1e307));
        assert_eq!(metrics.p95_latency, Some(1e307));
        assert!(!metrics.is_empty());

        let json = serde_json::to_value(metrics).unwrap();
        assert!(json["avg_latency"].is_number());
        assert!(json["p95_latency"].is_number());
    }
}

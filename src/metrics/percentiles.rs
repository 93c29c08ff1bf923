use hdrhistogram::Histogram;
use serde::Serialize;

use crate::reservoir::{UniformTimeSnapshot, UniformTimeValuesSnapshot};

/// A complete percentile breakdown for one set of durations (μs).
/// Serialized straight into the metrics JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileSet {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub p999: f64,
    pub count: u64,
}

impl PercentileSet {
    /// Lifetime breakdown from an HdrHistogram.
    /// Returns zeroed values if the histogram is empty.
    pub fn from_histogram(hist: &Histogram<u64>) -> Self {
        if hist.len() == 0 {
            return Self::empty();
        }

        Self {
            min: hist.min(),
            max: hist.max(),
            mean: hist.mean(),
            p50: hist.value_at_quantile(0.5) as f64,
            p95: hist.value_at_quantile(0.95) as f64,
            p99: hist.value_at_quantile(0.99) as f64,
            p999: hist.value_at_quantile(0.999) as f64,
            count: hist.len(),
        }
    }

    /// Exact breakdown of the values one window retained.
    pub fn from_snapshot(snapshot: &UniformTimeValuesSnapshot) -> Self {
        if snapshot.size() == 0 {
            return Self::empty();
        }
        // quantiles below are constants within [0, 1]
        let at = |q: f64| snapshot.value(q).unwrap_or_default();

        Self {
            min: snapshot.min(),
            max: snapshot.max(),
            mean: snapshot.mean(),
            p50: at(0.5),
            p95: at(0.95),
            p99: at(0.99),
            p999: at(0.999),
            count: snapshot.size(),
        }
    }

    /// All-zero placeholder used before any samples are recorded.
    pub fn empty() -> Self {
        Self {
            min: 0,
            max: 0,
            mean: 0.0,
            p50: 0.0,
            p95: 0.0,
            p99: 0.0,
            p999: 0.0,
            count: 0,
        }
    }

    /// Is this set backed by at least one observation?
    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}

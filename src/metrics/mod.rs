pub mod collector;
pub mod execution;
pub mod percentiles;
pub mod responses;
pub mod stream;
pub mod window_stats;

use thiserror::Error;

use crate::reservoir::ReservoirError;

pub use collector::{MetricsCollector, MetricsSnapshot, SampleRecord};
pub use execution::{ExecutionSnapshot, ExecutionStatistics};
pub use percentiles::PercentileSet;
pub use responses::ResponseStatistics;
pub use window_stats::TimeWindowStatistics;

/// A single timing observation.
/// This is the "write" side: the timing middleware and the load generator
/// create these and push them in.
#[derive(Debug, Clone)]
pub struct Sample {
    /// e.g. "GET /api/probe/:delay_ms"
    pub endpoint: String,
    /// Total request wall time in microseconds
    pub duration_us: u64,
    /// HTTP status of the response
    pub status: u16,
}

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error(transparent)]
    Reservoir(#[from] ReservoirError),
    #[error("histogram creation failed: {0}")]
    Histogram(#[from] hdrhistogram::CreationError),
}

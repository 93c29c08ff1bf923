use thiserror::Error;

use super::TimeUnit;

pub type Result<T> = std::result::Result<T, ReservoirError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReservoirError {
    #[error("quantile {0} is not in [0, 1]")]
    InvalidQuantile(f64),
    #[error("snapshot interval must be positive, got {interval} {unit:?}")]
    NonPositiveInterval { interval: i64, unit: TimeUnit },
    #[error("reservoir window must be positive, got {window} {unit:?}")]
    NonPositiveWindow { window: i64, unit: TimeUnit },
    #[error("aggregation chunk must be positive, got {chunk} {unit:?}")]
    NonPositiveChunk { chunk: i64, unit: TimeUnit },
}

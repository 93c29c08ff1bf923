use super::error::{ReservoirError, Result};
use super::TimeUnit;

/// Read-only statistics of the samples a reservoir held within one window.
pub trait UniformTimeSnapshot: Send + Sync {
    /// Number of samples in the snapshot.
    fn size(&self) -> u64;

    /// Largest sample, `0` when empty.
    fn max(&self) -> u64;

    /// Smallest sample, `0` when empty.
    fn min(&self) -> u64;

    /// Arithmetic mean of the samples, `0.0` when empty.
    fn mean(&self) -> f64;

    /// The time interval the samples were collected over.
    fn interval(&self) -> SnapshotInterval;

    /// Samples per one `unit` of time.
    fn rate(&self, unit: TimeUnit) -> f64 {
        self.interval().rate(self.size(), unit)
    }

    fn time_interval(&self, unit: TimeUnit) -> i64 {
        self.interval().convert(unit)
    }
}

/// The `(interval, unit)` pair every snapshot is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotInterval {
    interval: i64,
    unit: TimeUnit,
}

impl SnapshotInterval {
    /// A zero or negative interval would turn every rate into NaN or infinity,
    /// so it is rejected here.
    pub fn new(interval: i64, unit: TimeUnit) -> Result<Self> {
        if interval <= 0 {
            return Err(ReservoirError::NonPositiveInterval { interval, unit });
        }
        Ok(Self { interval, unit })
    }

    /// Interval actually measured by a reservoir; clamped to one nanosecond,
    /// the finest resolution a reservoir records at.
    pub(crate) fn measured(nanos: i64) -> Self {
        Self {
            interval: nanos.max(1),
            unit: TimeUnit::Nanoseconds,
        }
    }

    pub fn convert(&self, unit: TimeUnit) -> i64 {
        unit.convert(self.interval, self.unit)
    }

    /// `size` spread over this interval, rescaled to one `unit`.
    pub fn rate(&self, size: u64, unit: TimeUnit) -> f64 {
        let interval_nanos = self.unit.to_nanos(self.interval) as f64;
        size as f64 * unit.nanos_per_unit() as f64 / interval_nanos
    }
}

/// Snapshot made of already aggregated figures; it cannot answer quantiles.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformTimeSimpleSnapshot {
    max: u64,
    min: u64,
    mean: f64,
    size: u64,
    interval: SnapshotInterval,
}

impl UniformTimeSimpleSnapshot {
    pub fn new(
        max: u64,
        min: u64,
        mean: f64,
        size: u64,
        interval: i64,
        unit: TimeUnit,
    ) -> Result<Self> {
        Ok(Self::with_interval(
            max,
            min,
            mean,
            size,
            SnapshotInterval::new(interval, unit)?,
        ))
    }

    pub(crate) fn with_interval(
        max: u64,
        min: u64,
        mean: f64,
        size: u64,
        interval: SnapshotInterval,
    ) -> Self {
        Self {
            max,
            min,
            mean,
            size,
            interval,
        }
    }
}

impl UniformTimeSnapshot for UniformTimeSimpleSnapshot {
    fn size(&self) -> u64 {
        self.size
    }

    fn max(&self) -> u64 {
        self.max
    }

    fn min(&self) -> u64 {
        self.min
    }

    fn mean(&self) -> f64 {
        self.mean
    }

    fn interval(&self) -> SnapshotInterval {
        self.interval
    }
}

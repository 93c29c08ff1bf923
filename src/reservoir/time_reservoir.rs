use super::snapshot::UniformTimeSnapshot;
use super::TimeUnit;

/// A store of time-stamped values that answers statistics over a trailing
/// time window.
///
/// Queries are "at `time` or newer": a reservoir trims forward and keeps no
/// history, so asking about a moment older than what has already been
/// trimmed yields an approximation, not an exact historical view.
pub trait TimeReservoir<V>: Send + Sync {
    /// Number of values retained at `time` or newer.
    fn size(&self, time: i64, unit: TimeUnit) -> usize;

    /// Records `value` as measured at `time`.
    fn update(&self, value: V, time: i64, unit: TimeUnit);

    /// Statistics of the values retained at `time` or newer.
    fn snapshot(&self, time: i64, unit: TimeUnit) -> Box<dyn UniformTimeSnapshot>;

    /// The configured window length.
    fn interval(&self, unit: TimeUnit) -> i64;
}

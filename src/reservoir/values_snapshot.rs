use super::error::{ReservoirError, Result};
use super::snapshot::{SnapshotInterval, UniformTimeSnapshot};
use super::TimeUnit;

/// Snapshot keeping every sampled value, sorted once at construction.
///
/// Quantiles follow the `q * (n + 1)` linear interpolation convention: below
/// the first position the minimum is returned, past the last one the maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformTimeValuesSnapshot {
    values: Vec<u64>,
    interval: SnapshotInterval,
}

impl UniformTimeValuesSnapshot {
    pub fn new<I>(values: I, interval: i64, unit: TimeUnit) -> Result<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        Ok(Self::with_interval(
            values,
            SnapshotInterval::new(interval, unit)?,
        ))
    }

    pub(crate) fn with_interval<I>(values: I, interval: SnapshotInterval) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        let mut values: Vec<u64> = values.into_iter().collect();
        values.sort_unstable();
        Self { values, interval }
    }

    /// Interpolated value at `quantile`, `0.0` for an empty snapshot.
    pub fn value(&self, quantile: f64) -> Result<f64> {
        if quantile.is_nan() || !(0.0..=1.0).contains(&quantile) {
            return Err(ReservoirError::InvalidQuantile(quantile));
        }
        if self.values.is_empty() {
            return Ok(0.0);
        }

        let len = self.values.len();
        let pos = quantile * (len + 1) as f64;
        let index = pos.floor() as usize;

        if index < 1 {
            return Ok(self.values[0] as f64);
        }
        if index >= len {
            return Ok(self.values[len - 1] as f64);
        }

        let lower = self.values[index - 1] as f64;
        let upper = self.values[index] as f64;
        Ok(lower + (pos - pos.floor()) * (upper - lower))
    }

    pub fn median(&self) -> f64 {
        self.value(0.5).unwrap_or_default()
    }

    /// Copy of the sorted values.
    pub fn values(&self) -> Vec<u64> {
        self.values.clone()
    }
}

impl UniformTimeSnapshot for UniformTimeValuesSnapshot {
    fn size(&self) -> u64 {
        self.values.len() as u64
    }

    fn max(&self) -> u64 {
        self.values.last().copied().unwrap_or(0)
    }

    fn min(&self) -> u64 {
        self.values.first().copied().unwrap_or(0)
    }

    fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let sum: u128 = self.values.iter().map(|&v| v as u128).sum();
        sum as f64 / self.values.len() as f64
    }

    fn interval(&self) -> SnapshotInterval {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(values: &[u64]) -> UniformTimeValuesSnapshot {
        UniformTimeValuesSnapshot::new(values.iter().copied(), 60, TimeUnit::Seconds).unwrap()
    }

    #[test]
    fn sorts_and_summarises() {
        let snap = snapshot(&[5, 1, 9, 3]);
        assert_eq!(snap.values(), vec![1, 3, 5, 9]);
        assert_eq!(snap.min(), 1);
        assert_eq!(snap.max(), 9);
        assert_eq!(snap.mean(), 4.5);
        assert_eq!(snap.size(), 4);
        assert_eq!(snap.value(0.5).unwrap(), 4.0);
        assert_eq!(snap.median(), 4.0);
    }

    #[test]
    fn quantile_bounds_are_min_and_max() {
        let snap = snapshot(&[7, 2, 11]);
        assert_eq!(snap.value(0.0).unwrap(), 2.0);
        assert_eq!(snap.value(1.0).unwrap(), 11.0);
    }

    #[test]
    fn single_value_answers_every_quantile() {
        let snap = snapshot(&[42]);
        for q in [0.0, 0.25, 0.5, 0.99, 1.0] {
            assert_eq!(snap.value(q).unwrap(), 42.0);
        }
    }

    #[test]
    fn interpolates_between_neighbours() {
        let snap = snapshot(&(1..=9).collect::<Vec<_>>());
        // 0.75 * 10 = 7.5 -> between 7 and 8
        assert_eq!(snap.value(0.75).unwrap(), 7.5);
        // 0.05 * 10 = 0.5 -> below the first position
        assert_eq!(snap.value(0.05).unwrap(), 1.0);
    }

    #[test]
    fn empty_snapshot_is_all_zero() {
        let snap = snapshot(&[]);
        assert_eq!(snap.size(), 0);
        assert_eq!(snap.min(), 0);
        assert_eq!(snap.max(), 0);
        assert_eq!(snap.mean(), 0.0);
        assert_eq!(snap.value(0.99).unwrap(), 0.0);
        assert!(snap.values().is_empty());
    }

    #[test]
    fn rejects_invalid_quantiles() {
        let snap = snapshot(&[1, 2, 3]);
        for q in [-0.1, 1.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                snap.value(q),
                Err(ReservoirError::InvalidQuantile(_))
            ));
        }
    }

    #[test]
    fn returned_values_are_a_copy() {
        let snap = snapshot(&[3, 1, 2]);
        let mut values = snap.values();
        values[0] = 100;
        values.push(0);
        assert_eq!(snap.min(), 1);
        assert_eq!(snap.max(), 3);
        assert_eq!(snap.value(0.0).unwrap(), 1.0);
    }

    #[test]
    fn rate_uses_the_snapshot_interval() {
        let snap =
            UniformTimeValuesSnapshot::new((0..10).map(|v| v as u64), 1, TimeUnit::Seconds)
                .unwrap();
        assert_eq!(snap.rate(TimeUnit::Seconds), 10.0);
        assert_eq!(snap.time_interval(TimeUnit::Milliseconds), 1_000);
    }

    #[test]
    fn mean_does_not_overflow() {
        let snap = snapshot(&[u64::MAX, u64::MAX]);
        assert_eq!(snap.mean(), u64::MAX as f64);
    }
}

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use log::trace;
use parking_lot::RwLock;

use super::constants::{nanos_from_tick, tick_from_nanos, Tick, COLLISION_BUFFER, TRIM_THRESHOLD};
use super::error::{ReservoirError, Result};
use super::snapshot::{SnapshotInterval, UniformTimeSnapshot};
use super::time_reservoir::TimeReservoir;
use super::trimmer::{DefaultSlidingWindowTrimmer, SlidingWindowTrimmer};
use super::values_snapshot::UniformTimeValuesSnapshot;
use super::TimeUnit;

// ─── Shared sliding window ───────────────────────────────────────

/// Time-ordered measurements of the last `window` of time, the storage every
/// reservoir is composed of.
///
/// Keys are [`Tick`]s: nanoseconds shifted left by
/// [`COLLISION_BUFFER_POWER`](super::constants::COLLISION_BUFFER_POWER), so
/// up to [`COLLISION_BUFFER`] values fit into one nanosecond. Any `i64`
/// nanosecond is accepted, epoch timestamps included. Values may arrive out
/// of order, including from before the start time.
pub struct SlidingWindow<V> {
    measurements: RwLock<BTreeMap<Tick, V>>,
    /// Window length in nanoseconds.
    window: i64,
    greatest_nanos: AtomicI64,
    update_count: AtomicU64,
    start_nanos: AtomicI64,
    trimmer: Arc<dyn SlidingWindowTrimmer<V>>,
    interval: i64,
    interval_unit: TimeUnit,
}

/// Values of one window plus the interval they were measured over.
pub struct WindowValues<V> {
    pub values: Vec<V>,
    pub interval: SnapshotInterval,
}

impl<V: Clone + Send + Sync + 'static> SlidingWindow<V> {
    pub fn new(
        window: i64,
        window_unit: TimeUnit,
        start_time: i64,
        start_time_unit: TimeUnit,
        trimmer: Arc<dyn SlidingWindowTrimmer<V>>,
    ) -> Result<Self> {
        if window <= 0 {
            return Err(ReservoirError::NonPositiveWindow {
                window,
                unit: window_unit,
            });
        }

        let start = start_time_unit.to_nanos(start_time);
        Ok(Self {
            measurements: RwLock::new(BTreeMap::new()),
            window: window_unit.to_nanos(window),
            greatest_nanos: AtomicI64::new(start),
            update_count: AtomicU64::new(0),
            start_nanos: AtomicI64::new(start),
            trimmer,
            interval: window,
            interval_unit: window_unit,
        })
    }

    pub fn size(&self, time: i64, unit: TimeUnit) -> usize {
        self.advance_greatest(unit.to_nanos(time));
        self.trim();
        self.measurements.read().len()
    }

    pub fn update(&self, value: V, time: i64, unit: TimeUnit) {
        if (self.update_count.fetch_add(1, Ordering::Relaxed) + 1) % TRIM_THRESHOLD == 0 {
            self.trim();
        }

        let nanos = unit.to_nanos(time);
        let first = tick_from_nanos(nanos);
        let mut measurements = self.measurements.write();
        for candidate in first..first + Tick::from(COLLISION_BUFFER) {
            if let Entry::Vacant(slot) = measurements.entry(candidate) {
                slot.insert(value);
                drop(measurements);
                self.advance_greatest(nanos);
                return;
            }
        }
        // every slot of this nanosecond is taken, the statistics are inexact anyway
        trace!(
            "Discarding value at {} ns, all {} collision slots are taken",
            nanos,
            COLLISION_BUFFER
        );
    }

    pub fn interval(&self, unit: TimeUnit) -> i64 {
        unit.convert(self.interval, self.interval_unit)
    }

    /// Copies the values in the window ending at `time` (or at the greatest
    /// time seen, if later) and trims afterwards.
    pub fn window_values(&self, time: i64, unit: TimeUnit) -> WindowValues<V> {
        let baseline = self.advance_greatest(unit.to_nanos(time));
        let lower = self.trim_key(baseline);
        let upper = tick_from_nanos(baseline) + Tick::from(COLLISION_BUFFER) - 1;

        let values: Vec<V> = {
            let measurements = self.measurements.read();
            let range = measurements.range(lower..=upper);
            if let Some((&first, _)) = range.clone().next() {
                // a value older than the start widens the measured interval
                self.start_nanos
                    .fetch_min(nanos_from_tick(first), Ordering::SeqCst);
            }
            range.map(|(_, value)| value.clone()).collect()
        };

        let start = self.start_nanos.load(Ordering::SeqCst);
        let measured = (i128::from(baseline) - i128::from(start)).min(i128::from(self.window));
        self.trim_at(baseline);

        WindowValues {
            values,
            interval: SnapshotInterval::measured(i64::try_from(measured).unwrap_or(self.window)),
        }
    }

    /// Moves the greatest time forward to `nanos` and returns the greatest one.
    fn advance_greatest(&self, nanos: i64) -> i64 {
        self.greatest_nanos.fetch_max(nanos, Ordering::SeqCst).max(nanos)
    }

    /// First tick kept by a trim at `baseline`.
    fn trim_key(&self, baseline: i64) -> Tick {
        tick_from_nanos(baseline) - tick_from_nanos(self.window)
    }

    fn trim(&self) {
        self.trim_at(self.greatest_nanos.load(Ordering::SeqCst));
    }

    fn trim_at(&self, baseline: i64) {
        let key = self.trim_key(baseline);
        let mut measurements = self.measurements.write();
        self.trimmer.trim(&mut measurements, key);
    }
}

// ─── Raw values reservoir ────────────────────────────────────────

/// Reservoir of raw `u64` measurements (durations, counts) whose snapshots
/// answer quantile queries.
pub struct SlidingWindowTimeReservoir {
    window: SlidingWindow<u64>,
}

impl SlidingWindowTimeReservoir {
    pub fn new(
        window: i64,
        window_unit: TimeUnit,
        start_time: i64,
        start_time_unit: TimeUnit,
    ) -> Result<Arc<Self>> {
        Self::with_trimmer(
            window,
            window_unit,
            start_time,
            start_time_unit,
            Arc::new(DefaultSlidingWindowTrimmer),
        )
    }

    pub fn with_trimmer(
        window: i64,
        window_unit: TimeUnit,
        start_time: i64,
        start_time_unit: TimeUnit,
        trimmer: Arc<dyn SlidingWindowTrimmer<u64>>,
    ) -> Result<Arc<Self>> {
        let window = SlidingWindow::new(
            window,
            window_unit,
            start_time,
            start_time_unit,
            Arc::clone(&trimmer),
        )?;
        let reservoir = Arc::new(Self { window });
        let weak = Arc::downgrade(&reservoir);
        trimmer.set_time_reservoir(weak);
        Ok(reservoir)
    }

    /// Same as [`TimeReservoir::snapshot`] but keeps the concrete type, so
    /// quantiles can be queried.
    pub fn values_snapshot(&self, time: i64, unit: TimeUnit) -> UniformTimeValuesSnapshot {
        let WindowValues { values, interval } = self.window.window_values(time, unit);
        UniformTimeValuesSnapshot::with_interval(values, interval)
    }
}

impl TimeReservoir<u64> for SlidingWindowTimeReservoir {
    fn size(&self, time: i64, unit: TimeUnit) -> usize {
        self.window.size(time, unit)
    }

    fn update(&self, value: u64, time: i64, unit: TimeUnit) {
        self.window.update(value, time, unit);
    }

    fn snapshot(&self, time: i64, unit: TimeUnit) -> Box<dyn UniformTimeSnapshot> {
        Box::new(self.values_snapshot(time, unit))
    }

    fn interval(&self, unit: TimeUnit) -> i64 {
        self.window.interval(unit)
    }
}

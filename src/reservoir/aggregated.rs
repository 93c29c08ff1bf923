use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use log::{debug, trace};
use parking_lot::RwLock;

use super::constants::{nanos_from_tick, tick_from_nanos, Tick};
use super::error::{ReservoirError, Result};
use super::sliding_window::{SlidingWindow, WindowValues};
use super::snapshot::{UniformTimeSimpleSnapshot, UniformTimeSnapshot};
use super::time_reservoir::TimeReservoir;
use super::trimmer::{DefaultSlidingWindowTrimmer, SlidingWindowTrimmer};
use super::TimeUnit;

// ─── Aggregated chunk ────────────────────────────────────────────

/// Summary of the raw values evicted together as one chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedValueObject {
    pub max: u64,
    pub min: u64,
    pub mean: f64,
    pub count: u64,
}

impl AggregatedValueObject {
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        let mut max = 0u64;
        let mut min = u64::MAX;
        let mut sum: u128 = 0;
        let mut count = 0u64;
        for value in values {
            max = max.max(value);
            min = min.min(value);
            sum += value as u128;
            count += 1;
        }

        if count == 0 {
            return Self {
                max: 0,
                min: 0,
                mean: 0.0,
                count: 0,
            };
        }
        Self {
            max,
            min,
            mean: sum as f64 / count as f64,
            count,
        }
    }
}

// ─── Aggregating trimmer ─────────────────────────────────────────

type AggregatedListener = Weak<dyn TimeReservoir<AggregatedValueObject>>;

/// Trimmer that, instead of dropping evicted values, folds them into
/// fixed-length chunks and publishes every chunk to the aggregated reservoirs
/// registered with it.
///
/// Chunks are aligned to the start time: each chunk covers
/// `[start + k * chunk, start + (k + 1) * chunk)`.
pub struct AggregatingTrimmer {
    listeners: RwLock<Vec<AggregatedListener>>,
    source: RwLock<Option<Weak<dyn TimeReservoir<u64>>>>,
    /// Alignment of chunk boundaries, in ticks.
    start_tick: Tick,
    /// Chunk length in ticks.
    chunk: Tick,
    locked: AtomicBool,
}

impl AggregatingTrimmer {
    pub fn new(
        start_time: i64,
        start_time_unit: TimeUnit,
        chunk: i64,
        chunk_unit: TimeUnit,
    ) -> Result<Arc<Self>> {
        if chunk <= 0 {
            return Err(ReservoirError::NonPositiveChunk {
                chunk,
                unit: chunk_unit,
            });
        }
        Ok(Arc::new(Self {
            listeners: RwLock::new(Vec::new()),
            source: RwLock::new(None),
            start_tick: tick_from_nanos(start_time_unit.to_nanos(start_time)),
            chunk: tick_from_nanos(chunk_unit.to_nanos(chunk)),
            locked: AtomicBool::new(false),
        }))
    }

    /// Adds a reservoir that receives every chunk trimmed from now on.
    pub fn register(&self, listener: AggregatedListener) {
        let mut listeners = self.listeners.write();
        listeners.retain(|l| l.strong_count() > 0);
        listeners.push(listener);
    }

    /// The reservoir whose values are not trimmed yet.
    pub fn source(&self) -> Option<Arc<dyn TimeReservoir<u64>>> {
        self.source.read().as_ref().and_then(Weak::upgrade)
    }

    /// Start of the chunk `tick` falls into.
    ///
    /// Ticks span 72 bits, so none of this can overflow an `i128`.
    fn lower_bound(&self, tick: Tick) -> Tick {
        let offset = self.start_tick.rem_euclid(self.chunk);
        (tick - offset).div_euclid(self.chunk) * self.chunk + offset
    }
}

impl SlidingWindowTrimmer<u64> for AggregatingTrimmer {
    fn trim(&self, measurements: &mut BTreeMap<Tick, u64>, key: Tick) {
        // another source is already publishing, let the next trim catch up
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            trace!("Aggregating trim already in progress, skipping");
            return;
        }

        let listeners: Vec<_> = self
            .listeners
            .read()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();

        let mut published = 0usize;
        while let Some((&first, _)) = measurements.first_key_value() {
            if first >= key {
                break;
            }
            let lower = self.lower_bound(first);
            let upper = (lower + self.chunk).min(key);

            let retained = measurements.split_off(&upper);
            let chunk = std::mem::replace(measurements, retained);
            let aggregated = AggregatedValueObject::from_values(chunk.into_values());

            for listener in &listeners {
                listener.update(aggregated, nanos_from_tick(lower), TimeUnit::Nanoseconds);
            }
            published += 1;
        }

        self.locked.store(false, Ordering::Release);
        if published > 0 {
            debug!(
                "Published {} aggregated chunk(s) to {} reservoir(s)",
                published,
                listeners.len()
            );
        }
    }

    fn set_time_reservoir(&self, reservoir: Weak<dyn TimeReservoir<u64>>) {
        *self.source.write() = Some(reservoir);
    }
}

// ─── Aggregated reservoir ────────────────────────────────────────

/// Reservoir of aggregated chunks. It covers long windows with a bounded
/// number of entries (one per chunk) while the raw values stay in the short
/// source reservoir of its [`AggregatingTrimmer`].
pub struct AggregatedSlidingWindowTimeReservoir {
    window: SlidingWindow<AggregatedValueObject>,
    notifier: Arc<AggregatingTrimmer>,
}

impl AggregatedSlidingWindowTimeReservoir {
    pub fn new(
        window: i64,
        window_unit: TimeUnit,
        start_time: i64,
        start_time_unit: TimeUnit,
        notifier: &Arc<AggregatingTrimmer>,
    ) -> Result<Arc<Self>> {
        let window = SlidingWindow::new(
            window,
            window_unit,
            start_time,
            start_time_unit,
            Arc::new(DefaultSlidingWindowTrimmer),
        )?;
        let reservoir = Arc::new(Self {
            window,
            notifier: Arc::clone(notifier),
        });
        let weak = Arc::downgrade(&reservoir);
        notifier.register(weak);
        Ok(reservoir)
    }

    /// Merges the chunks of this window with the values the source reservoir
    /// still holds.
    pub fn aggregated_snapshot(&self, time: i64, unit: TimeUnit) -> UniformTimeSimpleSnapshot {
        // the source snapshot may trim chunks into this window, so take it first
        let pending = self
            .notifier
            .source()
            .map(|source| source.snapshot(time, unit));
        let WindowValues { values, interval } = self.window.window_values(time, unit);

        let mut max: Option<u64> = None;
        let mut min: Option<u64> = None;
        let mut count = 0u64;
        let mut weighted_sum = 0.0;

        let mut merge = |chunk_max: u64, chunk_min: u64, chunk_mean: f64, chunk_count: u64| {
            if chunk_count == 0 {
                return;
            }
            max = Some(max.map_or(chunk_max, |m| m.max(chunk_max)));
            min = Some(min.map_or(chunk_min, |m| m.min(chunk_min)));
            count += chunk_count;
            weighted_sum += chunk_mean * chunk_count as f64;
        };

        for chunk in &values {
            merge(chunk.max, chunk.min, chunk.mean, chunk.count);
        }
        if let Some(pending) = &pending {
            merge(pending.max(), pending.min(), pending.mean(), pending.size());
        }

        let mean = if count > 0 {
            weighted_sum / count as f64
        } else {
            0.0
        };
        UniformTimeSimpleSnapshot::with_interval(
            max.unwrap_or(0),
            min.unwrap_or(0),
            mean,
            count,
            interval,
        )
    }
}

impl TimeReservoir<AggregatedValueObject> for AggregatedSlidingWindowTimeReservoir {
    fn size(&self, time: i64, unit: TimeUnit) -> usize {
        self.window.size(time, unit)
    }

    fn update(&self, value: AggregatedValueObject, time: i64, unit: TimeUnit) {
        self.window.update(value, time, unit);
    }

    fn snapshot(&self, time: i64, unit: TimeUnit) -> Box<dyn UniformTimeSnapshot> {
        Box::new(self.aggregated_snapshot(time, unit))
    }

    fn interval(&self, unit: TimeUnit) -> i64 {
        self.window.interval(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reservoir::SlidingWindowTimeReservoir;

    const MS: TimeUnit = TimeUnit::Milliseconds;

    #[test]
    fn aggregates_a_chunk() {
        let chunk = AggregatedValueObject::from_values([4, 8, 6]);
        assert_eq!(chunk.count, 3);
        assert_eq!(chunk.min, 4);
        assert_eq!(chunk.max, 8);
        assert_eq!(chunk.mean, 6.0);
        assert_eq!(AggregatedValueObject::from_values(std::iter::empty()).count, 0);
    }

    #[test]
    fn rejects_non_positive_chunk() {
        assert!(matches!(
            AggregatingTrimmer::new(0, MS, 0, MS),
            Err(ReservoirError::NonPositiveChunk { chunk: 0, .. })
        ));
    }

    #[test]
    fn chunks_are_aligned_to_the_start() {
        let trimmer = AggregatingTrimmer::new(3, TimeUnit::Nanoseconds, 10, TimeUnit::Nanoseconds)
            .unwrap();
        let tick = tick_from_nanos;
        assert_eq!(trimmer.lower_bound(tick(3)), tick(3));
        assert_eq!(trimmer.lower_bound(tick(12) + 7), tick(3));
        assert_eq!(trimmer.lower_bound(tick(13)), tick(13));
        assert_eq!(trimmer.lower_bound(tick(2)), tick(-7));
        assert_eq!(trimmer.lower_bound(tick(-8)), tick(-17));
    }

    #[test]
    fn trimmed_chunks_reach_the_aggregated_reservoir() {
        let trimmer = AggregatingTrimmer::new(0, MS, 10, MS).unwrap();
        let source =
            SlidingWindowTimeReservoir::with_trimmer(10, MS, 0, MS, trimmer.clone()).unwrap();
        let aggregated =
            AggregatedSlidingWindowTimeReservoir::new(1, TimeUnit::Hours, 0, MS, &trimmer)
                .unwrap();

        for (value, time) in [(1, 1), (5, 5), (3, 12), (9, 25)] {
            source.update(value, time, MS);
        }
        // trims everything older than 20 ms: chunks [0, 10) and [10, 20)
        assert_eq!(source.size(30, MS), 1);
        assert_eq!(aggregated.size(30, MS), 2);

        let snapshot = aggregated.aggregated_snapshot(30, MS);
        assert_eq!(snapshot.size(), 4);
        assert_eq!(snapshot.min(), 1);
        assert_eq!(snapshot.max(), 9);
        assert_eq!(snapshot.mean(), 4.5);
        assert_eq!(snapshot.time_interval(MS), 30);
    }

    #[test]
    fn chunks_at_epoch_times() {
        let start = 1_760_000_000_000;
        let trimmer = AggregatingTrimmer::new(start, MS, 7, MS).unwrap();
        let source =
            SlidingWindowTimeReservoir::with_trimmer(10, MS, start, MS, trimmer.clone()).unwrap();
        let aggregated =
            AggregatedSlidingWindowTimeReservoir::new(1, TimeUnit::Hours, start, MS, &trimmer)
                .unwrap();

        for (value, offset) in [(1, 1), (5, 5), (3, 8), (9, 25)] {
            source.update(value, start + offset, MS);
        }
        // chunks [start, start + 7) and [start + 7, start + 14)
        assert_eq!(source.size(start + 30, MS), 1);
        assert_eq!(aggregated.size(start + 30, MS), 2);

        let snapshot = aggregated.aggregated_snapshot(start + 30, MS);
        assert_eq!(snapshot.size(), 4);
        assert_eq!(snapshot.min(), 1);
        assert_eq!(snapshot.max(), 9);
        assert_eq!(snapshot.mean(), 4.5);
        assert_eq!(snapshot.time_interval(MS), 30);
    }

    #[test]
    fn empty_aggregated_snapshot_is_all_zero() {
        let trimmer = AggregatingTrimmer::new(0, MS, 10, MS).unwrap();
        let _source =
            SlidingWindowTimeReservoir::with_trimmer(10, MS, 0, MS, trimmer.clone()).unwrap();
        let aggregated =
            AggregatedSlidingWindowTimeReservoir::new(1, TimeUnit::Minutes, 0, MS, &trimmer)
                .unwrap();

        let snapshot = aggregated.snapshot(5, MS);
        assert_eq!(snapshot.size(), 0);
        assert_eq!(snapshot.min(), 0);
        assert_eq!(snapshot.max(), 0);
        assert_eq!(snapshot.mean(), 0.0);
    }

    #[test]
    fn dropped_listeners_are_skipped() {
        let trimmer = AggregatingTrimmer::new(0, MS, 10, MS).unwrap();
        let source =
            SlidingWindowTimeReservoir::with_trimmer(10, MS, 0, MS, trimmer.clone()).unwrap();
        let aggregated =
            AggregatedSlidingWindowTimeReservoir::new(1, TimeUnit::Minutes, 0, MS, &trimmer)
                .unwrap();
        drop(aggregated);

        source.update(1, 1, MS);
        assert_eq!(source.size(50, MS), 0);
    }
}

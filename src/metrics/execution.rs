use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use log::debug;
use serde::Serialize;

use super::percentiles::PercentileSet;
use super::window_stats::TimeWindowStatistics;
use crate::config::{StatisticsConfig, WindowSpec};
use crate::reservoir::error::Result;
use crate::reservoir::{
    AggregatedSlidingWindowTimeReservoir, AggregatingTrimmer, SlidingWindowTimeReservoir,
    TimeReservoir, TimeSource, TimeUnit,
};

const NO_EXECUTION: i64 = i64::MIN;

/// Execution statistics of one thing being measured (all requests, or one
/// endpoint) over several trailing windows.
///
/// The shortest window keeps raw durations; its [`AggregatingTrimmer`] folds
/// everything it evicts into chunks feeding one aggregated reservoir per
/// longer window.
pub struct ExecutionStatistics {
    clock: Arc<dyn TimeSource>,
    shortest: WindowSpec,
    raw: Arc<SlidingWindowTimeReservoir>,
    aggregated: Vec<(WindowSpec, Arc<AggregatedSlidingWindowTimeReservoir>)>,
    last_start_nanos: AtomicI64,
}

/// Serializable result of [`ExecutionStatistics::build`].
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSnapshot {
    /// Start of the most recent execution, milliseconds since monitoring began
    pub last_start_time_ms: Option<i64>,
    /// One entry per configured window, shortest first
    pub windows: Vec<TimeWindowStatistics>,
    /// Exact percentiles of the shortest window
    pub percentiles: PercentileSet,
}

impl ExecutionStatistics {
    pub fn new(config: &StatisticsConfig, clock: Arc<dyn TimeSource>) -> Result<Self> {
        let windows = config.sorted_windows();
        let start = clock.now_nanos();
        let ns = TimeUnit::Nanoseconds;

        // validated configs always name a window
        let shortest = windows
            .first()
            .copied()
            .unwrap_or(WindowSpec::new(1, TimeUnit::Seconds));
        let longer = windows.get(1..).unwrap_or(&[]);

        let trimmer = AggregatingTrimmer::new(start, ns, config.chunk.length, config.chunk.unit)?;
        let raw = SlidingWindowTimeReservoir::with_trimmer(
            shortest.length,
            shortest.unit,
            start,
            ns,
            trimmer.clone(),
        )?;
        let aggregated = longer
            .iter()
            .map(|&window| {
                AggregatedSlidingWindowTimeReservoir::new(window.length, window.unit, start, ns, &trimmer)
                    .map(|reservoir| (window, reservoir))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Created execution statistics with {} window(s)",
            aggregated.len() + 1
        );
        Ok(Self {
            clock,
            shortest,
            raw,
            aggregated,
            last_start_nanos: AtomicI64::new(NO_EXECUTION),
        })
    }

    /// Records an execution that started at `start_nanos` (clock time) and
    /// took `duration_us`.
    pub fn add_execution(&self, start_nanos: i64, duration_us: u64) {
        self.last_start_nanos.fetch_max(start_nanos, Ordering::Relaxed);
        self.raw.update(duration_us, start_nanos, TimeUnit::Nanoseconds);
    }

    pub fn build(&self) -> ExecutionSnapshot {
        let now = self.clock.now_nanos();
        let ns = TimeUnit::Nanoseconds;

        let values = self.raw.values_snapshot(now, ns);
        let mut windows = Vec::with_capacity(self.aggregated.len() + 1);
        windows.push(TimeWindowStatistics::from_snapshot(
            self.shortest.millis(),
            &values,
        ));
        for (window, reservoir) in &self.aggregated {
            let snapshot = reservoir.aggregated_snapshot(now, ns);
            windows.push(TimeWindowStatistics::from_snapshot(window.millis(), &snapshot));
        }

        let last_start = self.last_start_nanos.load(Ordering::Relaxed);
        ExecutionSnapshot {
            last_start_time_ms: (last_start != NO_EXECUTION)
                .then(|| TimeUnit::Milliseconds.convert(last_start, ns)),
            windows,
            percentiles: PercentileSet::from_snapshot(&values),
        }
    }
}

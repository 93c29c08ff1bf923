use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use hdrhistogram::Histogram;
use log::{info, warn};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use super::execution::{ExecutionSnapshot, ExecutionStatistics};
use super::percentiles::PercentileSet;
use super::responses::ResponseStatistics;
use super::{MetricsError, Sample};
use crate::config::StatisticsConfig;
use crate::reservoir::{TimeSource, TimeUnit};

// ─── Configuration ───────────────────────────────────────────────

/// HdrHistogram range: 1 μs → 60 s, 3 significant figures
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 60_000_000;
const HIST_SIGFIG: u8 = 3;

const NANOS_PER_MICRO: i64 = 1_000;

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe metrics engine.
/// The timing middleware and load workers call `record()`, the export
/// endpoints call `snapshot()`.
pub struct MetricsCollector {
    config: StatisticsConfig,
    clock: Arc<dyn TimeSource>,
    windows: RwLock<Windows>,
    feed: Mutex<Feed>,
}

/// A single entry in the live request feed.
#[derive(Debug, Clone, Serialize)]
pub struct SampleRecord {
    /// Milliseconds since monitoring (re)started
    pub timestamp_ms: i64,
    pub endpoint: String,
    pub duration_us: u64,
    pub status: u16,
}

/// Complete snapshot shipped on every request to the export endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub uptime_secs: f64,

    // Windowed statistics
    pub requests: ExecutionSnapshot,
    pub endpoints: BTreeMap<String, ExecutionSnapshot>,

    // Lifetime
    pub responses: ResponseStatistics,
    pub lifetime: PercentileSet,
    pub total_requests: u64,
    pub total_errors: u64,

    pub recent_samples: Vec<SampleRecord>,
}

// ─── Internal state ──────────────────────────────────────────────

/// Sliding-window statistics; replaced as a whole on reset.
struct Windows {
    started_at: i64,
    requests: ExecutionStatistics,
    endpoints: DashMap<String, Arc<ExecutionStatistics>>,
}

/// Lifetime counters and the live feed.
struct Feed {
    lifetime: Histogram<u64>,
    total_requests: u64,
    responses: ResponseStatistics,
    recent_samples: VecDeque<SampleRecord>,
}

// ─── MetricsCollector impl ───────────────────────────────────────

impl MetricsCollector {
    pub fn new(config: StatisticsConfig, clock: Arc<dyn TimeSource>) -> Result<Self, MetricsError> {
        let windows = Windows::new(&config, &clock)?;
        let feed = Feed::new(config.recent_samples)?;
        Ok(Self {
            config,
            clock,
            windows: RwLock::new(windows),
            feed: Mutex::new(feed),
        })
    }

    /// Record a single request observation. The request is taken to have
    /// started `duration_us` before now.
    pub fn record(&self, sample: Sample) {
        let now = self.clock.now_nanos();
        let duration_nanos = i64::try_from(sample.duration_us)
            .unwrap_or(i64::MAX)
            .saturating_mul(NANOS_PER_MICRO);
        let start = now.saturating_sub(duration_nanos);

        let started_at = {
            let windows = self.windows.read();
            windows.requests.add_execution(start, sample.duration_us);
            if let Some(endpoint) = self.endpoint(&windows, &sample.endpoint) {
                endpoint.add_execution(start, sample.duration_us);
            }
            windows.started_at
        };

        let timestamp_ms = TimeUnit::Milliseconds.convert(now - started_at, TimeUnit::Nanoseconds);
        self.feed
            .lock()
            .record(sample, timestamp_ms, self.config.recent_samples);
    }

    /// Wipe all data, called when a new load run starts.
    pub fn reset(&self) -> Result<(), MetricsError> {
        let windows = Windows::new(&self.config, &self.clock)?;
        let feed = Feed::new(self.config.recent_samples)?;
        *self.windows.write() = windows;
        *self.feed.lock() = feed;
        info!("Metrics reset");
        Ok(())
    }

    /// Produce a read-only snapshot for the export endpoints.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let now = self.clock.now_nanos();
        let (started_at, requests, endpoints) = {
            let windows = self.windows.read();
            let endpoints = windows
                .endpoints
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().build()))
                .collect();
            (windows.started_at, windows.requests.build(), endpoints)
        };
        let feed = self.feed.lock();

        MetricsSnapshot {
            generated_at: Utc::now(),
            uptime_secs: (now - started_at).max(0) as f64 / 1e9,
            requests,
            endpoints,
            responses: feed.responses.clone(),
            lifetime: PercentileSet::from_histogram(&feed.lifetime),
            total_requests: feed.total_requests,
            total_errors: feed.responses.server_errors(),
            recent_samples: feed.recent_samples.iter().cloned().collect(),
        }
    }

    /// Statistics of one endpoint, created on first use.
    fn endpoint(&self, windows: &Windows, name: &str) -> Option<Arc<ExecutionStatistics>> {
        if let Some(existing) = windows.endpoints.get(name) {
            return Some(Arc::clone(existing.value()));
        }
        match ExecutionStatistics::new(&self.config, Arc::clone(&self.clock)) {
            Ok(stats) => Some(Arc::clone(
                windows
                    .endpoints
                    .entry(name.to_string())
                    .or_insert_with(|| Arc::new(stats))
                    .value(),
            )),
            Err(e) => {
                warn!("Cannot track endpoint {}: {}", name, e);
                None
            }
        }
    }
}

// ─── Internal impls ──────────────────────────────────────────────

impl Windows {
    fn new(config: &StatisticsConfig, clock: &Arc<dyn TimeSource>) -> Result<Self, MetricsError> {
        Ok(Self {
            started_at: clock.now_nanos(),
            requests: ExecutionStatistics::new(config, Arc::clone(clock))?,
            endpoints: DashMap::new(),
        })
    }
}

impl Feed {
    fn new(capacity: usize) -> Result<Self, MetricsError> {
        Ok(Self {
            lifetime: Histogram::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)?,
            total_requests: 0,
            responses: ResponseStatistics::default(),
            recent_samples: VecDeque::with_capacity(capacity + 1),
        })
    }

    fn record(&mut self, sample: Sample, timestamp_ms: i64, capacity: usize) {
        self.total_requests += 1;
        self.responses.add_response_code(sample.status);
        // clamp into the histogram range
        let _ = self
            .lifetime
            .record(sample.duration_us.clamp(HIST_LOW, HIST_HIGH));

        self.recent_samples.push_back(SampleRecord {
            timestamp_ms,
            endpoint: sample.endpoint,
            duration_us: sample.duration_us,
            status: sample.status,
        });
        while self.recent_samples.len() > capacity {
            self.recent_samples.pop_front();
        }
    }
}

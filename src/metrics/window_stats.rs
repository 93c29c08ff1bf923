use serde::Serialize;

use crate::reservoir::{TimeUnit, UniformTimeSnapshot};

/// Request statistics over one trailing time window (last second, last
/// fifteen minutes, ...). Durations are in microseconds and absent when no
/// request finished within the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeWindowStatistics {
    pub time_window_ms: i64,
    pub requests_per_second: f64,
    pub minimum_duration_us: Option<u64>,
    pub maximum_duration_us: Option<u64>,
    pub average_duration_us: Option<u64>,
    pub request_count: u64,
}

impl TimeWindowStatistics {
    pub fn from_snapshot(time_window_ms: i64, snapshot: &dyn UniformTimeSnapshot) -> Self {
        if snapshot.size() == 0 {
            return Self::empty(time_window_ms);
        }
        Self {
            time_window_ms,
            requests_per_second: snapshot.rate(TimeUnit::Seconds),
            minimum_duration_us: Some(snapshot.min()),
            maximum_duration_us: Some(snapshot.max()),
            average_duration_us: Some(snapshot.mean() as u64),
            request_count: snapshot.size(),
        }
    }

    pub fn empty(time_window_ms: i64) -> Self {
        Self {
            time_window_ms,
            requests_per_second: 0.0,
            minimum_duration_us: None,
            maximum_duration_us: None,
            average_duration_us: None,
            request_count: 0,
        }
    }
}

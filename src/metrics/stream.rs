//! Export endpoints: one-off JSON snapshots and a Server-Sent Events feed.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::{Stream, StreamExt};

use super::collector::{MetricsCollector, MetricsSnapshot};
use crate::AppState;

const SNAPSHOT_EVENT: &str = "metrics";
const KEEP_ALIVE: Duration = Duration::from_secs(15);

/// `GET /api/metrics`
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// `GET /api/metrics/stream`: a `metrics` event carrying a full snapshot
/// every `stream_interval`. A slow client skips ticks instead of receiving
/// a burst of stale snapshots.
pub async fn metrics_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let mut ticker = tokio::time::interval(state.stream_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let metrics = Arc::clone(&state.metrics);
    let events = IntervalStream::new(ticker).map(move |_| snapshot_event(&metrics));

    Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE).text("keep-alive"))
}

fn snapshot_event(metrics: &MetricsCollector) -> Result<Event, axum::Error> {
    Event::default()
        .event(SNAPSHOT_EVENT)
        .json_data(metrics.snapshot())
}

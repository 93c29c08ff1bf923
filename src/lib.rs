use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

pub mod config;
pub mod handlers;
pub mod load_generator;
pub mod metrics;
pub mod middleware;
pub mod reservoir;
pub mod server;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Central metrics engine: middleware and load workers push samples,
    /// the export endpoints read snapshots.
    pub metrics: Arc<metrics::MetricsCollector>,

    /// Flag checked by every load-generator worker on each iteration.
    pub load_running: Arc<AtomicBool>,

    /// Handle to the spawned load-generator task so we can await clean shutdown.
    pub load_handle: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,

    /// Pause between two Server-Sent Events snapshots.
    pub stream_interval: Duration,
}

impl AppState {
    pub fn new(metrics: Arc<metrics::MetricsCollector>, stream_interval: Duration) -> Self {
        Self {
            metrics,
            load_running: Arc::new(AtomicBool::new(false)),
            load_handle: tokio::sync::Mutex::new(None),
            stream_interval,
        }
    }
}

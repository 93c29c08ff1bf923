use axum::{extract::State, Json};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use uuid::Uuid;

use crate::load_generator::LoadPlan;
use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LoadConfig {
    /// Number of concurrent Tokio tasks generating samples
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// How long the run lasts (seconds)
    #[serde(default = "default_duration")]
    pub duration_secs: u64,

    /// Synthetic latency range (μs), both ends inclusive
    #[serde(default = "default_min_latency")]
    pub min_latency_us: u64,
    #[serde(default = "default_max_latency")]
    pub max_latency_us: u64,

    /// Percentage of samples recorded as server errors (0–100)
    #[serde(default = "default_error_pct")]
    pub error_pct: u8,
}

fn default_concurrency() -> u32 {
    10
}
fn default_duration() -> u64 {
    30
}
fn default_min_latency() -> u64 {
    200
}
fn default_max_latency() -> u64 {
    5_000
}
fn default_error_pct() -> u8 {
    1
}

impl LoadConfig {
    fn validate(&self) -> Result<(), AppError> {
        if self.concurrency == 0 || self.concurrency > 500 {
            return Err(AppError::BadRequest(
                "concurrency must be between 1 and 500".into(),
            ));
        }
        if self.duration_secs == 0 || self.duration_secs > 300 {
            return Err(AppError::BadRequest(
                "duration_secs must be between 1 and 300".into(),
            ));
        }
        if self.min_latency_us == 0 || self.min_latency_us > self.max_latency_us {
            return Err(AppError::BadRequest(
                "latency range must satisfy 0 < min_latency_us <= max_latency_us".into(),
            ));
        }
        if self.max_latency_us > 1_000_000 {
            return Err(AppError::BadRequest(
                "max_latency_us must be at most 1000000".into(),
            ));
        }
        if self.error_pct > 100 {
            return Err(AppError::BadRequest(
                "error_pct must be between 0 and 100".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoadStatus {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    pub message: String,
}

// ─── POST /api/load/start ────────────────────────────────────────

pub async fn start_load(
    State(state): State<Arc<AppState>>,
    Json(config): Json<LoadConfig>,
) -> Result<Json<LoadStatus>, AppError> {
    // Guard: only one run at a time. Claiming the flag BEFORE spawning also
    // lets the workers see it immediately
    if state
        .load_running
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(AppError::AlreadyRunning);
    }
    if let Err(e) = prepare_run(&state, &config) {
        state.load_running.store(false, Ordering::SeqCst);
        return Err(e);
    }

    let run_id = Uuid::new_v4();
    let message = format!(
        "Started: {} workers × {}s, {}–{}μs, {}% errors",
        config.concurrency,
        config.duration_secs,
        config.min_latency_us,
        config.max_latency_us,
        config.error_pct,
    );
    info!("Load run {}: {}", run_id, message);

    let plan = LoadPlan {
        concurrency: config.concurrency,
        duration_secs: config.duration_secs,
        min_latency_us: config.min_latency_us,
        max_latency_us: config.max_latency_us,
        error_pct: config.error_pct,
    };
    let running = state.load_running.clone();
    let metrics = state.metrics.clone();

    let handle = tokio::spawn(async move {
        crate::load_generator::run(running, metrics, plan).await;
    });

    // Stash the handle so `stop` can await clean shutdown
    let mut guard = state.load_handle.lock().await;
    *guard = Some(handle);

    Ok(Json(LoadStatus {
        running: true,
        run_id: Some(run_id),
        message,
    }))
}

/// Validates the run and resets metrics for a clean run.
fn prepare_run(state: &AppState, config: &LoadConfig) -> Result<(), AppError> {
    config.validate()?;
    state.metrics.reset()?;
    Ok(())
}

// ─── POST /api/load/stop ─────────────────────────────────────────

pub async fn stop_load(State(state): State<Arc<AppState>>) -> Json<LoadStatus> {
    if !state.load_running.load(Ordering::SeqCst) {
        return Json(LoadStatus {
            running: false,
            run_id: None,
            message: "No load run in progress".into(),
        });
    }

    // Signal all workers to stop
    state.load_running.store(false, Ordering::SeqCst);

    // Await the load-generator task so we know it's fully stopped
    let mut guard = state.load_handle.lock().await;
    if let Some(handle) = guard.take() {
        // the task may have already finished
        let _ = handle.await;
    }
    info!("Load run stopped");

    Json(LoadStatus {
        running: false,
        run_id: None,
        message: "Load run stopped".into(),
    })
}

// ─── GET /api/load/status ────────────────────────────────────────

pub async fn load_status(State(state): State<Arc<AppState>>) -> Json<LoadStatus> {
    let running = state.load_running.load(Ordering::SeqCst);
    Json(LoadStatus {
        running,
        run_id: None,
        message: if running {
            "Load run in progress".into()
        } else {
            "Idle".into()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LoadConfig {
        serde_json::from_str("{}").unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        let config = config();
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.max_latency_us, 5_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_ranges() {
        let mut inverted = config();
        inverted.min_latency_us = 10_000;
        assert!(matches!(inverted.validate(), Err(AppError::BadRequest(_))));

        let mut idle = config();
        idle.concurrency = 0;
        assert!(matches!(idle.validate(), Err(AppError::BadRequest(_))));

        let mut errors = config();
        errors.error_pct = 101;
        assert!(matches!(errors.validate(), Err(AppError::BadRequest(_))));
    }
}

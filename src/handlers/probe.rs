use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::AppError;

/// Longest delay a probe may ask for
pub const MAX_DELAY_MS: u64 = 5_000;

#[derive(Debug, Default, Deserialize)]
pub struct ProbeParams {
    /// Status code to answer with, 200 when absent
    pub status: Option<u16>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub delay_ms: u64,
    pub slept_us: u64,
}

// ─── GET /api/probe/:delay_ms ────────────────────────────────────

/// Sleeps for the requested delay, giving the timing middleware an
/// observable latency to record.
pub async fn probe(
    Path(delay_ms): Path<u64>,
    Query(params): Query<ProbeParams>,
) -> Result<(StatusCode, Json<ProbeResponse>), AppError> {
    if delay_ms > MAX_DELAY_MS {
        return Err(AppError::BadRequest(format!(
            "delay_ms must be at most {MAX_DELAY_MS}"
        )));
    }
    let status = match params.status {
        None => StatusCode::OK,
        Some(code) => StatusCode::from_u16(code)
            .map_err(|_| AppError::BadRequest(format!("invalid status code {code}")))?,
    };

    let start = Instant::now();
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    let slept_us = start.elapsed().as_micros() as u64;

    Ok((status, Json(ProbeResponse { delay_ms, slept_us })))
}

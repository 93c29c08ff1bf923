use axum::{
    extract::{MatchedPath, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use log::debug;
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::Sample;
use crate::AppState;

/// Middleware that measures every request and adds two response headers:
///
///   X-Response-Time-Us  — total handler wall time in microseconds
///   Server-Timing       — same value in the standard Server-Timing format
///
/// API requests (the SSE stream excepted) are recorded as samples, keyed by
/// their matched route so `/api/probe/5` and `/api/probe/7` share statistics.
/// Requests matching no route share the [`UNMATCHED_ENDPOINT`] key.
pub async fn timing_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let endpoint = endpoint_key(&method, req.extensions().get::<MatchedPath>());

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    let us = elapsed.as_micros() as u64;

    // ── Inject response headers ─────────────────────────────────
    if let Ok(val) = us.to_string().parse() {
        response.headers_mut().insert("X-Response-Time-Us", val);
    }

    let server_timing = format!("total;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = server_timing.parse() {
        response.headers_mut().insert("Server-Timing", val);
    }

    // ── Record ──────────────────────────────────────────────────
    let status = response.status().as_u16();
    if is_recorded(&path) {
        debug!("{status}  {method:<5} {path:<35} {us:>7}μs");
        state.metrics.record(Sample {
            endpoint,
            duration_us: us,
            status,
        });
    }

    response
}

/// Endpoint key of requests without a route (404s, unknown methods), so
/// arbitrary paths cannot grow the per-endpoint statistics.
pub const UNMATCHED_ENDPOINT: &str = "<unmatched>";

fn endpoint_key(method: &Method, matched: Option<&MatchedPath>) -> String {
    let standard = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::HEAD,
        Method::OPTIONS,
    ]
    .contains(method);
    match matched {
        Some(route) if standard => format!("{method} {}", route.as_str()),
        _ => UNMATCHED_ENDPOINT.to_owned(),
    }
}

/// Skip non-API and SSE requests.
fn is_recorded(path: &str) -> bool {
    path.starts_with("/api/") && !path.ends_with("/stream")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_api_requests_are_recorded() {
        assert!(is_recorded("/api/probe/10"));
        assert!(is_recorded("/api/metrics"));
        assert!(!is_recorded("/api/metrics/stream"));
        assert!(!is_recorded("/favicon.ico"));
    }

    #[test]
    fn requests_without_a_route_share_one_key() {
        assert_eq!(endpoint_key(&Method::GET, None), UNMATCHED_ENDPOINT);
        assert_eq!(endpoint_key(&Method::POST, None), UNMATCHED_ENDPOINT);
        let custom = Method::from_bytes(b"BREW").unwrap();
        assert_eq!(endpoint_key(&custom, None), UNMATCHED_ENDPOINT);
    }
}

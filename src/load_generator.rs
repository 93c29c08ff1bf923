use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::metrics::{MetricsCollector, Sample};

/// Endpoints the synthetic samples are attributed to, with their weight.
const ENDPOINTS: &[(&str, u32)] = &[
    ("GET /synthetic/read", 6),
    ("POST /synthetic/write", 3),
    ("DELETE /synthetic/purge", 1),
];

/// Parameters of one synthetic load run.
#[derive(Debug, Clone, Copy)]
pub struct LoadPlan {
    pub concurrency: u32,
    pub duration_secs: u64,
    pub min_latency_us: u64,
    pub max_latency_us: u64,
    pub error_pct: u8,
}

// ─── Public entry point ──────────────────────────────────────────

/// Spawns `concurrency` Tokio tasks that record synthetic samples until the
/// deadline or the `running` flag is set to false.
pub async fn run(running: Arc<AtomicBool>, metrics: Arc<MetricsCollector>, plan: LoadPlan) {
    let deadline = Instant::now() + Duration::from_secs(plan.duration_secs);

    let mut handles = Vec::with_capacity(plan.concurrency as usize);

    for worker_id in 0..plan.concurrency {
        let running = running.clone();
        let metrics = metrics.clone();

        handles.push(tokio::spawn(async move {
            worker(worker_id, running, metrics, deadline, plan).await
        }));
    }

    // Wait for all workers to finish
    let mut recorded = 0u64;
    for h in handles {
        recorded += h.await.unwrap_or_default();
    }

    // Mark the run as finished
    running.store(false, Ordering::SeqCst);
    debug!("Load run finished after {} samples", recorded);
}

// ─── Worker loop ─────────────────────────────────────────────────

async fn worker(
    id: u32,
    running: Arc<AtomicBool>,
    metrics: Arc<MetricsCollector>,
    deadline: Instant,
    plan: LoadPlan,
) -> u64 {
    // Each worker gets its own deterministic RNG seeded uniquely.
    let mut rng = StdRng::seed_from_u64(1000 + id as u64);
    let mut recorded = 0;

    while running.load(Ordering::Relaxed) && Instant::now() < deadline {
        let latency_us = rng.gen_range(plan.min_latency_us..=plan.max_latency_us);
        let failed = rng.gen_range(0u8..100) < plan.error_pct;

        tokio::time::sleep(Duration::from_micros(latency_us)).await;

        metrics.record(Sample {
            endpoint: pick_endpoint(&mut rng).into(),
            duration_us: latency_us,
            status: if failed { 500 } else { 200 },
        });
        recorded += 1;
    }

    recorded
}

fn pick_endpoint(rng: &mut StdRng) -> &'static str {
    let total: u32 = ENDPOINTS.iter().map(|(_, weight)| weight).sum();
    let mut roll = rng.gen_range(0..total);
    for &(endpoint, weight) in ENDPOINTS {
        if roll < weight {
            return endpoint;
        }
        roll -= weight;
    }
    ENDPOINTS[0].0
}

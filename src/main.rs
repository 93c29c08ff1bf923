use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{error, info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

use latency_reservoir::config::MonitorConfig;
use latency_reservoir::metrics::MetricsCollector;
use latency_reservoir::reservoir::MonotonicClock;
use latency_reservoir::{server, AppState};

const CONSOLE_APPENDER: &str = "stdout";
const LOG_FORMAT_CONSOLE: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l:>5.5})} [{T:>15.15}] {t:<40.40} : {m}{n}";

/// Request-latency monitor built on sliding time-window reservoirs.
#[derive(Debug, Parser)]
#[command(name = "latency-reservoir", version, about)]
struct Cli {
    /// Address to listen on, overrides `server.bind` of the config file
    #[arg(short, long)]
    bind: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root log level (off, error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logger(cli.log_level)?;

    if let Err(e) = serve(cli).await {
        error!("Monitor stopped: {}", e);
        return Err(e);
    }
    Ok(())
}

fn init_logger(level: LevelFilter) -> Result<(), Box<dyn Error>> {
    let config = Config::builder()
        .appender(Appender::builder().build(
            CONSOLE_APPENDER,
            Box::new(
                ConsoleAppender::builder()
                    .encoder(Box::new(PatternEncoder::new(LOG_FORMAT_CONSOLE)))
                    .build(),
            ),
        ))
        .build(Root::builder().appender(CONSOLE_APPENDER).build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

async fn serve(cli: Cli) -> Result<(), Box<dyn Error>> {
    // ── 1. Configuration ─────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            MonitorConfig::load(path)?
        }
        None => MonitorConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    config.validate()?;

    // ── 2. Build shared state ────────────────────────────────────
    let metrics = MetricsCollector::new(config.statistics.clone(), Arc::new(MonotonicClock::new()))?;
    let state = Arc::new(AppState::new(
        Arc::new(metrics),
        Duration::from_millis(config.server.stream_interval_ms),
    ));
    let windows: Vec<String> = config
        .statistics
        .sorted_windows()
        .iter()
        .map(|w| format!("{}ms", w.millis()))
        .collect();
    info!("Tracking windows [{}]", windows.join(", "));

    // ── 3. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state);

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Server listening on http://{}", listener.local_addr()?);
    info!("Metrics JSON    → /api/metrics");
    info!("Metrics SSE     → /api/metrics/stream");

    axum::serve(listener, app).await?;
    Ok(())
}

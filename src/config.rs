use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::reservoir::TimeUnit;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ─── Configuration tree ──────────────────────────────────────────

/// Everything the service reads from its optional TOML file. Missing keys
/// fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub server: ServerConfig,
    pub statistics: StatisticsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind: String,
    /// Milliseconds between two Server-Sent Events snapshots
    pub stream_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Trailing windows statistics are reported for. The shortest one keeps
    /// raw values, the longer ones aggregated chunks.
    pub windows: Vec<WindowSpec>,
    /// Length of one aggregated chunk
    pub chunk: WindowSpec,
    /// How many individual requests the live feed keeps
    pub recent_samples: usize,
}

/// A length of time, e.g. `{ length = 15, unit = "seconds" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WindowSpec {
    pub length: i64,
    pub unit: TimeUnit,
}

impl WindowSpec {
    pub const fn new(length: i64, unit: TimeUnit) -> Self {
        Self { length, unit }
    }

    pub fn nanos(&self) -> i64 {
        self.unit.to_nanos(self.length)
    }

    pub fn millis(&self) -> i64 {
        TimeUnit::Milliseconds.convert(self.length, self.unit)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".into(),
            stream_interval_ms: 500,
        }
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            windows: vec![
                WindowSpec::new(1, TimeUnit::Seconds),
                WindowSpec::new(15, TimeUnit::Seconds),
                WindowSpec::new(1, TimeUnit::Minutes),
                WindowSpec::new(15, TimeUnit::Minutes),
                WindowSpec::new(1, TimeUnit::Hours),
            ],
            chunk: WindowSpec::new(100, TimeUnit::Milliseconds),
            recent_samples: 200,
        }
    }
}

// ─── Loading ─────────────────────────────────────────────────────

impl MonitorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.stream_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "server.stream_interval_ms must be positive".into(),
            ));
        }
        self.statistics.validate()
    }
}

impl StatisticsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.windows.is_empty() {
            return Err(ConfigError::Invalid(
                "statistics.windows must name at least one window".into(),
            ));
        }
        if let Some(window) = self.windows.iter().find(|w| w.length <= 0) {
            return Err(ConfigError::Invalid(format!(
                "window length must be positive, got {} {:?}",
                window.length, window.unit
            )));
        }
        if self.chunk.length <= 0 {
            return Err(ConfigError::Invalid(
                "statistics.chunk length must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Windows sorted from shortest to longest, duplicates removed.
    pub fn sorted_windows(&self) -> Vec<WindowSpec> {
        let mut windows = self.windows.clone();
        windows.sort_by_key(WindowSpec::nanos);
        windows.dedup_by_key(|w| w.nanos());
        windows
    }
}

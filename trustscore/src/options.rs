//! Runtime configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::pipeline::ExecutionMode;
use crate::registry::RetentionPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use trustscore_shared::{TrustscoreError, TrustscoreResult};

/// Environment variable that overrides [`TrustscoreOptions::environment`].
pub const ENVIRONMENT_VAR: &str = "TRUSTSCORE_ENV";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustscoreOptions {
    /// Deployment label reported by the monitoring view.
    pub environment: String,
    pub health: HealthOptions,
    pub pipeline: PipelineOptions,
    pub retention: RetentionOptions,
    pub logging: LoggingOptions,
    /// Endpoints probed by the CLI's TCP checks.
    pub dependencies: Vec<DependencyEndpoint>,
}

impl Default for TrustscoreOptions {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            health: HealthOptions::default(),
            pipeline: PipelineOptions::default(),
            retention: RetentionOptions::default(),
            logging: LoggingOptions::default(),
            dependencies: Vec::new(),
        }
    }
}

impl TrustscoreOptions {
    /// Load options from a JSON file, apply the environment override, and
    /// validate.
    pub fn from_file(path: impl AsRef<Path>) -> TrustscoreResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TrustscoreError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut options: Self = serde_json::from_str(&raw).map_err(|e| {
            TrustscoreError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        options.apply_env();
        options.sanitize()?;
        Ok(options)
    }

    /// Override `environment` from `TRUSTSCORE_ENV` when it is set and non-empty.
    pub fn apply_env(&mut self) {
        if let Ok(environment) = std::env::var(ENVIRONMENT_VAR)
            && !environment.trim().is_empty()
        {
            self.environment = environment.trim().to_string();
        }
    }

    /// Reject values the runtime cannot work with.
    pub fn sanitize(&self) -> TrustscoreResult<()> {
        if self.health.probe_interval_secs == 0 {
            return Err(TrustscoreError::Config(
                "health.probe_interval_secs must be greater than 0".into(),
            ));
        }
        if self.health.probe_timeout_ms == 0 {
            return Err(TrustscoreError::Config(
                "health.probe_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.pipeline.fetch_timeout_ms == 0 || self.pipeline.explain_timeout_ms == 0 {
            return Err(TrustscoreError::Config(
                "pipeline timeouts must be greater than 0".into(),
            ));
        }
        if self.retention.max_records == 0 {
            return Err(TrustscoreError::Config(
                "retention.max_records must be greater than 0".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for endpoint in &self.dependencies {
            if endpoint.name.trim().is_empty() {
                return Err(TrustscoreError::Config("dependency name is empty".into()));
            }
            if !seen.insert(endpoint.name.as_str()) {
                return Err(TrustscoreError::Config(format!(
                    "dependency {} listed twice",
                    endpoint.name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthOptions {
    pub probe_interval_secs: u64,
    pub probe_timeout_ms: u64,
}

impl Default for HealthOptions {
    fn default() -> Self {
        Self {
            probe_interval_secs: 30,
            probe_timeout_ms: 5_000,
        }
    }
}

impl HealthOptions {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// How the three fetch steps run relative to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    #[default]
    Sequential,
    Parallel,
}

impl From<FetchMode> for ExecutionMode {
    fn from(mode: FetchMode) -> Self {
        match mode {
            FetchMode::Sequential => ExecutionMode::Sequential,
            FetchMode::Parallel => ExecutionMode::Parallel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub fetch_mode: FetchMode,
    pub fetch_timeout_ms: u64,
    pub explain_timeout_ms: u64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            fetch_mode: FetchMode::Sequential,
            fetch_timeout_ms: 10_000,
            explain_timeout_ms: 15_000,
        }
    }
}

impl PipelineOptions {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn explain_timeout(&self) -> Duration {
        Duration::from_millis(self.explain_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionOptions {
    pub max_records: usize,
    /// `None` keeps terminal records until capacity eviction.
    pub ttl_secs: Option<u64>,
}

impl Default for RetentionOptions {
    fn default() -> Self {
        Self {
            max_records: 1000,
            ttl_secs: Some(3600),
        }
    }
}

impl From<&RetentionOptions> for RetentionPolicy {
    fn from(options: &RetentionOptions) -> Self {
        RetentionPolicy {
            max_records: options.max_records,
            ttl: options.ttl_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default `EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: String,
    /// Directory for daily-rolling log files. Logs go to stderr only when unset.
    pub log_dir: Option<std::path::PathBuf>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            filter: "trustscore=info".to_string(),
            log_dir: None,
        }
    }
}

/// A dependency reachable over TCP at `address` (`host:port`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEndpoint {
    pub name: String,
    /// `None` registers the dependency as inactive.
    #[serde(default)]
    pub address: Option<String>,
}

//! Configuration schema.

use brickyard_protocols::{ApiVersion, PlatformCapability};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub trace: TraceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub platform: PlatformConfig,
}

/// Interpreter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Used for pipelines that do not declare an api version.
    #[serde(default)]
    pub default_api_version: ApiVersion,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Log brick outputs that violate their output schema.
    #[serde(default)]
    pub validate_output: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_api_version: ApiVersion::default(),
            max_depth: default_max_depth(),
            validate_output: false,
        }
    }
}

fn default_max_depth() -> usize {
    64
}

/// Cross-context dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-target timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl DispatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Where trace records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Stage tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: TraceBackend,

    /// SQLite database file.
    #[serde(default = "default_trace_path")]
    pub path: PathBuf,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: TraceBackend::default(),
            path: default_trace_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Base directory for Brickyard data.
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".brickyard")
}

fn default_trace_path() -> PathBuf {
    data_dir().join("traces.db")
}

/// Log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,

    /// Directory for daily rotated log files. Console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Brick sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Directories of YAML or JSON brick definitions.
    #[serde(default)]
    pub brick_dirs: Vec<PathBuf>,
}

/// The host the command line pretends to be.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_platform_name")]
    pub name: String,

    /// Available capabilities; every capability when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<PlatformCapability>>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            name: default_platform_name(),
            capabilities: None,
        }
    }
}

fn default_platform_name() -> String {
    "cli".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.runtime.default_api_version, ApiVersion::V1);
        assert_eq!(config.runtime.max_depth, 64);
        assert_eq!(config.dispatch.timeout(), Duration::from_secs(30));
        assert!(config.trace.enabled);
        assert_eq!(config.trace.backend, TraceBackend::Memory);
        assert!(config.trace.path.ends_with("traces.db"));
        assert_eq!(config.logging.level, "info");
        assert!(config.platform.capabilities.is_none());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = Config::default();
        config.trace.backend = TraceBackend::Sqlite;
        config.platform.capabilities = Some(vec![PlatformCapability::Http]);
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("backend = \"sqlite\""));
        assert!(text.contains("capabilities = [\"http\"]"));
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.trace.backend, TraceBackend::Sqlite);
    }
}

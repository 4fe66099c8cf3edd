//! Configuration validation.

use std::collections::BTreeSet;

use crate::schema::{Config, TraceBackend};

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];
const MAX_SENSIBLE_DEPTH: usize = 1024;
const MAX_SENSIBLE_TIMEOUT_MS: u64 = 300_000;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();
        Self::validate_runtime(config, &mut result);
        Self::validate_dispatch(config, &mut result);
        Self::validate_trace(config, &mut result);
        Self::validate_logging(config, &mut result);
        Self::validate_registry(config, &mut result);
        Self::validate_platform(config, &mut result);
        result
    }

    fn validate_runtime(config: &Config, result: &mut ValidationResult) {
        if config.runtime.max_depth == 0 {
            result.add_error(ValidationError::new(
                "runtime.max_depth",
                "max_depth must be greater than 0",
            ));
        } else if config.runtime.max_depth > MAX_SENSIBLE_DEPTH {
            result.add_warning(ValidationWarning::new(
                "runtime.max_depth",
                format!(
                    "max_depth is very high (>{MAX_SENSIBLE_DEPTH}), runaway recursion may exhaust memory"
                ),
            ));
        }
    }

    fn validate_dispatch(config: &Config, result: &mut ValidationResult) {
        if config.dispatch.timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "dispatch.timeout_ms",
                "timeout_ms must be greater than 0",
            ));
        } else if config.dispatch.timeout_ms > MAX_SENSIBLE_TIMEOUT_MS {
            result.add_warning(ValidationWarning::new(
                "dispatch.timeout_ms",
                "timeout_ms is over five minutes, unresponsive frames will stall runs",
            ));
        }
    }

    fn validate_trace(config: &Config, result: &mut ValidationResult) {
        if !config.trace.enabled || config.trace.backend != TraceBackend::Sqlite {
            return;
        }
        if config.trace.path.as_os_str().is_empty() {
            result.add_error(ValidationError::new(
                "trace.path",
                "SQLite trace backend needs a path",
            ));
        } else if let Some(dir) = config
            .trace
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty() && !dir.exists())
        {
            result.add_warning(ValidationWarning::new(
                "trace.path",
                format!("Trace directory {} does not exist and will be created", dir.display()),
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let level = config.logging.level.trim();
        if level.is_empty() {
            result.add_error(ValidationError::new(
                "logging.level",
                "Log level cannot be empty",
            ));
        } else if !level.contains('=') && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            result.add_warning(ValidationWarning::new(
                "logging.level",
                format!("Unknown log level '{level}', valid values: {LOG_LEVELS:?}"),
            ));
        }
    }

    fn validate_registry(config: &Config, result: &mut ValidationResult) {
        let mut seen = BTreeSet::new();
        for dir in &config.registry.brick_dirs {
            if !seen.insert(dir) {
                result.add_warning(ValidationWarning::new(
                    "registry.brick_dirs",
                    format!("Brick directory listed twice: {dir:?}"),
                ));
            }
            if !dir.is_dir() {
                result.add_warning(ValidationWarning::new(
                    "registry.brick_dirs",
                    format!("Brick directory does not exist: {dir:?}"),
                ));
            }
        }
    }

    fn validate_platform(config: &Config, result: &mut ValidationResult) {
        if config.platform.name.is_empty() {
            result.add_error(ValidationError::new(
                "platform.name",
                "Platform name cannot be empty",
            ));
        }
        if config
            .platform
            .capabilities
            .as_ref()
            .is_some_and(Vec::is_empty)
        {
            result.add_warning(ValidationWarning::new(
                "platform.capabilities",
                "No capabilities listed, bricks that require any capability will fail",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

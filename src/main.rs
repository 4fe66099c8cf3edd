//! Brickyard - brick pipeline runtime
//!
//! Command line entry point: run mod components, list bricks and validate
//! mod documents.

mod cli;
mod cmd_inspect;
mod cmd_run;
mod register;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use brickyard_config::{ConfigLoader, ConfigValidator, LoggingConfig};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConfigLoader::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    let _guard = init_tracing(&config.logging)?;

    let validation = ConfigValidator::validate(&config);
    for warning in &validation.warnings {
        warn!(path = %warning.path, "Config warning: {}", warning.message);
    }
    if !validation.is_valid() {
        for e in &validation.errors {
            error!(path = %e.path, "Config error: {}", e.message);
        }
        anyhow::bail!("Invalid configuration");
    }

    match cli.command {
        Commands::Run {
            mod_path,
            component,
            input,
            trace,
            brick_dirs,
        } => {
            cmd_run::cmd_run(&config, &mod_path, component.as_deref(), &input, trace, &brick_dirs)
                .await
        }
        Commands::Bricks { brick_dirs, format } => {
            cmd_inspect::cmd_bricks(&config, &brick_dirs, format).await
        }
        Commands::Validate {
            mod_path,
            brick_dirs,
        } => cmd_inspect::cmd_validate(&config, &mod_path, &brick_dirs).await,
    }
}

/// Initialize tracing with a stderr console layer and, when a log directory
/// is configured, a daily rotated file layer.
///
/// `RUST_LOG` overrides the configured level. The returned guard flushes the
/// file writer on drop.
fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_layer, guard) = match &config.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("brickyard")
                .filename_suffix("log")
                .max_log_files(30)
                .build(dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // stdout carries command output
    let console_json = config
        .json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));
    let console_text = (!config.json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_json)
        .with(console_text)
        .with(file_layer)
        .init();

    Ok(guard)
}

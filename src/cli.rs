//! CLI definitions for Brickyard.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Brickyard CLI.
#[derive(Parser, Debug)]
#[command(name = "brickyard")]
#[command(about = "Run declarative brick pipelines")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (defaults to ~/.brickyard/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Run a component of a mod document
    Run {
        /// Mod document (YAML or JSON)
        #[arg(value_name = "MOD")]
        mod_path: PathBuf,

        /// Component label or zero-based index
        #[arg(long)]
        component: Option<String>,

        /// Pipeline input as a JSON object
        #[arg(long, default_value = "{}")]
        input: String,

        /// Print the stage trace after the run
        #[arg(long)]
        trace: bool,

        /// Extra brick definition directories
        #[arg(long = "brick-dir")]
        brick_dirs: Vec<PathBuf>,
    },

    /// List registered bricks with their inferred types
    Bricks {
        /// Extra brick definition directories
        #[arg(long = "brick-dir")]
        brick_dirs: Vec<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Resolve a mod document and report what its pipelines need
    Validate {
        /// Mod document (YAML or JSON)
        #[arg(value_name = "MOD")]
        mod_path: PathBuf,

        /// Extra brick definition directories
        #[arg(long = "brick-dir")]
        brick_dirs: Vec<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

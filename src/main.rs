//! # databricks-convert CLI
//!
//! Converts Databricks source exports (`.py`, `.scala`) and Jupyter
//! notebooks (`.ipynb`) into Databricks notebook JSON, packaged as a `.dbc`
//! archive or left as a directory of `.<language>` files.
//!
//! ## Usage
//!
//! ```bash
//! databricks-convert [--config <file>] convert <input_path> <output_path> \
//!     [--output-type dbc|directory] [--strict]
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `info`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use databricks_convert::config::{self, Config, OutputType};
use databricks_convert::convert;

/// Convert notebooks into Databricks archives.
#[derive(Parser)]
#[command(
    name = "databricks-convert",
    about = "Convert source and Jupyter notebooks into Databricks .dbc archives",
    version
)]
struct Cli {
    /// Path to an optional configuration file (TOML).
    ///
    /// Values from the `[convert]` section are used as defaults; command
    /// line flags take precedence.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a notebook file or a directory of notebooks.
    ///
    /// Directories are mirrored recursively. Files with unsupported
    /// extensions or malformed contents are skipped and reported.
    Convert {
        /// Input file or directory.
        input_path: PathBuf,

        /// Output directory. Receives `<input stem>.dbc`, or the converted
        /// tree with `--output-type directory`.
        output_path: PathBuf,

        /// Output type: `dbc` (archive) or `directory` (converted files).
        #[arg(long, value_enum)]
        output_type: Option<OutputType>,

        /// Fail on the first file that cannot be converted instead of
        /// skipping it.
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Convert {
            input_path,
            output_path,
            output_type,
            strict,
        } => {
            let mut convert_cfg = cfg.convert.clone();
            if let Some(output_type) = output_type {
                convert_cfg.output_type = output_type;
            }
            if strict {
                convert_cfg.strict = true;
            }

            let report = convert::run_convert(&convert_cfg, &input_path, &output_path)?;
            report.print_summary();
        }
    }

    Ok(())
}

//! Command-line driver for subbasin delineation and dataset inspection.

mod commands;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ensim_common::Diagnostics;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::{load_config, Overrides, SubbasinConfig};

#[derive(Parser, Debug)]
#[command(name = "basin-tool")]
#[command(about = "Subbasin delineation and inspection of EnSim r2c/tb0 datasets")]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", env = "BASIN_TOOL_LOG_LEVEL", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Delineate subbasins at gauges and aggregate land cover over them
    Subbasins {
        /// YAML run configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory relative paths are resolved against
        #[arg(long)]
        workdir: Option<PathBuf>,

        #[arg(long)]
        drainage_database: Option<PathBuf>,

        #[arg(long)]
        lss_database: Option<PathBuf>,

        /// Streamflow table locating the gauges
        #[arg(long)]
        streamflow: Option<PathBuf>,

        /// Drainage database copy with subbasin attributes added
        #[arg(long)]
        diagnostic_output: Option<PathBuf>,

        /// Also write the report as YAML
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print a summary of a grid (.r2c) or table (.tb0) dataset
    Inspect {
        file: PathBuf,
    },
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.json)?;

    let mut diagnostics = Diagnostics::new();
    match args.command {
        Command::Subbasins {
            config,
            workdir,
            drainage_database,
            lss_database,
            streamflow,
            diagnostic_output,
            report,
        } => {
            let base = match &config {
                Some(path) => load_config(path)?,
                None => SubbasinConfig::default(),
            };
            let settings = base.apply(Overrides {
                workdir,
                drainage_database,
                lss_database,
                streamflow,
                diagnostic_output,
            });
            info!(?settings, "Starting subbasin run");

            let paths = settings.resolve()?;
            let result = commands::subbasins(&paths, &mut diagnostics)?;
            print!("{}", commands::render_report(&result));

            if let Some(path) = report {
                let yaml = serde_yaml::to_string(&result).context("Failed to serialize report")?;
                std::fs::write(&path, yaml)
                    .with_context(|| format!("Failed to write report to {:?}", path))?;
                info!(path = %path.display(), "Wrote report");
            }
        }
        Command::Inspect { file } => {
            print!("{}", commands::inspect(&file, &mut diagnostics)?);
        }
    }

    diagnostics.report();
    Ok(())
}

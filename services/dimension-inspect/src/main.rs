//! Dimension inspector
//!
//! Prints the domain, histogram or default value of a layer dimension read
//! from a YAML layer file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use dimension_inspect::{load_layer_file, Inspector};
use wms_common::{BoundingBox, DefaultValueStrategy};

/// Dimension inspector
#[derive(Parser, Debug)]
#[command(name = "dimension-inspect")]
#[command(about = "Inspect dimension domains, histograms and default values of configured layers")]
struct Args {
    /// Layer file (YAML)
    #[arg(short, long, env = "DIMENSION_INSPECT_CONFIG")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the enabled dimensions
    List {
        /// Restrict to one layer
        #[arg(long)]
        layer: Option<String>,
    },

    /// Print the domain of a dimension
    Domain {
        #[arg(long)]
        layer: String,

        #[arg(long)]
        dimension: String,

        /// Spatial restriction as minx,miny,maxx,maxy
        #[arg(long, value_parser = parse_bbox)]
        bbox: Option<BoundingBox>,

        /// Keep repeated values
        #[arg(long)]
        duplicates: bool,
    },

    /// Count domain values into buckets
    Histogram {
        #[arg(long)]
        layer: String,

        #[arg(long)]
        dimension: String,

        /// Bucket width: a number, or an ISO-8601 duration for time
        #[arg(long)]
        resolution: String,

        #[arg(long, value_parser = parse_bbox)]
        bbox: Option<BoundingBox>,
    },

    /// Resolve the default value
    Default {
        #[arg(long)]
        layer: String,

        #[arg(long)]
        dimension: String,

        /// Override the configured strategy
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,

        /// Reference value for nearest and fixed
        #[arg(long)]
        reference: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Strategy {
    Minimum,
    Maximum,
    Nearest,
    Fixed,
}

impl From<Strategy> for DefaultValueStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Minimum => DefaultValueStrategy::Minimum,
            Strategy::Maximum => DefaultValueStrategy::Maximum,
            Strategy::Nearest => DefaultValueStrategy::Nearest,
            Strategy::Fixed => DefaultValueStrategy::Fixed,
        }
    }
}

fn parse_bbox(raw: &str) -> Result<BoundingBox, String> {
    BoundingBox::from_wms_string(raw).map_err(|e| e.to_string())
}

fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);
    if args.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    if let Err(e) = run(args) {
        let message = format!("{:#}", e);
        error!(error = %message, "Inspection failed");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    info!(config = %args.config.display(), "Loading layer file");
    let layers = load_layer_file(&args.config)?;
    let inspector = Inspector::new(layers)?;

    match args.command {
        Command::List { layer } => print(&inspector.list(layer.as_deref())?),
        Command::Domain {
            layer,
            dimension,
            bbox,
            duplicates,
        } => print(&inspector.domain(&layer, &dimension, bbox, duplicates)?),
        Command::Histogram {
            layer,
            dimension,
            resolution,
            bbox,
        } => print(&inspector.histogram(&layer, &dimension, &resolution, bbox)?),
        Command::Default {
            layer,
            dimension,
            strategy,
            reference,
        } => print(&inspector.default_value(
            &layer,
            &dimension,
            strategy.map(Into::into),
            reference,
        )?),
    }
}

fn print<T: Serialize>(report: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}

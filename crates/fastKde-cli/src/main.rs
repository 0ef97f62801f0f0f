//! fastKde CLI - adaptive density risk surfaces from CSV point files
//!
//! Provides subcommands for:
//! - `annotate`: Build the surface for an event file and classify query points
//! - `surface`: Build and persist the surface only
//!
//! Events are read from a CSV with `x` and `y` columns; queries from a CSV
//! with `x`, `y` and an optional `id` column. Coordinates must already be in
//! the configured CRS.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use fastKde::prelude::*;

mod records;

#[derive(Parser, Debug)]
#[command(name = "fastkde")]
#[command(version)]
#[command(about = "Adaptive KDE risk surfaces with GeoTIFF output", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the density surface and annotate query points
    Annotate(AnnotateArgs),
    /// Build and persist the density surface only
    Surface(SurfaceArgs),
}

#[derive(Args, Debug)]
struct SurfaceArgs {
    /// Dataset name; lower-cased with spaces replaced by `_` for the prefix
    #[arg(short, long)]
    dataset: String,

    /// Event CSV with `x` and `y` columns
    #[arg(short, long)]
    events: PathBuf,

    /// TOML configuration file (flags below override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid points per axis (default: 1320)
    #[arg(long)]
    resolution: Option<usize>,

    /// Lattice points per evaluation chunk (default: 50000)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Global bandwidth in whitened units (default: 0.1)
    #[arg(long)]
    bandwidth: Option<f64>,

    /// Adaptive sensitivity in [0, 1] (default: 0.999)
    #[arg(long)]
    sensitivity: Option<f64>,

    /// Whiten with the full covariance instead of its diagonal
    #[arg(long)]
    full_covariance: bool,

    /// Worker threads (default: all cores)
    #[arg(long)]
    workers: Option<usize>,

    /// Evaluate on the calling thread only
    #[arg(long)]
    sequential: bool,

    /// Raster output directory (default: {tmp}/fastkde)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Coordinate reference system (default: EPSG:2272)
    #[arg(long)]
    crs: Option<String>,
}

#[derive(Args, Debug)]
struct AnnotateArgs {
    #[command(flatten)]
    surface: SurfaceArgs,

    /// Query CSV with `x`, `y` and optional `id` columns
    #[arg(short, long)]
    queries: PathBuf,

    /// Output CSV path
    #[arg(short, long)]
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Annotate(args) => run_annotate(args),
        Commands::Surface(args) => run_surface(args),
    }
}

/// Merge the config file (or defaults) with command-line overrides.
fn load_config(args: &SurfaceArgs) -> Result<DensityConfig> {
    let mut config = match &args.config {
        Some(path) => DensityConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DensityConfig::default(),
    };

    if let Some(resolution) = args.resolution {
        config.resolution = resolution;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(bandwidth) = args.bandwidth {
        config.bandwidth = bandwidth;
    }
    if let Some(sensitivity) = args.sensitivity {
        config.sensitivity = sensitivity;
    }
    if args.full_covariance {
        config.fast_covariance = false;
    }
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    if args.sequential {
        config.parallel = false;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(crs) = &args.crs {
        config.crs = crs.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn build_pipeline(args: &SurfaceArgs) -> Result<RiskSurfacePipeline<f64>> {
    let config = load_config(args)?;
    RiskSurface::<f64>::from_config(&config)
        .build()
        .context("Failed to build density pipeline")
}

fn run_surface(args: SurfaceArgs) -> Result<()> {
    let pipeline = build_pipeline(&args)?;
    let events = records::read_events(&args.events)?;

    let artifact = pipeline
        .build_surface(&args.dataset, &events)
        .with_context(|| format!("Failed to build surface for dataset '{}'", args.dataset))?;

    println!("{}", artifact.raster.path.display());
    Ok(())
}

fn run_annotate(args: AnnotateArgs) -> Result<()> {
    let pipeline = build_pipeline(&args.surface)?;
    let events = records::read_events(&args.surface.events)?;
    let queries = records::read_queries(&args.queries)?;

    let points: Vec<Point<f64>> = queries.iter().map(|q| Point::new(q.x, q.y)).collect();
    let columns = pipeline
        .annotate(&args.surface.dataset, &events, &points)
        .with_context(|| {
            format!(
                "Failed to annotate queries for dataset '{}'",
                args.surface.dataset
            )
        })?;

    records::write_annotations(&args.output, &queries, &columns)?;
    info!(
        rows = columns.len(),
        output = %args.output.display(),
        raster = %columns.raster.path.display(),
        "annotations written"
    );
    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::ServiceArgs;

/// Raster elevation lookup CLI tool
#[derive(Parser)]
#[command(name = "geoelev")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    /// Log tile loading and lookup timing to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query elevation for a single coordinate
    Query {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Process elevation for multiple coordinates from a file
    Batch {
        /// Input file (CSV or GeoJSON)
        input: PathBuf,

        /// Output file (same format as input if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for latitude (CSV only)
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude (CSV only)
        #[arg(long, default_value = "lon")]
        lon_col: String,
    },

    /// Display information about a raster file
    Info {
        /// Path to a .hgt or GeoTIFF file
        path: PathBuf,

        /// Tile identifier (defaults to the file name without extension)
        #[arg(long)]
        id: Option<String>,
    },

    /// List loaded tiles and their coverage
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "geoelev=debug,geoelev_cli=debug".into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Query { lat, lon, json } => commands::query::run(&cli.service, lat, lon, json),
        Commands::Batch {
            input,
            output,
            lat_col,
            lon_col,
        } => commands::batch::run(&cli.service, input, output, lat_col, lon_col),
        Commands::Info { path, id } => commands::info::run(&cli.service, path, id),
        Commands::List => commands::list::run(&cli.service),
    }
}

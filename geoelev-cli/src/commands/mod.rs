pub mod batch;
pub mod info;
pub mod list;
pub mod query;

use anyhow::{bail, Context, Result};
use clap::Args;
use geoelev::service::parse_tile_list;
use geoelev::{ElevationService, ElevationServiceBuilder, PixelSnap};
use std::path::PathBuf;
use std::time::Instant;

/// Where tiles come from and how they are sampled.
#[derive(Args)]
pub struct ServiceArgs {
    /// Directory of rasters to load (.hgt, .hgt.zip, .hgt.gz, .tif, .tiff)
    #[arg(short, long, env = "GEOELEV_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Explicit tiles as id=path, in precedence order (separate with ';' in the env var)
    #[arg(
        short,
        long = "tile",
        env = "GEOELEV_TILES",
        value_delimiter = ';',
        global = true
    )]
    pub tiles: Vec<String>,

    /// Pixel snapping for north-up WGS84 tiles
    #[arg(long, env = "GEOELEV_DIRECT_SNAP", default_value = "round", global = true)]
    pub direct_snap: PixelSnap,

    /// Pixel snapping for rotated or reprojected tiles
    #[arg(
        long,
        env = "GEOELEV_REPROJECTED_SNAP",
        default_value = "truncate",
        global = true
    )]
    pub reprojected_snap: PixelSnap,
}

impl ServiceArgs {
    /// Builder with snapping and explicit tiles applied, but no data directory.
    pub fn builder(&self) -> Result<ElevationServiceBuilder> {
        let mut builder = ElevationServiceBuilder::new()
            .direct_snap(self.direct_snap)
            .reprojected_snap(self.reprojected_snap);
        for (id, path) in parse_tile_list(&self.tiles.join(";"))? {
            builder = builder.tile(&id, path);
        }
        Ok(builder)
    }

    /// Load every configured tile.
    pub fn build(&self) -> Result<ElevationService> {
        if self.data_dir.is_none() && self.tiles.is_empty() {
            bail!("No tiles configured. Use --data-dir/--tile or set GEOELEV_DATA_DIR/GEOELEV_TILES");
        }

        let start = Instant::now();
        let mut builder = self.builder()?;
        if let Some(dir) = &self.data_dir {
            builder = builder.data_dir(dir);
        }
        let service = builder.build().context("Failed to load tiles")?;

        tracing::info!(
            tiles = service.tile_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "tiles ready"
        );
        Ok(service)
    }
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

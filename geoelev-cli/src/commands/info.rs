use super::{format_size, ServiceArgs};
use anyhow::{bail, Context, Result};
use geoelev::hgt::HgtResolution;
use geoelev::service::tile_id;
use geoelev::{RasterFormat, SnapPolicy, Tile, TileOptions};
use std::path::PathBuf;
use std::time::Instant;

pub fn run(args: &ServiceArgs, path: PathBuf, id: Option<String>) -> Result<()> {
    if !path.exists() {
        bail!("Tile not found: {}", path.display());
    }
    let id = id.unwrap_or_else(|| tile_id(&path));

    let options = TileOptions {
        snap: SnapPolicy {
            direct: args.direct_snap,
            reprojected: args.reprojected_snap,
        },
        ..TileOptions::default()
    };

    let start = Instant::now();
    let tile = Tile::open(&id, &path, &options).context("Failed to load tile")?;
    let load_ms = start.elapsed().as_millis();

    let file_size = std::fs::metadata(&path)?.len();
    let (width, height) = tile.dimensions();
    let bounds = tile.bounds();
    let info = tile.info();
    let (pixel_x, pixel_y) = info.pixel_size;

    println!("Tile: {}", id);
    println!("Path: {}", path.display());
    println!();
    match RasterFormat::from_path(&path) {
        Some(RasterFormat::Hgt) => {
            let resolution = match HgtResolution::from_size(width * height * 2) {
                Some(HgtResolution::Srtm1) => "SRTM1 (~30m)",
                Some(HgtResolution::Srtm3) => "SRTM3 (~90m)",
                None => "unknown",
            };
            println!("Format: HGT, {}", resolution);
        }
        Some(RasterFormat::GeoTiff) => println!("Format: GeoTIFF"),
        None => {}
    }
    println!("Size: {}x{} samples", width, height);
    println!("CRS: {}", tile.crs());
    println!("Pixel size: {} x {}", pixel_x, pixel_y);
    println!(
        "Lookup: {} ({} snapping)",
        tile.lookup_path(),
        tile.pixel_snap()
    );
    println!(
        "Bounds: lat {:.6} to {:.6}, lon {:.6} to {:.6}",
        bounds.south, bounds.north, bounds.west, bounds.east
    );
    println!("Corners (native CRS):");
    for (name, (x, y)) in ["upper left", "upper right", "lower left", "lower right"]
        .iter()
        .zip(tile.corners())
    {
        println!("  {:<12} {:.6}, {:.6}", name, x, y);
    }
    println!("File size: {}", format_size(file_size));
    println!("Load time: {}ms", load_ms);
    println!();

    let stats = tile.statistics();
    if let (Some(min), Some(max)) = (stats.min, stats.max) {
        println!("Min elevation: {}m", min);
        println!("Max elevation: {}m", max);
        println!("Mean elevation: {:.1}m", stats.mean);
    }
    if stats.nodata_count > 0 {
        let total = (width * height) as f64;
        let pct = stats.nodata_count as f64 / total * 100.0;
        println!("Nodata samples: {} ({:.1}%)", stats.nodata_count, pct);
    }

    Ok(())
}

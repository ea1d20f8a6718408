use super::{format_size, ServiceArgs};
use anyhow::{bail, Result};
use geoelev::LookupPath;

pub fn run(args: &ServiceArgs) -> Result<()> {
    if let Some(dir) = &args.data_dir {
        if !dir.exists() {
            bail!("Data directory does not exist: {}", dir.display());
        }
    }

    let service = args.build()?;
    let tiles = service.tiles();

    if tiles.is_empty() {
        println!("No tiles loaded");
        return Ok(());
    }

    let mut total_size: u64 = 0;
    let (mut direct, mut affine, mut reprojected) = (0, 0, 0);

    println!(
        "{:<20} {:>11} {:>12} {:>44}",
        "TILE", "SIZE", "LOOKUP", "COVERAGE (S, W, N, E)"
    );
    println!("{}", "-".repeat(90));

    for tile in &tiles {
        total_size += tile
            .source
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        match tile.lookup_path {
            LookupPath::Direct => direct += 1,
            LookupPath::Affine => affine += 1,
            LookupPath::Reprojected => reprojected += 1,
        }

        let coverage = format!(
            "{:.3}, {:.3}, {:.3}, {:.3}",
            tile.bounds.south, tile.bounds.west, tile.bounds.north, tile.bounds.east
        );
        println!(
            "{:<20} {:>11} {:>12} {:>44}",
            tile.id,
            format!("{}x{}", tile.width, tile.height),
            tile.lookup_path.to_string(),
            coverage
        );
    }

    // Summary
    println!();
    println!("Summary:");
    println!("  Total tiles: {}", tiles.len());
    if direct > 0 {
        println!("  Direct: {}", direct);
    }
    if affine > 0 {
        println!("  Affine: {}", affine);
    }
    if reprojected > 0 {
        println!("  Reprojected: {}", reprojected);
    }
    if let Some(coverage) = service.coverage() {
        println!(
            "  Coverage: lat {:.3} to {:.3}, lon {:.3} to {:.3}",
            coverage.south, coverage.north, coverage.west, coverage.east
        );
    }
    println!("  Total size: {}", format_size(total_size));
    if let Some(dir) = &args.data_dir {
        println!("  Data directory: {}", dir.display());
    }

    Ok(())
}

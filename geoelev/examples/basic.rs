//! Basic example demonstrating geoelev library usage.
//!
//! Run with: cargo run --example basic -- /path/to/rasters

use geoelev::{ElevationError, ElevationService};
use std::env;

fn main() -> Result<(), ElevationError> {
    // Get data directory from command line
    let data_dir = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example basic -- /path/to/rasters");
        std::process::exit(1);
    });

    let service = ElevationService::new();
    let preload = service.load_directory(&data_dir, None);
    println!(
        "Loaded {} tiles ({} failed) in {}ms",
        preload.tiles_loaded, preload.tiles_failed, preload.elapsed_ms
    );

    for tile in service.tiles() {
        println!(
            "  {}: {}x{} {} [{:.3}, {:.3}] x [{:.3}, {:.3}]",
            tile.id,
            tile.width,
            tile.height,
            tile.lookup_path,
            tile.bounds.south,
            tile.bounds.north,
            tile.bounds.west,
            tile.bounds.east
        );
    }

    let locations = [
        ("Rothrock State Forest, USA", 40.6778, -77.6263),
        ("Rhön, Germany", 50.56323, 10.62979),
        ("Karoo, South Africa", -32.67897, 24.20700),
        ("Hunter Valley, Australia", -32.28488, 150.87893),
        ("Quito, Ecuador", -0.11823, -78.35878),
    ];

    println!("\nElevation queries:");
    println!("{:-<50}", "");

    for (name, lat, lon) in &locations {
        match service.get_elevation(*lat, *lon) {
            Ok(Some(elevation)) => println!("{}: {}m", name, elevation),
            Ok(None) => println!("{}: no data", name),
            Err(ElevationError::NoCoveringTile { .. }) => {
                println!("{}: no tile loaded for this area", name)
            }
            Err(e) => println!("{}: error - {}", name, e),
        }
    }

    let stats = service.stats();
    println!("\nTiles loaded: {}", stats.tile_count);

    Ok(())
}

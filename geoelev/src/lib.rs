//! # geoelev - Raster Elevation Lookup
//!
//! Answers "what is the ground elevation at this latitude/longitude?" from a
//! set of georeferenced elevation rasters (GeoTIFF and SRTM `.hgt`) that
//! together cover the area of interest.
//!
//! ## Features
//!
//! - **Multi-tile**: Tiles are indexed by bounding box; each query is
//!   dispatched to the tile that owns it
//! - **Any north-up or rotated grid**: Affine geotransforms are inverted for
//!   skewed rasters, and rasters in other CRSs are reprojected on the fly
//! - **Total lookup**: [`ElevationService::lookup`] never fails; nodata and
//!   uncovered points read as [`SEA_LEVEL`], while
//!   [`ElevationService::get_elevation`] keeps the two apart
//! - **Offline**: Works with local files, no internet required
//!
//! ## Quick Start
//!
//! ```ignore
//! use geoelev::ElevationService;
//!
//! let service = ElevationService::new();
//! service.load("ne", "/data/SRTM_NE_250m.tif")?;
//! service.load("se", "/data/SRTM_SE_250m.tif")?;
//! service.load("w", "/data/SRTM_W_250m.tif")?;
//!
//! let elevation = service.lookup(50.56323, 10.62979);
//! println!("Elevation: {}m", elevation);
//! ```
//!
//! ## Pixel Lookup
//!
//! Each tile picks one of three paths when it is loaded:
//!
//! - **Direct**: north-up WGS84 grids index straight from the grid scale
//! - **Affine**: rotated or sheared WGS84 grids invert the geotransform
//! - **Reprojected**: grids in other CRSs reproject the query first
//!
//! See [`tile::LookupPath`] and [`tile::SnapPolicy`].

pub mod bounds;
pub mod crs;
pub mod error;
pub mod geotiff;
pub mod hgt;
pub mod raster;
pub mod registry;
pub mod service;
pub mod tile;
pub mod transform;

#[cfg(feature = "geojson")]
pub mod geojson;

/// Elevation reported for nodata cells and unresolved lookups, in meters.
pub const SEA_LEVEL: i16 = 0;

// Re-export main types at crate root for convenience
pub use bounds::BoundingBox;
pub use crs::{Crs, CrsTransform, Proj4Transform};
pub use error::{ElevationError, Result};
pub use raster::{open_raster, MemoryRaster, RasterFormat, RasterSource, NODATA_VALUE};
pub use registry::TileRegistry;
pub use service::{ElevationService, ElevationServiceBuilder, LookupStats, PreloadStats};
pub use tile::{LookupPath, PixelSnap, SnapPolicy, Tile, TileInfo, TileOptions, TileStatistics};
pub use transform::GeoTransform;

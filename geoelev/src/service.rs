//! Elevation lookup service.
//!
//! This module provides [`ElevationService`], the high-level entry point:
//! load tiles by identifier, then resolve coordinates to elevations.
//!
//! ```ignore
//! use geoelev::ElevationService;
//!
//! let service = ElevationService::new();
//! service.load("ne", "/data/SRTM_NE_250m.tif")?;
//! service.load("N35E138", "/data/N35E138.hgt")?;
//!
//! // Never fails: nodata and unresolved queries read as sea level
//! let meters = service.lookup(35.3606, 138.7274);
//!
//! // Distinguishes nodata (Ok(None)) from faults (Err)
//! match service.get_elevation(35.3606, 138.7274) {
//!     Ok(Some(m)) => println!("{}m", m),
//!     Ok(None) => println!("no data"),
//!     Err(e) => println!("unresolved: {}", e),
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use crate::bounds::BoundingBox;
use crate::crs::CrsTransform;
use crate::error::{ElevationError, Result};
use crate::hgt::cell_from_name;
use crate::raster::{RasterFormat, RasterSource};
use crate::registry::TileRegistry;
use crate::tile::{PixelSnap, SnapPolicy, Tile, TileInfo, TileOptions};
use crate::SEA_LEVEL;

/// Counters describing query outcomes.
///
/// Every [`ElevationService::get_elevation`], [`ElevationService::lookup`]
/// and batch coordinate counts once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupStats {
    /// Number of tiles currently loaded.
    pub tile_count: usize,
    /// Total number of queries.
    pub lookups: u64,
    /// Lookups answered with a sample value.
    pub resolved: u64,
    /// Lookups that hit a nodata cell.
    pub nodata: u64,
    /// Lookups that failed (no tile, out of grid, projection error, bad input).
    pub unresolved: u64,
}

impl LookupStats {
    /// Fraction of lookups that could not be resolved (0.0 to 1.0).
    ///
    /// Returns 0.0 if no lookups have been made.
    pub fn unresolved_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.unresolved as f64 / self.lookups as f64
        }
    }
}

/// Statistics from a directory preload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreloadStats {
    /// Number of tiles loaded by this call.
    pub tiles_loaded: u64,
    /// Number of tiles whose identifier was already registered.
    pub tiles_already_loaded: u64,
    /// Number of tiles that failed to load.
    pub tiles_failed: u64,
    /// Number of files that matched the bounding box filter.
    pub tiles_matched: u64,
    /// Total elapsed time in milliseconds.
    pub elapsed_ms: u64,
}

/// Elevation lookup over a set of loaded tiles.
///
/// Tiles live in a [`TileRegistry`] behind a read-write lock: lookups take
/// the read lock and run concurrently, `load`/`unload` take the write lock
/// only to swap entries. Tiles are fully decoded before they are registered.
///
/// # Example
///
/// ```
/// use geoelev::raster::MemoryRaster;
/// use geoelev::ElevationService;
///
/// let service = ElevationService::new();
/// let mut raster = MemoryRaster::wgs84(1.0, 0.0, 0.0, 1.0, 1, 1, vec![251]).unwrap();
/// service.load_source("tile", &mut raster).unwrap();
///
/// assert_eq!(service.lookup(0.9, 0.1), 251);
/// assert_eq!(service.get_elevation(0.9, 0.1).unwrap(), Some(251));
/// // Outside every tile
/// assert_eq!(service.lookup(45.0, 45.0), 0);
/// assert!(service.get_elevation(45.0, 45.0).is_err());
/// ```
#[derive(Debug)]
pub struct ElevationService {
    registry: RwLock<TileRegistry>,
    options: TileOptions,
    lookups: AtomicU64,
    resolved: AtomicU64,
    nodata: AtomicU64,
    unresolved: AtomicU64,
}

impl Default for ElevationService {
    fn default() -> Self {
        Self::new()
    }
}

impl ElevationService {
    /// Create a service with default [`TileOptions`] and no tiles.
    pub fn new() -> Self {
        Self::with_options(TileOptions::default())
    }

    /// Create a service with custom tile options.
    pub fn with_options(options: TileOptions) -> Self {
        Self {
            registry: RwLock::new(TileRegistry::new()),
            options,
            lookups: AtomicU64::new(0),
            resolved: AtomicU64::new(0),
            nodata: AtomicU64::new(0),
            unresolved: AtomicU64::new(0),
        }
    }

    /// Create a builder for more configuration options.
    pub fn builder() -> ElevationServiceBuilder {
        ElevationServiceBuilder::new()
    }

    fn read(&self) -> RwLockReadGuard<'_, TileRegistry> {
        self.registry.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, TileRegistry> {
        self.registry.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Load a raster file and register it under `id`.
    ///
    /// Loading an identifier again replaces its tile, so repeated loads of
    /// the same file leave lookups unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or decoded, or its
    /// geotransform is degenerate. The registry is left unchanged.
    pub fn load<P: AsRef<Path>>(&self, id: &str, path: P) -> Result<()> {
        let path = path.as_ref();
        let start = Instant::now();
        let tile = Tile::open(id, path, &self.options)?;
        self.register(tile, start);
        Ok(())
    }

    /// Build a tile from an already opened raster and register it under `id`.
    pub fn load_source(&self, id: &str, source: &mut dyn RasterSource) -> Result<()> {
        let start = Instant::now();
        let tile = Tile::from_source(id, source, &self.options)?;
        self.register(tile, start);
        Ok(())
    }

    fn register(&self, tile: Tile, start: Instant) {
        let (width, height) = tile.dimensions();
        let bounds = tile.bounds();
        tracing::info!(
            tile = %tile.id(),
            source = ?tile.source(),
            width,
            height,
            north = bounds.north,
            south = bounds.south,
            west = bounds.west,
            east = bounds.east,
            lookup_path = %tile.lookup_path(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded tile"
        );
        if let Some(old) = self.write().register(tile) {
            tracing::debug!(tile = %old.id(), "replaced previously loaded tile");
        }
    }

    /// Remove a tile. Returns `true` if it was loaded.
    pub fn unload(&self, id: &str) -> bool {
        let removed = self.write().unload(id).is_some();
        if removed {
            tracing::info!(tile = %id, "unloaded tile");
        }
        removed
    }

    /// Get the elevation at a WGS84 coordinate.
    ///
    /// # Arguments
    ///
    /// * `lat` - Latitude in decimal degrees (-90 to 90)
    /// * `lon` - Longitude in decimal degrees (-180 to 180)
    ///
    /// # Returns
    ///
    /// - `Ok(Some(elevation))` - elevation in meters
    /// - `Ok(None)` - the owning tile has no data at this cell
    /// - `Err(...)` - invalid coordinate, no covering tile, out-of-grid pixel
    ///   or reprojection failure
    pub fn get_elevation(&self, lat: f64, lon: f64) -> Result<Option<i16>> {
        let result = sample(&self.read(), lat, lon);
        self.record(lat, lon, &result);
        result
    }

    /// Get the elevation at a WGS84 coordinate in whole meters.
    ///
    /// This never fails: nodata cells and unresolved queries both return
    /// [`SEA_LEVEL`]. Every outcome is counted in [`Self::stats`] and
    /// failures are logged at `debug`, so they remain observable.
    pub fn lookup(&self, lat: f64, lon: f64) -> i32 {
        match self.get_elevation(lat, lon) {
            Ok(Some(v)) => i32::from(v),
            _ => i32::from(SEA_LEVEL),
        }
    }

    /// Get elevations for a batch of coordinates.
    ///
    /// The registry lock is taken once for the whole batch.
    ///
    /// Returns a vector of elevation values, one per input coordinate.
    /// Uses `default` for nodata cells and unresolved coordinates.
    ///
    /// # Arguments
    ///
    /// * `coords` - Slice of (latitude, longitude) pairs
    /// * `default` - Value for nodata/unresolved results
    pub fn get_elevations_batch(&self, coords: &[(f64, f64)], default: i32) -> Vec<i32> {
        let registry = self.read();

        coords
            .iter()
            .map(|&(lat, lon)| {
                let result = sample(&registry, lat, lon);
                self.record(lat, lon, &result);
                match result {
                    Ok(Some(v)) => i32::from(v),
                    _ => default,
                }
            })
            .collect()
    }

    fn record(&self, lat: f64, lon: f64, result: &Result<Option<i16>>) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        match result {
            Ok(Some(_)) => self.resolved.fetch_add(1, Ordering::Relaxed),
            Ok(None) => self.nodata.fetch_add(1, Ordering::Relaxed),
            Err(e) => {
                tracing::debug!(lat, lon, error = %e, "unresolved lookup");
                self.unresolved.fetch_add(1, Ordering::Relaxed)
            }
        };
    }

    /// Load every raster in a directory.
    ///
    /// Files are discovered with [`scan_tile_files`] and registered under
    /// [`tile_id`] of their file name. With `bounds`, only tiles overlapping
    /// at least one box are kept: `.hgt` tiles are filtered by name before
    /// decoding, other rasters after.
    ///
    /// Failures are counted and logged, never propagated.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use geoelev::{BoundingBox, ElevationService};
    ///
    /// let service = ElevationService::new();
    ///
    /// // Preload only CONUS tiles
    /// let conus = BoundingBox::new(24.0, -125.0, 50.0, -66.0);
    /// let stats = service.load_directory("/data/srtm", Some(&[conus]));
    /// println!("Loaded {} tiles in {}ms", stats.tiles_loaded, stats.elapsed_ms);
    /// ```
    pub fn load_directory<P: AsRef<Path>>(
        &self,
        dir: P,
        bounds: Option<&[BoundingBox]>,
    ) -> PreloadStats {
        let dir = dir.as_ref();
        let start = Instant::now();
        let mut stats = PreloadStats::default();
        let overlaps_any =
            |b: &BoundingBox| bounds.map_or(true, |boxes| boxes.iter().any(|x| x.overlaps(b)));

        for path in scan_tile_files(dir) {
            let id = tile_id(&path);

            // Cheap pre-filter for 1° SRTM cells
            if let Some((lat, lon)) = cell_from_name(&id) {
                let cell = BoundingBox::new(lat as f64, lon as f64, (lat + 1) as f64, (lon + 1) as f64);
                if !overlaps_any(&cell) {
                    continue;
                }
            }

            if self.read().get(&id).is_some() {
                stats.tiles_matched += 1;
                stats.tiles_already_loaded += 1;
                continue;
            }

            let tile_start = Instant::now();
            match Tile::open(&id, &path, &self.options) {
                Ok(tile) if overlaps_any(&tile.bounds()) => {
                    stats.tiles_matched += 1;
                    stats.tiles_loaded += 1;
                    self.register(tile, tile_start);
                }
                Ok(_) => {}
                Err(e) => {
                    stats.tiles_matched += 1;
                    stats.tiles_failed += 1;
                    tracing::warn!(path = %path.display(), error = %e, "skipping tile");
                }
            }
        }

        stats.elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            dir = %dir.display(),
            loaded = stats.tiles_loaded,
            already_loaded = stats.tiles_already_loaded,
            failed = stats.tiles_failed,
            elapsed_ms = stats.elapsed_ms,
            "preloaded tiles"
        );
        stats
    }

    /// Metadata for all loaded tiles, highest precedence first.
    pub fn tiles(&self) -> Vec<TileInfo> {
        self.read().tiles().iter().map(|t| t.info()).collect()
    }

    /// Loaded tile by identifier.
    pub fn tile(&self, id: &str) -> Option<Arc<Tile>> {
        self.read().get(id)
    }

    /// The tile a coordinate resolves to.
    pub fn resolve(&self, lat: f64, lon: f64) -> Result<Arc<Tile>> {
        validate_coordinate(lat, lon)?;
        self.read().resolve(lat, lon)
    }

    /// Number of loaded tiles.
    pub fn tile_count(&self) -> usize {
        self.read().len()
    }

    /// Union of all tile bounding boxes.
    pub fn coverage(&self) -> Option<BoundingBox> {
        self.read().coverage()
    }

    /// Options applied to newly loaded tiles.
    pub fn options(&self) -> &TileOptions {
        &self.options
    }

    /// Get lookup statistics.
    pub fn stats(&self) -> LookupStats {
        LookupStats {
            tile_count: self.tile_count(),
            lookups: self.lookups.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            nodata: self.nodata.load(Ordering::Relaxed),
            unresolved: self.unresolved.load(Ordering::Relaxed),
        }
    }
}

fn sample(registry: &TileRegistry, lat: f64, lon: f64) -> Result<Option<i16>> {
    validate_coordinate(lat, lon)?;
    registry.sample(lat, lon)
}

fn validate_coordinate(lat: f64, lon: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(ElevationError::InvalidCoordinate {
            message: format!("lat={} must be in [-90, 90] and lon={} in [-180, 180]", lat, lon),
        });
    }
    Ok(())
}

/// Identifier of a tile file: its name without raster extensions.
///
/// ```
/// use geoelev::service::tile_id;
///
/// assert_eq!(tile_id("/data/N35E138.hgt.zip"), "N35E138");
/// assert_eq!(tile_id("SRTM_NE_250m.tif"), "SRTM_NE_250m");
/// ```
pub fn tile_id<P: AsRef<Path>>(path: P) -> String {
    let name = path
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lower = name.to_ascii_lowercase();
    for ext in [".hgt.zip", ".hgt.gz", ".hgt", ".tiff", ".tif"] {
        if lower.ends_with(ext) {
            return name[..name.len() - ext.len()].to_string();
        }
    }
    name
}

/// Scan a directory for raster files.
///
/// Returns sorted paths of `.hgt`, `.hgt.zip`, `.hgt.gz`, `.tif` and `.tiff`
/// files. When several files map to the same [`tile_id`], one is kept,
/// preferring uncompressed files over `.gz` over `.zip`, then the
/// lexicographically smallest path (so `x.tif` beats `x.tiff`).
pub fn scan_tile_files<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir.as_ref()) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let rank = |path: &Path| {
        let name = path.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".zip") {
            2
        } else if name.ends_with(".gz") {
            1
        } else {
            0
        }
    };

    let mut by_id: HashMap<String, PathBuf> = HashMap::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || RasterFormat::from_path(&path).is_none() {
            continue;
        }
        let id = tile_id(&path);
        match by_id.get(&id) {
            Some(existing) if (rank(existing), existing) <= (rank(&path), &path) => {}
            _ => {
                by_id.insert(id, path);
            }
        }
    }

    let mut result: Vec<PathBuf> = by_id.into_values().collect();
    result.sort();
    result
}

/// Builder for creating [`ElevationService`] with custom configuration.
///
/// # Example
///
/// ```ignore
/// use geoelev::{ElevationServiceBuilder, PixelSnap};
///
/// let service = ElevationServiceBuilder::new()
///     .tile("ne", "/data/SRTM_NE_250m.tif")
///     .data_dir("/data/srtm")
///     .direct_snap(PixelSnap::Truncate)
///     .build()?;
/// ```
#[derive(Default)]
pub struct ElevationServiceBuilder {
    snap: SnapPolicy,
    crs_transform: Option<Arc<dyn CrsTransform>>,
    tiles: Vec<(String, PathBuf)>,
    data_dir: Option<PathBuf>,
    preload_bounds: Option<Vec<BoundingBox>>,
}

impl ElevationServiceBuilder {
    /// Create a builder with default options and no tiles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `GEOELEV_DATA_DIR` | Directory of rasters to preload | None |
    /// | `GEOELEV_TILES` | Explicit tiles, `id=path;id=path` | None |
    /// | `GEOELEV_DIRECT_SNAP` | `round` or `truncate` | `round` |
    /// | `GEOELEV_REPROJECTED_SNAP` | `round` or `truncate` | `truncate` |
    ///
    /// At least one of `GEOELEV_DATA_DIR` and `GEOELEV_TILES` must be set.
    ///
    /// # Example
    ///
    /// ```bash
    /// export GEOELEV_DATA_DIR=/data/srtm
    /// export GEOELEV_TILES="ne=/data/SRTM_NE_250m.tif;se=/data/SRTM_SE_250m.tif"
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::Config`] if no tile source is configured or
    /// a variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let builder = Self::new().with_env()?;
        if !builder.has_tile_source() {
            return Err(ElevationError::Config {
                message: "set GEOELEV_DATA_DIR or GEOELEV_TILES".to_string(),
            });
        }
        Ok(builder)
    }

    /// Apply the `GEOELEV_*` variables read by [`Self::from_env`] on top of
    /// this builder. Unset variables leave it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::Config`] if a variable cannot be parsed.
    pub fn with_env(mut self) -> Result<Self> {
        if let Ok(dir) = std::env::var("GEOELEV_DATA_DIR") {
            self = self.data_dir(dir);
        }
        if let Ok(list) = std::env::var("GEOELEV_TILES") {
            for (id, path) in parse_tile_list(&list)? {
                self = self.tile(&id, path);
            }
        }
        if let Ok(s) = std::env::var("GEOELEV_DIRECT_SNAP") {
            self.snap.direct = s.parse()?;
        }
        if let Ok(s) = std::env::var("GEOELEV_REPROJECTED_SNAP") {
            self.snap.reprojected = s.parse()?;
        }
        Ok(self)
    }

    /// Returns `true` if explicit tiles or a data directory are configured.
    pub fn has_tile_source(&self) -> bool {
        self.data_dir.is_some() || !self.tiles.is_empty()
    }

    /// Set the snapping policy for all lookup paths.
    pub fn snap_policy(mut self, snap: SnapPolicy) -> Self {
        self.snap = snap;
        self
    }

    /// Set the snapping of the direct (grid-scale) path.
    pub fn direct_snap(mut self, snap: PixelSnap) -> Self {
        self.snap.direct = snap;
        self
    }

    /// Set the snapping of the transform-based paths.
    pub fn reprojected_snap(mut self, snap: PixelSnap) -> Self {
        self.snap.reprojected = snap;
        self
    }

    /// Use a custom reprojector for tiles not stored in WGS84.
    pub fn crs_transform(mut self, transform: Arc<dyn CrsTransform>) -> Self {
        self.crs_transform = Some(transform);
        self
    }

    /// Add a tile to load at build time.
    ///
    /// Tiles load in the order they are added, so earlier tiles take
    /// precedence where bounds overlap.
    pub fn tile<P: AsRef<Path>>(mut self, id: &str, path: P) -> Self {
        self.tiles.push((id.to_string(), path.as_ref().to_path_buf()));
        self
    }

    /// Preload every raster in a directory at build time, after explicit tiles.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Restrict the directory preload to tiles overlapping these boxes.
    pub fn preload_bounds(mut self, bounds: Vec<BoundingBox>) -> Self {
        self.preload_bounds = Some(bounds);
        self
    }

    /// Build the [`ElevationService`], loading all configured tiles.
    ///
    /// # Errors
    ///
    /// Returns the first error from loading an explicit tile, or
    /// [`ElevationError::Config`] if the data directory does not exist.
    pub fn build(self) -> Result<ElevationService> {
        let mut options = TileOptions {
            snap: self.snap,
            ..TileOptions::default()
        };
        if let Some(transform) = self.crs_transform {
            options.crs_transform = transform;
        }
        let service = ElevationService::with_options(options);

        for (id, path) in &self.tiles {
            service.load(id, path)?;
        }

        if let Some(dir) = &self.data_dir {
            if !dir.is_dir() {
                return Err(ElevationError::Config {
                    message: format!("data directory {} does not exist", dir.display()),
                });
            }
            service.load_directory(dir, self.preload_bounds.as_deref());
        }

        Ok(service)
    }
}

/// Parse `id=path;id=path` tile lists.
///
/// ```
/// use geoelev::service::parse_tile_list;
///
/// let tiles = parse_tile_list("ne=/data/ne.tif; se=/data/se.tif").unwrap();
/// assert_eq!(tiles[1].0, "se");
/// assert!(parse_tile_list("missing-separator").is_err());
/// ```
pub fn parse_tile_list(list: &str) -> Result<Vec<(String, PathBuf)>> {
    list.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| match item.split_once('=') {
            Some((id, path)) if !id.trim().is_empty() && !path.trim().is_empty() => {
                Ok((id.trim().to_string(), PathBuf::from(path.trim())))
            }
            _ => Err(ElevationError::Config {
                message: format!("invalid tile entry '{}', expected id=path", item),
            }),
        })
        .collect()
}

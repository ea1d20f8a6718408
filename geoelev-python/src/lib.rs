//! Python bindings for the geoelev raster elevation library.

#![allow(clippy::useless_conversion)]

use pyo3::exceptions::{PyIOError, PyLookupError, PyValueError};
use pyo3::prelude::*;

use geoelev::{ElevationError, ElevationServiceBuilder, PixelSnap};

fn to_py_err(e: ElevationError) -> PyErr {
    match e {
        ElevationError::NoCoveringTile { .. } => PyLookupError::new_err(e.to_string()),
        ElevationError::Io(_)
        | ElevationError::RasterOpen { .. }
        | ElevationError::RasterLoad { .. }
        | ElevationError::InvalidFileSize { .. }
        | ElevationError::UnsupportedFormat { .. } => PyIOError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

/// Lookup statistics for the elevation service.
#[pyclass]
#[derive(Clone)]
struct LookupStats {
    /// Number of loaded tiles.
    #[pyo3(get)]
    tile_count: usize,
    /// Total number of queries.
    #[pyo3(get)]
    lookups: u64,
    /// Queries answered with a sample value.
    #[pyo3(get)]
    resolved: u64,
    /// Queries that hit a nodata cell.
    #[pyo3(get)]
    nodata: u64,
    /// Queries that could not be resolved.
    #[pyo3(get)]
    unresolved: u64,
}

#[pymethods]
impl LookupStats {
    /// Fraction of queries that could not be resolved (0.0 to 1.0).
    #[getter]
    fn unresolved_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.unresolved as f64 / self.lookups as f64
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "LookupStats(tile_count={}, lookups={}, resolved={}, nodata={}, unresolved={})",
            self.tile_count, self.lookups, self.resolved, self.nodata, self.unresolved
        )
    }
}

/// Metadata about a loaded tile.
#[pyclass]
#[derive(Clone)]
struct TileInfo {
    #[pyo3(get)]
    id: String,
    /// File the tile was loaded from, if any.
    #[pyo3(get)]
    source: Option<String>,
    #[pyo3(get)]
    width: usize,
    #[pyo3(get)]
    height: usize,
    /// Native CRS, e.g. "EPSG:4326".
    #[pyo3(get)]
    crs: String,
    /// "direct", "affine" or "reprojected".
    #[pyo3(get)]
    lookup_path: String,
    #[pyo3(get)]
    north: f64,
    #[pyo3(get)]
    south: f64,
    #[pyo3(get)]
    west: f64,
    #[pyo3(get)]
    east: f64,
}

#[pymethods]
impl TileInfo {
    fn __repr__(&self) -> String {
        format!(
            "TileInfo(id={:?}, {}x{}, lat {}..{}, lon {}..{}, {})",
            self.id, self.width, self.height, self.south, self.north, self.west, self.east,
            self.lookup_path
        )
    }
}

impl From<geoelev::TileInfo> for TileInfo {
    fn from(info: geoelev::TileInfo) -> Self {
        TileInfo {
            id: info.id,
            source: info.source.map(|p| p.display().to_string()),
            width: info.width,
            height: info.height,
            crs: info.crs.to_string(),
            lookup_path: info.lookup_path.to_string(),
            north: info.bounds.north,
            south: info.bounds.south,
            west: info.bounds.west,
            east: info.bounds.east,
        }
    }
}

/// Elevation lookup over a set of raster tiles.
///
/// This is the main interface for querying elevation data from GeoTIFF and
/// SRTM .hgt files.
///
/// Example:
///     >>> service = ElevationService(tiles=[("ne", "/data/SRTM_NE_250m.tif")])
///     >>> service.load("se", "/data/SRTM_SE_250m.tif")
///     >>> elevation = service.lookup(50.56323, 10.62979)
///     >>> print(f"Elevation: {elevation}m")
#[pyclass]
struct ElevationService {
    inner: geoelev::ElevationService,
}

#[pymethods]
impl ElevationService {
    /// Create a new elevation service.
    ///
    /// Args:
    ///     data_dir: Optional directory of rasters to load.
    ///     tiles: Optional list of (id, path) pairs, in precedence order.
    ///     direct_snap: "round" or "truncate" for north-up WGS84 tiles.
    ///     reprojected_snap: "round" or "truncate" for other tiles.
    ///
    /// Raises:
    ///     IOError: If an explicit tile cannot be loaded.
    ///     ValueError: If a snapping mode is unknown or data_dir is missing.
    #[new]
    #[pyo3(signature = (data_dir=None, tiles=None, direct_snap="round", reprojected_snap="truncate"))]
    fn new(
        data_dir: Option<&str>,
        tiles: Option<Vec<(String, String)>>,
        direct_snap: &str,
        reprojected_snap: &str,
    ) -> PyResult<Self> {
        let direct: PixelSnap = direct_snap.parse().map_err(to_py_err)?;
        let reprojected: PixelSnap = reprojected_snap.parse().map_err(to_py_err)?;

        let mut builder = ElevationServiceBuilder::new()
            .direct_snap(direct)
            .reprojected_snap(reprojected);
        for (id, path) in tiles.unwrap_or_default() {
            builder = builder.tile(&id, path);
        }
        if let Some(dir) = data_dir {
            builder = builder.data_dir(dir);
        }

        Ok(ElevationService {
            inner: builder.build().map_err(to_py_err)?,
        })
    }

    /// Load a raster file under an identifier, replacing any tile with that id.
    ///
    /// Raises:
    ///     IOError: If the file cannot be opened or decoded.
    ///     ValueError: If its georeferencing is unusable.
    fn load(&self, py: Python<'_>, id: &str, path: &str) -> PyResult<()> {
        py.allow_threads(|| self.inner.load(id, path))
            .map_err(to_py_err)
    }

    /// Load every raster in a directory.
    ///
    /// Returns:
    ///     Number of tiles loaded.
    fn load_directory(&self, py: Python<'_>, path: &str) -> u64 {
        py.allow_threads(|| self.inner.load_directory(path, None))
            .tiles_loaded
    }

    /// Remove a tile. Returns True if it was loaded.
    fn unload(&self, id: &str) -> bool {
        self.inner.unload(id)
    }

    /// Get elevation in meters; never raises.
    ///
    /// Nodata cells and uncovered coordinates return 0 (sea level).
    fn lookup(&self, lat: f64, lon: f64) -> i32 {
        self.inner.lookup(lat, lon)
    }

    /// Get elevation, distinguishing nodata from failures.
    ///
    /// Returns:
    ///     Elevation in meters, or None if the cell has no data.
    ///
    /// Raises:
    ///     LookupError: If no loaded tile covers the coordinate.
    ///     ValueError: If the coordinate is invalid or falls outside the tile grid.
    fn get_elevation(&self, lat: f64, lon: f64) -> PyResult<Option<i16>> {
        self.inner.get_elevation(lat, lon).map_err(to_py_err)
    }

    /// Get elevations for a list of (lat, lon) pairs.
    ///
    /// Nodata and unresolved coordinates get `default`.
    #[pyo3(signature = (coords, default=0))]
    fn get_elevations_batch(
        &self,
        py: Python<'_>,
        coords: Vec<(f64, f64)>,
        default: i32,
    ) -> Vec<i32> {
        py.allow_threads(|| self.inner.get_elevations_batch(&coords, default))
    }

    /// Metadata for all loaded tiles, highest precedence first.
    fn tiles(&self) -> Vec<TileInfo> {
        self.inner.tiles().into_iter().map(TileInfo::from).collect()
    }

    /// Current lookup statistics.
    fn stats(&self) -> LookupStats {
        let stats = self.inner.stats();
        LookupStats {
            tile_count: stats.tile_count,
            lookups: stats.lookups,
            resolved: stats.resolved,
            nodata: stats.nodata,
            unresolved: stats.unresolved,
        }
    }

    fn __len__(&self) -> usize {
        self.inner.tile_count()
    }

    fn __repr__(&self) -> String {
        let stats = self.inner.stats();
        format!(
            "ElevationService(tiles={}, lookups={}, unresolved_rate={:.1}%)",
            stats.tile_count,
            stats.lookups,
            stats.unresolved_rate() * 100.0
        )
    }
}

/// Name of the SRTM tile whose 1-degree cell holds a coordinate.
///
/// Example:
///     >>> cell_name(35.5, 138.7)
///     'N35E138'
#[pyfunction]
fn cell_name(lat: f64, lon: f64) -> String {
    geoelev::hgt::cell_name(lat, lon)
}

/// Parse an SRTM tile name.
///
/// Returns:
///     Tuple of (latitude, longitude) for the cell's southwest corner,
///     or None if the name does not encode a cell.
///
/// Example:
///     >>> cell_from_name("N35E138.hgt")
///     (35, 138)
#[pyfunction]
fn cell_from_name(name: &str) -> Option<(i32, i32)> {
    geoelev::hgt::cell_from_name(name)
}

/// geoelev - raster elevation lookup.
///
/// Example:
///     >>> import geoelev_rs
///     >>> service = geoelev_rs.ElevationService(data_dir="/data/dem")
///     >>> service.lookup(40.6778, -77.6263)
#[pymodule]
fn geoelev_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ElevationService>()?;
    m.add_class::<LookupStats>()?;
    m.add_class::<TileInfo>()?;
    m.add_function(wrap_pyfunction!(cell_name, m)?)?;
    m.add_function(wrap_pyfunction!(cell_from_name, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("SEA_LEVEL", geoelev::SEA_LEVEL)?;
    m.add("NODATA_VALUE", geoelev::NODATA_VALUE)?;
    Ok(())
}

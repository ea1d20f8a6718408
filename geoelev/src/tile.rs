//! Loaded elevation tiles and per-tile pixel lookup.
//!
//! A [`Tile`] owns one decoded raster grid together with its [`GeoTransform`]
//! and WGS84 bounding box. It is built once from a [`RasterSource`] and never
//! mutated afterwards, so it can be shared freely as `Arc<Tile>`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::bounds::BoundingBox;
use crate::crs::{Crs, CrsTransform, Proj4Transform};
use crate::error::{ElevationError, Result};
use crate::raster::{open_raster, RasterSource, NODATA_VALUE};
use crate::transform::GeoTransform;
use crate::SEA_LEVEL;

/// How continuous pixel coordinates are turned into grid indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelSnap {
    /// Nearest integer, halves away from zero.
    #[default]
    Round,
    /// Drop the fractional part (toward zero).
    Truncate,
}

impl PixelSnap {
    #[inline]
    fn apply(self, v: f64) -> f64 {
        match self {
            PixelSnap::Round => v.round(),
            PixelSnap::Truncate => v.trunc(),
        }
    }
}

impl FromStr for PixelSnap {
    type Err = ElevationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "round" => Ok(PixelSnap::Round),
            "truncate" | "trunc" => Ok(PixelSnap::Truncate),
            other => Err(ElevationError::Config {
                message: format!("unknown pixel snap '{}' (expected round or truncate)", other),
            }),
        }
    }
}

impl fmt::Display for PixelSnap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelSnap::Round => f.write_str("round"),
            PixelSnap::Truncate => f.write_str("truncate"),
        }
    }
}

/// Snapping used by each lookup path.
///
/// The defaults reproduce the historical behaviour: the grid-scale path
/// rounds, the transform-based paths truncate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapPolicy {
    /// Snap for [`LookupPath::Direct`].
    pub direct: PixelSnap,
    /// Snap for [`LookupPath::Affine`] and [`LookupPath::Reprojected`].
    pub reprojected: PixelSnap,
}

impl Default for SnapPolicy {
    fn default() -> Self {
        Self {
            direct: PixelSnap::Round,
            reprojected: PixelSnap::Truncate,
        }
    }
}

/// Strategy a tile uses to map a query coordinate to a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPath {
    /// North-up WGS84 raster: precomputed grid scales over the bounding box.
    Direct,
    /// WGS84 raster with rotation or skew: inverse geotransform.
    Affine,
    /// Raster in another CRS: reproject, then inverse geotransform.
    Reprojected,
}

impl fmt::Display for LookupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupPath::Direct => f.write_str("direct"),
            LookupPath::Affine => f.write_str("affine"),
            LookupPath::Reprojected => f.write_str("reprojected"),
        }
    }
}

/// Per-path state needed to turn a query into pixel coordinates.
#[derive(Clone)]
enum PixelMapping {
    /// Columns and rows per degree over the bounding box.
    Direct { lon_scale: f64, lat_scale: f64 },
    Affine,
    Reprojected(Arc<dyn CrsTransform>),
}

impl PixelMapping {
    fn path(&self) -> LookupPath {
        match self {
            PixelMapping::Direct { .. } => LookupPath::Direct,
            PixelMapping::Affine => LookupPath::Affine,
            PixelMapping::Reprojected(_) => LookupPath::Reprojected,
        }
    }
}

/// Settings applied while building tiles.
#[derive(Clone)]
pub struct TileOptions {
    /// Pixel snapping per lookup path.
    pub snap: SnapPolicy,
    /// Reprojector for tiles not stored in WGS84.
    pub crs_transform: Arc<dyn CrsTransform>,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            snap: SnapPolicy::default(),
            crs_transform: Arc::new(Proj4Transform::new()),
        }
    }
}

impl fmt::Debug for TileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileOptions")
            .field("snap", &self.snap)
            .finish_non_exhaustive()
    }
}

/// Summary statistics over the valid (non-nodata) samples of a tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileStatistics {
    /// Lowest valid sample.
    pub min: Option<i16>,
    /// Highest valid sample.
    pub max: Option<i16>,
    /// Mean of valid samples (0 when there are none).
    pub mean: f64,
    /// Population standard deviation of valid samples.
    pub std_dev: f64,
    /// Number of valid samples.
    pub valid_count: usize,
    /// Number of nodata samples.
    pub nodata_count: usize,
}

/// Descriptive metadata about a loaded tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileInfo {
    /// Tile identifier.
    pub id: String,
    /// File the tile was loaded from, if any.
    pub source: Option<PathBuf>,
    /// WGS84 bounding box.
    pub bounds: BoundingBox,
    /// Grid width in samples.
    pub width: usize,
    /// Grid height in samples.
    pub height: usize,
    /// Native CRS.
    pub crs: Crs,
    /// Lookup strategy.
    pub lookup_path: LookupPath,
    /// Pixel size in native units `(x, y)`.
    pub pixel_size: (f64, f64),
}

/// One loaded elevation raster.
///
/// # Example
///
/// ```
/// use geoelev::raster::MemoryRaster;
/// use geoelev::tile::{Tile, TileOptions};
///
/// // 2x2 grid over [35, 36] x [138, 139]
/// let mut raster =
///     MemoryRaster::wgs84(36.0, 35.0, 138.0, 139.0, 2, 2, vec![10, 20, 30, -32768]).unwrap();
/// let tile = Tile::from_source("N35E138", &mut raster, &TileOptions::default()).unwrap();
///
/// assert!(tile.contains(35.8, 138.2));
/// assert_eq!(tile.sample(35.8, 138.2).unwrap(), Some(10));
/// // Nodata reads as sea level
/// assert_eq!(tile.lookup(35.4, 138.6), 0);
/// ```
pub struct Tile {
    id: String,
    source: Option<PathBuf>,
    bounds: BoundingBox,
    /// Row-major samples, north row first.
    grid: Vec<i16>,
    width: usize,
    height: usize,
    transform: GeoTransform,
    nodata: i16,
    crs: Crs,
    mapping: PixelMapping,
    snap: PixelSnap,
}

impl Tile {
    /// Open a raster file and build a tile from it.
    ///
    /// # Errors
    ///
    /// Any error from [`open_raster`] or [`Tile::from_source`].
    pub fn open<P: AsRef<Path>>(id: &str, path: P, options: &TileOptions) -> Result<Self> {
        let path = path.as_ref();
        let mut source = open_raster(path)?;
        let mut tile = Self::from_source(id, source.as_mut(), options)?;
        tile.source = Some(path.to_path_buf());
        Ok(tile)
    }

    /// Build a tile from an opened raster.
    ///
    /// Band 1 is decoded eagerly. The lookup path is chosen from the raster's
    /// CRS and geotransform, and the bounding box is derived from the grid
    /// corners (reprojected to WGS84 when needed).
    ///
    /// # Errors
    ///
    /// - [`ElevationError::DegenerateTransform`] for a non-invertible geotransform
    /// - [`ElevationError::RasterLoad`] if the band does not fill the grid
    /// - [`ElevationError::UnsupportedCrs`] / [`ElevationError::Projection`] if
    ///   the bounds cannot be reprojected to WGS84
    pub fn from_source(
        id: &str,
        source: &mut dyn RasterSource,
        options: &TileOptions,
    ) -> Result<Self> {
        let (width, height) = source.grid_dimensions();
        let transform = GeoTransform::new(source.geotransform())?;
        let crs = source.spatial_reference();
        let nodata = source.nodata().unwrap_or(NODATA_VALUE);

        let grid = source.read_band(1)?;
        if width == 0 || height == 0 || grid.len() != width * height {
            return Err(ElevationError::RasterLoad {
                message: format!(
                    "tile {}: band 1 has {} samples, grid is {}x{}",
                    id,
                    grid.len(),
                    width,
                    height
                ),
            });
        }

        let reprojector = (!crs.is_wgs84()).then(|| options.crs_transform.clone());
        let bounds = match &reprojector {
            None => BoundingBox::enclosing(transform.corners(width, height)),
            Some(t) => {
                let mut points = Vec::with_capacity(8);
                for (col, row) in outline(width, height) {
                    let native = transform.to_native(col, row);
                    points.push(t.transform(native, &crs, &Crs::Wgs84)?);
                }
                BoundingBox::enclosing(points)
            }
        }
        .ok_or_else(|| ElevationError::RasterLoad {
            message: format!("tile {}: bounds are not finite", id),
        })?;

        let (mapping, snap) = match reprojector {
            Some(t) => (PixelMapping::Reprojected(t), options.snap.reprojected),
            None if transform.is_north_up() => (
                PixelMapping::Direct {
                    lon_scale: width as f64 / bounds.width(),
                    lat_scale: height as f64 / bounds.height(),
                },
                options.snap.direct,
            ),
            None => (PixelMapping::Affine, options.snap.reprojected),
        };

        Ok(Self {
            id: id.to_string(),
            source: None,
            bounds,
            grid,
            width,
            height,
            transform,
            nodata,
            crs,
            mapping,
            snap,
        })
    }

    /// Check if the coordinate falls inside this tile's bounding box.
    ///
    /// North and west edges are inclusive, south and east edges exclusive.
    #[inline]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.bounds.contains(lat, lon)
    }

    /// Grid indices `(row, col)` for a WGS84 coordinate.
    ///
    /// # Errors
    ///
    /// - [`ElevationError::InvalidCoordinate`] for non-finite input
    /// - [`ElevationError::Projection`] if reprojection fails
    /// - [`ElevationError::OutOfGrid`] if the snapped cell lies outside the grid
    pub fn pixel(&self, lat: f64, lon: f64) -> Result<(usize, usize)> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(ElevationError::InvalidCoordinate {
                message: format!("lat={}, lon={}", lat, lon),
            });
        }

        let (col, row) = match &self.mapping {
            PixelMapping::Direct {
                lon_scale,
                lat_scale,
            } => (
                (lon - self.bounds.west) * lon_scale,
                (self.bounds.north - lat) * lat_scale,
            ),
            PixelMapping::Affine => self.transform.to_pixel(lon, lat),
            PixelMapping::Reprojected(t) => {
                let (x, y) = t.transform((lon, lat), &Crs::Wgs84, &self.crs)?;
                self.transform.to_pixel(x, y)
            }
        };
        let (col, row) = (self.snap.apply(col), self.snap.apply(row));

        if !(col >= 0.0 && row >= 0.0 && col < self.width as f64 && row < self.height as f64) {
            return Err(ElevationError::OutOfGrid {
                row: row as i64,
                col: col as i64,
                width: self.width,
                height: self.height,
            });
        }
        Ok((row as usize, col as usize))
    }

    /// Read the sample at a WGS84 coordinate.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(elevation))` - raw sample in meters
    /// - `Ok(None)` - the cell holds the nodata sentinel
    /// - `Err(...)` - the coordinate could not be mapped to a cell
    pub fn sample(&self, lat: f64, lon: f64) -> Result<Option<i16>> {
        let (row, col) = self.pixel(lat, lon)?;
        let v = self.grid[row * self.width + col];
        Ok(if v == self.nodata { None } else { Some(v) })
    }

    /// Elevation at a WGS84 coordinate, never failing.
    ///
    /// Nodata cells and lookup faults both read as [`SEA_LEVEL`]; use
    /// [`Tile::sample`] to tell them apart.
    pub fn lookup(&self, lat: f64, lon: f64) -> i16 {
        match self.sample(lat, lon) {
            Ok(Some(v)) => v,
            Ok(None) => SEA_LEVEL,
            Err(e) => {
                tracing::debug!(tile = %self.id, lat, lon, error = %e, "lookup fault");
                SEA_LEVEL
            }
        }
    }

    /// Raw sample by grid index, `None` outside the grid.
    pub fn value_at(&self, row: usize, col: usize) -> Option<i16> {
        if row < self.height && col < self.width {
            Some(self.grid[row * self.width + col])
        } else {
            None
        }
    }

    /// Min/max/mean/standard deviation over valid samples.
    pub fn statistics(&self) -> TileStatistics {
        let mut min = i16::MAX;
        let mut max = i16::MIN;
        let mut sum = 0f64;
        let mut sum_sq = 0f64;
        let mut valid = 0usize;

        for &v in self.grid.iter().filter(|&&v| v != self.nodata) {
            min = min.min(v);
            max = max.max(v);
            sum += v as f64;
            sum_sq += (v as f64) * (v as f64);
            valid += 1;
        }

        let (mean, std_dev) = if valid == 0 {
            (0.0, 0.0)
        } else {
            let mean = sum / valid as f64;
            (mean, (sum_sq / valid as f64 - mean * mean).max(0.0).sqrt())
        };

        TileStatistics {
            min: (valid > 0).then_some(min),
            max: (valid > 0).then_some(max),
            mean,
            std_dev,
            valid_count: valid,
            nodata_count: self.grid.len() - valid,
        }
    }

    /// Tile identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// WGS84 bounding box.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Grid size as `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// The tile's geotransform.
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Native CRS of the raster.
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Nodata sentinel.
    pub fn nodata(&self) -> i16 {
        self.nodata
    }

    /// Lookup strategy chosen at construction.
    pub fn lookup_path(&self) -> LookupPath {
        self.mapping.path()
    }

    /// Snapping applied by this tile's lookup path.
    pub fn pixel_snap(&self) -> PixelSnap {
        self.snap
    }

    /// Outer grid corners in native coordinates: top-left, top-right,
    /// bottom-left, bottom-right.
    pub fn corners(&self) -> [(f64, f64); 4] {
        self.transform.corners(self.width, self.height)
    }

    /// File this tile was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Descriptive metadata.
    pub fn info(&self) -> TileInfo {
        TileInfo {
            id: self.id.clone(),
            source: self.source.clone(),
            bounds: self.bounds,
            width: self.width,
            height: self.height,
            crs: self.crs.clone(),
            lookup_path: self.lookup_path(),
            pixel_size: self.transform.pixel_size(),
        }
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile")
            .field("id", &self.id)
            .field("bounds", &self.bounds)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("crs", &self.crs)
            .field("path", &self.lookup_path())
            .field("snap", &self.snap)
            .finish_non_exhaustive()
    }
}

/// Corners and edge midpoints of a grid, in pixel coordinates.
fn outline(width: usize, height: usize) -> [(f64, f64); 8] {
    let (w, h) = (width as f64, height as f64);
    [
        (0.0, 0.0),
        (w / 2.0, 0.0),
        (w, 0.0),
        (w, h / 2.0),
        (w, h),
        (w / 2.0, h),
        (0.0, h),
        (0.0, h / 2.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::EPSG_WEB_MERCATOR;
    use crate::raster::MemoryRaster;

    /// 4x4 tile over [0, 4] x [10, 14], value = row * 10 + col
    fn grid_tile(options: &TileOptions) -> Tile {
        let samples = (0..16).map(|i| (i / 4 * 10 + i % 4) as i16).collect();
        let mut raster = MemoryRaster::wgs84(4.0, 0.0, 10.0, 14.0, 4, 4, samples).unwrap();
        Tile::from_source("grid", &mut raster, options).unwrap()
    }

    #[test]
    fn test_direct_path_bounds_and_scales() {
        let tile = grid_tile(&TileOptions::default());
        assert_eq!(tile.lookup_path(), LookupPath::Direct);
        assert_eq!(tile.bounds(), BoundingBox::new(0.0, 10.0, 4.0, 14.0));
        assert_eq!(tile.dimensions(), (4, 4));
        assert_eq!(tile.pixel_snap(), PixelSnap::Round);
    }

    #[test]
    fn test_direct_round_vs_truncate() {
        let round = grid_tile(&TileOptions::default());
        // (lon - west) * 1 = 1.6 -> 2, (north - lat) * 1 = 0.7 -> 1
        assert_eq!(round.sample(3.3, 11.6).unwrap(), Some(12));

        let truncate = grid_tile(&TileOptions {
            snap: SnapPolicy {
                direct: PixelSnap::Truncate,
                ..SnapPolicy::default()
            },
            ..TileOptions::default()
        });
        assert_eq!(truncate.pixel_snap(), PixelSnap::Truncate);
        assert_eq!(truncate.sample(3.3, 11.6).unwrap(), Some(1));
    }

    #[test]
    fn test_direct_round_past_last_cell_is_out_of_grid() {
        let tile = grid_tile(&TileOptions::default());
        // Inside the bounds, but the last half column rounds to col 4
        assert!(tile.contains(2.0, 13.8));
        assert!(matches!(
            tile.sample(2.0, 13.8),
            Err(ElevationError::OutOfGrid { col: 4, .. })
        ));
        assert_eq!(tile.lookup(2.0, 13.8), SEA_LEVEL);
    }

    #[test]
    fn test_nodata_maps_to_sea_level() {
        let mut raster =
            MemoryRaster::wgs84(1.0, 0.0, 0.0, 1.0, 2, 1, vec![NODATA_VALUE, -12]).unwrap();
        let options = TileOptions {
            snap: SnapPolicy {
                direct: PixelSnap::Truncate,
                reprojected: PixelSnap::Truncate,
            },
            ..TileOptions::default()
        };
        let tile = Tile::from_source("t", &mut raster, &options).unwrap();

        assert_eq!(tile.sample(0.5, 0.2).unwrap(), None);
        assert_eq!(tile.lookup(0.5, 0.2), 0);
        // Below sea level stays negative
        assert_eq!(tile.lookup(0.5, 0.7), -12);
    }

    #[test]
    fn test_custom_nodata_sentinel() {
        let mut raster = MemoryRaster::wgs84(1.0, 0.0, 0.0, 1.0, 1, 1, vec![-9999])
            .unwrap()
            .with_nodata(Some(-9999));
        let tile = Tile::from_source("t", &mut raster, &TileOptions::default()).unwrap();
        assert_eq!(tile.nodata(), -9999);
        assert_eq!(tile.sample(0.8, 0.2).unwrap(), None);
    }

    #[test]
    fn test_affine_path_for_skewed_raster() {
        // Rotated grid: col axis points east, row axis points south-east
        let gt = [10.0, 1.0, 0.5, 4.0, 0.0, -1.0];
        let samples = (0..16).map(|i| i as i16).collect();
        let mut raster = MemoryRaster::new(4, 4, gt, Crs::Wgs84, samples).unwrap();
        let tile = Tile::from_source("skew", &mut raster, &TileOptions::default()).unwrap();

        assert_eq!(tile.lookup_path(), LookupPath::Affine);
        assert_eq!(tile.pixel_snap(), PixelSnap::Truncate);
        // Bounds enclose all four corners
        assert_eq!(tile.bounds(), BoundingBox::new(0.0, 10.0, 4.0, 16.0));

        // Pixel (col 1.5, row 2.5) center
        let (lon, lat) = tile.transform().to_native(1.5, 2.5);
        assert_eq!(tile.pixel(lat, lon).unwrap(), (2, 1));
        assert_eq!(tile.sample(lat, lon).unwrap(), Some(9));
    }

    #[test]
    fn test_reprojected_path() {
        // 100 km Web Mercator tile anchored at the origin
        let gt = [0.0, 1000.0, 0.0, 100_000.0, 0.0, -1000.0];
        let samples = (0..100 * 100).map(|i| (i % 100) as i16).collect();
        let mut raster =
            MemoryRaster::new(100, 100, gt, Crs::Epsg(EPSG_WEB_MERCATOR), samples).unwrap();
        let tile = Tile::from_source("merc", &mut raster, &TileOptions::default()).unwrap();

        assert_eq!(tile.lookup_path(), LookupPath::Reprojected);
        let b = tile.bounds();
        assert!(b.west.abs() < 1e-9 && b.south.abs() < 1e-9);
        // 100 km is just under 0.9 degrees at the equator
        assert!((b.east - 0.898315).abs() < 1e-5, "east = {}", b.east);
        assert!((b.north - 0.898315).abs() < 1e-3, "north = {}", b.north);

        // Web Mercator x = R * lon (radians): x = 50.5 km is column 50
        let lon = (50_500.0 / 6_378_137.0_f64).to_degrees();
        assert_eq!(tile.sample(0.45, lon).unwrap(), Some(50));
    }

    #[test]
    fn test_unsupported_crs_fails_load() {
        let mut raster = MemoryRaster::new(
            2,
            2,
            [0.0, 1.0, 0.0, 2.0, 0.0, -1.0],
            Crs::Epsg(99999),
            vec![0; 4],
        )
        .unwrap();
        assert!(matches!(
            Tile::from_source("bad", &mut raster, &TileOptions::default()),
            Err(ElevationError::UnsupportedCrs { .. })
        ));
    }

    #[test]
    fn test_degenerate_transform_fails_load() {
        let mut raster = MemoryRaster::new(
            2,
            2,
            [0.0, 1.0, 0.0, 2.0, 0.0, 0.0],
            Crs::Wgs84,
            vec![0; 4],
        )
        .unwrap();
        assert!(matches!(
            Tile::from_source("flat", &mut raster, &TileOptions::default()),
            Err(ElevationError::DegenerateTransform { .. })
        ));
    }

    #[test]
    fn test_invalid_coordinate() {
        let tile = grid_tile(&TileOptions::default());
        assert!(matches!(
            tile.sample(f64::NAN, 11.0),
            Err(ElevationError::InvalidCoordinate { .. })
        ));
        assert_eq!(tile.lookup(f64::NAN, 11.0), SEA_LEVEL);
    }

    #[test]
    fn test_statistics() {
        let mut raster =
            MemoryRaster::wgs84(1.0, 0.0, 0.0, 1.0, 2, 2, vec![100, 300, NODATA_VALUE, 200])
                .unwrap();
        let tile = Tile::from_source("s", &mut raster, &TileOptions::default()).unwrap();
        let stats = tile.statistics();

        assert_eq!(stats.min, Some(100));
        assert_eq!(stats.max, Some(300));
        assert_eq!(stats.valid_count, 3);
        assert_eq!(stats.nodata_count, 1);
        assert!((stats.mean - 200.0).abs() < 1e-9);
        assert!((stats.std_dev - (20_000.0f64 / 3.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_value_at_and_info() {
        let tile = grid_tile(&TileOptions::default());
        assert_eq!(tile.value_at(3, 2), Some(32));
        assert_eq!(tile.value_at(4, 0), None);

        let info = tile.info();
        assert_eq!(info.id, "grid");
        assert_eq!(info.source, None);
        assert_eq!(info.lookup_path, LookupPath::Direct);
        assert_eq!(info.pixel_size, (1.0, 1.0));
        assert_eq!(tile.corners()[3], (14.0, 0.0));
    }

    #[test]
    fn test_pixel_snap_parse() {
        assert_eq!("round".parse::<PixelSnap>().unwrap(), PixelSnap::Round);
        assert_eq!(" Truncate ".parse::<PixelSnap>().unwrap(), PixelSnap::Truncate);
        assert!("floor".parse::<PixelSnap>().is_err());
        assert_eq!(PixelSnap::Truncate.to_string(), "truncate");
    }
}

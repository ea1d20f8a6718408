//! Raster sources: the boundary between file formats and the lookup engine.
//!
//! A [`RasterSource`] exposes one decoded raster: its grid dimensions,
//! geotransform, native coordinate reference system, nodata sentinel and
//! sample bands. [`open_raster`] picks a reader from the file name.

use std::path::Path;

use crate::crs::Crs;
use crate::error::{ElevationError, Result};
use crate::geotiff::GeoTiffSource;
use crate::hgt::HgtSource;

/// Value indicating no data (void) in elevation rasters.
pub const NODATA_VALUE: i16 = -32768;

/// An opened raster dataset.
pub trait RasterSource {
    /// Grid size as `(width, height)` in samples.
    fn grid_dimensions(&self) -> (usize, usize);

    /// GDAL-ordered geotransform coefficients.
    fn geotransform(&self) -> [f64; 6];

    /// Native coordinate reference system of the geotransform.
    fn spatial_reference(&self) -> Crs;

    /// Sentinel marking void samples, if the raster declares one.
    fn nodata(&self) -> Option<i16> {
        None
    }

    /// Number of sample bands.
    fn band_count(&self) -> usize {
        1
    }

    /// Read a band (1-based, as in GDAL) as row-major samples, north row first.
    fn read_band(&mut self, index: usize) -> Result<Vec<i16>>;
}

/// Raster file types understood by [`open_raster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    /// SRTM height file, optionally zipped or gzipped.
    Hgt,
    /// GeoTIFF.
    GeoTiff,
}

impl RasterFormat {
    /// Detect the format from a file name.
    ///
    /// ```
    /// use geoelev::raster::RasterFormat;
    ///
    /// assert_eq!(RasterFormat::from_path("N35E138.hgt"), Some(RasterFormat::Hgt));
    /// assert_eq!(RasterFormat::from_path("N35E138.hgt.zip"), Some(RasterFormat::Hgt));
    /// assert_eq!(RasterFormat::from_path("srtm_ne_250m.TIF"), Some(RasterFormat::GeoTiff));
    /// assert_eq!(RasterFormat::from_path("readme.txt"), None);
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let name = path.as_ref().file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".hgt") || name.ends_with(".hgt.zip") || name.ends_with(".hgt.gz") {
            Some(RasterFormat::Hgt)
        } else if name.ends_with(".tif") || name.ends_with(".tiff") {
            Some(RasterFormat::GeoTiff)
        } else {
            None
        }
    }
}

/// Open a raster file with the reader matching its extension.
///
/// # Errors
///
/// Returns [`ElevationError::UnsupportedFormat`] for unknown extensions and
/// [`ElevationError::RasterOpen`] if the file cannot be opened or parsed.
pub fn open_raster<P: AsRef<Path>>(path: P) -> Result<Box<dyn RasterSource>> {
    let path = path.as_ref();
    match RasterFormat::from_path(path) {
        Some(RasterFormat::Hgt) => Ok(Box::new(HgtSource::open(path)?)),
        Some(RasterFormat::GeoTiff) => Ok(Box::new(GeoTiffSource::open(path)?)),
        None => Err(ElevationError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// A raster held entirely in memory.
///
/// Useful for synthetic grids and for rasters decoded by other libraries.
#[derive(Debug, Clone)]
pub struct MemoryRaster {
    width: usize,
    height: usize,
    geotransform: [f64; 6],
    crs: Crs,
    nodata: Option<i16>,
    samples: Vec<i16>,
}

impl MemoryRaster {
    /// Wrap row-major samples.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::RasterLoad`] if `samples.len()` is not
    /// `width * height`.
    pub fn new(
        width: usize,
        height: usize,
        geotransform: [f64; 6],
        crs: Crs,
        samples: Vec<i16>,
    ) -> Result<Self> {
        if width == 0 || height == 0 || samples.len() != width * height {
            return Err(ElevationError::RasterLoad {
                message: format!(
                    "{} samples do not fill a {}x{} grid",
                    samples.len(),
                    width,
                    height
                ),
            });
        }
        Ok(Self {
            width,
            height,
            geotransform,
            crs,
            nodata: Some(NODATA_VALUE),
            samples,
        })
    }

    /// A north-up WGS84 raster covering `[south, north] × [west, east]`.
    pub fn wgs84(
        north: f64,
        south: f64,
        west: f64,
        east: f64,
        width: usize,
        height: usize,
        samples: Vec<i16>,
    ) -> Result<Self> {
        let geotransform = [
            west,
            (east - west) / width as f64,
            0.0,
            north,
            0.0,
            -(north - south) / height as f64,
        ];
        Self::new(width, height, geotransform, Crs::Wgs84, samples)
    }

    /// Override the nodata sentinel.
    pub fn with_nodata(mut self, nodata: Option<i16>) -> Self {
        self.nodata = nodata;
        self
    }

    /// Set a sample by grid index.
    pub fn set(&mut self, row: usize, col: usize, value: i16) {
        self.samples[row * self.width + col] = value;
    }
}

impl RasterSource for MemoryRaster {
    fn grid_dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn geotransform(&self) -> [f64; 6] {
        self.geotransform
    }

    fn spatial_reference(&self) -> Crs {
        self.crs.clone()
    }

    fn nodata(&self) -> Option<i16> {
        self.nodata
    }

    fn read_band(&mut self, index: usize) -> Result<Vec<i16>> {
        if index != 1 {
            return Err(ElevationError::RasterLoad {
                message: format!("band {} requested from a single-band raster", index),
            });
        }
        Ok(self.samples.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_raster_dimensions() {
        let raster = MemoryRaster::wgs84(1.0, 0.0, 0.0, 2.0, 4, 2, vec![0; 8]).unwrap();
        assert_eq!(raster.grid_dimensions(), (4, 2));
        assert_eq!(raster.geotransform(), [0.0, 0.5, 0.0, 1.0, 0.0, -0.5]);
        assert_eq!(raster.spatial_reference(), Crs::Wgs84);
        assert_eq!(raster.nodata(), Some(NODATA_VALUE));
    }

    #[test]
    fn test_memory_raster_size_mismatch() {
        let result = MemoryRaster::wgs84(1.0, 0.0, 0.0, 1.0, 3, 3, vec![0; 8]);
        assert!(matches!(result, Err(ElevationError::RasterLoad { .. })));
    }

    #[test]
    fn test_memory_raster_bands() {
        let mut raster = MemoryRaster::wgs84(1.0, 0.0, 0.0, 1.0, 2, 1, vec![5, 6]).unwrap();
        raster.set(0, 1, 7);
        assert_eq!(raster.read_band(1).unwrap(), vec![5, 7]);
        assert!(raster.read_band(2).is_err());
    }

    #[test]
    fn test_open_unsupported_format() {
        let result = open_raster("/tmp/elevation.png");
        assert!(matches!(
            result,
            Err(ElevationError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_open_missing_file() {
        let result = open_raster("/nonexistent/N35E138.hgt");
        assert!(matches!(result, Err(ElevationError::RasterOpen { .. })));
    }
}

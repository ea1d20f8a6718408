//! SRTM `.hgt` raster reader.
//!
//! This module provides [`HgtSource`], a [`RasterSource`] over SRTM height
//! files. Plain `.hgt` files are memory-mapped; `.hgt.zip` and `.hgt.gz`
//! archives are decompressed into memory.
//!
//! SRTM files contain elevation data in a simple binary format:
//!
//! - **SRTM1**: 3601×3601 samples, 1 arc-second (~30m) resolution
//! - **SRTM3**: 1201×1201 samples, 3 arc-second (~90m) resolution
//!
//! Each sample is a 16-bit big-endian signed integer. Samples sit on the
//! grid lines, so the first and last rows/columns fall exactly on the tile's
//! integer-degree edges and repeat in the neighbouring tiles.
//!
//! The geotransform anchors cell `k` at sample `k`: the pixel origin is the
//! north-west sample itself, which makes the rounding lookup land on the
//! nearest sample. The grid therefore reaches one step past the east and
//! south degree lines; lookups there fall through to the neighbouring tile.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use memmap2::Mmap;

use crate::crs::Crs;
use crate::error::{ElevationError, Result};
use crate::raster::{RasterSource, NODATA_VALUE};

/// File size for SRTM1 (1 arc-second, ~30m resolution): 3601 × 3601 × 2 bytes
pub const SRTM1_SIZE: usize = 3601 * 3601 * 2; // 25,934,402 bytes

/// File size for SRTM3 (3 arc-second, ~90m resolution): 1201 × 1201 × 2 bytes
pub const SRTM3_SIZE: usize = 1201 * 1201 * 2; // 2,884,802 bytes

/// Number of samples per row/column for SRTM1
const SRTM1_SAMPLES: usize = 3601;

/// Number of samples per row/column for SRTM3
const SRTM3_SAMPLES: usize = 1201;

/// Resolution type of an SRTM tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HgtResolution {
    /// SRTM1: 1 arc-second (~30m) resolution
    Srtm1,
    /// SRTM3: 3 arc-second (~90m) resolution
    Srtm3,
}

impl HgtResolution {
    /// Detect the resolution from the decompressed data size.
    pub fn from_size(size: usize) -> Option<Self> {
        match size {
            SRTM1_SIZE => Some(HgtResolution::Srtm1),
            SRTM3_SIZE => Some(HgtResolution::Srtm3),
            _ => None,
        }
    }

    /// Returns the number of samples per row/column for this resolution.
    pub fn samples(&self) -> usize {
        match self {
            HgtResolution::Srtm1 => SRTM1_SAMPLES,
            HgtResolution::Srtm3 => SRTM3_SAMPLES,
        }
    }

    /// Returns the approximate resolution in meters.
    pub fn meters(&self) -> f64 {
        match self {
            HgtResolution::Srtm1 => 30.0,
            HgtResolution::Srtm3 => 90.0,
        }
    }
}

enum HgtData {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl HgtData {
    fn bytes(&self) -> &[u8] {
        match self {
            HgtData::Mapped(mmap) => mmap,
            HgtData::Owned(buf) => buf,
        }
    }
}

/// An opened SRTM height file.
///
/// # Example
///
/// ```ignore
/// use geoelev::hgt::HgtSource;
/// use geoelev::raster::RasterSource;
///
/// let mut source = HgtSource::open("N35E138.hgt")?;
/// assert_eq!(source.grid_dimensions(), (1201, 1201));
/// let grid = source.read_band(1)?;
/// ```
pub struct HgtSource {
    /// Raw big-endian sample bytes
    data: HgtData,
    /// Number of samples per row/column (1201 or 3601)
    samples: usize,
    /// Resolution type
    resolution: HgtResolution,
    /// Southwest corner latitude (integer)
    base_lat: i32,
    /// Southwest corner longitude (integer)
    base_lon: i32,
}

impl HgtSource {
    /// Open an `.hgt`, `.hgt.zip` or `.hgt.gz` file.
    ///
    /// The tile position is parsed from the file name and the resolution
    /// (SRTM1 vs SRTM3) is detected from the data size.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file name does not follow the `N35E138.hgt` convention
    /// - The file cannot be opened, mapped or decompressed
    /// - The data size doesn't match SRTM1 or SRTM3 format
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let (base_lat, base_lon) =
            cell_from_name(name).ok_or_else(|| ElevationError::RasterOpen {
                path: path.to_path_buf(),
                message: "file name does not encode a tile position (expected e.g. N35E138.hgt)"
                    .to_string(),
            })?;
        Self::open_with_coords(path, base_lat, base_lon)
    }

    /// Open an SRTM file with explicit base coordinates.
    ///
    /// This is useful when the filename doesn't follow the standard naming convention.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the `.hgt` file (optionally `.zip` or `.gz`)
    /// * `base_lat` - Latitude of the southwest corner (integer)
    /// * `base_lon` - Longitude of the southwest corner (integer)
    pub fn open_with_coords<P: AsRef<Path>>(path: P, base_lat: i32, base_lon: i32) -> Result<Self> {
        let path = path.as_ref();
        let open_error = |e: std::io::Error| ElevationError::RasterOpen {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let lower = path.to_string_lossy().to_ascii_lowercase();
        let data = if lower.ends_with(".zip") {
            HgtData::Owned(read_zip_entry(path)?)
        } else if lower.ends_with(".gz") {
            let file = File::open(path).map_err(open_error)?;
            let mut buf = Vec::with_capacity(SRTM1_SIZE);
            GzDecoder::new(file)
                .read_to_end(&mut buf)
                .map_err(open_error)?;
            HgtData::Owned(buf)
        } else {
            let file = File::open(path).map_err(open_error)?;
            // SAFETY: Memory mapping is safe as long as the file is not modified
            // while mapped. We open the file read-only and don't expose the mapping.
            let mmap = unsafe { Mmap::map(&file).map_err(open_error)? };
            HgtData::Mapped(mmap)
        };

        let size = data.bytes().len();
        let resolution =
            HgtResolution::from_size(size).ok_or(ElevationError::InvalidFileSize { size })?;

        Ok(Self {
            data,
            samples: resolution.samples(),
            resolution,
            base_lat,
            base_lon,
        })
    }

    /// Returns the resolution of this tile.
    pub fn resolution(&self) -> HgtResolution {
        self.resolution
    }

    /// Returns the base latitude (southwest corner).
    pub fn base_lat(&self) -> i32 {
        self.base_lat
    }

    /// Returns the base longitude (southwest corner).
    pub fn base_lon(&self) -> i32 {
        self.base_lon
    }
}

impl RasterSource for HgtSource {
    fn grid_dimensions(&self) -> (usize, usize) {
        (self.samples, self.samples)
    }

    fn geotransform(&self) -> [f64; 6] {
        let step = 1.0 / (self.samples - 1) as f64;
        [
            self.base_lon as f64,
            step,
            0.0,
            (self.base_lat + 1) as f64,
            0.0,
            -step,
        ]
    }

    fn spatial_reference(&self) -> Crs {
        Crs::Wgs84
    }

    fn nodata(&self) -> Option<i16> {
        Some(NODATA_VALUE)
    }

    fn read_band(&mut self, index: usize) -> Result<Vec<i16>> {
        if index != 1 {
            return Err(ElevationError::RasterLoad {
                message: format!("band {} requested from a single-band .hgt file", index),
            });
        }
        // Read 16-bit big-endian signed integers, row-major, north row first
        Ok(self
            .data
            .bytes()
            .chunks_exact(2)
            .map(|b| i16::from_be_bytes([b[0], b[1]]))
            .collect())
    }
}

/// South-west corner `(lat, lon)` of the 1° cell an SRTM tile name encodes.
///
/// Accepts a bare name or a path, with or without the `.hgt`, `.hgt.zip`
/// or `.hgt.gz` extension, in either case.
///
/// ```
/// use geoelev::hgt::cell_from_name;
///
/// assert_eq!(cell_from_name("N35E138.hgt"), Some((35, 138)));
/// assert_eq!(cell_from_name("/srtm/s12w077.hgt.zip"), Some((-12, -77)));
/// assert_eq!(cell_from_name("N35E13.hgt"), None);
/// ```
pub fn cell_from_name(name: &str) -> Option<(i32, i32)> {
    let file = name.rsplit(['/', '\\']).next()?;
    let stem = file.split('.').next()?.as_bytes();
    if stem.len() != 7 {
        return None;
    }

    let lat_sign = match stem[0].to_ascii_uppercase() {
        b'N' => 1,
        b'S' => -1,
        _ => return None,
    };
    let lon_sign = match stem[3].to_ascii_uppercase() {
        b'E' => 1,
        b'W' => -1,
        _ => return None,
    };
    let degrees = |digits: &[u8]| {
        digits.iter().try_fold(0i32, |acc, &d| {
            d.is_ascii_digit().then(|| acc * 10 + i32::from(d - b'0'))
        })
    };

    Some((lat_sign * degrees(&stem[1..3])?, lon_sign * degrees(&stem[4..7])?))
}

/// Name of the SRTM tile whose 1° cell holds `(lat, lon)`, without extension.
///
/// ```
/// use geoelev::hgt::cell_name;
///
/// assert_eq!(cell_name(35.5, 138.7), "N35E138");
/// assert_eq!(cell_name(-0.1, -77.1), "S01W078");
/// ```
pub fn cell_name(lat: f64, lon: f64) -> String {
    let (lat, lon) = (lat.floor() as i32, lon.floor() as i32);
    format!(
        "{}{:02}{}{:03}",
        if lat < 0 { 'S' } else { 'N' },
        lat.unsigned_abs(),
        if lon < 0 { 'W' } else { 'E' },
        lon.unsigned_abs()
    )
}

/// Extract the `.hgt` member of a `.hgt.zip` archive into memory.
fn read_zip_entry(zip_path: &Path) -> Result<Vec<u8>> {
    let invalid = |message: String| ElevationError::RasterOpen {
        path: zip_path.to_path_buf(),
        message,
    };

    let file = File::open(zip_path).map_err(|e| invalid(e.to_string()))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| invalid(e.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| invalid(e.to_string()))?;
        if entry.name().to_ascii_lowercase().ends_with(".hgt") {
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut buf)
                .map_err(|e| invalid(e.to_string()))?;
            return Ok(buf);
        }
    }

    Err(invalid(format!(
        "No .hgt file found in {}",
        PathBuf::from(zip_path).display()
    )))
}

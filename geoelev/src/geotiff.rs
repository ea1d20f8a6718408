//! GeoTIFF raster reader.
//!
//! Georeferencing is read from the standard GeoTIFF tags: either
//! `ModelPixelScale` + `ModelTiepoint` or a full `ModelTransformation`
//! matrix. The CRS comes from the GeoKey directory and nodata from the
//! `GDAL_NODATA` ASCII tag.
//!
//! Samples of any integer or float type are converted to `i16` on load:
//! floats are rounded, values outside the `i16` range are clamped, and NaN
//! or nodata samples become [`NODATA_VALUE`].

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

use crate::crs::{Crs, EPSG_WGS84};
use crate::error::{ElevationError, Result};
use crate::raster::{RasterSource, NODATA_VALUE};

const GDAL_NODATA_TAG: u16 = 42113;

const GT_MODEL_TYPE_KEY: u64 = 1024;
const GT_RASTER_TYPE_KEY: u64 = 1025;
const GEOGRAPHIC_TYPE_KEY: u64 = 2048;
const PROJECTED_CS_TYPE_KEY: u64 = 3072;

const MODEL_TYPE_PROJECTED: u64 = 1;
const RASTER_PIXEL_IS_POINT: u64 = 2;
const USER_DEFINED: u64 = 32767;

/// A decoded GeoTIFF.
#[derive(Debug)]
pub struct GeoTiffSource {
    width: usize,
    height: usize,
    bands: usize,
    geotransform: [f64; 6],
    crs: Crs,
    nodata: Option<i16>,
    /// Pixel-interleaved samples of every band.
    samples: Vec<i16>,
}

impl GeoTiffSource {
    /// Open and decode a GeoTIFF file.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::RasterOpen`] if the file cannot be read or
    /// lacks georeferencing, and [`ElevationError::UnsupportedCrs`] for
    /// user-defined coordinate systems.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let open_error = |message: String| ElevationError::RasterOpen {
            path: path.to_path_buf(),
            message,
        };

        let file = File::open(path).map_err(|e| open_error(e.to_string()))?;
        let mut decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| open_error(e.to_string()))?;

        // Elevation rasters easily exceed the decoder's default buffer limits
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024;
        limits.intermediate_buffer_size = 1024 * 1024 * 1024;
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder
            .dimensions()
            .map_err(|e| open_error(e.to_string()))?;
        let (width, height) = (width as usize, height as usize);
        let bands = decoder
            .get_tag_u32(Tag::SamplesPerPixel)
            .map(|n| n.max(1) as usize)
            .unwrap_or(1);

        let geokeys = read_geokeys(&mut decoder);
        let mut geotransform = read_geotransform(&mut decoder).ok_or_else(|| {
            open_error("missing ModelPixelScale/ModelTiepoint or ModelTransformation".to_string())
        })?;
        if geokey(&geokeys, GT_RASTER_TYPE_KEY) == Some(RASTER_PIXEL_IS_POINT) {
            // Tie point names the center of the top-left pixel
            geotransform[0] -= 0.5 * (geotransform[1] + geotransform[2]);
            geotransform[3] -= 0.5 * (geotransform[4] + geotransform[5]);
        }
        let crs = crs_from_geokeys(&geokeys, path)?;

        let declared_nodata = decoder
            .get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA_TAG))
            .ok()
            .and_then(|s| {
                s.trim_matches(|c: char| c == '\0' || c.is_whitespace())
                    .parse::<f64>()
                    .ok()
            });

        let decoded = decoder
            .read_image()
            .map_err(|e| open_error(e.to_string()))?;
        let is_float = matches!(decoded, DecodingResult::F32(_) | DecodingResult::F64(_));
        let samples = convert_samples(decoded, declared_nodata);

        if samples.len() != width * height * bands {
            return Err(ElevationError::RasterLoad {
                message: format!(
                    "{}: decoded {} samples for a {}x{}x{} image",
                    path.display(),
                    samples.len(),
                    width,
                    height,
                    bands
                ),
            });
        }

        let nodata = if declared_nodata.is_some() || is_float {
            Some(NODATA_VALUE)
        } else {
            None
        };

        tracing::debug!(
            path = %path.display(),
            width,
            height,
            bands,
            crs = %crs,
            "decoded GeoTIFF"
        );

        Ok(Self {
            width,
            height,
            bands,
            geotransform,
            crs,
            nodata,
            samples,
        })
    }
}

impl RasterSource for GeoTiffSource {
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

    fn band_count(&self) -> usize {
        self.bands
    }

    fn read_band(&mut self, index: usize) -> Result<Vec<i16>> {
        if index == 0 || index > self.bands {
            return Err(ElevationError::RasterLoad {
                message: format!("band {} requested from a {}-band GeoTIFF", index, self.bands),
            });
        }
        if self.bands == 1 {
            return Ok(self.samples.clone());
        }
        Ok(self
            .samples
            .iter()
            .skip(index - 1)
            .step_by(self.bands)
            .copied()
            .collect())
    }
}

/// GDAL-ordered geotransform from the model tags.
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<[f64; 6]> {
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag);
    let pixel_scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag);

    if let (Ok(tiepoint), Ok(scale)) = (tiepoint, pixel_scale) {
        if tiepoint.len() >= 6 && scale.len() >= 2 {
            // Tiepoint format: [i, j, k, x, y, z] where (i, j) is the raster
            // position of model point (x, y)
            let (i, j) = (tiepoint[0], tiepoint[1]);
            let (x, y) = (tiepoint[3], tiepoint[4]);
            let (sx, sy) = (scale[0], scale[1]);
            return Some([x - i * sx, sx, 0.0, y + j * sy, 0.0, -sy]);
        }
    }

    // Row-major 4x4 matrix: x = m0*col + m1*row + m3, y = m4*col + m5*row + m7
    let matrix = decoder.get_tag_f64_vec(Tag::ModelTransformationTag).ok()?;
    if matrix.len() >= 8 {
        return Some([matrix[3], matrix[0], matrix[1], matrix[7], matrix[4], matrix[5]]);
    }
    None
}

/// `(key, value)` pairs of the inline (short) GeoKeys.
fn read_geokeys<R: Read + Seek>(decoder: &mut Decoder<R>) -> Vec<(u64, u64)> {
    let Ok(directory) = decoder.get_tag_u64_vec(Tag::GeoKeyDirectoryTag) else {
        return Vec::new();
    };
    // Header: version, revision, minor revision, number of keys
    directory
        .get(4..)
        .unwrap_or_default()
        .chunks_exact(4)
        .filter(|entry| entry[1] == 0)
        .map(|entry| (entry[0], entry[3]))
        .collect()
}

fn geokey(keys: &[(u64, u64)], key: u64) -> Option<u64> {
    keys.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn crs_from_geokeys(keys: &[(u64, u64)], path: &Path) -> Result<Crs> {
    let user_defined = |key: &str| ElevationError::UnsupportedCrs {
        crs: format!("user-defined {} in {}", key, path.display()),
    };

    let projected = geokey(keys, GT_MODEL_TYPE_KEY) == Some(MODEL_TYPE_PROJECTED)
        || geokey(keys, PROJECTED_CS_TYPE_KEY).is_some();

    if projected {
        return match geokey(keys, PROJECTED_CS_TYPE_KEY) {
            Some(USER_DEFINED) | None => Err(user_defined("ProjectedCSType")),
            Some(code) => Ok(Crs::Epsg(code as u32)),
        };
    }

    match geokey(keys, GEOGRAPHIC_TYPE_KEY) {
        Some(USER_DEFINED) => Err(user_defined("GeographicType")),
        Some(code) if code as u32 == EPSG_WGS84 => Ok(Crs::Wgs84),
        Some(code) => Ok(Crs::Epsg(code as u32)),
        None => {
            tracing::warn!(path = %path.display(), "no GeoKeys, assuming WGS84");
            Ok(Crs::Wgs84)
        }
    }
}

fn convert_samples(decoded: DecodingResult, nodata: Option<f64>) -> Vec<i16> {
    fn clamp(v: f64, nodata: Option<f64>) -> i16 {
        if v.is_nan() || nodata == Some(v) {
            NODATA_VALUE
        } else {
            v.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
        }
    }

    match decoded {
        DecodingResult::U8(data) => data.into_iter().map(|v| clamp(v as f64, nodata)).collect(),
        DecodingResult::U16(data) => data.into_iter().map(|v| clamp(v as f64, nodata)).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|v| clamp(v as f64, nodata)).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| clamp(v as f64, nodata)).collect(),
        DecodingResult::I8(data) => data.into_iter().map(|v| clamp(v as f64, nodata)).collect(),
        DecodingResult::I16(data) => data.into_iter().map(|v| clamp(v as f64, nodata)).collect(),
        DecodingResult::I32(data) => data.into_iter().map(|v| clamp(v as f64, nodata)).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| clamp(v as f64, nodata)).collect(),
        DecodingResult::F32(data) => data.into_iter().map(|v| clamp(v as f64, nodata)).collect(),
        DecodingResult::F64(data) => data.into_iter().map(|v| clamp(v, nodata)).collect(),
    }
}

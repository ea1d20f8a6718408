//! Coordinate reference systems and reprojection.
//!
//! Queries always arrive as WGS84 latitude/longitude. Tiles whose raster is
//! stored in another CRS reproject each query point through a
//! [`CrsTransform`] before applying their geotransform.
//!
//! Points are passed as `(x, y)`: `(lon, lat)` in degrees for geographic
//! systems, `(easting, northing)` in the CRS units otherwise.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use proj4rs::proj::Proj;

use crate::error::{ElevationError, Result};

/// EPSG code of WGS84 geographic coordinates.
pub const EPSG_WGS84: u32 = 4326;

/// EPSG code of spherical Web Mercator.
pub const EPSG_WEB_MERCATOR: u32 = 3857;

/// A coordinate reference system descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Crs {
    /// WGS84 longitude/latitude in degrees.
    Wgs84,
    /// A system identified by its EPSG code.
    Epsg(u32),
    /// A system given as a PROJ.4 definition string.
    Proj(String),
}

impl Crs {
    /// Returns `true` for WGS84, including its EPSG spelling.
    pub fn is_wgs84(&self) -> bool {
        matches!(self, Crs::Wgs84 | Crs::Epsg(EPSG_WGS84))
    }

    /// Returns `true` if coordinates in this system are angular (degrees).
    pub fn is_geographic(&self) -> bool {
        match self {
            Crs::Wgs84 => true,
            Crs::Epsg(code) => matches!(code, 4326 | 4269 | 4258 | 4267),
            Crs::Proj(def) => def.contains("+proj=longlat") || def.contains("+proj=latlong"),
        }
    }

    /// PROJ.4 definition for this system.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::UnsupportedCrs`] for EPSG codes without a
    /// built-in definition.
    pub fn proj_string(&self) -> Result<String> {
        match self {
            Crs::Wgs84 => Ok(WGS84_DEFINITION.to_string()),
            Crs::Epsg(code) => {
                epsg_proj_string(*code).ok_or_else(|| ElevationError::UnsupportedCrs {
                    crs: self.to_string(),
                })
            }
            Crs::Proj(def) => Ok(def.clone()),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Wgs84 => write!(f, "EPSG:{}", EPSG_WGS84),
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
            Crs::Proj(def) => f.write_str(def),
        }
    }
}

const WGS84_DEFINITION: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Built-in PROJ.4 definitions for the EPSG codes DEM products commonly use.
///
/// Covers WGS84, NAD83, ETRS89, NAD27, Web Mercator, ETRS89-LAEA and all
/// WGS84 UTM zones (326xx north, 327xx south).
pub fn epsg_proj_string(code: u32) -> Option<String> {
    let def = match code {
        4326 => WGS84_DEFINITION.to_string(),
        4269 | 4258 => "+proj=longlat +ellps=GRS80 +towgs84=0,0,0 +no_defs".to_string(),
        4267 => "+proj=longlat +datum=NAD27 +no_defs".to_string(),
        3857 => "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 \
                 +units=m +no_defs"
            .to_string(),
        3035 => "+proj=laea +lat_0=52 +lon_0=10 +x_0=4321000 +y_0=3210000 +ellps=GRS80 \
                 +units=m +no_defs"
            .to_string(),
        32601..=32660 => format!(
            "+proj=utm +zone={} +datum=WGS84 +units=m +no_defs",
            code - 32600
        ),
        32701..=32760 => format!(
            "+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs",
            code - 32700
        ),
        _ => return None,
    };
    Some(def)
}

/// Reprojects points between coordinate reference systems.
pub trait CrsTransform: Send + Sync {
    /// Transform `point` from `source` into `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::Projection`] if the point is outside the
    /// domain of either projection, or [`ElevationError::UnsupportedCrs`] if
    /// a system has no known definition.
    fn transform(&self, point: (f64, f64), source: &Crs, target: &Crs) -> Result<(f64, f64)>;
}

/// Pure Rust [`CrsTransform`] backed by proj4rs.
///
/// Parsed projections are cached per CRS, since building a [`Proj`] is far
/// more expensive than transforming a point.
#[derive(Default)]
pub struct Proj4Transform {
    cache: RwLock<HashMap<Crs, Arc<Proj>>>,
}

impl Proj4Transform {
    /// Create a transformer with an empty projection cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn projection(&self, crs: &Crs) -> Result<Arc<Proj>> {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(proj) = cache.get(crs) {
                return Ok(proj.clone());
            }
        }

        let definition = crs.proj_string()?;
        let proj = Proj::from_proj_string(&definition).map_err(|e| {
            ElevationError::UnsupportedCrs {
                crs: format!("{} ({:?})", crs, e),
            }
        })?;
        let proj = Arc::new(proj);

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(crs.clone(), proj.clone());
        Ok(proj)
    }
}

impl fmt::Debug for Proj4Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.cache.read().map(|c| c.len()).unwrap_or(0);
        f.debug_struct("Proj4Transform")
            .field("cached_projections", &cached)
            .finish()
    }
}

impl CrsTransform for Proj4Transform {
    fn transform(&self, point: (f64, f64), source: &Crs, target: &Crs) -> Result<(f64, f64)> {
        if source == target || (source.is_wgs84() && target.is_wgs84()) {
            return Ok(point);
        }

        let src = self.projection(source)?;
        let dst = self.projection(target)?;

        // proj4rs works in radians for geographic systems
        let (x, y) = if source.is_geographic() {
            (point.0.to_radians(), point.1.to_radians())
        } else {
            point
        };
        let mut p = (x, y, 0.0);

        proj4rs::transform::transform(&src, &dst, &mut p).map_err(|e| {
            ElevationError::Projection {
                message: format!("{} -> {} at ({}, {}): {:?}", source, target, point.0, point.1, e),
            }
        })?;

        let out = if target.is_geographic() {
            (p.0.to_degrees(), p.1.to_degrees())
        } else {
            (p.0, p.1)
        };

        if !out.0.is_finite() || !out.1.is_finite() {
            return Err(ElevationError::Projection {
                message: format!(
                    "{} -> {} at ({}, {}): non-finite result",
                    source, target, point.0, point.1
                ),
            });
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_identity() {
        assert!(Crs::Wgs84.is_wgs84());
        assert!(Crs::Epsg(4326).is_wgs84());
        assert!(!Crs::Epsg(3857).is_wgs84());

        let t = Proj4Transform::new();
        let p = t.transform((10.5, 50.25), &Crs::Wgs84, &Crs::Epsg(4326)).unwrap();
        assert_eq!(p, (10.5, 50.25));
    }

    #[test]
    fn test_epsg_definitions() {
        assert!(epsg_proj_string(4326).is_some());
        assert!(epsg_proj_string(3857).is_some());
        assert_eq!(
            epsg_proj_string(32633).unwrap(),
            "+proj=utm +zone=33 +datum=WGS84 +units=m +no_defs"
        );
        assert!(epsg_proj_string(32718).unwrap().contains("+south"));
        assert!(epsg_proj_string(99999).is_none());

        assert!(matches!(
            Crs::Epsg(99999).proj_string(),
            Err(ElevationError::UnsupportedCrs { .. })
        ));
    }

    #[test]
    fn test_geographic_detection() {
        assert!(Crs::Wgs84.is_geographic());
        assert!(Crs::Epsg(4269).is_geographic());
        assert!(!Crs::Epsg(32633).is_geographic());
        assert!(Crs::Proj("+proj=longlat +ellps=WGS84".into()).is_geographic());
        assert!(!Crs::Proj("+proj=merc +a=6378137".into()).is_geographic());
    }

    #[test]
    fn test_web_mercator_round_trip() {
        let t = Proj4Transform::new();
        let wgs84 = Crs::Wgs84;
        let merc = Crs::Epsg(EPSG_WEB_MERCATOR);

        let (x, y) = t.transform((10.62979, 50.56323), &wgs84, &merc).unwrap();
        // Web Mercator x is linear in longitude
        let expected_x = 10.62979_f64.to_radians() * 6_378_137.0;
        assert!((x - expected_x).abs() < 0.01, "x = {}", x);
        assert!(y > 6_000_000.0 && y < 7_000_000.0, "y = {}", y);

        let (lon, lat) = t.transform((x, y), &merc, &wgs84).unwrap();
        assert!((lon - 10.62979).abs() < 1e-7);
        assert!((lat - 50.56323).abs() < 1e-7);
    }

    #[test]
    fn test_utm_round_trip() {
        let t = Proj4Transform::new();
        let utm = Crs::Epsg(32618);

        let (e, n) = t.transform((-77.6263, 40.6778), &Crs::Wgs84, &utm).unwrap();
        // Zone 18 central meridian is -75°, so the point lies west of 500 km
        assert!(e > 200_000.0 && e < 500_000.0, "easting = {}", e);
        assert!(n > 4_400_000.0 && n < 4_600_000.0, "northing = {}", n);

        let (lon, lat) = t.transform((e, n), &utm, &Crs::Wgs84).unwrap();
        assert!((lon + 77.6263).abs() < 1e-6);
        assert!((lat - 40.6778).abs() < 1e-6);
    }

    #[test]
    fn test_display() {
        assert_eq!(Crs::Wgs84.to_string(), "EPSG:4326");
        assert_eq!(Crs::Epsg(32633).to_string(), "EPSG:32633");
    }
}

//! Elevation Z values for GeoJSON geometries (feature `geojson`).
//!
//! Positions are GeoJSON ordered, `[lon, lat]` or `[lon, lat, alt]`. The
//! elevation is written as the third ordinate, replacing any altitude that
//! was already there. Nodata cells are written as [`SEA_LEVEL`].
//!
//! ```ignore
//! let mut geometry: geojson::Geometry =
//!     r#"{"type": "Point", "coordinates": [10.62979, 50.56323]}"#.parse()?;
//! geoelev::geojson::elevate_geometry(&service, &mut geometry)?;
//! ```

use geojson::{Geometry, Value};

use crate::error::{ElevationError, Result};
use crate::{ElevationService, SEA_LEVEL};

/// Visit every position of a geometry value, depth first, in document order.
///
/// Stops at the first error.
fn try_for_each_position<F>(value: &mut Value, visit: &mut F) -> Result<()>
where
    F: FnMut(&mut Vec<f64>) -> Result<()>,
{
    match value {
        Value::Point(pos) => visit(pos),
        Value::MultiPoint(positions) | Value::LineString(positions) => {
            positions.iter_mut().try_for_each(visit)
        }
        Value::MultiLineString(rings) | Value::Polygon(rings) => {
            rings.iter_mut().flatten().try_for_each(visit)
        }
        Value::MultiPolygon(polygons) => polygons
            .iter_mut()
            .flatten()
            .flatten()
            .try_for_each(visit),
        Value::GeometryCollection(members) => members
            .iter_mut()
            .try_for_each(|member| try_for_each_position(&mut member.value, visit)),
    }
}

fn set_z(pos: &mut Vec<f64>, z: i16) {
    pos.truncate(2);
    pos.push(f64::from(z));
}

fn position_lat_lon(pos: &[f64]) -> Result<(f64, f64)> {
    match pos {
        [lon, lat, ..] => Ok((*lat, *lon)),
        _ => Err(ElevationError::InvalidCoordinate {
            message: format!("position needs [lon, lat], got {} value(s)", pos.len()),
        }),
    }
}

/// Write the elevation of every position into `geometry`.
///
/// The geometry is left partially updated when an error is returned.
///
/// # Errors
///
/// Fails on the first position that is too short, out of range, not covered
/// by any tile, or outside its tile's grid.
pub fn elevate_geometry(service: &ElevationService, geometry: &mut Geometry) -> Result<()> {
    try_for_each_position(&mut geometry.value, &mut |pos| {
        let (lat, lon) = position_lat_lon(pos)?;
        let z = service.get_elevation(lat, lon)?.unwrap_or(SEA_LEVEL);
        set_z(pos, z);
        Ok(())
    })
}

/// Like [`elevate_geometry`], but writes [`SEA_LEVEL`] wherever the lookup
/// fails instead of stopping. Positions with fewer than two ordinates are
/// skipped.
///
/// Returns the number of positions that could not be resolved.
pub fn elevate_geometry_lossy(service: &ElevationService, geometry: &mut Geometry) -> usize {
    let mut unresolved = 0;
    let visited: Result<()> = try_for_each_position(&mut geometry.value, &mut |pos| {
        match position_lat_lon(pos) {
            Ok((lat, lon)) => match service.get_elevation(lat, lon) {
                Ok(z) => set_z(pos, z.unwrap_or(SEA_LEVEL)),
                Err(_) => {
                    unresolved += 1;
                    set_z(pos, SEA_LEVEL);
                }
            },
            Err(_) => unresolved += 1,
        }
        Ok(())
    });
    debug_assert!(visited.is_ok());
    unresolved
}

/// Owned form of [`elevate_geometry`].
pub fn add_elevations_to_geometry(
    service: &ElevationService,
    mut geometry: Geometry,
) -> Result<Geometry> {
    elevate_geometry(service, &mut geometry)?;
    Ok(geometry)
}

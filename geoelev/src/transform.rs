//! Affine geotransform between raster pixel space and native coordinates.
//!
//! Coefficients follow the GDAL ordering:
//!
//! ```text
//! x = c0 + col * c1 + row * c2
//! y = c3 + col * c4 + row * c5
//! ```
//!
//! `c0, c3` is the outer top-left corner of the top-left pixel, `c1` the pixel
//! width, `c5` the (usually negative) pixel height and `c2, c4` the skew terms.

use crate::error::{ElevationError, Result};

/// Forward and inverse affine mapping for one raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    forward: [f64; 6],
    inverse: [f64; 6],
}

impl GeoTransform {
    /// Build a transform from GDAL-ordered coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::DegenerateTransform`] if the linear part of
    /// the map cannot be inverted.
    pub fn new(coefficients: [f64; 6]) -> Result<Self> {
        let inverse = Self::invert(coefficients)?;
        Ok(Self {
            forward: coefficients,
            inverse,
        })
    }

    /// Transform for a north-up raster with no skew.
    pub fn north_up(
        origin_x: f64,
        origin_y: f64,
        pixel_width: f64,
        pixel_height: f64,
    ) -> Result<Self> {
        Self::new([origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height])
    }

    /// Closed-form inversion of a GDAL-ordered geotransform.
    ///
    /// The result uses the same layout, so that
    /// `col = i0 + i1 * x + i2 * y` and `row = i3 + i4 * x + i5 * y`.
    pub fn invert(gt: [f64; 6]) -> Result<[f64; 6]> {
        let determinant = gt[1] * gt[5] - gt[2] * gt[4];
        // Relative to the magnitude of the products, so arc-second sized
        // pixels are not mistaken for singular ones.
        let scale = (gt[1] * gt[5]).abs().max((gt[2] * gt[4]).abs());
        if !determinant.is_finite() || determinant == 0.0 || determinant.abs() <= scale * 1e-12 {
            return Err(ElevationError::DegenerateTransform { determinant });
        }

        let i1 = gt[5] / determinant;
        let i2 = -gt[2] / determinant;
        let i4 = -gt[4] / determinant;
        let i5 = gt[1] / determinant;
        let i0 = -(i1 * gt[0] + i2 * gt[3]);
        let i3 = -(i4 * gt[0] + i5 * gt[3]);

        Ok([i0, i1, i2, i3, i4, i5])
    }

    /// Map a native coordinate to continuous `(col, row)` pixel coordinates.
    ///
    /// The result is not snapped to a cell; whether to round or truncate is
    /// up to the caller.
    #[inline]
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let i = &self.inverse;
        (i[0] + i[1] * x + i[2] * y, i[3] + i[4] * x + i[5] * y)
    }

    /// Map continuous `(col, row)` pixel coordinates to a native coordinate.
    #[inline]
    pub fn to_native(&self, col: f64, row: f64) -> (f64, f64) {
        let f = &self.forward;
        (f[0] + col * f[1] + row * f[2], f[3] + col * f[4] + row * f[5])
    }

    /// Returns `true` if the raster has no rotation, columns run west to east
    /// and rows run north to south.
    pub fn is_north_up(&self) -> bool {
        self.forward[2] == 0.0
            && self.forward[4] == 0.0
            && self.forward[1] > 0.0
            && self.forward[5] < 0.0
    }

    /// Outer corners of a `width` × `height` grid in native coordinates:
    /// top-left, top-right, bottom-left, bottom-right.
    pub fn corners(&self, width: usize, height: usize) -> [(f64, f64); 4] {
        let (w, h) = (width as f64, height as f64);
        [
            self.to_native(0.0, 0.0),
            self.to_native(w, 0.0),
            self.to_native(0.0, h),
            self.to_native(w, h),
        ]
    }

    /// Forward coefficients, GDAL order.
    pub fn coefficients(&self) -> [f64; 6] {
        self.forward
    }

    /// Inverse coefficients, GDAL order.
    pub fn inverse_coefficients(&self) -> [f64; 6] {
        self.inverse
    }

    /// Pixel width and height (absolute values of `c1` and `c5`).
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.forward[1].abs(), self.forward[5].abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_round_trip_north_up() {
        let gt = GeoTransform::north_up(-180.0, 60.0, 1.0 / 240.0, -1.0 / 240.0).unwrap();

        for row in (0..14_400).step_by(997) {
            for col in (0..86_400).step_by(4999) {
                let (x, y) = gt.to_native(col as f64, row as f64);
                let (c, r) = gt.to_pixel(x, y);
                assert!((c - col as f64).abs() < 1e-6, "col {} -> {}", col, c);
                assert!((r - row as f64).abs() < 1e-6, "row {} -> {}", row, r);
            }
        }
    }

    #[test]
    fn test_round_trip_skewed() {
        let gt = GeoTransform::new([500_000.0, 30.0, 4.0, 4_200_000.0, -3.0, -30.0]).unwrap();

        for row in 0..50 {
            for col in 0..50 {
                let (x, y) = gt.to_native(col as f64 + 0.25, row as f64 + 0.75);
                let (c, r) = gt.to_pixel(x, y);
                assert!((c - (col as f64 + 0.25)).abs() < EPS);
                assert!((r - (row as f64 + 0.75)).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_inverse_of_simple_grid() {
        let inv = GeoTransform::invert([10.0, 0.5, 0.0, 50.0, 0.0, -0.25]).unwrap();
        // col = (x - 10) / 0.5, row = (50 - y) / 0.25
        assert!((inv[0] + 20.0).abs() < EPS);
        assert!((inv[1] - 2.0).abs() < EPS);
        assert!(inv[2].abs() < EPS);
        assert!((inv[3] - 200.0).abs() < EPS);
        assert!(inv[4].abs() < EPS);
        assert!((inv[5] + 4.0).abs() < EPS);
    }

    #[test]
    fn test_degenerate_transform() {
        // Zero pixel height
        let result = GeoTransform::new([0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(matches!(
            result,
            Err(ElevationError::DegenerateTransform { .. })
        ));

        // Collinear axes: c1*c5 == c2*c4
        let result = GeoTransform::new([0.0, 2.0, 1.0, 0.0, 4.0, 2.0]);
        assert!(matches!(
            result,
            Err(ElevationError::DegenerateTransform { .. })
        ));

        // Non-finite coefficients
        assert!(GeoTransform::new([0.0, f64::NAN, 0.0, 0.0, 0.0, -1.0]).is_err());
    }

    #[test]
    fn test_small_pixels_are_not_degenerate() {
        // 1/3 arc-second pixels
        let size = 1.0 / 10_800.0;
        assert!(GeoTransform::north_up(-78.0, 41.0, size, -size).is_ok());
    }

    #[test]
    fn test_corners_and_north_up() {
        let gt = GeoTransform::north_up(138.0, 36.0, 0.5, -0.5).unwrap();
        let corners = gt.corners(2, 2);
        assert_eq!(corners[0], (138.0, 36.0));
        assert_eq!(corners[1], (139.0, 36.0));
        assert_eq!(corners[2], (138.0, 35.0));
        assert_eq!(corners[3], (139.0, 35.0));
        assert!(gt.is_north_up());
        assert_eq!(gt.pixel_size(), (0.5, 0.5));

        let skewed = GeoTransform::new([0.0, 1.0, 0.1, 0.0, 0.0, -1.0]).unwrap();
        assert!(!skewed.is_north_up());
        let flipped = GeoTransform::north_up(0.0, 0.0, -1.0, -1.0).unwrap();
        assert!(!flipped.is_north_up());
    }
}

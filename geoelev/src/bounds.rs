//! Geographic bounding boxes.

/// A geographic bounding box in decimal degrees (WGS84).
///
/// Containment is half-open: the north and west edges belong to the box, the
/// south and east edges do not. Two boxes sharing an edge therefore never
/// both contain a point on that edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Northern boundary latitude.
    pub north: f64,
    /// Southern boundary latitude.
    pub south: f64,
    /// Western boundary longitude.
    pub west: f64,
    /// Eastern boundary longitude.
    pub east: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    ///
    /// # Arguments
    ///
    /// * `south` - Southern boundary latitude
    /// * `west` - Western boundary longitude
    /// * `north` - Northern boundary latitude
    /// * `east` - Eastern boundary longitude
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            north,
            south,
            west,
            east,
        }
    }

    /// Smallest box enclosing all `(lon, lat)` points.
    ///
    /// Returns `None` for an empty iterator or if any point is not finite.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut bbox: Option<Self> = None;
        for (lon, lat) in points {
            if !lon.is_finite() || !lat.is_finite() {
                return None;
            }
            bbox = Some(match bbox {
                None => Self::new(lat, lon, lat, lon),
                Some(b) => Self::new(
                    b.south.min(lat),
                    b.west.min(lon),
                    b.north.max(lat),
                    b.east.max(lon),
                ),
            });
        }
        bbox
    }

    /// Check if the coordinate lies inside the box.
    ///
    /// Inclusive on the north/west edges, exclusive on the south/east edges.
    #[inline]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat <= self.north && lat > self.south && lon >= self.west && lon < self.east
    }

    /// Check if this box shares a region of non-zero area with `other`.
    ///
    /// Boxes that only touch along an edge do not overlap.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.south < other.north
            && self.north > other.south
            && self.west < other.east
            && self.east > other.west
    }

    /// Union of two boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            north: self.north.max(other.north),
            south: self.south.min(other.south),
            west: self.west.min(other.west),
            east: self.east.max(other.east),
        }
    }

    /// Latitude extent in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude extent in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_half_open() {
        let bbox = BoundingBox::new(35.0, 138.0, 36.0, 139.0);

        assert!(bbox.contains(35.5, 138.5));
        // North and west edges are inside
        assert!(bbox.contains(36.0, 138.5));
        assert!(bbox.contains(35.5, 138.0));
        assert!(bbox.contains(36.0, 138.0));
        // South and east edges are outside
        assert!(!bbox.contains(35.0, 138.5));
        assert!(!bbox.contains(35.5, 139.0));
        // NaN never matches
        assert!(!bbox.contains(f64::NAN, 138.5));
    }

    #[test]
    fn test_shared_edge_has_single_owner() {
        let north = BoundingBox::new(35.0, 138.0, 36.0, 139.0);
        let south = BoundingBox::new(34.0, 138.0, 35.0, 139.0);
        let east = BoundingBox::new(35.0, 139.0, 36.0, 140.0);

        assert!(north.contains(35.0 + 1e-12, 138.5));
        assert!(!north.contains(35.0, 138.5));
        assert!(south.contains(35.0, 138.5));

        assert!(!north.contains(35.5, 139.0));
        assert!(east.contains(35.5, 139.0));
    }

    #[test]
    fn test_overlaps() {
        // Tile N35E138 covers [35, 36) x [138, 139)
        let tile = BoundingBox::new(35.0, 138.0, 36.0, 139.0);

        assert!(BoundingBox::new(35.5, 138.5, 36.5, 139.5).overlaps(&tile));
        assert!(!BoundingBox::new(40.0, 140.0, 41.0, 141.0).overlaps(&tile));
        // Touching edge only
        assert!(!BoundingBox::new(36.0, 139.0, 37.0, 140.0).overlaps(&tile));
        // Containment either way
        assert!(BoundingBox::new(34.0, 137.0, 37.0, 140.0).overlaps(&tile));
        assert!(BoundingBox::new(35.2, 138.2, 35.8, 138.8).overlaps(&tile));

        // Negative coordinates
        let bbox = BoundingBox::new(-13.5, -78.5, -11.5, -76.5);
        assert!(bbox.overlaps(&BoundingBox::new(-13.0, -78.0, -12.0, -77.0)));
    }

    #[test]
    fn test_enclosing() {
        let bbox = BoundingBox::enclosing([(10.0, 50.0), (11.0, 49.0), (10.5, 49.5)]).unwrap();
        assert_eq!(bbox, BoundingBox::new(49.0, 10.0, 50.0, 11.0));
        assert_eq!(bbox.width(), 1.0);
        assert_eq!(bbox.height(), 1.0);

        assert!(BoundingBox::enclosing(Vec::new()).is_none());
        assert!(BoundingBox::enclosing([(f64::INFINITY, 0.0)]).is_none());
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BoundingBox::new(-1.0, 2.0, 0.5, 3.0);
        assert_eq!(a.union(&b), BoundingBox::new(-1.0, 0.0, 1.0, 3.0));
    }
}

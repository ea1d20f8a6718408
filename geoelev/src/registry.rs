//! Tile registry and coordinate-to-tile dispatch.
//!
//! Tiles are indexed by identifier and by WGS84 bounding box in an R-tree.
//! A coordinate resolves to the tile whose half-open bounding box contains
//! it. Overlapping tiles are allowed; the one registered first wins, unless
//! the coordinate falls outside its grid, in which case the next candidate
//! answers (see [`TileRegistry::sample`]).

use std::collections::HashMap;
use std::sync::Arc;

use rstar::{RTree, RTreeObject, AABB};

use crate::bounds::BoundingBox;
use crate::error::{ElevationError, Result};
use crate::tile::Tile;

/// R-tree entry: a tile with its registration order.
#[derive(Clone)]
struct IndexedTile {
    /// Registration order; lower wins on overlap.
    seq: u64,
    env: AABB<[f64; 2]>,
    tile: Arc<Tile>,
}

impl IndexedTile {
    fn new(seq: u64, tile: Arc<Tile>) -> Self {
        let b = tile.bounds();
        Self {
            seq,
            env: AABB::from_corners([b.west, b.south], [b.east, b.north]),
            tile,
        }
    }
}

// seq is unique per registry
impl PartialEq for IndexedTile {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl RTreeObject for IndexedTile {
    type Envelope = AABB<[f64; 2]>;

    #[inline]
    fn envelope(&self) -> Self::Envelope {
        self.env
    }
}

/// The set of loaded tiles.
///
/// # Example
///
/// ```
/// use geoelev::raster::MemoryRaster;
/// use geoelev::registry::TileRegistry;
/// use geoelev::tile::{Tile, TileOptions};
///
/// let mut registry = TileRegistry::new();
/// let mut raster = MemoryRaster::wgs84(1.0, 0.0, 0.0, 1.0, 1, 1, vec![42]).unwrap();
/// registry.register(Tile::from_source("a", &mut raster, &TileOptions::default()).unwrap());
///
/// assert_eq!(registry.resolve(0.5, 0.5).unwrap().id(), "a");
/// assert!(registry.resolve(5.0, 5.0).is_err());
/// ```
#[derive(Default)]
pub struct TileRegistry {
    by_id: HashMap<String, IndexedTile>,
    index: RTree<IndexedTile>,
    next_seq: u64,
}

impl TileRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tile under its own identifier.
    ///
    /// Registering an identifier again replaces the tile but keeps its
    /// original precedence. Returns the replaced tile, if any.
    pub fn register(&mut self, tile: Tile) -> Option<Arc<Tile>> {
        let id = tile.id().to_string();
        let tile = Arc::new(tile);

        let replaced = self.by_id.remove(&id);
        let seq = match &replaced {
            Some(old) => {
                self.index.remove(old);
                old.seq
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                seq
            }
        };

        let entry = IndexedTile::new(seq, tile);
        let bounds = entry.tile.bounds();
        let overlapping: Vec<&str> = self
            .index
            .locate_in_envelope_intersecting(&entry.env)
            .filter(|other| other.tile.bounds().overlaps(&bounds))
            .map(|other| other.tile.id())
            .collect();
        if !overlapping.is_empty() {
            tracing::warn!(
                tile = %id,
                overlaps = ?overlapping,
                "tile bounds overlap registered tiles; earlier registrations take precedence"
            );
        }

        self.index.insert(entry.clone());
        self.by_id.insert(id, entry);
        replaced.map(|old| old.tile)
    }

    /// Find the tile owning a WGS84 coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::NoCoveringTile`] if no registered tile
    /// contains the coordinate.
    pub fn resolve(&self, lat: f64, lon: f64) -> Result<Arc<Tile>> {
        self.index
            .locate_in_envelope_intersecting(&AABB::from_point([lon, lat]))
            .filter(|e| e.tile.contains(lat, lon))
            .min_by_key(|e| e.seq)
            .map(|e| e.tile.clone())
            .ok_or(ElevationError::NoCoveringTile { lat, lon })
    }

    /// Every tile containing the coordinate, highest precedence first.
    pub fn candidates(&self, lat: f64, lon: f64) -> Vec<Arc<Tile>> {
        let mut hits: Vec<&IndexedTile> = self
            .index
            .locate_in_envelope_intersecting(&AABB::from_point([lon, lat]))
            .filter(|e| e.tile.contains(lat, lon))
            .collect();
        hits.sort_by_key(|e| e.seq);
        hits.into_iter().map(|e| e.tile.clone()).collect()
    }

    /// Sample the highest-precedence tile whose grid holds the coordinate.
    ///
    /// Bounding boxes of reprojected tiles, and of tiles whose grids share
    /// an edge, reach past their grids. A candidate answering
    /// [`ElevationError::OutOfGrid`] hands the query to the next one; if none
    /// holds it, the first candidate's error is returned.
    ///
    /// # Errors
    ///
    /// [`ElevationError::NoCoveringTile`] when no bounding box contains the
    /// coordinate, otherwise the sampling error of the owning tile.
    pub fn sample(&self, lat: f64, lon: f64) -> Result<Option<i16>> {
        let mut hits: Vec<&IndexedTile> = self
            .index
            .locate_in_envelope_intersecting(&AABB::from_point([lon, lat]))
            .filter(|e| e.tile.contains(lat, lon))
            .collect();
        hits.sort_by_key(|e| e.seq);

        let mut outside = None;
        for entry in hits {
            match entry.tile.sample(lat, lon) {
                Err(e @ ElevationError::OutOfGrid { .. }) => {
                    outside.get_or_insert(e);
                }
                result => return result,
            }
        }
        Err(outside.unwrap_or(ElevationError::NoCoveringTile { lat, lon }))
    }

    /// Tile registered under `id`.
    pub fn get(&self, id: &str) -> Option<Arc<Tile>> {
        self.by_id.get(id).map(|e| e.tile.clone())
    }

    /// Remove a tile. Returns it if it was registered.
    pub fn unload(&mut self, id: &str) -> Option<Arc<Tile>> {
        let entry = self.by_id.remove(id)?;
        self.index.remove(&entry);
        Some(entry.tile)
    }

    /// Number of registered tiles.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` if no tiles are registered.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// All tiles, highest precedence first.
    pub fn tiles(&self) -> Vec<Arc<Tile>> {
        let mut entries: Vec<&IndexedTile> = self.by_id.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.tile.clone()).collect()
    }

    /// Union of all tile bounding boxes.
    pub fn coverage(&self) -> Option<BoundingBox> {
        self.by_id
            .values()
            .map(|e| e.tile.bounds())
            .reduce(|a, b| a.union(&b))
    }
}

impl std::fmt::Debug for TileRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileRegistry")
            .field("tiles", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::MemoryRaster;
    use crate::tile::TileOptions;

    fn tile(id: &str, north: f64, south: f64, west: f64, east: f64, value: i16) -> Tile {
        let mut raster = MemoryRaster::wgs84(north, south, west, east, 1, 1, vec![value]).unwrap();
        Tile::from_source(id, &mut raster, &TileOptions::default()).unwrap()
    }

    #[test]
    fn test_resolve_inside_bounds() {
        let mut registry = TileRegistry::new();
        registry.register(tile("west", 10.0, 0.0, 0.0, 10.0, 1));
        registry.register(tile("east", 10.0, 0.0, 10.0, 20.0, 2));
        registry.register(tile("far", 50.0, 40.0, 100.0, 110.0, 3));

        for lon in [0.0, 2.5, 7.3, 9.999] {
            assert_eq!(registry.resolve(5.0, lon).unwrap().id(), "west");
        }
        for lon in [10.0, 15.0, 19.999] {
            assert_eq!(registry.resolve(5.0, lon).unwrap().id(), "east");
        }
        assert_eq!(registry.resolve(45.0, 105.0).unwrap().id(), "far");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_no_covering_tile() {
        let mut registry = TileRegistry::new();
        registry.register(tile("a", 10.0, 0.0, 0.0, 10.0, 1));

        assert!(matches!(
            registry.resolve(20.0, 5.0),
            Err(ElevationError::NoCoveringTile { .. })
        ));
        // South edge is exclusive
        assert!(registry.resolve(0.0, 5.0).is_err());
        assert!(registry.resolve(f64::NAN, 5.0).is_err());
        assert!(TileRegistry::new().resolve(0.0, 0.0).is_err());
    }

    #[test]
    fn test_shared_edges_have_one_owner() {
        let mut registry = TileRegistry::new();
        registry.register(tile("nw", 20.0, 10.0, 0.0, 10.0, 1));
        registry.register(tile("ne", 20.0, 10.0, 10.0, 20.0, 2));
        registry.register(tile("sw", 10.0, 0.0, 0.0, 10.0, 3));
        registry.register(tile("se", 10.0, 0.0, 10.0, 20.0, 4));

        // Vertical edge at lon 10 belongs to the eastern tiles
        assert_eq!(registry.candidates(15.0, 10.0).len(), 1);
        // Horizontal edge at lat 10 belongs to the southern tiles
        assert_eq!(registry.candidates(10.0, 5.0).len(), 1);
        // Shared corner
        assert_eq!(registry.candidates(10.0, 10.0).len(), 1);

        for _ in 0..10 {
            assert_eq!(registry.resolve(15.0, 10.0).unwrap().id(), "ne");
            assert_eq!(registry.resolve(10.0, 5.0).unwrap().id(), "sw");
            assert_eq!(registry.resolve(10.0, 10.0).unwrap().id(), "se");
        }
    }

    #[test]
    fn test_overlap_first_registered_wins() {
        let mut registry = TileRegistry::new();
        registry.register(tile("coarse", 10.0, 0.0, 0.0, 10.0, 1));
        registry.register(tile("fine", 6.0, 4.0, 4.0, 6.0, 2));

        assert_eq!(registry.resolve(5.0, 5.0).unwrap().id(), "coarse");
        let ids: Vec<_> = registry
            .candidates(5.0, 5.0)
            .iter()
            .map(|t| t.id().to_string())
            .collect();
        assert_eq!(ids, vec!["coarse", "fine"]);

        // Removing the winner exposes the next candidate
        registry.unload("coarse");
        assert_eq!(registry.resolve(5.0, 5.0).unwrap().id(), "fine");
    }

    #[test]
    fn test_sample_falls_through_past_grid_edge() {
        let mut registry = TileRegistry::new();
        registry.register(tile("a", 1.0, 0.0, 0.0, 1.0, 5));
        registry.register(tile("b", 1.0, 0.0, 0.5, 1.5, 7));

        assert_eq!(registry.sample(0.7, 0.3).unwrap(), Some(5));
        // Inside a's box but rounds to col 1; b holds it
        assert_eq!(registry.resolve(0.7, 0.8).unwrap().id(), "a");
        assert_eq!(registry.sample(0.7, 0.8).unwrap(), Some(7));
        // Past every grid: the error of the first candidate
        assert!(matches!(
            registry.sample(0.7, 1.3),
            Err(ElevationError::OutOfGrid { col: 1, .. })
        ));
        assert!(matches!(
            registry.sample(5.0, 5.0),
            Err(ElevationError::NoCoveringTile { .. })
        ));

        registry.unload("b");
        assert!(matches!(
            registry.sample(0.7, 0.8),
            Err(ElevationError::OutOfGrid { col: 1, .. })
        ));
    }

    #[test]
    fn test_reregister_replaces_and_keeps_precedence() {
        let mut registry = TileRegistry::new();
        registry.register(tile("a", 10.0, 0.0, 0.0, 10.0, 1));
        registry.register(tile("b", 10.0, 0.0, 0.0, 10.0, 2));

        let replaced = registry.register(tile("a", 10.0, 0.0, 0.0, 10.0, 3));
        assert_eq!(replaced.unwrap().value_at(0, 0), Some(1));
        assert_eq!(registry.len(), 2);

        let winner = registry.resolve(5.0, 5.0).unwrap();
        assert_eq!(winner.id(), "a");
        assert_eq!(winner.value_at(0, 0), Some(3));

        let order: Vec<_> = registry.tiles().iter().map(|t| t.id().to_string()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn test_unload_and_coverage() {
        let mut registry = TileRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.coverage().is_none());

        registry.register(tile("a", 10.0, 0.0, 0.0, 10.0, 1));
        registry.register(tile("b", 5.0, -5.0, 20.0, 30.0, 2));
        assert_eq!(
            registry.coverage(),
            Some(BoundingBox::new(-5.0, 0.0, 10.0, 30.0))
        );

        assert!(registry.unload("a").is_some());
        assert!(registry.unload("a").is_none());
        assert!(registry.get("a").is_none());
        assert!(registry.get("b").is_some());
        assert!(registry.resolve(5.0, 5.0).is_err());
    }
}

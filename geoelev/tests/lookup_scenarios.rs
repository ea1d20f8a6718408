//! End-to-end lookups over three regional GeoTIFF tiles.
//!
//! The fixtures mimic a world split into a northern band and two southern
//! halves at 0.5° resolution, with known elevations planted at the cells the
//! reference locations snap to.

use std::fs::File;
use std::path::{Path, PathBuf};

use geoelev::transform::GeoTransform;
use geoelev::{BoundingBox, ElevationError, ElevationService, LookupPath, NODATA_VALUE};
use tempfile::TempDir;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

const RES: f64 = 0.5;
const GEOGRAPHIC_WGS84: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 2, 2048, 0, 1, 4326];

struct Region {
    id: &'static str,
    north: f64,
    south: f64,
    west: f64,
    east: f64,
}

const NORTH: Region = Region {
    id: "north",
    north: 60.0,
    south: 0.0,
    west: -180.0,
    east: 180.0,
};
const SOUTH_EAST: Region = Region {
    id: "south_east",
    north: 0.0,
    south: -60.0,
    west: -30.0,
    east: 180.0,
};
const SOUTH_WEST: Region = Region {
    id: "south_west",
    north: 0.0,
    south: -60.0,
    west: -180.0,
    east: -30.0,
};

/// (lat, lon, elevation)
const GOLDEN: [(f64, f64, i32); 5] = [
    (40.6778, -77.6263, 251),
    (50.56323, 10.62979, 601),
    (-32.67897, 24.20700, 744),
    (-32.28488, 150.87893, 144),
    (-0.11823, -78.35878, 2372),
];

/// A cell in the northern tile planted with nodata.
const NODATA_POINT: (f64, f64) = (45.0, 45.0);

impl Region {
    fn width(&self) -> usize {
        ((self.east - self.west) / RES) as usize
    }

    fn height(&self) -> usize {
        ((self.north - self.south) / RES) as usize
    }

    fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.south, self.west, self.north, self.east)
    }

    /// Nearest cell, as the direct lookup path snaps.
    fn cell(&self, lat: f64, lon: f64) -> (usize, usize) {
        let row = ((self.north - lat) / RES).round() as usize;
        let col = ((lon - self.west) / RES).round() as usize;
        (row, col)
    }

    /// Background samples, none of which equal a golden value.
    fn samples(&self) -> Vec<i16> {
        let (width, height) = (self.width(), self.height());
        let mut data: Vec<i16> = (0..width * height)
            .map(|i| (1000 + (i / width * 7 + i % width * 13) % 500) as i16)
            .collect();

        for &(lat, lon, elevation) in &GOLDEN {
            if self.bounds().contains(lat, lon) {
                let (row, col) = self.cell(lat, lon);
                data[row * width + col] = elevation as i16;
            }
        }
        if self.bounds().contains(NODATA_POINT.0, NODATA_POINT.1) {
            let (row, col) = self.cell(NODATA_POINT.0, NODATA_POINT.1);
            data[row * width + col] = NODATA_VALUE;
        }
        data
    }

    fn write(&self, dir: &Path) -> PathBuf {
        let path = dir.join(format!("SRTM_{}_250m.tif", self.id));
        let file = File::create(&path).unwrap();
        let mut tiff = TiffEncoder::new(file).unwrap();
        let mut image = tiff
            .new_image::<colortype::GrayI16>(self.width() as u32, self.height() as u32)
            .unwrap();
        {
            let encoder = image.encoder();
            encoder
                .write_tag(Tag::ModelPixelScaleTag, &[RES, RES, 0.0][..])
                .unwrap();
            encoder
                .write_tag(
                    Tag::ModelTiepointTag,
                    &[0.0, 0.0, 0.0, self.west, self.north, 0.0][..],
                )
                .unwrap();
            encoder
                .write_tag(Tag::GeoKeyDirectoryTag, &GEOGRAPHIC_WGS84[..])
                .unwrap();
            encoder
                .write_tag(Tag::from_u16_exhaustive(42113), "-32768")
                .unwrap();
        }
        image.write_data(&self.samples()).unwrap();
        path
    }
}

fn loaded_service(dir: &TempDir) -> ElevationService {
    let service = ElevationService::new();
    for region in [&NORTH, &SOUTH_EAST, &SOUTH_WEST] {
        let path = region.write(dir.path());
        service.load(region.id, path).unwrap();
    }
    service
}

#[test]
fn golden_locations() {
    let dir = TempDir::new().unwrap();
    let service = loaded_service(&dir);

    for (lat, lon, expected) in GOLDEN {
        assert_eq!(
            service.lookup(lat, lon),
            expected,
            "elevation at ({}, {})",
            lat,
            lon
        );
    }
}

#[test]
fn golden_locations_resolve_to_expected_tiles() {
    let dir = TempDir::new().unwrap();
    let service = loaded_service(&dir);

    let owners = ["north", "north", "south_east", "south_east", "south_west"];
    for ((lat, lon, _), owner) in GOLDEN.iter().zip(owners) {
        let tile = service.resolve(*lat, *lon).unwrap();
        assert_eq!(tile.id(), owner);
        assert_eq!(tile.lookup_path(), LookupPath::Direct);
    }
}

#[test]
fn nodata_reads_as_sea_level() {
    let dir = TempDir::new().unwrap();
    let service = loaded_service(&dir);
    let (lat, lon) = NODATA_POINT;

    assert_eq!(service.get_elevation(lat, lon).unwrap(), None);
    assert_eq!(service.lookup(lat, lon), 0);
    assert_eq!(service.stats().nodata, 2);
}

#[test]
fn uncovered_points_are_distinguishable() {
    let dir = TempDir::new().unwrap();
    let service = loaded_service(&dir);

    // North of the northern band, south of the southern halves
    for (lat, lon) in [(70.0, 0.0), (-70.0, 100.0)] {
        assert!(matches!(
            service.get_elevation(lat, lon),
            Err(ElevationError::NoCoveringTile { .. })
        ));
        assert_eq!(service.lookup(lat, lon), 0);
    }
    assert_eq!(service.stats().unresolved, 4);
}

#[test]
fn shared_edges_resolve_deterministically() {
    let dir = TempDir::new().unwrap();
    let service = loaded_service(&dir);

    // The equator belongs to the southern tiles, lon -30 to the eastern one
    let edges = [
        ((0.0, 10.0), "south_east"),
        ((0.0, -100.0), "south_west"),
        ((-10.0, -30.0), "south_east"),
        ((0.0, -30.0), "south_east"),
        ((0.3, -30.0), "north"),
    ];
    for ((lat, lon), owner) in edges {
        let first = service.lookup(lat, lon);
        for _ in 0..5 {
            assert_eq!(service.resolve(lat, lon).unwrap().id(), owner);
            assert_eq!(service.lookup(lat, lon), first);
        }
    }
}

#[test]
fn reloading_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let service = loaded_service(&dir);

    let points: Vec<(f64, f64)> = GOLDEN
        .iter()
        .map(|&(lat, lon, _)| (lat, lon))
        .chain([(12.3, 45.6), (-45.6, -123.4), (59.9, 179.0)])
        .collect();
    let before = service.get_elevations_batch(&points, i32::MIN);

    let path = NORTH.write(dir.path());
    service.load(NORTH.id, &path).unwrap();
    service.load(NORTH.id, &path).unwrap();

    assert_eq!(service.tile_count(), 3);
    assert_eq!(service.get_elevations_batch(&points, i32::MIN), before);
}

#[test]
fn directory_preload_matches_explicit_loads() {
    let dir = TempDir::new().unwrap();
    let explicit = loaded_service(&dir);

    let preloaded = ElevationService::new();
    let stats = preloaded.load_directory(dir.path(), None);
    assert_eq!(stats.tiles_loaded, 3);
    assert_eq!(stats.tiles_failed, 0);

    for (lat, lon, expected) in GOLDEN {
        assert_eq!(preloaded.lookup(lat, lon), expected);
        assert_eq!(explicit.lookup(lat, lon), expected);
    }
}

#[test]
fn coverage_spans_all_tiles() {
    let dir = TempDir::new().unwrap();
    let service = loaded_service(&dir);

    assert_eq!(
        service.coverage(),
        Some(BoundingBox::new(-60.0, -180.0, 60.0, 180.0))
    );
    let tiles = service.tiles();
    assert_eq!(tiles.len(), 3);
    assert_eq!((tiles[0].width, tiles[0].height), (720, 120));
}

#[test]
fn transform_round_trip() {
    let transforms = [
        [-180.0, 0.5, 0.0, 60.0, 0.0, -0.5],
        [138.0 - 1.0 / 2400.0, 1.0 / 1200.0, 0.0, 36.0 + 1.0 / 2400.0, 0.0, -1.0 / 1200.0],
        [10.0, 1.0, 0.5, 4.0, 0.0, -1.0],
        [500_000.0, 30.0, 2.5, 4_500_000.0, -1.5, -30.0],
        [-1.0e7, 250.0, 0.0, 8.0e6, 0.0, -250.0],
    ];
    let points = [(0.0, 0.0), (12.5, 7.25), (1200.0, 1200.0), (0.5, 719.5)];

    for coeffs in transforms {
        let gt = GeoTransform::new(coeffs).unwrap();
        for (col, row) in points {
            let (x, y) = gt.to_native(col, row);
            let (c, r) = gt.to_pixel(x, y);
            assert!((c - col).abs() < 1e-6, "{:?} col {} -> {}", coeffs, col, c);
            assert!((r - row).abs() < 1e-6, "{:?} row {} -> {}", coeffs, row, r);
        }
    }
}

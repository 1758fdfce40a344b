//! End-to-end: GeoTIFF scenes on disk -> annual composite -> zonal means.
//!
//! Two one-row, two-pixel scenes of 2013 cover a HUC6 basin: one from
//! Landsat 7 (harmonized onto the OLI scale) and one from Landsat 8 whose
//! second pixel is cloudy. The basin's sub-watersheds are one pixel each.

use approx::assert_relative_eq;
use huctrend_algorithms::composite::{make_annual, AnnualParams, ArchiveSet};
use huctrend_algorithms::statistics::{zonal_means, ZonalParams};
use huctrend_core::io::write_band_geotiff_to_buffer;
use huctrend_core::{BBox, Boundary, BoundaryCollection, GeoTransform, HucCode, HucRange, Raster};
use std::fs;
use std::path::Path;

const CLEAR: f64 = 322.0;
const CLOUD: f64 = 352.0;

fn grid() -> GeoTransform {
    GeoTransform::new(0.0, 30.0, 30.0, -30.0)
}

fn write_band(dir: &Path, file: &str, values: [f64; 2]) {
    let mut band = Raster::from_vec(values.to_vec(), 1, 2).unwrap();
    band.set_transform(grid());
    fs::write(dir.join(file), write_band_geotiff_to_buffer(&band).unwrap()).unwrap();
}

/// Write one scene's bands and return its manifest entry.
fn write_scene(
    dir: &Path,
    id: &str,
    sensor: &str,
    date: &str,
    bands: &[(&str, [f64; 2])],
) -> serde_json::Value {
    let mut files = serde_json::Map::new();
    for (name, values) in bands {
        let file = format!("{}_{}.tif", id, name);
        write_band(dir, &file, *values);
        files.insert(name.to_string(), serde_json::Value::String(file));
    }
    serde_json::json!({
        "id": id,
        "sensor": sensor,
        "acquired": date,
        "footprint": { "min_x": 0.0, "min_y": 0.0, "max_x": 60.0, "max_y": 30.0 },
        "bands": files,
    })
}

fn archives(dir: &Path) -> ArchiveSet {
    let le07 = write_scene(
        dir,
        "LE07_2013",
        "LE07",
        "2013-06-15",
        &[
            ("B1", [500.0, 500.0]),
            ("B2", [800.0, 800.0]),
            ("B3", [2000.0, 2000.0]),
            ("B4", [3000.0, 3000.0]),
            ("B5", [2000.0, 2000.0]),
            ("B7", [1000.0, 1000.0]),
            ("pixel_qa", [CLEAR, CLEAR]),
        ],
    );
    let lc08 = write_scene(
        dir,
        "LC08_2013",
        "LC08",
        "2013-07-20",
        &[
            ("B2", [500.0, 500.0]),
            ("B3", [800.0, 800.0]),
            ("B4", [1000.0, 1000.0]),
            ("B5", [3000.0, 3000.0]),
            ("B6", [2000.0, 2000.0]),
            ("B7", [1000.0, 1000.0]),
            ("pixel_qa", [CLEAR, CLOUD]),
        ],
    );
    // Outside the May-September window
    let late = write_scene(
        dir,
        "LC08_2013_late",
        "LC08",
        "2013-10-15",
        &[
            ("B2", [0.0, 0.0]),
            ("B3", [0.0, 0.0]),
            ("B4", [9000.0, 9000.0]),
            ("B5", [100.0, 100.0]),
            ("B6", [0.0, 0.0]),
            ("B7", [0.0, 0.0]),
            ("pixel_qa", [CLEAR, CLEAR]),
        ],
    );

    let manifest = serde_json::json!({ "scenes": [le07, lc08, late] });
    let path = dir.join("scenes.json");
    fs::write(&path, serde_json::to_string_pretty(&manifest).unwrap()).unwrap();
    ArchiveSet::from_manifest_file(&path).unwrap()
}

fn sub_watersheds() -> BoundaryCollection {
    let sub = |code: &str, x: f64| {
        Boundary::from_bbox(HucCode::parse(code).unwrap(), BBox::new(x, 0.0, x + 30.0, 30.0))
    };
    vec![
        sub("140200010101", 0.0),
        sub("140200010102", 30.0),
        // Neighbouring basin, same footprint
        sub("140300010101", 0.0),
    ]
    .into_iter()
    .collect()
}

// ---------------------------------------------------------------------------
// Composite
// ---------------------------------------------------------------------------

#[test]
fn annual_composite_merges_harmonized_and_oli_scenes() {
    let dir = tempfile::tempdir().unwrap();
    let archives = archives(dir.path());
    let basin = Boundary::from_bbox(HucCode::parse("140200").unwrap(), BBox::new(0.0, 0.0, 60.0, 30.0));

    let composite = make_annual(&archives, &basin, 2013, &AnnualParams::default()).unwrap();
    assert_eq!(composite.shape(), (1, 2));
    assert_eq!(composite.band_count(), 14);

    let nir = composite.band("NIR").unwrap();
    // LE07 NIR: 3000 * 1.0073 - 21 = 3000.9 -> 3001; median with LC08's 3000
    assert_relative_eq!(nir.get(0, 0).unwrap(), 3000.5, epsilon = 1e-10);
    // Cloudy in LC08, so only the harmonized LE07 value remains
    assert_eq!(nir.get(0, 1).unwrap(), 3001.0);

    // The composite NDVI is the median of per-scene NDVI values:
    // LE07 (3001 - 1943) / (3001 + 1943), LC08 (3000 - 1000) / (3000 + 1000)
    let le07_ndvi = 1058.0 / 4944.0;
    let ndvi = composite.band("NDVI").unwrap();
    let mixed = ndvi.get(0, 0).unwrap();
    assert_relative_eq!(mixed, (le07_ndvi + 0.5) / 2.0, epsilon = 1e-10);
    assert!((mixed - 0.356998).abs() < 1e-6);
    assert_relative_eq!(ndvi.get(0, 1).unwrap(), le07_ndvi, epsilon = 1e-10);
}

#[test]
fn empty_year_gives_empty_composite() {
    let dir = tempfile::tempdir().unwrap();
    let archives = archives(dir.path());
    let basin = Boundary::from_bbox(HucCode::parse("140200").unwrap(), BBox::new(0.0, 0.0, 60.0, 30.0));

    let composite = make_annual(&archives, &basin, 1990, &AnnualParams::default()).unwrap();
    assert_eq!(composite.band_count(), 14);
    assert_eq!(composite.valid_pixel_count(), 0);
}

// ---------------------------------------------------------------------------
// Zonal means
// ---------------------------------------------------------------------------

#[test]
fn zonal_means_per_sub_watershed() {
    let dir = tempfile::tempdir().unwrap();
    let archives = archives(dir.path());
    let basin = Boundary::from_bbox(HucCode::parse("140200").unwrap(), BBox::new(0.0, 0.0, 60.0, 30.0));
    let composite = make_annual(&archives, &basin, 2013, &AnnualParams::default()).unwrap();

    let range = HucRange::parse("140200000000", "140300000000").unwrap();
    assert!(range.is_aligned_to(&basin.code()));
    let zones = sub_watersheds().filter_range(&range);
    assert_eq!(zones.len(), 2);

    let table = zonal_means(&composite, &zones, &ZonalParams::default()).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.columns().last().map(String::as_str), Some("Year"));

    let first = HucCode::parse("140200010101").unwrap();
    let second = HucCode::parse("140200010102").unwrap();
    assert_eq!(table.get(&first, "NIR"), Some(3000.5));
    assert_eq!(table.get(&second, "NIR"), Some(3001.0));
    assert_eq!(table.get(&second, "Year"), Some(2013.0));
}

//! Watershed boundaries from GeoJSON
//!
//! Reads a FeatureCollection exported from the Watershed Boundary Dataset
//! (one feature per HUC6 basin or HUC12 sub-watershed). Polygon and
//! MultiPolygon features are kept; features with other geometry types or
//! without a code are skipped.

use crate::error::{Error, Result};
use crate::vector::{Boundary, BoundaryCollection, HucCode};
use geo_types::{Geometry, MultiPolygon};
use geojson::{FeatureCollection, GeoJson};
use std::fs;
use std::path::Path;

/// Which feature properties hold the code and the display name.
#[derive(Debug, Clone)]
pub struct BoundaryFields {
    pub code: String,
    pub name: Option<String>,
}

impl BoundaryFields {
    /// WBD HUC6 layer: `huc6` / `name`
    pub fn huc6() -> Self {
        Self {
            code: "huc6".into(),
            name: Some("name".into()),
        }
    }

    /// WBD HUC12 layer: `huc12` / `name`
    pub fn huc12() -> Self {
        Self {
            code: "huc12".into(),
            name: Some("name".into()),
        }
    }
}

/// Read every polygon feature of a GeoJSON file as a boundary.
pub fn read_boundaries_geojson<P: AsRef<Path>>(
    path: P,
    fields: &BoundaryFields,
) -> Result<BoundaryCollection> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_boundaries_geojson(&text, fields)
}

/// Parse a GeoJSON FeatureCollection string into boundaries.
pub fn parse_boundaries_geojson(text: &str, fields: &BoundaryFields) -> Result<BoundaryCollection> {
    let geojson: GeoJson = text.parse()?;
    let collection = FeatureCollection::try_from(geojson)?;

    let mut boundaries = BoundaryCollection::new();
    for feature in collection.features {
        let Some(code) = feature.property(&fields.code).and_then(code_from_json) else {
            continue;
        };
        let code = HucCode::parse(&code)?;

        let Some(geometry) = feature.geometry.as_ref() else {
            continue;
        };
        let geometry: Geometry<f64> = Geometry::try_from(&geometry.value)?;
        let multi = match geometry {
            Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
            Geometry::MultiPolygon(mp) => mp,
            _ => continue,
        };

        let mut boundary = Boundary::new(code, multi);
        if let Some(name) = fields
            .name
            .as_ref()
            .and_then(|key| feature.property(key))
            .and_then(|v| v.as_str())
        {
            boundary = boundary.with_name(name);
        }
        boundaries.push(boundary);
    }

    if boundaries.is_empty() {
        return Err(Error::Other(format!(
            "no polygon features with a '{}' property",
            fields.code
        )));
    }
    Ok(boundaries)
}

/// Codes are usually strings (leading zeros matter) but some exports write
/// them as numbers.
fn code_from_json(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => n.as_u64().map(|v| v.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HUC12: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {
          "type": "Feature",
          "properties": { "huc12": "140200010101", "name": "Taylor River Headwaters" },
          "geometry": { "type": "Polygon", "coordinates": [[[0,0],[30,0],[30,30],[0,30],[0,0]]] }
        },
        {
          "type": "Feature",
          "properties": { "huc12": "140200010102", "name": "Texas Creek" },
          "geometry": { "type": "MultiPolygon", "coordinates": [[[[30,0],[60,0],[60,30],[30,30],[30,0]]]] }
        },
        {
          "type": "Feature",
          "properties": { "huc12": "140200010103" },
          "geometry": { "type": "Point", "coordinates": [5, 5] }
        },
        {
          "type": "Feature",
          "properties": { "name": "no code" },
          "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] }
        }
      ]
    }"#;

    #[test]
    fn test_parse_polygons_and_multipolygons() {
        let boundaries = parse_boundaries_geojson(HUC12, &BoundaryFields::huc12()).unwrap();
        assert_eq!(boundaries.len(), 2);

        let first = &boundaries.as_slice()[0];
        assert_eq!(first.code().to_string(), "140200010101");
        assert_eq!(first.name(), Some("Taylor River Headwaters"));

        let second = &boundaries.as_slice()[1];
        assert_eq!(second.geometry().0.len(), 1);
        assert_eq!(second.bbox().unwrap().min_x, 30.0);
    }

    #[test]
    fn test_wrong_code_field_is_an_error() {
        let err = parse_boundaries_geojson(HUC12, &BoundaryFields::huc6());
        assert!(err.is_err());
    }

    #[test]
    fn test_bad_code_is_an_error() {
        let bad = HUC12.replace("140200010101", "14020001010X");
        assert!(matches!(
            parse_boundaries_geojson(&bad, &BoundaryFields::huc12()),
            Err(Error::InvalidHucCode { .. })
        ));
    }
}

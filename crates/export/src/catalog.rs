//! Watershed catalog
//!
//! One record per HUC6 basin: its sub-watershed range and the naming
//! strings used for its export tasks. The Colorado River basin catalog is
//! compiled in; other catalogs load from JSON with the same field names:
//!
//! ```json
//! [{ "ws_name": "gunnison", "HUC6": "140200",
//!    "HUC12": ["140200000000", "140300000000"], "region": "upperColorado",
//!    "export_description": "gunnison_export_",
//!    "file_name_prefix": "gunnison_subwatersheds_" }]
//! ```

use crate::error::{ExportError, Result};
use huctrend_core::{HucCode, HucRange};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// Half of the Colorado River basin a watershed drains to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "upperColorado")]
    UpperColorado,
    #[serde(rename = "lowerColorado")]
    LowerColorado,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::UpperColorado => f.write_str("upperColorado"),
            Region::LowerColorado => f.write_str("lowerColorado"),
        }
    }
}

/// A basin and the naming of its yearly exports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatershedRecord {
    #[serde(rename = "ws_name")]
    pub name: String,
    #[serde(rename = "HUC6")]
    pub huc6: HucCode,
    /// Half-open range of the basin's HUC12 codes
    #[serde(rename = "HUC12")]
    pub huc12: HucRange,
    pub region: Region,
    /// Task description prefix; the year is appended
    pub export_description: String,
    /// Output file name prefix; the year is appended
    pub file_name_prefix: String,
}

impl WatershedRecord {
    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ExportError::InvalidRecord {
            name: self.name.clone(),
            reason,
        };
        if self.huc6.digits() != 6 {
            return Err(invalid(format!("HUC6 {} does not have 6 digits", self.huc6)));
        }
        if self.huc12.lower().digits() != 12 {
            return Err(invalid(format!(
                "HUC12 bound {} does not have 12 digits",
                self.huc12.lower()
            )));
        }
        if !self.huc12.is_aligned_to(&self.huc6) {
            return Err(invalid(format!(
                "HUC12 range [{}, {}) does not start at basin {}",
                self.huc12.lower(),
                self.huc12.upper(),
                self.huc6
            )));
        }
        if self.export_description.is_empty() || self.file_name_prefix.is_empty() {
            return Err(invalid("export naming prefixes must not be empty".into()));
        }
        Ok(())
    }
}

type Row = (&'static str, &'static str, [&'static str; 2], Region, &'static str, &'static str);

const COLORADO_RIVER: [Row; 25] = {
    use Region::{LowerColorado as L, UpperColorado as U};
    [
        ("agua_fria", "150701", ["150701000000", "150702000000"], L, "aguaFria_export_", "aguaFria_subwatersheds_"),
        ("bavispe", "150803", ["150803000000", "150804000000"], L, "bavispe_export_", "bavispe_subwatersheds_"),
        ("bill_williams", "150302", ["150302000000", "150303000000"], L, "billWilliams_export_", "billWilliams_subwatersheds_"),
        ("colorado_headwaters", "140100", ["140100000000", "140200000000"], U, "coloradoHeadwaters_export_", "coloradoHeadwaters_subwatersheds_"),
        ("dirty_devil", "140700", ["140700000000", "140800000000"], U, "dirtyDevil_export_", "dirtyDevil_subwatersheds_"),
        ("great_divide", "140402", ["140402000000", "140403000000"], U, "greatDivide_export_", "greatDivide_subwatersheds_"),
        ("gunnison", "140200", ["140200000000", "140300000000"], U, "gunnison_export_", "gunnison_subwatersheds_"),
        ("la_conception", "150802", ["150802000000", "150803000000"], L, "laConception_export_", "laConception_subwatersheds_"),
        ("lake_mead", "150100", ["150100000000", "150200000000"], L, "lakeMead_export_", "lakeMead_subwatersheds_"),
        ("little_colorado", "150200", ["150200000000", "150300000000"], L, "littleColorado_export_", "littleColorado_subwatersheds_"),
        ("lower_colorado", "150301", ["150301000000", "150302000000"], L, "lowerColorado_export_", "lowerColorado_subwatersheds_"),
        ("lower_gila", "150702", ["150702000000", "150703000000"], L, "lowerGila_export_", "lowerGila_subwatersheds_"),
        ("lower_green", "140600", ["140600000000", "140700000000"], U, "lowerGreen_export_", "lowerGreen_subwatersheds_"),
        ("lower_san_juan", "140802", ["140802000000", "140803000000"], U, "lowerSanJuan_export_", "lowerSanJuan_subwatersheds_"),
        ("middle_gila", "150501", ["150501000000", "150502000000"], L, "middleGila_export_", "middleGila_subwatersheds_"),
        ("salt", "150601", ["150601000000", "150602000000"], L, "salt_export_", "salt_subwatersheds_"),
        ("san_pedro", "150502", ["150502000000", "150503000000"], L, "sanPedro_export_", "sanPedro_subwatersheds_"),
        ("santa_cruz", "150503", ["150503000000", "150504000000"], L, "santaCruz_export_", "santaCruz_subwatersheds_"),
        ("sonoyta", "150801", ["150801000000", "150802000000"], L, "sonoyta_export_", "sonoyta_subwatersheds_"),
        ("upper_colorado_dolores", "140300", ["140300000000", "140400000000"], U, "upperColoradoDolores_export_", "upperColoradoDolores_subwatersheds_"),
        ("upper_gila", "150400", ["150400000000", "150401000000"], L, "upperGila_export_", "upperGila_subwatersheds_"),
        ("upper_green", "140401", ["140401000000", "140402000000"], U, "upperGreen_export_", "upperGreen_subwatersheds_"),
        ("upper_san_juan", "140801", ["140801000000", "140802000000"], U, "upperSanJuan_export_", "upperSanJuan_subwatersheds_"),
        ("verde", "150602", ["150602000000", "150603000000"], L, "verde_export_", "verde_subwatersheds_"),
        ("white_yampa", "140500", ["140500000000", "140600000000"], U, "whiteYampa_export_", "whiteYampa_subwatersheds_"),
    ]
};

/// An ordered, validated list of watershed records with unique names
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    records: Vec<WatershedRecord>,
}

impl Catalog {
    /// The 25 sub-basins of the Colorado River, in alphabetical order
    pub fn colorado_river() -> Result<Self> {
        let records = COLORADO_RIVER
            .iter()
            .map(|(name, huc6, [lower, upper], region, description, prefix)| -> Result<WatershedRecord> {
                Ok(WatershedRecord {
                    name: name.to_string(),
                    huc6: HucCode::parse(huc6)?,
                    huc12: HucRange::parse(lower, upper)?,
                    region: *region,
                    export_description: description.to_string(),
                    file_name_prefix: prefix.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_records(records)
    }

    /// Validate records: 6-digit basins, 12-digit ranges starting at their
    /// basin, non-empty prefixes and unique names.
    pub fn from_records(records: Vec<WatershedRecord>) -> Result<Self> {
        let mut names = HashSet::new();
        for record in &records {
            record.validate()?;
            if !names.insert(record.name.as_str()) {
                return Err(ExportError::InvalidRecord {
                    name: record.name.clone(),
                    reason: "duplicate watershed name".into(),
                });
            }
        }
        Ok(Self { records })
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let records: Vec<WatershedRecord> = serde_json::from_str(text)?;
        Self::from_records(records)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WatershedRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatershedRecord> {
        self.records.iter()
    }

    /// Look a watershed up by catalog index (`"6"`) or by name (`"gunnison"`).
    pub fn find(&self, key: &str) -> Option<&WatershedRecord> {
        match key.parse::<usize>() {
            Ok(index) => self.get(index),
            Err(_) => self.records.iter().find(|r| r.name == key),
        }
    }

    /// The watershed named by `key`, or every watershed when `key` is `None`.
    pub fn select(&self, key: Option<&str>) -> Result<Vec<&WatershedRecord>> {
        match key {
            None => Ok(self.records.iter().collect()),
            Some(key) => self
                .find(key)
                .map(|r| vec![r])
                .ok_or_else(|| ExportError::UnknownWatershed(key.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorado_river_catalog() {
        let catalog = Catalog::colorado_river().unwrap();
        assert_eq!(catalog.len(), 25);

        let first = catalog.get(0).unwrap();
        assert_eq!(first.name, "agua_fria");
        assert_eq!(first.huc6.to_string(), "150701");
        assert_eq!(first.region, Region::LowerColorado);

        let last = catalog.get(24).unwrap();
        assert_eq!(last.name, "white_yampa");
        assert_eq!(last.huc12.upper().to_string(), "140600000000");

        let upper = catalog.iter().filter(|r| r.region == Region::UpperColorado).count();
        assert_eq!(upper, 10);
    }

    #[test]
    fn test_find_by_index_or_name() {
        let catalog = Catalog::colorado_river().unwrap();
        assert_eq!(catalog.find("6").unwrap().name, "gunnison");
        assert_eq!(catalog.find("gunnison").unwrap().huc6.to_string(), "140200");
        assert!(catalog.find("25").is_none());
        assert!(catalog.find("missouri").is_none());

        assert_eq!(catalog.select(None).unwrap().len(), 25);
        assert!(matches!(
            catalog.select(Some("missouri")),
            Err(ExportError::UnknownWatershed(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_uses_wbd_field_names() {
        let catalog = Catalog::colorado_river().unwrap();
        let json = catalog.to_json_string().unwrap();
        assert!(json.contains(r#""ws_name": "agua_fria""#));
        assert!(json.contains(r#""HUC12": ["#));
        assert!(json.contains(r#""region": "lowerColorado""#));

        let back = Catalog::from_json_str(&json).unwrap();
        assert_eq!(back, catalog);
    }

    #[test]
    fn test_misaligned_range_is_rejected() {
        let json = r#"[{ "ws_name": "gunnison", "HUC6": "140200",
            "HUC12": ["140100000000", "140300000000"], "region": "upperColorado",
            "export_description": "gunnison_export_",
            "file_name_prefix": "gunnison_subwatersheds_" }]"#;
        assert!(matches!(
            Catalog::from_json_str(json),
            Err(ExportError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let catalog = Catalog::colorado_river().unwrap();
        let mut records: Vec<WatershedRecord> = catalog.iter().take(2).cloned().collect();
        records[1].name = records[0].name.clone();
        assert!(Catalog::from_records(records).is_err());
    }
}

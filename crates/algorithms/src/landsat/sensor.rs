//! Landsat sensors, their archives and native band names

use huctrend_core::{Error, Image, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical band names shared by every prepared scene, in band order
pub const CANONICAL_BANDS: [&str; 7] = ["B", "G", "R", "NIR", "SWIR1", "SWIR2", "QA"];

/// The six reflectance bands of [`CANONICAL_BANDS`]
pub const REFLECTANCE_BANDS: [&str; 6] = ["B", "G", "R", "NIR", "SWIR1", "SWIR2"];

/// Name of the pixel quality band after normalization
pub const QA_BAND: &str = "QA";

/// Radiometric family of a sensor.
///
/// TM (Landsat 4/5) and ETM+ (Landsat 7) share band numbering and
/// radiometry; OLI (Landsat 8) renumbers the bands and reads slightly
/// differently, so older scenes are harmonized onto the OLI scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorFamily {
    /// TM / ETM+ (the older family)
    Etm,
    /// OLI (the newer family)
    Oli,
}

impl SensorFamily {
    /// Native band names, aligned with [`CANONICAL_BANDS`]
    pub fn source_bands(&self) -> &'static [&'static str; 7] {
        match self {
            SensorFamily::Etm => &["B1", "B2", "B3", "B4", "B5", "B7", "pixel_qa"],
            SensorFamily::Oli => &["B2", "B3", "B4", "B5", "B6", "B7", "pixel_qa"],
        }
    }
}

/// A Landsat surface reflectance archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sensor {
    #[serde(rename = "LT04")]
    Landsat4,
    #[serde(rename = "LT05")]
    Landsat5,
    #[serde(rename = "LE07")]
    Landsat7,
    #[serde(rename = "LC08")]
    Landsat8,
}

impl Sensor {
    /// Every archive merged into an annual composite
    pub const ALL: [Sensor; 4] = [
        Sensor::Landsat4,
        Sensor::Landsat5,
        Sensor::Landsat7,
        Sensor::Landsat8,
    ];

    /// Short product code (`LT04`, `LT05`, `LE07`, `LC08`)
    pub fn short_name(&self) -> &'static str {
        match self {
            Sensor::Landsat4 => "LT04",
            Sensor::Landsat5 => "LT05",
            Sensor::Landsat7 => "LE07",
            Sensor::Landsat8 => "LC08",
        }
    }

    /// Collection 1 Tier 1 surface reflectance archive id
    pub fn archive_id(&self) -> &'static str {
        match self {
            Sensor::Landsat4 => "LANDSAT/LT04/C01/T1_SR",
            Sensor::Landsat5 => "LANDSAT/LT05/C01/T1_SR",
            Sensor::Landsat7 => "LANDSAT/LE07/C01/T1_SR",
            Sensor::Landsat8 => "LANDSAT/LC08/C01/T1_SR",
        }
    }

    pub fn family(&self) -> SensorFamily {
        match self {
            Sensor::Landsat4 | Sensor::Landsat5 | Sensor::Landsat7 => SensorFamily::Etm,
            Sensor::Landsat8 => SensorFamily::Oli,
        }
    }

    /// Native band names read from this archive
    pub fn source_bands(&self) -> &'static [&'static str; 7] {
        self.family().source_bands()
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Sensor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Sensor::ALL
            .into_iter()
            .find(|sensor| sensor.short_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidParameter {
                name: "sensor",
                value: s.to_string(),
                reason: "expected one of LT04, LT05, LE07, LC08".into(),
            })
    }
}

/// Select the six reflectance bands and the QA band of a raw scene and
/// rename them to [`CANONICAL_BANDS`]. Other bands are dropped; properties
/// are kept. A missing source band is an error.
pub fn normalize(scene: &Image, family: SensorFamily) -> Result<Image> {
    scene.select_renamed(family.source_bands(), &CANONICAL_BANDS)
}

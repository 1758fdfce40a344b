//! Scenes and the scene query used to assemble one year's stack

use crate::landsat::Sensor;
use chrono::{Datelike, NaiveDate};
use geo::Intersects;
use geo_types::MultiPolygon;
use huctrend_core::{BBox, Boundary, Error, Image, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Years covered by the merged TM / ETM+ / OLI archives
pub const LANDSAT_YEARS: RangeInclusive<i32> = 1985..=2020;

/// Descriptive fields of an archived scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMetadata {
    /// Archive-unique scene id, e.g. `LC08_035034_20170712`
    pub id: String,
    pub sensor: Sensor,
    /// Acquisition date
    pub acquired: NaiveDate,
    /// Envelope of the scene's valid data
    pub footprint: BBox,
}

/// A raw scene: native bands plus metadata
#[derive(Debug, Clone)]
pub struct Scene {
    pub metadata: SceneMetadata,
    pub image: Image,
}

impl Scene {
    /// Pair an image with its metadata. The id, sensor and date are also
    /// stamped on the image as properties.
    pub fn new(metadata: SceneMetadata, image: Image) -> Self {
        let image = image
            .set_property("system:index", metadata.id.as_str())
            .set_property("SENSOR", metadata.sensor.short_name())
            .set_property("DATE_ACQUIRED", metadata.acquired.to_string());
        Self { metadata, image }
    }
}

/// Inclusive calendar-month window applied in every year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonWindow {
    pub start_month: u32,
    pub end_month: u32,
}

impl SeasonWindow {
    pub fn new(start_month: u32, end_month: u32) -> Result<Self> {
        if !(1..=12).contains(&start_month) || !(1..=12).contains(&end_month) {
            return Err(Error::InvalidParameter {
                name: "season",
                value: format!("{}-{}", start_month, end_month),
                reason: "months must be between 1 and 12".into(),
            });
        }
        if start_month > end_month {
            return Err(Error::InvalidParameter {
                name: "season",
                value: format!("{}-{}", start_month, end_month),
                reason: "start month must not be after end month".into(),
            });
        }
        Ok(Self {
            start_month,
            end_month,
        })
    }

    pub fn contains_month(&self, month: u32) -> bool {
        (self.start_month..=self.end_month).contains(&month)
    }
}

impl Default for SeasonWindow {
    /// May through September
    fn default() -> Self {
        Self {
            start_month: 5,
            end_month: 9,
        }
    }
}

/// Selects the scenes of one year and season whose footprint touches a
/// region.
#[derive(Debug, Clone)]
pub struct SceneQuery {
    year: i32,
    season: SeasonWindow,
    region: MultiPolygon<f64>,
    region_bbox: Option<BBox>,
}

impl SceneQuery {
    pub fn new(year: i32, season: SeasonWindow, region: &Boundary) -> Self {
        Self {
            year,
            season,
            region: region.geometry().clone(),
            region_bbox: region.bbox(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn season(&self) -> SeasonWindow {
        self.season
    }

    /// Year, season and footprint test
    pub fn matches(&self, metadata: &SceneMetadata) -> bool {
        let date = metadata.acquired;
        date.year() == self.year
            && self.season.contains_month(date.month())
            && self.touches(&metadata.footprint)
    }

    fn touches(&self, footprint: &BBox) -> bool {
        let Some(region_bbox) = self.region_bbox else {
            return false;
        };
        if !region_bbox.intersects(footprint) {
            return false;
        }
        self.region.intersects(&footprint.to_polygon())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huctrend_core::HucCode;

    fn basin() -> Boundary {
        Boundary::from_bbox(
            HucCode::parse("140200").unwrap(),
            BBox::new(0.0, 0.0, 100.0, 100.0),
        )
    }

    fn meta(date: &str, footprint: BBox) -> SceneMetadata {
        SceneMetadata {
            id: "LT05_test".into(),
            sensor: Sensor::Landsat5,
            acquired: date.parse().unwrap(),
            footprint,
        }
    }

    #[test]
    fn test_season_window() {
        let season = SeasonWindow::default();
        assert!(!season.contains_month(4));
        assert!(season.contains_month(5));
        assert!(season.contains_month(9));
        assert!(!season.contains_month(10));
        assert!(SeasonWindow::new(9, 5).is_err());
        assert!(SeasonWindow::new(0, 5).is_err());
    }

    #[test]
    fn test_query_filters_year_season_and_bounds() {
        let query = SceneQuery::new(1999, SeasonWindow::default(), &basin());
        let inside = BBox::new(50.0, 50.0, 150.0, 150.0);
        let outside = BBox::new(200.0, 200.0, 300.0, 300.0);

        assert!(query.matches(&meta("1999-05-01", inside)));
        assert!(query.matches(&meta("1999-09-30", inside)));
        assert!(!query.matches(&meta("1999-04-30", inside)));
        assert!(!query.matches(&meta("1999-10-01", inside)));
        assert!(!query.matches(&meta("2000-07-15", inside)));
        assert!(!query.matches(&meta("1999-07-15", outside)));
    }

    #[test]
    fn test_scene_stamps_properties() {
        let image = Image::new(1, 1, Default::default());
        let scene = Scene::new(meta("1999-07-15", BBox::new(0.0, 0.0, 1.0, 1.0)), image);
        assert_eq!(
            scene.image.property("DATE_ACQUIRED").map(|v| v.to_string()),
            Some("1999-07-15".to_string())
        );
        assert_eq!(
            scene.image.property("SENSOR").map(|v| v.to_string()),
            Some("LT05".to_string())
        );
    }
}

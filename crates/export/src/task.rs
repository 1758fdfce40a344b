//! Export requests: one named CSV task per (watershed, year)

use crate::catalog::WatershedRecord;
use crate::error::{ExportError, Result};
use huctrend_algorithms::composite::LANDSAT_YEARS;
use serde::{Deserialize, Serialize};

/// File format of every export
pub const EXPORT_FORMAT: &str = "CSV";

/// A request handed to an [`ExportSink`](crate::sink::ExportSink)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Task description, e.g. `gunnison_export_2003`
    pub description: String,
    /// Bucket or directory the sink writes into
    pub destination: String,
    /// Output file name without extension, e.g. `gunnison_subwatersheds_2003`
    pub file_name_prefix: String,
    pub format: String,
}

impl ExportRequest {
    /// Name the export of `record` for `year`. The year is rendered with
    /// four digits after the record's prefixes.
    pub fn for_year(record: &WatershedRecord, year: i32, destination: &str) -> Self {
        Self {
            description: format!("{}{:04}", record.export_description, year),
            destination: destination.to_string(),
            file_name_prefix: format!("{}{:04}", record.file_name_prefix, year),
            format: EXPORT_FORMAT.to_string(),
        }
    }

    /// `{file_name_prefix}.csv`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.file_name_prefix, self.format.to_ascii_lowercase())
    }
}

/// Inclusive, ascending range of years inside the archive coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    first: i32,
    last: i32,
}

impl YearRange {
    pub fn new(first: i32, last: i32) -> Result<Self> {
        let invalid = |reason: String| ExportError::InvalidYears { first, last, reason };
        if first > last {
            return Err(invalid("first year is after last year".into()));
        }
        if !LANDSAT_YEARS.contains(&first) || !LANDSAT_YEARS.contains(&last) {
            return Err(invalid(format!(
                "years must lie in {}-{}",
                LANDSAT_YEARS.start(),
                LANDSAT_YEARS.end()
            )));
        }
        Ok(Self { first, last })
    }

    /// A single year
    pub fn single(year: i32) -> Result<Self> {
        Self::new(year, year)
    }

    pub fn first(&self) -> i32 {
        self.first
    }

    pub fn last(&self) -> i32 {
        self.last
    }

    pub fn len(&self) -> usize {
        (self.last - self.first + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Years in ascending order
    pub fn years(&self) -> Vec<i32> {
        (self.first..=self.last).collect()
    }
}

impl Default for YearRange {
    /// 1985-2020
    fn default() -> Self {
        Self {
            first: *LANDSAT_YEARS.start(),
            last: *LANDSAT_YEARS.end(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_request_naming() {
        let catalog = Catalog::colorado_river().unwrap();
        let record = catalog.find("agua_fria").unwrap();
        let req = ExportRequest::for_year(record, 1985, "huc-trends");

        assert_eq!(req.description, "aguaFria_export_1985");
        assert_eq!(req.file_name_prefix, "aguaFria_subwatersheds_1985");
        assert_eq!(req.destination, "huc-trends");
        assert_eq!(req.format, "CSV");
        assert_eq!(req.file_name(), "aguaFria_subwatersheds_1985.csv");
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let catalog = Catalog::colorado_river().unwrap();
        let req = ExportRequest::for_year(catalog.find("salt").unwrap(), 2020, "bucket");
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""fileNamePrefix":"salt_subwatersheds_2020""#));
        assert!(json.contains(r#""format":"CSV""#));
    }

    #[test]
    fn test_year_range() {
        let all = YearRange::default();
        assert_eq!(all.len(), 36);
        assert_eq!(all.years().first(), Some(&1985));
        assert_eq!(all.years().last(), Some(&2020));

        assert_eq!(YearRange::single(2003).unwrap().years(), [2003]);
        assert!(YearRange::new(2001, 2000).is_err());
        assert!(YearRange::new(1984, 2000).is_err());
        assert!(YearRange::new(2000, 2021).is_err());
    }
}

//! Batch driver: composite, reduce and export every year of a watershed
//!
//! Each (watershed, year) job only reads shared inputs and produces its
//! own table, so years run independently under the chosen
//! [`ProcessingMode`].

use crate::catalog::WatershedRecord;
use crate::error::{ExportError, Result};
use crate::sink::{ExportReceipt, ExportSink};
use crate::task::{ExportRequest, YearRange};
use huctrend_algorithms::composite::{make_annual, AnnualParams, ArchiveSet};
use huctrend_algorithms::statistics::{zonal_means, ZonalParams};
use huctrend_core::io::{read_boundaries_geojson, BoundaryFields};
use huctrend_core::{Boundary, BoundaryCollection};
use huctrend_parallel::{ParallelStrategy, ProcessingMode};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Basin polygons (HUC6) and sub-watershed polygons (HUC12)
#[derive(Debug, Clone, Default)]
pub struct BoundarySource {
    pub basins: BoundaryCollection,
    pub sub_watersheds: BoundaryCollection,
}

impl BoundarySource {
    pub fn new(basins: BoundaryCollection, sub_watersheds: BoundaryCollection) -> Self {
        Self {
            basins,
            sub_watersheds,
        }
    }

    /// Load the WBD HUC6 and HUC12 layers from GeoJSON files.
    pub fn from_geojson_files<P: AsRef<Path>, Q: AsRef<Path>>(huc6: P, huc12: Q) -> Result<Self> {
        let basins = read_boundaries_geojson(huc6, &BoundaryFields::huc6())?;
        let sub_watersheds = read_boundaries_geojson(huc12, &BoundaryFields::huc12())?;
        debug!(
            basins = basins.len(),
            sub_watersheds = sub_watersheds.len(),
            "loaded boundaries"
        );
        Ok(Self::new(basins, sub_watersheds))
    }

    /// The basin polygon with the record's HUC6 code
    pub fn basin(&self, record: &WatershedRecord) -> Result<&Boundary> {
        self.basins
            .find(&record.huc6)
            .ok_or(ExportError::MissingBasin(record.huc6))
    }

    /// Sub-watersheds whose HUC12 code falls in the record's range
    pub fn sub_watersheds(&self, record: &WatershedRecord) -> BoundaryCollection {
        self.sub_watersheds.filter_range(&record.huc12)
    }
}

/// Runs the annual pipeline for every year of a watershed and hands each
/// table to a sink.
pub struct BatchRunner<'a> {
    archives: &'a ArchiveSet,
    boundaries: &'a BoundarySource,
    sink: &'a dyn ExportSink,
    destination: String,
    years: YearRange,
    mode: ProcessingMode,
    annual: AnnualParams,
    zonal: ZonalParams,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        archives: &'a ArchiveSet,
        boundaries: &'a BoundarySource,
        sink: &'a dyn ExportSink,
    ) -> Self {
        Self {
            archives,
            boundaries,
            sink,
            destination: String::new(),
            years: YearRange::default(),
            mode: ProcessingMode::default(),
            annual: AnnualParams::default(),
            zonal: ZonalParams::default(),
        }
    }

    /// Bucket or directory name every request targets
    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    pub fn years(mut self, years: YearRange) -> Self {
        self.years = years;
        self
    }

    pub fn mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn annual_params(mut self, params: AnnualParams) -> Self {
        self.annual = params;
        self
    }

    pub fn zonal_params(mut self, params: ZonalParams) -> Self {
        self.zonal = params;
        self
    }

    /// The requests a run of `record` would submit, without computing
    /// anything.
    pub fn plan(&self, record: &WatershedRecord) -> Vec<ExportRequest> {
        plan_requests(record, &self.years, &self.destination)
    }

    /// Composite, reduce and export one year.
    pub fn run_year(
        &self,
        record: &WatershedRecord,
        basin: &Boundary,
        zones: &BoundaryCollection,
        year: i32,
    ) -> Result<ExportReceipt> {
        let composite = make_annual(self.archives, basin, year, &self.annual)?;
        let table = zonal_means(&composite, zones, &self.zonal)?;
        let request = ExportRequest::for_year(record, year, &self.destination);
        self.sink.submit(&request, &table)
    }

    /// Run every year of `record`, calling `on_done` after each export.
    /// Receipts come back in year order.
    pub fn run_with_progress<F>(&self, record: &WatershedRecord, on_done: F) -> Result<Vec<ExportReceipt>>
    where
        F: Fn(&ExportReceipt) + Sync + Send,
    {
        let start = Instant::now();
        let basin = self.boundaries.basin(record)?;
        let zones = self.boundaries.sub_watersheds(record);
        if zones.is_empty() {
            warn!(
                watershed = %record.name,
                lower = %record.huc12.lower(),
                upper = %record.huc12.upper(),
                "no sub-watersheds in range; tables will be empty"
            );
        }
        info!(
            watershed = %record.name,
            sink = self.sink.name(),
            zones = zones.len(),
            first = self.years.first(),
            last = self.years.last(),
            "running watershed"
        );

        let receipts = self.mode.try_par_map(&self.years.years(), |&year| {
            let receipt = self.run_year(record, basin, &zones, year)?;
            on_done(&receipt);
            Ok::<_, ExportError>(receipt)
        })?;

        info!(
            watershed = %record.name,
            exports = receipts.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "watershed done"
        );
        Ok(receipts)
    }

    pub fn run(&self, record: &WatershedRecord) -> Result<Vec<ExportReceipt>> {
        self.run_with_progress(record, |_| {})
    }
}

/// Requests for every year of `years`, in ascending order
pub fn plan_requests(
    record: &WatershedRecord,
    years: &YearRange,
    destination: &str,
) -> Vec<ExportRequest> {
    years
        .years()
        .into_iter()
        .map(|year| ExportRequest::for_year(record, year, destination))
        .collect()
}

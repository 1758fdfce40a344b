//! # huctrend Export
//!
//! Turns the annual pipeline into one CSV per watershed and year.
//!
//! - **catalog**: watershed records (basin code, sub-watershed range, naming)
//! - **task**: export request naming and year ranges
//! - **sink**: where tables go (local CSV files, or a dry run)
//! - **batch**: the per-watershed driver over all years

pub mod batch;
pub mod catalog;
pub mod error;
pub mod sink;
pub mod task;

pub use batch::{plan_requests, BatchRunner, BoundarySource};
pub use catalog::{Catalog, Region, WatershedRecord};
pub use error::{ExportError, Result};
pub use sink::{write_stats_csv, DryRunSink, ExportReceipt, ExportSink, LocalCsvSink};
pub use task::{ExportRequest, YearRange, EXPORT_FORMAT};

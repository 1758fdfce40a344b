//! Export sinks
//!
//! A sink receives one [`ExportRequest`] plus its table per
//! (watershed, year). [`LocalCsvSink`] writes CSV files under a root
//! directory; [`DryRunSink`] only records what would have been written.

use crate::error::{ExportError, Result};
use crate::task::ExportRequest;
use huctrend_algorithms::statistics::StatsTable;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// What a sink did with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    pub description: String,
    /// Where the table ended up (a file path, or the would-be path)
    pub location: String,
    pub rows: usize,
}

/// Destination for exported tables. Submissions from different years may
/// arrive concurrently.
pub trait ExportSink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Store `table` as described by `request`.
    fn submit(&self, request: &ExportRequest, table: &StatsTable) -> Result<ExportReceipt>;
}

/// Write `table` as CSV: `huc12`, `name`, then one column per table
/// column. Missing values are written as empty fields.
pub fn write_stats_csv<W: Write>(table: &StatsTable, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["huc12".to_string(), "name".to_string()];
    header.extend(table.columns().iter().cloned());
    csv.write_record(&header)?;

    for row in table.rows() {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.code.to_string());
        record.push(row.name.clone().unwrap_or_default());
        record.extend(
            row.values
                .iter()
                .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
        );
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Local CSV files
// ---------------------------------------------------------------------------

/// Writes `{root}/{destination}/{fileNamePrefix}.csv`
#[derive(Debug, Clone)]
pub struct LocalCsvSink {
    root: PathBuf,
}

impl LocalCsvSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a request is written to
    pub fn path_for(&self, request: &ExportRequest) -> PathBuf {
        self.root.join(&request.destination).join(request.file_name())
    }
}

impl ExportSink for LocalCsvSink {
    fn name(&self) -> &str {
        "local-csv"
    }

    fn submit(&self, request: &ExportRequest, table: &StatsTable) -> Result<ExportReceipt> {
        let path = self.path_for(request);
        let dir = path
            .parent()
            .ok_or_else(|| ExportError::SinkUnavailable(path.display().to_string()))?;
        fs::create_dir_all(dir)?;

        let file = File::create(&path)?;
        write_stats_csv(table, BufWriter::new(file))?;

        info!(
            task = %request.description,
            path = %path.display(),
            rows = table.len(),
            "exported"
        );
        Ok(ExportReceipt {
            description: request.description.clone(),
            location: path.display().to_string(),
            rows: table.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

/// Records every submission without writing anything
#[derive(Debug, Default)]
pub struct DryRunSink {
    receipts: Mutex<Vec<ExportReceipt>>,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receipts recorded so far, in submission order
    pub fn receipts(&self) -> Vec<ExportReceipt> {
        self.receipts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ExportSink for DryRunSink {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn submit(&self, request: &ExportRequest, table: &StatsTable) -> Result<ExportReceipt> {
        let receipt = ExportReceipt {
            description: request.description.clone(),
            location: format!("{}/{}", request.destination, request.file_name()),
            rows: table.len(),
        };
        debug!(task = %receipt.description, location = %receipt.location, "dry run");
        self.receipts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(receipt.clone());
        Ok(receipt)
    }
}

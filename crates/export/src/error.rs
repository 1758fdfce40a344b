//! Error types for catalog handling and exports

use huctrend_core::HucCode;
use thiserror::Error;

/// Errors raised while planning or running exports
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown watershed '{0}'")]
    UnknownWatershed(String),

    #[error("invalid catalog record '{name}': {reason}")]
    InvalidRecord { name: String, reason: String },

    #[error("year range {first}-{last} is invalid: {reason}")]
    InvalidYears { first: i32, last: i32, reason: String },

    #[error("basin {0} is not in the boundary file")]
    MissingBasin(HucCode),

    #[error(transparent)]
    Core(#[from] huctrend_core::Error),

    #[error(transparent)]
    Parallel(#[from] huctrend_parallel::ParallelError),

    #[error("export sink '{0}' is unavailable")]
    SinkUnavailable(String),
}

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

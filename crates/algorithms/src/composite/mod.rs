//! Annual composites
//!
//! - `scene`: scene metadata and the year / season / footprint query
//! - `archive`: per-sensor scene sources
//! - `grid`: output grid and nearest-neighbour resampling
//! - `median`: NaN-skipping per-pixel median
//! - `annual`: the annual composite builder

mod annual;
mod archive;
mod grid;
mod median;
mod scene;

pub use annual::{make_annual, AnnualComposite, AnnualParams};
pub use archive::{
    ArchiveSet, InMemoryArchive, ManifestArchive, ManifestEntry, SceneArchive, SceneManifest,
};
pub use grid::{CompositeGrid, DEFAULT_CELL_SIZE};
pub use median::{median_composite, median_of};
pub use scene::{Scene, SceneMetadata, SceneQuery, SeasonWindow, LANDSAT_YEARS};

//! # huctrend Core
//!
//! Core types and I/O for building annual Landsat composites over
//! watershed boundaries.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced grid
//! - `Image`: Named bands on one shared grid, plus scalar properties
//! - `Boundary` / `BoundaryCollection`: HUC-coded watershed polygons
//! - `HucRange`: Half-open code range used to select sub-watersheds
//! - I/O for single-band GeoTIFFs and GeoJSON boundary files

pub mod error;
pub mod image;
pub mod io;
pub mod raster;
pub mod vector;

pub use error::{Error, Result};
pub use image::{Image, PropertyValue};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use vector::{BBox, Boundary, BoundaryCollection, HucCode, HucRange};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image::{Image, PropertyValue};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::{BBox, Boundary, BoundaryCollection, HucCode, HucRange};
    pub use crate::Algorithm;
}

/// Core trait for the pipeline stages.
///
/// Stages are pure functions: they consume inputs and parameters and
/// return a new value without touching shared state.
pub trait Algorithm {
    /// Input type for the stage
    type Input;
    /// Output type for the stage
    type Output;
    /// Parameters controlling stage behavior
    type Params: Default;
    /// Error type for stage execution
    type Error: std::error::Error;

    /// Returns the stage name
    fn name(&self) -> &'static str;

    /// Returns a description of what the stage does
    fn description(&self) -> &'static str;

    /// Execute the stage
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}

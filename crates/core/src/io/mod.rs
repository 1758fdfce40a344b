//! Reading scene bands and watershed boundaries from disk

mod boundaries;
mod geotiff;

pub use boundaries::{parse_boundaries_geojson, read_boundaries_geojson, BoundaryFields};
pub use geotiff::{read_band_geotiff, read_band_geotiff_from_buffer, write_band_geotiff_to_buffer};

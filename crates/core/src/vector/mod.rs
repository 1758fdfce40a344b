//! Vector types: bounding boxes, HUC codes and watershed boundaries

mod bbox;
mod boundary;
mod huc;

pub use bbox::BBox;
pub use boundary::{Boundary, BoundaryCollection};
pub use huc::{HucCode, HucRange};

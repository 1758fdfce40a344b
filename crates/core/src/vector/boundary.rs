//! Watershed boundaries identified by hydrologic unit code

use super::{BBox, HucCode, HucRange};
use geo_types::{MultiPolygon, Polygon};

/// A watershed polygon (basin or sub-watershed).
#[derive(Debug, Clone)]
pub struct Boundary {
    code: HucCode,
    name: Option<String>,
    geometry: MultiPolygon<f64>,
    bbox: Option<BBox>,
}

impl Boundary {
    pub fn new(code: HucCode, geometry: MultiPolygon<f64>) -> Self {
        let bbox = BBox::of_multi_polygon(&geometry);
        Self {
            code,
            name: None,
            geometry,
            bbox,
        }
    }

    pub fn from_polygon(code: HucCode, polygon: Polygon<f64>) -> Self {
        Self::new(code, MultiPolygon::new(vec![polygon]))
    }

    /// Convenience constructor for an axis-aligned rectangular boundary.
    pub fn from_bbox(code: HucCode, bbox: BBox) -> Self {
        Self::from_polygon(code, bbox.to_polygon())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn code(&self) -> HucCode {
        self.code
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    /// Envelope of the geometry; `None` for an empty geometry.
    pub fn bbox(&self) -> Option<BBox> {
        self.bbox
    }
}

/// An ordered set of boundaries, used both as a spatial filter and as the
/// zones of a zonal reduction.
#[derive(Debug, Clone, Default)]
pub struct BoundaryCollection {
    boundaries: Vec<Boundary>,
}

impl BoundaryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, boundary: Boundary) {
        self.boundaries.push(boundary);
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Boundary> {
        self.boundaries.iter()
    }

    pub fn as_slice(&self) -> &[Boundary] {
        &self.boundaries
    }

    /// The boundary with exactly this code.
    pub fn find(&self, code: &HucCode) -> Option<&Boundary> {
        self.boundaries.iter().find(|b| b.code == *code)
    }

    /// Boundaries whose code falls in the half-open `range`, in input order.
    pub fn filter_range(&self, range: &HucRange) -> BoundaryCollection {
        self.boundaries
            .iter()
            .filter(|b| range.contains(&b.code))
            .cloned()
            .collect()
    }

    /// Union of every member's envelope.
    pub fn bbox(&self) -> Option<BBox> {
        self.boundaries
            .iter()
            .filter_map(Boundary::bbox)
            .reduce(|a, b| a.union(&b))
    }
}

impl FromIterator<Boundary> for BoundaryCollection {
    fn from_iter<I: IntoIterator<Item = Boundary>>(iter: I) -> Self {
        Self {
            boundaries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for BoundaryCollection {
    type Item = Boundary;
    type IntoIter = std::vec::IntoIter<Boundary>;

    fn into_iter(self) -> Self::IntoIter {
        self.boundaries.into_iter()
    }
}

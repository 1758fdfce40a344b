//! Axis-aligned bounding boxes in map coordinates

use geo_types::{coord, MultiPolygon, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Envelope of every vertex of a multipolygon, or `None` when it has none.
    pub fn of_multi_polygon(geometry: &MultiPolygon<f64>) -> Option<Self> {
        let mut coords = geometry
            .0
            .iter()
            .flat_map(|poly| poly.exterior().coords());

        let first = coords.next()?;
        let init = Self::new(first.x, first.y, first.x, first.y);
        Some(coords.fold(init, |b, c| {
            Self::new(b.min_x.min(c.x), b.min_y.min(c.y), b.max_x.max(c.x), b.max_y.max(c.y))
        }))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Whether the two boxes share interior area. Touching edges do not count.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Overlapping part of the two boxes, if any.
    pub fn intersection(&self, other: &BBox) -> Option<BBox> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        ))
    }

    /// The box as a closed rectangular polygon
    pub fn to_polygon(&self) -> Polygon<f64> {
        Rect::new(
            coord! { x: self.min_x, y: self.min_y },
            coord! { x: self.max_x, y: self.max_y },
        )
        .to_polygon()
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &BBox) -> BBox {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    #[test]
    fn test_intersects() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&BBox::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!a.intersects(&BBox::new(10.0, 0.0, 20.0, 10.0)));
        assert!(!a.intersects(&BBox::new(20.0, 20.0, 30.0, 30.0)));
    }

    #[test]
    fn test_intersection_and_union() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(5.0, -5.0, 15.0, 5.0);
        assert_eq!(a.intersection(&b), Some(BBox::new(5.0, 0.0, 10.0, 5.0)));
        assert_eq!(a.union(&b), BBox::new(0.0, -5.0, 15.0, 10.0));
    }

    #[test]
    fn test_of_multi_polygon() {
        let poly = polygon![(x: 1.0, y: 2.0), (x: 4.0, y: 2.0), (x: 4.0, y: 7.0), (x: 1.0, y: 2.0)];
        let bbox = BBox::of_multi_polygon(&MultiPolygon::new(vec![poly])).unwrap();
        assert_eq!(bbox, BBox::new(1.0, 2.0, 4.0, 7.0));
        assert!(BBox::of_multi_polygon(&MultiPolygon::new(vec![])).is_none());
    }
}

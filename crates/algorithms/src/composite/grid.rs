//! Output grid of a composite and nearest-neighbour resampling onto it

use crate::maybe_rayon::*;
use huctrend_core::{BBox, Error, GeoTransform, Image, Raster, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Default composite resolution in map units (Landsat's 30 m)
pub const DEFAULT_CELL_SIZE: f64 = 30.0;

/// A north-up grid every scene of a composite is resampled onto
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeGrid {
    pub transform: GeoTransform,
    pub rows: usize,
    pub cols: usize,
}

impl CompositeGrid {
    pub fn new(transform: GeoTransform, rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        Ok(Self {
            transform,
            rows,
            cols,
        })
    }

    /// Smallest grid of `cell_size` cells covering `bbox`, with its origin
    /// snapped to a multiple of `cell_size`.
    pub fn covering(bbox: &BBox, cell_size: f64) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(Error::InvalidParameter {
                name: "cell_size",
                value: cell_size.to_string(),
                reason: "must be a positive number".into(),
            });
        }
        let min_x = (bbox.min_x / cell_size).floor() * cell_size;
        let max_y = (bbox.max_y / cell_size).ceil() * cell_size;
        let max_x = (bbox.max_x / cell_size).ceil() * cell_size;
        let min_y = (bbox.min_y / cell_size).floor() * cell_size;

        let cols = (((max_x - min_x) / cell_size).round() as usize).max(1);
        let rows = (((max_y - min_y) / cell_size).round() as usize).max(1);

        Self::new(GeoTransform::new(min_x, max_y, cell_size, -cell_size), rows, cols)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn bounds(&self) -> BBox {
        self.transform.bounds(self.cols, self.rows)
    }

    /// Resample every band of `image` onto this grid. Each output cell
    /// takes the value of the source cell under its centre; cells outside
    /// the source are no-data. Properties are kept.
    pub fn resample(&self, image: &Image) -> Result<Image> {
        if image.shape() == self.shape() && *image.transform() == self.transform {
            return Ok(image.clone());
        }

        let lookup = self.source_cells(image);
        let mut out = Image::new(self.rows, self.cols, self.transform).copy_properties(image);
        for (name, band) in image.bands() {
            out = out.with_band(name, self.take(band, &lookup)?)?;
        }
        Ok(out)
    }

    /// For every output cell, the source cell under its centre
    fn source_cells(&self, image: &Image) -> Vec<Option<(usize, usize)>> {
        let (src_rows, src_cols) = image.shape();
        let src = *image.transform();
        let cols = self.cols;

        (0..self.rows)
            .into_par_iter()
            .flat_map(|row| {
                (0..cols)
                    .map(|col| {
                        let (x, y) = self.transform.pixel_to_geo(col, row);
                        src.cell_at(x, y, src_rows, src_cols)
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn take(&self, band: &Raster<f64>, lookup: &[Option<(usize, usize)>]) -> Result<Raster<f64>> {
        let data: Vec<f64> = lookup
            .iter()
            .map(|cell| match cell {
                Some((r, c)) => unsafe { band.get_unchecked(*r, *c) },
                None => f64::NAN,
            })
            .collect();
        let data = Array2::from_shape_vec(self.shape(), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        let mut raster = Raster::from_array(data);
        raster.set_transform(self.transform);
        raster.set_nodata(Some(f64::NAN));
        Ok(raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covering_snaps_to_cells() {
        let grid = CompositeGrid::covering(&BBox::new(10.0, 5.0, 95.0, 61.0), 30.0).unwrap();
        assert_eq!(grid.transform.origin_x, 0.0);
        assert_eq!(grid.transform.origin_y, 90.0);
        assert_eq!(grid.shape(), (3, 4));
        assert_eq!(grid.bounds(), BBox::new(0.0, 0.0, 120.0, 90.0));
    }

    #[test]
    fn test_covering_rejects_bad_cell_size() {
        let bbox = BBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(CompositeGrid::covering(&bbox, 0.0).is_err());
        assert!(CompositeGrid::covering(&bbox, f64::NAN).is_err());
    }

    #[test]
    fn test_resample_nearest_and_outside() {
        // Source: 2x2 cells of 30 m starting at (30, 60)
        let src = Raster::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        let image = Image::new(2, 2, GeoTransform::new(30.0, 60.0, 30.0, -30.0))
            .with_band("NIR", src)
            .unwrap()
            .set_property("SENSOR", "LC08");

        // Target: 2x3 cells of 30 m starting at (0, 60)
        let grid = CompositeGrid::new(GeoTransform::new(0.0, 60.0, 30.0, -30.0), 2, 3).unwrap();
        let out = grid.resample(&image).unwrap();
        let nir = out.band("NIR").unwrap();

        assert!(nir.get(0, 0).unwrap().is_nan());
        assert_eq!(nir.get(0, 1).unwrap(), 1.0);
        assert_eq!(nir.get(0, 2).unwrap(), 2.0);
        assert_eq!(nir.get(1, 2).unwrap(), 4.0);
        assert!(out.property("SENSOR").is_some());
    }

    #[test]
    fn test_resample_same_grid_is_identity() {
        let gt = GeoTransform::new(0.0, 30.0, 30.0, -30.0);
        let image = Image::new(1, 1, gt).with_band("R", Raster::filled(1, 1, 7.0)).unwrap();
        let grid = CompositeGrid::new(gt, 1, 1).unwrap();
        assert_eq!(grid.resample(&image).unwrap().band("R").unwrap().get(0, 0).unwrap(), 7.0);
    }
}

//! Multi-band images
//!
//! An [`Image`] is an ordered list of named `f64` bands sharing one grid,
//! plus scalar properties such as the composite `Year`. NaN marks a pixel
//! with no data in that band. Every transformation returns a new image;
//! bands are never modified in place once they belong to an image.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};
use crate::vector::BBox;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scalar image property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl PropertyValue {
    /// Numeric view of the property; text has none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Named bands on a shared grid, plus scalar properties.
#[derive(Debug, Clone)]
pub struct Image {
    rows: usize,
    cols: usize,
    transform: GeoTransform,
    bands: Vec<(String, Raster<f64>)>,
    properties: BTreeMap<String, PropertyValue>,
}

impl Image {
    /// An image with no bands on the given grid
    pub fn new(rows: usize, cols: usize, transform: GeoTransform) -> Self {
        Self {
            rows,
            cols,
            transform,
            bands: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// An image whose bands are all no-data
    pub fn nodata<S: AsRef<str>>(
        rows: usize,
        cols: usize,
        transform: GeoTransform,
        band_names: &[S],
    ) -> Result<Self> {
        band_names.iter().try_fold(Self::new(rows, cols, transform), |img, name| {
            img.with_band(name.as_ref(), Raster::filled(rows, cols, f64::NAN))
        })
    }

    /// Build an image from named bands. The grid is taken from the first band.
    pub fn from_bands<S, I>(bands: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Raster<f64>)>,
    {
        let mut iter = bands.into_iter().peekable();
        let (rows, cols, transform) = match iter.peek() {
            Some((_, r)) => (r.rows(), r.cols(), *r.transform()),
            None => return Err(Error::Other("an image needs at least one band".into())),
        };
        iter.try_fold(Self::new(rows, cols, transform), |img, (name, raster)| {
            img.with_band(name, raster)
        })
    }

    // Grid

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Map extent of the grid
    pub fn bounds(&self) -> BBox {
        self.transform.bounds(self.cols, self.rows)
    }

    // Bands

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.iter().any(|(n, _)| n == name)
    }

    pub fn band(&self, name: &str) -> Result<&Raster<f64>> {
        self.bands
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
            .ok_or_else(|| Error::MissingBand(name.to_string()))
    }

    /// Iterate over `(name, band)` in band order
    pub fn bands(&self) -> impl Iterator<Item = (&str, &Raster<f64>)> {
        self.bands.iter().map(|(n, r)| (n.as_str(), r))
    }

    /// Return a new image with `raster` appended as band `name`.
    ///
    /// The raster must match the image grid; it is re-stamped with the
    /// image transform and NaN no-data.
    pub fn with_band(mut self, name: impl Into<String>, mut raster: Raster<f64>) -> Result<Self> {
        let name = name.into();
        if raster.shape() != self.shape() {
            return Err(Error::SizeMismatch {
                er: self.rows,
                ec: self.cols,
                ar: raster.rows(),
                ac: raster.cols(),
            });
        }
        if self.has_band(&name) {
            return Err(Error::DuplicateBand(name));
        }
        raster.set_transform(self.transform);
        raster.set_nodata(Some(f64::NAN));
        self.bands.push((name, raster));
        Ok(self)
    }

    /// Append several bands at once
    pub fn with_bands<S, I>(self, bands: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Raster<f64>)>,
    {
        bands
            .into_iter()
            .try_fold(self, |img, (name, raster)| img.with_band(name, raster))
    }

    /// Keep only `names`, in the given order. Properties are kept.
    pub fn select(&self, names: &[&str]) -> Result<Self> {
        self.select_renamed(names, names)
    }

    /// Keep bands `from`, renaming each to the matching entry of `to`.
    /// Bands not listed are dropped. Properties are kept.
    pub fn select_renamed(&self, from: &[&str], to: &[&str]) -> Result<Self> {
        if from.len() != to.len() {
            return Err(Error::InvalidParameter {
                name: "to",
                value: format!("{:?}", to),
                reason: format!("expected {} names", from.len()),
            });
        }
        let mut out = self.without_bands();
        for (src, dst) in from.iter().zip(to) {
            out = out.with_band(*dst, self.band(src)?.clone())?;
        }
        Ok(out)
    }

    /// Same grid and properties, no bands
    pub fn without_bands(&self) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            transform: self.transform,
            bands: Vec::new(),
            properties: self.properties.clone(),
        }
    }

    /// Return a new image where every band is no-data wherever `valid` is
    /// false. Pixels already no-data stay no-data.
    pub fn update_mask(&self, valid: &Array2<bool>) -> Result<Self> {
        if valid.dim() != self.shape() {
            let (ar, ac) = valid.dim();
            return Err(Error::SizeMismatch {
                er: self.rows,
                ec: self.cols,
                ar,
                ac,
            });
        }
        let mut out = self.clone();
        for (_, raster) in out.bands.iter_mut() {
            Zip::from(raster.data_mut()).and(valid).for_each(|v, &keep| {
                if !keep {
                    *v = f64::NAN;
                }
            });
        }
        Ok(out)
    }

    /// Number of pixels where at least one band holds a value
    pub fn valid_pixel_count(&self) -> usize {
        let mut any_valid = Array2::from_elem(self.shape(), false);
        for (_, raster) in &self.bands {
            Zip::from(&mut any_valid)
                .and(raster.data())
                .for_each(|acc, v| *acc |= !v.is_nan());
        }
        any_valid.iter().filter(|&&v| v).count()
    }

    // Properties

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    pub fn set_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Copy every property of `source` onto this image, overwriting
    /// properties with the same key.
    pub fn copy_properties(mut self, source: &Image) -> Self {
        self.properties
            .extend(source.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

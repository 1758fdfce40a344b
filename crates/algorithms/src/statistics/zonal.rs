//! Zonal means over watershed polygons
//!
//! For every zone, the image is sampled on a lattice of `scale` spacing
//! anchored at the image origin; samples whose point falls inside the
//! zone polygon contribute to the per-band mean. With `scale` equal to the
//! image resolution the samples are exactly the pixel centres. No-data
//! samples are skipped band by band.

use crate::maybe_rayon::*;
use geo::Contains;
use geo_types::Point;
use huctrend_core::{Algorithm, BBox, Boundary, BoundaryCollection, Error, HucCode, Image, Raster, Result};
use tracing::{debug, warn};

/// Parameters for [`zonal_means`]
#[derive(Debug, Clone)]
pub struct ZonalParams {
    /// Sampling resolution in map units. Default: 30
    pub scale: f64,
    /// Number of strips each zone is split into for parallel reduction.
    /// Affects scheduling only, never the result. Default: 4
    pub tile_scale: usize,
}

impl Default for ZonalParams {
    fn default() -> Self {
        Self {
            scale: 30.0,
            tile_scale: 4,
        }
    }
}

/// One zone's row of a [`StatsTable`]
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneRow {
    pub code: HucCode,
    pub name: Option<String>,
    /// One value per table column; `None` where the zone had no valid sample
    pub values: Vec<Option<f64>>,
    /// Samples that fell inside the zone and on the image grid
    pub pixel_count: usize,
}

/// Per-zone means: one row per zone in input order, one column per band
/// followed by one per numeric image property (such as `Year`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatsTable {
    columns: Vec<String>,
    rows: Vec<ZoneRow>,
}

impl StatsTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; it must have one value per column.
    pub fn push(&mut self, row: ZoneRow) -> Result<()> {
        if row.values.len() != self.columns.len() {
            return Err(Error::InvalidParameter {
                name: "row",
                value: row.code.to_string(),
                reason: format!(
                    "has {} values for {} columns",
                    row.values.len(),
                    self.columns.len()
                ),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ZoneRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Value of `column` for the zone `code`
    pub fn get(&self, code: &HucCode, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.rows
            .iter()
            .find(|r| r.code == *code)
            .and_then(|r| r.values[idx])
    }
}

/// Mean of every band of `image` within each zone of `zones`.
///
/// A zone that misses the image, or covers only no-data pixels in a band,
/// gets `None` for that band. Numeric image properties are repeated on
/// every row.
pub fn zonal_means(
    image: &Image,
    zones: &BoundaryCollection,
    params: &ZonalParams,
) -> Result<StatsTable> {
    if !(params.scale.is_finite() && params.scale > 0.0) {
        return Err(Error::InvalidParameter {
            name: "scale",
            value: params.scale.to_string(),
            reason: "must be a positive number".into(),
        });
    }
    if params.tile_scale == 0 {
        return Err(Error::InvalidParameter {
            name: "tile_scale",
            value: "0".into(),
            reason: "must be at least 1".into(),
        });
    }

    let bands: Vec<&Raster<f64>> = image.bands().map(|(_, r)| r).collect();
    let constants: Vec<(String, f64)> = image
        .properties()
        .iter()
        .filter_map(|(k, v)| v.as_f64().map(|v| (k.clone(), v)))
        .collect();

    let mut columns: Vec<String> = image.band_names().iter().map(|s| s.to_string()).collect();
    columns.extend(constants.iter().map(|(k, _)| k.clone()));
    let mut table = StatsTable::new(columns);

    let sampler = Sampler {
        image,
        bands: &bands,
        scale: params.scale,
        tile_scale: params.tile_scale,
    };
    let reduced: Vec<(Vec<Option<f64>>, usize)> = zones
        .as_slice()
        .par_iter()
        .map(|zone| sampler.zone_means(zone))
        .collect();

    let mut empty = 0usize;
    for (zone, (mut values, pixel_count)) in zones.iter().zip(reduced) {
        if pixel_count == 0 {
            empty += 1;
            debug!(zone = %zone.code(), "zone has no samples on the image");
        }
        values.extend(constants.iter().map(|(_, v)| Some(*v)));
        table.push(ZoneRow {
            code: zone.code(),
            name: zone.name().map(str::to_string),
            values,
            pixel_count,
        })?;
    }
    if empty > 0 {
        warn!(empty, zones = zones.len(), "zones without samples");
    }
    Ok(table)
}

/// Accumulated sums for one strip of one zone
#[derive(Debug, Clone)]
struct Partial {
    sums: Vec<f64>,
    counts: Vec<usize>,
    pixels: usize,
}

impl Partial {
    fn new(bands: usize) -> Self {
        Self {
            sums: vec![0.0; bands],
            counts: vec![0; bands],
            pixels: 0,
        }
    }

    fn merge(mut self, other: Partial) -> Self {
        for (s, o) in self.sums.iter_mut().zip(&other.sums) {
            *s += o;
        }
        for (c, o) in self.counts.iter_mut().zip(&other.counts) {
            *c += o;
        }
        self.pixels += other.pixels;
        self
    }
}

struct Sampler<'a> {
    image: &'a Image,
    bands: &'a [&'a Raster<f64>],
    scale: f64,
    tile_scale: usize,
}

impl Sampler<'_> {
    fn zone_means(&self, zone: &Boundary) -> (Vec<Option<f64>>, usize) {
        let none = (vec![None; self.bands.len()], 0);
        let Some(area) = zone
            .bbox()
            .and_then(|zb| zb.intersection(&self.image.bounds()))
        else {
            return none;
        };

        let (row_range, col_range) = self.lattice(&area);
        if row_range.is_empty() || col_range.is_empty() {
            return none;
        }

        let strips = split(row_range, self.tile_scale);
        let partials: Vec<Partial> = strips
            .into_par_iter()
            .map(|rows| self.reduce_strip(zone, rows, col_range.clone()))
            .collect();
        let total = partials
            .into_iter()
            .fold(Partial::new(self.bands.len()), Partial::merge);

        let means = total
            .sums
            .iter()
            .zip(&total.counts)
            .map(|(&s, &c)| (c > 0).then(|| s / c as f64))
            .collect();
        (means, total.pixels)
    }

    /// Lattice rows and columns whose sample point may fall in `area`
    fn lattice(&self, area: &BBox) -> (std::ops::Range<i64>, std::ops::Range<i64>) {
        let gt = self.image.transform();
        let s = self.scale;
        let c0 = ((area.min_x - gt.origin_x) / s).floor() as i64;
        let c1 = ((area.max_x - gt.origin_x) / s).ceil() as i64;
        let r0 = ((gt.origin_y - area.max_y) / s).floor() as i64;
        let r1 = ((gt.origin_y - area.min_y) / s).ceil() as i64;
        (r0..r1, c0..c1)
    }

    fn reduce_strip(
        &self,
        zone: &Boundary,
        rows: std::ops::Range<i64>,
        cols: std::ops::Range<i64>,
    ) -> Partial {
        let gt = self.image.transform();
        let (img_rows, img_cols) = self.image.shape();
        let mut acc = Partial::new(self.bands.len());

        for j in rows {
            let y = gt.origin_y - (j as f64 + 0.5) * self.scale;
            for i in cols.clone() {
                let x = gt.origin_x + (i as f64 + 0.5) * self.scale;
                if !zone.geometry().contains(&Point::new(x, y)) {
                    continue;
                }
                let Some((row, col)) = gt.cell_at(x, y, img_rows, img_cols) else {
                    continue;
                };
                acc.pixels += 1;
                for (b, band) in self.bands.iter().enumerate() {
                    let v = unsafe { band.get_unchecked(row, col) };
                    if !v.is_nan() {
                        acc.sums[b] += v;
                        acc.counts[b] += 1;
                    }
                }
            }
        }
        acc
    }
}

/// Split `range` into at most `parts` contiguous, non-empty pieces.
fn split(range: std::ops::Range<i64>, parts: usize) -> Vec<std::ops::Range<i64>> {
    let len = (range.end - range.start).max(0);
    let parts = (parts as i64).clamp(1, len.max(1));
    let step = (len + parts - 1) / parts;
    (0..parts)
        .map(|p| {
            let start = range.start + p * step;
            start..(start + step).min(range.end)
        })
        .filter(|r| !r.is_empty())
        .collect()
}

/// Zonal means as a pipeline stage
#[derive(Debug, Clone, Default)]
pub struct ZonalMean;

impl Algorithm for ZonalMean {
    type Input = (Image, BoundaryCollection);
    type Output = StatsTable;
    type Params = ZonalParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "ZonalMean"
    }

    fn description(&self) -> &'static str {
        "Mean of every band within each zone polygon"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (image, zones) = input;
        zonal_means(&image, &zones, &params)
    }
}

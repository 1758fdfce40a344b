//! Annual growing-season median composites

use super::archive::ArchiveSet;
use super::grid::{CompositeGrid, DEFAULT_CELL_SIZE};
use super::median::median_composite;
use super::scene::{SceneQuery, SeasonWindow, LANDSAT_YEARS};
use crate::landsat::{composite_band_names, prepare_with, HarmonizationCoefficients};
use crate::maybe_rayon::*;
use huctrend_core::{Algorithm, Boundary, Error, Image, Result};
use tracing::{debug, info, warn};

/// Parameters for [`make_annual`]
#[derive(Debug, Clone)]
pub struct AnnualParams {
    /// Months of each year that contribute scenes (default May-September)
    pub season: SeasonWindow,
    /// Output resolution in map units (default 30)
    pub cell_size: f64,
    /// TM / ETM+ to OLI coefficients
    pub harmonization: HarmonizationCoefficients,
}

impl Default for AnnualParams {
    fn default() -> Self {
        Self {
            season: SeasonWindow::default(),
            cell_size: DEFAULT_CELL_SIZE,
            harmonization: HarmonizationCoefficients::ETM_TO_OLI,
        }
    }
}

/// Build the median composite of every prepared scene of `year` whose
/// footprint touches `basin`.
///
/// Scenes from all archives are prepared, resampled onto a grid covering
/// the basin envelope and reduced band by band with a NaN-skipping median.
/// The result carries the canonical bands, the spectral indices and a
/// `Year` property. With no matching scenes every band is no-data.
pub fn make_annual(
    archives: &ArchiveSet,
    basin: &Boundary,
    year: i32,
    params: &AnnualParams,
) -> Result<Image> {
    if !LANDSAT_YEARS.contains(&year) {
        return Err(Error::InvalidParameter {
            name: "year",
            value: year.to_string(),
            reason: format!(
                "must be between {} and {}",
                LANDSAT_YEARS.start(),
                LANDSAT_YEARS.end()
            ),
        });
    }
    let bbox = basin.bbox().ok_or_else(|| Error::InvalidParameter {
        name: "basin",
        value: basin.code().to_string(),
        reason: "boundary has an empty geometry".into(),
    })?;

    let grid = CompositeGrid::covering(&bbox, params.cell_size)?;
    let query = SceneQuery::new(year, params.season, basin);
    let band_names = composite_band_names();

    let mut prepared = Vec::new();
    for archive in archives.iter() {
        let scenes = archive.select(&query)?;
        debug!(
            sensor = %archive.sensor(),
            archive = archive.sensor().archive_id(),
            year,
            scenes = scenes.len(),
            "selected scenes"
        );
        let images: Vec<Image> = scenes
            .par_iter()
            .map(|scene| {
                let image = prepare_with(&scene.image, scene.metadata.sensor, &params.harmonization)?;
                grid.resample(&image)
            })
            .collect::<Result<_>>()?;
        prepared.extend(images);
    }

    let composite = if prepared.is_empty() {
        warn!(basin = %basin.code(), year, "no scenes matched; composite is empty");
        Image::nodata(grid.rows, grid.cols, grid.transform, &band_names)?
    } else {
        median_composite(&prepared, &band_names)?
    };

    info!(
        basin = %basin.code(),
        year,
        scenes = prepared.len(),
        rows = grid.rows,
        cols = grid.cols,
        "annual composite"
    );
    Ok(composite.set_property("Year", year))
}

/// Annual compositing over a fixed set of archives as a pipeline stage
#[derive(Debug, Default)]
pub struct AnnualComposite {
    pub archives: ArchiveSet,
}

impl AnnualComposite {
    pub fn new(archives: ArchiveSet) -> Self {
        Self { archives }
    }
}

impl Algorithm for AnnualComposite {
    type Input = (Boundary, i32);
    type Output = Image;
    type Params = AnnualParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "AnnualComposite"
    }

    fn description(&self) -> &'static str {
        "Median of all cloud-masked, harmonized scenes of one growing season"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (basin, year) = input;
        make_annual(&self.archives, &basin, year, &params)
    }
}

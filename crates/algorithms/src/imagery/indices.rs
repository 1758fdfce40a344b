//! Spectral indices over canonical Landsat bands
//!
//! Every index works on surface reflectance as delivered (scaled by
//! 10000), so the soil and canopy constants of EVI, SAVI and MSAVI are
//! applied to scaled values, matching the published composites.
//! No-data (NaN) in any input band, a zero denominator, or a negative
//! square-root argument yields NaN.

use crate::maybe_rayon::*;
use huctrend_core::raster::Raster;
use huctrend_core::{Error, Image, Result};
use ndarray::Array2;

/// The derived bands appended to every prepared scene, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectralIndex {
    /// Normalized Difference Vegetation Index
    Ndvi,
    /// Normalized Difference Moisture Index
    Ndmi,
    /// Enhanced Vegetation Index
    Evi,
    /// Soil Adjusted Vegetation Index
    Savi,
    /// Modified Soil Adjusted Vegetation Index
    Msavi,
    /// Normalized Burn Ratio
    Nbr,
    /// Normalized Burn Ratio 2
    Nbr2,
}

impl SpectralIndex {
    /// All indices in band order
    pub const ALL: [SpectralIndex; 7] = [
        SpectralIndex::Ndvi,
        SpectralIndex::Ndmi,
        SpectralIndex::Evi,
        SpectralIndex::Savi,
        SpectralIndex::Msavi,
        SpectralIndex::Nbr,
        SpectralIndex::Nbr2,
    ];

    /// Band name of the index
    pub fn band_name(&self) -> &'static str {
        match self {
            SpectralIndex::Ndvi => "NDVI",
            SpectralIndex::Ndmi => "NDMI",
            SpectralIndex::Evi => "EVI",
            SpectralIndex::Savi => "SAVI",
            SpectralIndex::Msavi => "MSAVI",
            SpectralIndex::Nbr => "NBR",
            SpectralIndex::Nbr2 => "NBR2",
        }
    }

    /// Canonical input bands the index reads
    pub fn inputs(&self) -> &'static [&'static str] {
        match self {
            SpectralIndex::Ndvi => &["NIR", "R"],
            SpectralIndex::Ndmi => &["NIR", "SWIR1"],
            SpectralIndex::Evi => &["NIR", "R", "B"],
            SpectralIndex::Savi => &["NIR", "R"],
            SpectralIndex::Msavi => &["NIR", "R"],
            SpectralIndex::Nbr => &["NIR", "SWIR2"],
            SpectralIndex::Nbr2 => &["SWIR1", "SWIR2"],
        }
    }

    /// Compute the index from an image holding the canonical bands.
    pub fn compute(&self, image: &Image) -> Result<Raster<f64>> {
        let band = |name| image.band(name);
        match self {
            SpectralIndex::Ndvi => ndvi(band("NIR")?, band("R")?),
            SpectralIndex::Ndmi => ndmi(band("NIR")?, band("SWIR1")?),
            SpectralIndex::Evi => evi(band("NIR")?, band("R")?, band("B")?, EviParams::default()),
            SpectralIndex::Savi => savi(band("NIR")?, band("R")?, SaviParams::default()),
            SpectralIndex::Msavi => msavi(band("NIR")?, band("R")?),
            SpectralIndex::Nbr => nbr(band("NIR")?, band("SWIR2")?),
            SpectralIndex::Nbr2 => nbr2(band("SWIR1")?, band("SWIR2")?),
        }
    }
}

/// Append all seven index bands (NDVI, NDMI, EVI, SAVI, MSAVI, NBR, NBR2)
/// to an image holding the canonical reflectance bands.
///
/// Existing bands and properties are kept unchanged.
pub fn add_spectral_indices(image: &Image) -> Result<Image> {
    let mut out = image.clone();
    for index in SpectralIndex::ALL {
        let raster = index.compute(image)?;
        out = out.with_band(index.band_name(), raster)?;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Generic normalized difference
// ---------------------------------------------------------------------------

/// Compute the normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Pixels where the sum is zero or either band is no-data are NaN.
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(band_a, band_b)?;

    let (rows, cols) = band_a.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };

                if a.is_nan() || b.is_nan() {
                    continue;
                }

                let sum = a + b;
                if sum == 0.0 {
                    continue;
                }

                row_data[col] = (a - b) / sum;
            }
            row_data
        })
        .collect();

    build_output(band_a, rows, cols, data)
}

/// `NDVI = (NIR - R) / (NIR + R)`
pub fn ndvi(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, red)
}

/// `NDMI = (NIR - SWIR1) / (NIR + SWIR1)`
///
/// Tracks canopy water content.
pub fn ndmi(nir: &Raster<f64>, swir1: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, swir1)
}

/// `NBR = (NIR - SWIR2) / (NIR + SWIR2)`
///
/// Low values indicate burned areas.
pub fn nbr(nir: &Raster<f64>, swir2: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, swir2)
}

/// `NBR2 = (SWIR1 - SWIR2) / (SWIR1 + SWIR2)`
pub fn nbr2(swir1: &Raster<f64>, swir2: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(swir1, swir2)
}

// ---------------------------------------------------------------------------
// SAVI
// ---------------------------------------------------------------------------

/// Parameters for SAVI
#[derive(Debug, Clone)]
pub struct SaviParams {
    /// Soil brightness correction factor. Default: 0.5
    pub l_factor: f64,
}

impl Default for SaviParams {
    fn default() -> Self {
        Self { l_factor: 0.5 }
    }
}

/// Soil Adjusted Vegetation Index (Huete, 1988)
///
/// `SAVI = ((NIR - R) / (NIR + R + L)) * (1 + L)`
pub fn savi(nir: &Raster<f64>, red: &Raster<f64>, params: SaviParams) -> Result<Raster<f64>> {
    check_dimensions(nir, red)?;

    let (rows, cols) = nir.shape();
    let l = params.l_factor;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let n = unsafe { nir.get_unchecked(row, col) };
                let r = unsafe { red.get_unchecked(row, col) };

                if n.is_nan() || r.is_nan() {
                    continue;
                }

                let denom = n + r + l;
                if denom == 0.0 {
                    continue;
                }

                row_data[col] = ((n - r) / denom) * (1.0 + l);
            }
            row_data
        })
        .collect();

    build_output(nir, rows, cols, data)
}

// ---------------------------------------------------------------------------
// EVI
// ---------------------------------------------------------------------------

/// Parameters for EVI
#[derive(Debug, Clone)]
pub struct EviParams {
    /// Gain factor (default: 2.5)
    pub g: f64,
    /// Aerosol coefficient for red band (default: 6.0)
    pub c1: f64,
    /// Aerosol coefficient for blue band (default: 7.5)
    pub c2: f64,
    /// Canopy background adjustment (default: 1.0)
    pub l: f64,
}

impl Default for EviParams {
    fn default() -> Self {
        Self {
            g: 2.5,
            c1: 6.0,
            c2: 7.5,
            l: 1.0,
        }
    }
}

/// Enhanced Vegetation Index (Huete et al., 2002)
///
/// `EVI = G * (NIR - R) / (NIR + C1 * R - C2 * B + L)`
pub fn evi(
    nir: &Raster<f64>,
    red: &Raster<f64>,
    blue: &Raster<f64>,
    params: EviParams,
) -> Result<Raster<f64>> {
    check_dimensions(nir, red)?;
    check_dimensions(nir, blue)?;

    let (rows, cols) = nir.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let n = unsafe { nir.get_unchecked(row, col) };
                let r = unsafe { red.get_unchecked(row, col) };
                let b = unsafe { blue.get_unchecked(row, col) };

                if n.is_nan() || r.is_nan() || b.is_nan() {
                    continue;
                }

                let denom = n + params.c1 * r - params.c2 * b + params.l;
                if denom == 0.0 {
                    continue;
                }

                row_data[col] = params.g * (n - r) / denom;
            }
            row_data
        })
        .collect();

    build_output(nir, rows, cols, data)
}

// ---------------------------------------------------------------------------
// MSAVI
// ---------------------------------------------------------------------------

/// Modified Soil Adjusted Vegetation Index (Qi et al., 1994)
///
/// `MSAVI = (2 * NIR + 1 - sqrt((2 * NIR + 1)^2 - 8 * (NIR - R))) / 2`
///
/// A negative square-root argument yields NaN.
pub fn msavi(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(nir, red)?;

    let (rows, cols) = nir.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let n = unsafe { nir.get_unchecked(row, col) };
                let r = unsafe { red.get_unchecked(row, col) };

                if n.is_nan() || r.is_nan() {
                    continue;
                }

                let a = 2.0 * n + 1.0;
                let radicand = a * a - 8.0 * (n - r);
                if radicand < 0.0 {
                    continue;
                }

                row_data[col] = (a - radicand.sqrt()) / 2.0;
            }
            row_data
        })
        .collect();

    build_output(nir, rows, cols, data)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_dimensions(a: &Raster<f64>, b: &Raster<f64>) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(Error::SizeMismatch {
            er: a.rows(),
            ec: a.cols(),
            ar: b.rows(),
            ac: b.cols(),
        });
    }
    Ok(())
}

fn build_output(
    template: &Raster<f64>,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
) -> Result<Raster<f64>> {
    let data =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    let mut output = template.with_data(data)?;
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use huctrend_core::GeoTransform;

    fn make_band(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::new(0.0, rows as f64 * 30.0, 30.0, -30.0));
        r
    }

    fn canonical(b: f64, g: f64, r: f64, nir: f64, swir1: f64, swir2: f64) -> Image {
        Image::from_bands([
            ("B", make_band(3, 3, b)),
            ("G", make_band(3, 3, g)),
            ("R", make_band(3, 3, r)),
            ("NIR", make_band(3, 3, nir)),
            ("SWIR1", make_band(3, 3, swir1)),
            ("SWIR2", make_band(3, 3, swir2)),
            ("QA", make_band(3, 3, 322.0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_ndvi() {
        let nir = make_band(5, 5, 3000.0);
        let red = make_band(5, 5, 1000.0);

        let val = ndvi(&nir, &red).unwrap().get(2, 2).unwrap();
        assert!((val - 0.5).abs() < 1e-10, "Expected 0.5, got {}", val);
    }

    #[test]
    fn test_normalized_difference_zero_sum_is_nodata() {
        let a = make_band(3, 3, 0.0);
        let b = make_band(3, 3, 0.0);

        let result = normalized_difference(&a, &b).unwrap();
        assert!(result.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn test_equal_bands_give_zero() {
        let x = make_band(3, 3, 1234.0);
        for f in [ndvi, ndmi, nbr, nbr2] {
            assert_eq!(f(&x, &x).unwrap().get(1, 1).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_tiny_sum_is_not_nodata() {
        let a = make_band(2, 2, 5e-11);
        let b = make_band(2, 2, 0.0);

        let result = normalized_difference(&a, &b).unwrap();
        assert_eq!(result.get(0, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_ndmi_nbr_nbr2() {
        let nir = make_band(3, 3, 3000.0);
        let swir1 = make_band(3, 3, 2000.0);
        let swir2 = make_band(3, 3, 1000.0);

        let v = ndmi(&nir, &swir1).unwrap().get(0, 0).unwrap();
        assert!((v - 0.2).abs() < 1e-10, "NDMI: got {}", v);

        let v = nbr(&nir, &swir2).unwrap().get(0, 0).unwrap();
        assert!((v - 0.5).abs() < 1e-10, "NBR: got {}", v);

        let v = nbr2(&swir1, &swir2).unwrap().get(0, 0).unwrap();
        assert!((v - 1.0 / 3.0).abs() < 1e-10, "NBR2: got {}", v);
    }

    #[test]
    fn test_savi() {
        let nir = make_band(5, 5, 3000.0);
        let red = make_band(5, 5, 1000.0);

        let val = savi(&nir, &red, SaviParams::default()).unwrap().get(2, 2).unwrap();

        // 1.5 * 2000 / 4000.5
        let expected = 1.5 * 2000.0 / 4000.5;
        assert!((val - expected).abs() < 1e-10, "Expected {}, got {}", expected, val);
    }

    #[test]
    fn test_evi() {
        let nir = make_band(5, 5, 3000.0);
        let red = make_band(5, 5, 1000.0);
        let blue = make_band(5, 5, 500.0);

        let val = evi(&nir, &red, &blue, EviParams::default())
            .unwrap()
            .get(2, 2)
            .unwrap();

        // 2.5 * 2000 / (3000 + 6000 - 3750 + 1)
        let expected = 2.5 * 2000.0 / 5251.0;
        assert!((val - expected).abs() < 1e-10, "Expected {}, got {}", expected, val);
    }

    #[test]
    fn test_evi_zero_denominator_is_nodata() {
        // 0.875 + 6 * 0 - 7.5 * 0.25 + 1 == 0
        let nir = make_band(2, 2, 0.875);
        let red = make_band(2, 2, 0.0);
        let blue = make_band(2, 2, 0.25);

        let result = evi(&nir, &red, &blue, EviParams::default()).unwrap();
        assert!(result.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_msavi() {
        let nir = make_band(3, 3, 3000.0);
        let red = make_band(3, 3, 1000.0);

        let val = msavi(&nir, &red).unwrap().get(1, 1).unwrap();

        let a: f64 = 6001.0;
        let expected = (a - (a * a - 16000.0).sqrt()) / 2.0;
        assert!((val - expected).abs() < 1e-10, "Expected {}, got {}", expected, val);
        assert!(val > 0.0 && val < 2.0);
    }

    #[test]
    fn test_msavi_negative_radicand_is_nodata() {
        // (2 * 0.45 + 1)^2 - 8 * (0.45 + 0.5) = 3.61 - 7.6
        let nir = make_band(2, 2, 0.45);
        let red = make_band(2, 2, -0.5);

        let result = msavi(&nir, &red).unwrap();
        assert!(result.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_nodata_propagates() {
        let mut nir = make_band(3, 3, 3000.0);
        nir.set(1, 1, f64::NAN).unwrap();
        let red = make_band(3, 3, 1000.0);

        let result = ndvi(&nir, &red).unwrap();
        assert!(result.get(1, 1).unwrap().is_nan());
        assert!(!result.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = make_band(3, 3, 1.0);
        let b = make_band(4, 4, 1.0);
        assert!(matches!(normalized_difference(&a, &b), Err(Error::SizeMismatch { .. })));
    }

    #[test]
    fn test_add_spectral_indices_band_order() {
        let img = canonical(500.0, 800.0, 1000.0, 3000.0, 2000.0, 1000.0);
        let out = add_spectral_indices(&img).unwrap();

        assert_eq!(
            out.band_names(),
            [
                "B", "G", "R", "NIR", "SWIR1", "SWIR2", "QA", "NDVI", "NDMI", "EVI", "SAVI",
                "MSAVI", "NBR", "NBR2"
            ]
        );
        let ndvi = out.band("NDVI").unwrap().get(2, 2).unwrap();
        assert!((ndvi - 0.5).abs() < 1e-10);
        // Inputs untouched
        assert_eq!(out.band("NIR").unwrap().get(0, 0).unwrap(), 3000.0);
    }

    #[test]
    fn test_add_spectral_indices_needs_canonical_bands() {
        let img = Image::from_bands([("B5", make_band(2, 2, 1.0))]).unwrap();
        assert!(matches!(add_spectral_indices(&img), Err(Error::MissingBand(_))));
    }
}

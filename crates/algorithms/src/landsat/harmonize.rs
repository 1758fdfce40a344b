//! ETM+ to OLI reflectance harmonization
//!
//! Linear per-band transform from Roy et al. (2016), applied to surface
//! reflectance scaled by 10000. Results are rounded and stored in the
//! signed 16-bit range of the source product.

use super::sensor::{QA_BAND, REFLECTANCE_BANDS};
use crate::imagery::band_math;
use huctrend_core::{Image, RasterElement, Result};

/// Per-band slope and intercept, in [`REFLECTANCE_BANDS`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonizationCoefficients {
    pub slopes: [f64; 6],
    /// Intercepts on the scaled (x10000) reflectance range
    pub intercepts: [f64; 6],
}

impl HarmonizationCoefficients {
    /// TM/ETM+ surface reflectance onto OLI surface reflectance
    pub const ETM_TO_OLI: Self = Self {
        slopes: [0.9785, 0.9542, 0.9825, 1.0073, 1.0171, 0.9949],
        intercepts: [-95.0, -16.0, -22.0, -21.0, -30.0, 29.0],
    };

    /// Transform one reflectance value of band `band` (index into
    /// [`REFLECTANCE_BANDS`]). NaN stays NaN.
    pub fn apply(&self, band: usize, value: f64) -> f64 {
        if value.is_nan() {
            return f64::NAN;
        }
        let scaled = value * self.slopes[band] + self.intercepts[band];
        f64::from(i16::saturating_from_f64(scaled))
    }
}

impl Default for HarmonizationCoefficients {
    fn default() -> Self {
        Self::ETM_TO_OLI
    }
}

/// Apply `coefficients` to the six reflectance bands and carry the QA band
/// over unchanged. Properties are kept.
///
/// Callers go through [`CanonicalImage::harmonize`], which only accepts
/// ETM-scale images.
///
/// [`CanonicalImage::harmonize`]: super::CanonicalImage::harmonize
pub(crate) fn harmonize_bands(
    image: &Image,
    coefficients: &HarmonizationCoefficients,
) -> Result<Image> {
    let mut out = image.without_bands();
    for (i, name) in REFLECTANCE_BANDS.iter().enumerate() {
        let band = band_math(image.band(name)?, |v| coefficients.apply(i, v))?;
        out = out.with_band(*name, band)?;
    }
    out.with_band(QA_BAND, image.band(QA_BAND)?.clone())
}

//! Scene preparation with the radiometric scale tracked in the type
//!
//! A [`CanonicalImage<S>`] holds the canonical bands of one scene on
//! radiometric scale `S`. Only ETM-scale images can be harmonized, and
//! only OLI-scale images get spectral indices, so a scene can be neither
//! harmonized twice nor indexed before harmonization.

use super::harmonize::{harmonize_bands, HarmonizationCoefficients};
use super::qa::mask_clouds;
use super::sensor::{normalize, Sensor, SensorFamily};
use crate::imagery::add_spectral_indices;
use huctrend_core::{Algorithm, Error, Image, Result};
use std::marker::PhantomData;
use tracing::debug;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::EtmScale {}
    impl Sealed for super::OliScale {}
}

/// A radiometric scale marker
pub trait Radiometry: sealed::Sealed {
    /// Sensor family whose native bands land on this scale
    const FAMILY: SensorFamily;
}

/// TM / ETM+ surface reflectance
#[derive(Debug, Clone, Copy)]
pub enum EtmScale {}

/// OLI surface reflectance
#[derive(Debug, Clone, Copy)]
pub enum OliScale {}

impl Radiometry for EtmScale {
    const FAMILY: SensorFamily = SensorFamily::Etm;
}

impl Radiometry for OliScale {
    const FAMILY: SensorFamily = SensorFamily::Oli;
}

/// Canonical bands (`B G R NIR SWIR1 SWIR2 QA`) on scale `S`
#[derive(Debug, Clone)]
pub struct CanonicalImage<S: Radiometry> {
    image: Image,
    _scale: PhantomData<S>,
}

impl<S: Radiometry> CanonicalImage<S> {
    fn wrap(image: Image) -> Self {
        Self {
            image,
            _scale: PhantomData,
        }
    }

    /// Rename a raw scene of family `S::FAMILY` to the canonical bands.
    pub fn normalize(scene: &Image) -> Result<Self> {
        normalize(scene, S::FAMILY).map(Self::wrap)
    }

    /// Mask cloud and cloud-shadow pixels on every band.
    pub fn mask_clouds(self) -> Result<Self> {
        mask_clouds(&self.image).map(Self::wrap)
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn into_image(self) -> Image {
        self.image
    }
}

impl CanonicalImage<EtmScale> {
    /// Move reflectance onto the OLI scale with the standard coefficients.
    pub fn harmonize(self) -> Result<CanonicalImage<OliScale>> {
        self.harmonize_with(&HarmonizationCoefficients::ETM_TO_OLI)
    }

    pub fn harmonize_with(
        self,
        coefficients: &HarmonizationCoefficients,
    ) -> Result<CanonicalImage<OliScale>> {
        harmonize_bands(&self.image, coefficients).map(CanonicalImage::wrap)
    }
}

impl CanonicalImage<OliScale> {
    /// Append NDVI, NDMI, EVI, SAVI, MSAVI, NBR and NBR2.
    pub fn add_spectral_indices(self) -> Result<Image> {
        add_spectral_indices(&self.image)
    }
}

/// Prepare a raw scene for compositing.
///
/// - OLI: normalize, mask clouds, add indices
/// - TM / ETM+: normalize, mask clouds, harmonize to OLI, add indices
///
/// The result keeps every property of `scene`.
pub fn prepare(scene: &Image, sensor: Sensor) -> Result<Image> {
    prepare_with(scene, sensor, &HarmonizationCoefficients::ETM_TO_OLI)
}

/// [`prepare`] with explicit harmonization coefficients
pub fn prepare_with(
    scene: &Image,
    sensor: Sensor,
    coefficients: &HarmonizationCoefficients,
) -> Result<Image> {
    debug!(sensor = %sensor, "preparing scene");
    let prepared = match sensor.family() {
        SensorFamily::Oli => CanonicalImage::<OliScale>::normalize(scene)?
            .mask_clouds()?
            .add_spectral_indices()?,
        SensorFamily::Etm => CanonicalImage::<EtmScale>::normalize(scene)?
            .mask_clouds()?
            .harmonize_with(coefficients)?
            .add_spectral_indices()?,
    };
    Ok(prepared.copy_properties(scene))
}

/// Scene preparation as a pipeline stage
#[derive(Debug, Clone, Default)]
pub struct PrepareScene;

impl Algorithm for PrepareScene {
    type Input = (Image, Sensor);
    type Output = Image;
    type Params = HarmonizationCoefficients;
    type Error = Error;

    fn name(&self) -> &'static str {
        "PrepareScene"
    }

    fn description(&self) -> &'static str {
        "Rename bands, mask clouds, harmonize older sensors and add spectral indices"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (scene, sensor) = input;
        prepare_with(&scene, sensor, &params)
    }
}

//! Landsat scene preparation
//!
//! Raw surface reflectance scenes from the four Landsat archives are
//! brought onto one band layout and radiometric scale:
//!
//! 1. normalize: select and rename to `B G R NIR SWIR1 SWIR2 QA`
//! 2. mask clouds and cloud shadow from the QA band
//! 3. harmonize TM/ETM+ reflectance onto the OLI scale
//! 4. append spectral indices

mod canonical;
mod harmonize;
mod qa;
mod sensor;

pub use canonical::{
    prepare, prepare_with, CanonicalImage, EtmScale, OliScale, PrepareScene, Radiometry,
};
pub use harmonize::HarmonizationCoefficients;
pub use qa::{clear_mask, is_clear, mask_clouds, CLOUD_BIT, CLOUD_SHADOW_BIT};
pub use sensor::{
    normalize, Sensor, SensorFamily, CANONICAL_BANDS, QA_BAND, REFLECTANCE_BANDS,
};

use crate::imagery::SpectralIndex;

/// Band names of a prepared scene and of an annual composite:
/// the canonical bands followed by the spectral indices.
pub fn composite_band_names() -> Vec<&'static str> {
    CANONICAL_BANDS
        .iter()
        .copied()
        .chain(SpectralIndex::ALL.iter().map(SpectralIndex::band_name))
        .collect()
}

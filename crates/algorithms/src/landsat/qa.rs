//! Cloud and cloud-shadow masking from the `pixel_qa` band

use super::sensor::QA_BAND;
use huctrend_core::{Image, Raster, Result};
use ndarray::Array2;
use tracing::debug;

/// Bit set in `pixel_qa` when the pixel is cloud shadow
pub const CLOUD_SHADOW_BIT: u32 = 3;
/// Bit set in `pixel_qa` when the pixel is cloud
pub const CLOUD_BIT: u32 = 5;

const REJECT: u64 = (1 << CLOUD_SHADOW_BIT) | (1 << CLOUD_BIT);

/// Whether a QA word has both the cloud-shadow and cloud bits clear.
///
/// A missing (NaN) or negative QA word is never clear.
pub fn is_clear(qa: f64) -> bool {
    if !qa.is_finite() || qa < 0.0 {
        return false;
    }
    (qa as u64) & REJECT == 0
}

/// `true` where the QA band marks the pixel clear
pub fn clear_mask(qa: &Raster<f64>) -> Array2<bool> {
    qa.data().mapv(is_clear)
}

/// Mask every band (QA included) wherever the QA band flags cloud or
/// cloud shadow. Applying the mask twice gives the same image.
pub fn mask_clouds(image: &Image) -> Result<Image> {
    let mask = clear_mask(image.band(QA_BAND)?);
    let masked = image.update_mask(&mask)?;
    debug!(
        before = image.valid_pixel_count(),
        after = masked.valid_pixel_count(),
        "cloud mask applied"
    );
    Ok(masked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use huctrend_core::GeoTransform;

    fn scene_with_qa(qa: [f64; 4]) -> Image {
        Image::new(2, 2, GeoTransform::default())
            .with_band("NIR", Raster::filled(2, 2, 3000.0))
            .unwrap()
            .with_band("QA", Raster::from_vec(qa.to_vec(), 2, 2).unwrap())
            .unwrap()
    }

    #[test]
    fn test_is_clear_bits() {
        assert!(is_clear(0.0));
        assert!(is_clear(322.0)); // clear land, low confidence cloud
        assert!(!is_clear(8.0)); // shadow
        assert!(!is_clear(32.0)); // cloud
        assert!(!is_clear(40.0)); // both
        assert!(is_clear(4.0)); // water
        assert!(!is_clear(f64::NAN));
    }

    #[test]
    fn test_mask_clouds_hits_all_bands() {
        let img = scene_with_qa([322.0, 8.0, 32.0, 66.0]);
        let out = mask_clouds(&img).unwrap();

        let nir = out.band("NIR").unwrap();
        assert_eq!(nir.get(0, 0).unwrap(), 3000.0);
        assert!(nir.get(0, 1).unwrap().is_nan());
        assert!(nir.get(1, 0).unwrap().is_nan());
        assert_eq!(nir.get(1, 1).unwrap(), 3000.0);
        // The QA band is masked too
        assert!(out.band("QA").unwrap().get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_mask_clouds_idempotent() {
        let img = scene_with_qa([322.0, 8.0, f64::NAN, 66.0]);
        let once = mask_clouds(&img).unwrap();
        let twice = mask_clouds(&once).unwrap();

        for (a, b) in once.band("NIR").unwrap().data().iter().zip(twice.band("NIR").unwrap().data()) {
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
        assert_eq!(once.valid_pixel_count(), 2);
        assert_eq!(twice.valid_pixel_count(), 2);
    }

    #[test]
    fn test_mask_needs_qa() {
        let img = Image::new(1, 1, GeoTransform::default())
            .with_band("NIR", Raster::filled(1, 1, 1.0))
            .unwrap();
        assert!(mask_clouds(&img).is_err());
    }
}

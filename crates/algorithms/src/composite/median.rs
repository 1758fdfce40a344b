//! Per-pixel median over a stack of images

use crate::maybe_rayon::*;
use huctrend_core::{Error, Image, Raster, Result};
use ndarray::Array2;

/// Median of the non-NaN values, averaging the two middle values of an
/// even count. `None` when every value is NaN.
pub fn median_of(values: &mut Vec<f64>) -> Option<f64> {
    values.retain(|v| !v.is_nan());
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    Some(if n % 2 == 0 {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    } else {
        values[n / 2]
    })
}

/// Band-wise, pixel-wise median of `images`.
///
/// Every image must share the grid of the first one and hold each band of
/// `band_names`. No-data values are skipped; a pixel with no value in any
/// image stays no-data. The result has no properties.
pub fn median_composite(images: &[Image], band_names: &[&str]) -> Result<Image> {
    let first = images
        .first()
        .ok_or_else(|| Error::Other("median of an empty image stack".into()))?;
    let (rows, cols) = first.shape();
    let transform = *first.transform();

    for image in images {
        if image.shape() != (rows, cols) {
            return Err(Error::SizeMismatch {
                er: rows,
                ec: cols,
                ar: image.rows(),
                ac: image.cols(),
            });
        }
    }

    let mut out = Image::new(rows, cols, transform);
    for name in band_names {
        let stack: Vec<&Raster<f64>> = images
            .iter()
            .map(|img| img.band(name))
            .collect::<Result<_>>()?;
        out = out.with_band(*name, median_band(&stack, rows, cols)?)?;
    }
    Ok(out)
}

fn median_band(stack: &[&Raster<f64>], rows: usize, cols: usize) -> Result<Raster<f64>> {
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut values = Vec::with_capacity(stack.len());
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                values.clear();
                values.extend(stack.iter().map(|band| unsafe { band.get_unchecked(row, col) }));
                if let Some(m) = median_of(&mut values) {
                    row_data[col] = m;
                }
            }
            row_data
        })
        .collect();

    let data =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(Raster::from_array(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use huctrend_core::GeoTransform;

    fn single(value: f64) -> Image {
        Image::new(1, 2, GeoTransform::default())
            .with_band("NDVI", Raster::from_vec(vec![value, f64::NAN], 1, 2).unwrap())
            .unwrap()
    }

    #[test]
    fn test_median_of() {
        assert_eq!(median_of(&mut vec![100.0, 200.0]), Some(150.0));
        assert_eq!(median_of(&mut vec![400.0, 100.0, 150.0]), Some(150.0));
        assert_eq!(median_of(&mut vec![f64::NAN, 3.0]), Some(3.0));
        assert_eq!(median_of(&mut vec![f64::NAN]), None);
        assert_eq!(median_of(&mut vec![]), None);
    }

    #[test]
    fn test_median_composite_skips_nodata() {
        let images = vec![single(0.2), single(0.6), single(f64::NAN), single(0.3)];
        let out = median_composite(&images, &["NDVI"]).unwrap();
        let band = out.band("NDVI").unwrap();

        assert!((band.get(0, 0).unwrap() - 0.3).abs() < 1e-10);
        assert!(band.get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_median_composite_empty_stack() {
        assert!(median_composite(&[], &["NDVI"]).is_err());
    }

    #[test]
    fn test_median_composite_missing_band() {
        assert!(matches!(
            median_composite(&[single(1.0)], &["EVI"]),
            Err(Error::MissingBand(_))
        ));
    }
}

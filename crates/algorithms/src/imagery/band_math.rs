//! Band math
//!
//! Apply a per-cell function to a band, leaving no-data cells untouched.

use crate::maybe_rayon::*;
use huctrend_core::raster::Raster;
use huctrend_core::{Error, Result};
use ndarray::Array2;

/// Apply a unary function to every cell in a raster.
///
/// No-data cells (NaN) are preserved.
///
/// # Example
/// ```ignore
/// let rescaled = band_math(&red, |v| v * 0.9825 - 22.0)?;
/// ```
pub fn band_math<F>(raster: &Raster<f64>, f: F) -> Result<Raster<f64>>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    let (rows, cols) = raster.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let val = unsafe { raster.get_unchecked(row, col) };
                if val.is_nan() {
                    continue;
                }
                row_data[col] = f(val);
            }
            row_data
        })
        .collect();

    let data =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    let mut output = raster.with_data(data)?;
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_math_applies_function() {
        let raster = Raster::filled(3, 3, 1000.0);
        let result = band_math(&raster, |v| v * 2.0 + 1.0).unwrap();
        assert_eq!(result.get(1, 1).unwrap(), 2001.0);
    }

    #[test]
    fn test_band_math_keeps_nodata() {
        let mut raster = Raster::filled(2, 2, 5.0);
        raster.set(0, 1, f64::NAN).unwrap();

        let result = band_math(&raster, |_| 0.0).unwrap();
        assert!(result.get(0, 1).unwrap().is_nan());
        assert_eq!(result.get(0, 0).unwrap(), 0.0);
    }
}

//! Cell types

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// A value that can sit in a raster cell.
///
/// Landsat surface reflectance is stored as `i16` and QA flags as `u16`;
/// pipeline arithmetic happens in `f64`, where NaN is no-data.
pub trait RasterElement:
    Copy + Debug + PartialOrd + NumCast + Zero + Send + Sync + 'static
{
    /// Fill value used when a NaN has to be stored in this type
    fn fill_value() -> Self;

    /// Whether the cell is no-data, given the band's declared fill value
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Convert an `f64`, rounding half away from zero and saturating at
    /// the type bounds. NaN becomes [`RasterElement::fill_value`].
    fn saturating_from_f64(value: f64) -> Self;

    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! integer_cell {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn fill_value() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata == Some(*self)
            }

            fn saturating_from_f64(value: f64) -> Self {
                if value.is_nan() {
                    return Self::fill_value();
                }
                // float -> int `as` saturates
                value.round() as $t
            }
        }
    )*};
}

integer_cell!(u8, i16, u16, i32);

impl RasterElement for f64 {
    fn fill_value() -> Self {
        f64::NAN
    }

    fn is_nodata(&self, nodata: Option<Self>) -> bool {
        self.is_nan() || nodata.is_some_and(|nd| (self - nd).abs() < 1e-9)
    }

    fn saturating_from_f64(value: f64) -> Self {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_i16() {
        assert_eq!(i16::saturating_from_f64(1234.5), 1235);
        assert_eq!(i16::saturating_from_f64(-1234.5), -1235);
        assert_eq!(i16::saturating_from_f64(1.0e9), i16::MAX);
        assert_eq!(i16::saturating_from_f64(-1.0e9), i16::MIN);
        assert_eq!(i16::saturating_from_f64(f64::NAN), i16::MIN);
    }

    #[test]
    fn test_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!((-9999.0_f64).is_nodata(Some(-9999.0)));
        assert!(!0.5_f64.is_nodata(Some(-9999.0)));
        assert!(1u16.is_nodata(Some(1)));
        assert!(!322u16.is_nodata(None));
    }
}

//! Hydrologic unit codes (HUC) and half-open code ranges
//!
//! The Watershed Boundary Dataset nests units by appending digits: a
//! 6-digit basin (HUC6) contains 12-digit sub-watersheds (HUC12) whose
//! codes start with the basin's digits. Sub-watersheds of a basin are
//! selected with a half-open range `[lower, upper)` over 12-digit codes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_DIGITS: usize = 16;

/// A hydrologic unit code with a fixed number of digits.
///
/// Leading zeros are significant for the digit count, so the code keeps
/// both its numeric value and its width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HucCode {
    digits: u8,
    value: u64,
}

impl HucCode {
    /// Parse a code made only of ASCII digits.
    pub fn parse(code: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidHucCode {
            code: code.to_string(),
            reason: reason.to_string(),
        };

        if code.is_empty() || code.len() > MAX_DIGITS {
            return Err(invalid("expected between 1 and 16 digits"));
        }
        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("only decimal digits are allowed"));
        }
        let value = code.parse::<u64>().map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            digits: code.len() as u8,
            value,
        })
    }

    /// Number of digits (6 for a basin, 12 for a sub-watershed)
    pub fn digits(&self) -> usize {
        self.digits as usize
    }

    /// Numeric value of the code
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Whether `self` is an ancestor of (or equal to) `other` in the
    /// hierarchy, i.e. `other`'s digits start with `self`'s digits.
    pub fn is_prefix_of(&self, other: &HucCode) -> bool {
        if other.digits < self.digits {
            return false;
        }
        let shift = 10u64.pow(u32::from(other.digits - self.digits));
        other.value / shift == self.value
    }

    /// First code with `digits` digits below this unit: the code padded
    /// with zeros. `140200` padded to 12 digits is `140200000000`.
    pub fn pad_to(&self, digits: usize) -> Result<HucCode> {
        if digits < self.digits() || digits > MAX_DIGITS {
            return Err(Error::InvalidParameter {
                name: "digits",
                value: digits.to_string(),
                reason: format!("must be between {} and {}", self.digits, MAX_DIGITS),
            });
        }
        Ok(Self {
            digits: digits as u8,
            value: self.value * 10u64.pow((digits - self.digits()) as u32),
        })
    }
}

impl fmt::Display for HucCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.value, width = self.digits())
    }
}

impl FromStr for HucCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HucCode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<HucCode> for String {
    fn from(code: HucCode) -> String {
        code.to_string()
    }
}

/// Half-open range `[lower, upper)` of equal-width HUC codes.
///
/// The range is not checked against any parent basin: a range whose
/// `upper` is not the next basin's first code silently drops or
/// double-counts sub-watersheds. Use [`HucRange::is_aligned_to`] to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[String; 2]", into = "[String; 2]")]
pub struct HucRange {
    lower: HucCode,
    upper: HucCode,
}

impl HucRange {
    pub fn new(lower: HucCode, upper: HucCode) -> Result<Self> {
        if lower.digits != upper.digits {
            return Err(Error::InvalidParameter {
                name: "upper",
                value: upper.to_string(),
                reason: format!("must have {} digits like lower bound {}", lower.digits, lower),
            });
        }
        if upper.value <= lower.value {
            return Err(Error::InvalidParameter {
                name: "upper",
                value: upper.to_string(),
                reason: format!("must be greater than lower bound {}", lower),
            });
        }
        Ok(Self { lower, upper })
    }

    /// Parse a range from its two bound strings.
    pub fn parse(lower: &str, upper: &str) -> Result<Self> {
        Self::new(HucCode::parse(lower)?, HucCode::parse(upper)?)
    }

    pub fn lower(&self) -> HucCode {
        self.lower
    }

    pub fn upper(&self) -> HucCode {
        self.upper
    }

    /// `lower <= code < upper`. Codes of a different width never match.
    pub fn contains(&self, code: &HucCode) -> bool {
        code.digits == self.lower.digits
            && code.value >= self.lower.value
            && code.value < self.upper.value
    }

    /// Whether the range starts exactly at `basin`'s first sub-code and
    /// reaches at least the first code past the basin, so every
    /// sub-watershed of `basin` is included.
    pub fn is_aligned_to(&self, basin: &HucCode) -> bool {
        let Ok(first) = basin.pad_to(self.lower.digits()) else {
            return false;
        };
        let span = 10u64.pow((self.lower.digits() - basin.digits()) as u32);
        self.lower == first && self.upper.value >= first.value + span
    }
}

impl TryFrom<[String; 2]> for HucRange {
    type Error = Error;

    fn try_from(bounds: [String; 2]) -> Result<Self> {
        Self::parse(&bounds[0], &bounds[1])
    }
}

impl From<HucRange> for [String; 2] {
    fn from(range: HucRange) -> [String; 2] {
        [range.lower.to_string(), range.upper.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> HucCode {
        HucCode::parse(s).unwrap()
    }

    #[test]
    fn test_parse_and_display_keep_leading_zeros() {
        let c = code("010200000001");
        assert_eq!(c.digits(), 12);
        assert_eq!(c.to_string(), "010200000001");
    }

    #[test]
    fn test_parse_rejects_non_digits() {
        assert!(HucCode::parse("14010A").is_err());
        assert!(HucCode::parse("").is_err());
        assert!(HucCode::parse("12345678901234567").is_err());
    }

    #[test]
    fn test_prefix() {
        assert!(code("140200").is_prefix_of(&code("140200010101")));
        assert!(!code("140200").is_prefix_of(&code("140300010101")));
        assert!(!code("140200010101").is_prefix_of(&code("140200")));
    }

    #[test]
    fn test_half_open_range() {
        let range = HucRange::parse("140100000000", "140200000000").unwrap();
        assert!(range.contains(&code("140100000000")));
        assert!(range.contains(&code("140150000000")));
        assert!(range.contains(&code("140199999999")));
        assert!(!range.contains(&code("140200000000")));
        assert!(!range.contains(&code("140099999999")));
        // A 6-digit basin code is never a member of a 12-digit range
        assert!(!range.contains(&code("140150")));
    }

    #[test]
    fn test_range_rejects_bad_bounds() {
        assert!(HucRange::parse("140200000000", "140100000000").is_err());
        assert!(HucRange::parse("140100000000", "140100000000").is_err());
        assert!(HucRange::parse("140100000000", "1402").is_err());
    }

    #[test]
    fn test_alignment() {
        let basin = code("140100");
        assert!(HucRange::parse("140100000000", "140200000000").unwrap().is_aligned_to(&basin));
        assert!(HucRange::parse("140100000000", "140101000000").unwrap().is_aligned_to(&basin));
        // Stops short of the basin's last sub-codes
        assert!(!HucRange::parse("140100000000", "140100500000").unwrap().is_aligned_to(&basin));
        // Starts inside another basin
        assert!(!HucRange::parse("140000000000", "140200000000").unwrap().is_aligned_to(&basin));
    }

    #[test]
    fn test_serde_roundtrip_as_strings() {
        let range = HucRange::parse("150701000000", "150702000000").unwrap();
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, r#"["150701000000","150702000000"]"#);
        let back: HucRange = serde_json::from_str(&json).unwrap();
        assert_eq!(back, range);
    }
}

use crate::DemImageError;
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Range, str::FromStr};
use tin_dem_core::Scalar;

/// Bit depth of produced grayscale image.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageDepth {
    /// 8 bits per channel.
    #[default]
    Eight,
    /// 16 bits per channel.
    Sixteen,
}

impl ImageDepth {
    /// Largest channel value.
    pub fn max_value(self) -> Scalar {
        match self {
            Self::Eight => u8::MAX as Scalar,
            Self::Sixteen => u16::MAX as Scalar,
        }
    }
}

/// Heights mapped to the darkest and brightest gray.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ValueRange {
    /// Minimum and maximum of non-background grid values.
    #[default]
    Auto,
    /// Fixed heights, values outside are clamped.
    /// `(min, max)`
    Fixed(Scalar, Scalar),
}

impl ValueRange {
    /// Checks that fixed range is finite and not empty.
    pub fn validate(&self) -> Result<(), DemImageError> {
        match *self {
            Self::Fixed(min, max) if !(min.is_finite() && max.is_finite() && min < max) => {
                Err(DemImageError::InvalidRange(self.to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl From<(Scalar, Scalar)> for ValueRange {
    fn from(value: (Scalar, Scalar)) -> Self {
        Self::Fixed(value.0, value.1)
    }
}

impl From<Range<Scalar>> for ValueRange {
    fn from(value: Range<Scalar>) -> Self {
        Self::Fixed(value.start, value.end)
    }
}

/// Parses `auto` or `MIN..MAX`.
///
/// # Examples
/// ```
/// use tin_dem_image::settings::ValueRange;
///
/// assert_eq!("auto".parse::<ValueRange>(), Ok(ValueRange::Auto));
/// assert_eq!("-5..12.5".parse::<ValueRange>(), Ok(ValueRange::Fixed(-5.0, 12.5)));
/// assert!("12".parse::<ValueRange>().is_err());
/// assert!("3..1".parse::<ValueRange>().is_err());
/// ```
impl FromStr for ValueRange {
    type Err = DemImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        let invalid = || DemImageError::InvalidRange(s.to_owned());
        let found = s.find("..").ok_or_else(invalid)?;
        let min = s[..found].trim().parse::<Scalar>().map_err(|_| invalid())?;
        let max = s[(found + 2)..]
            .trim()
            .parse::<Scalar>()
            .map_err(|_| invalid())?;
        let result = Self::Fixed(min, max);
        result.validate()?;
        Ok(result)
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Fixed(min, max) => write!(f, "{}..{}", min, max),
        }
    }
}

/// Settings of elevation image rendering.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemImageSettings {
    #[serde(default)]
    pub depth: ImageDepth,
    #[serde(default)]
    pub range: ValueRange,
    /// Background pixels get zero alpha instead of being black.
    #[serde(default)]
    pub transparent_background: bool,
}

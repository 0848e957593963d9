use crate::{
    error::{Result, TinError},
    predicates::DEFAULT_TOLERANCE,
    Scalar,
};
use serde::{Deserialize, Serialize};

/// Settings of elevation grid generation.
///
/// # Examples
/// ```
/// use tin_dem_core::prelude::*;
///
/// let settings: DemSettings = serde_json::from_str(r#"{ "pixel_size": 0.5 }"#).unwrap();
/// assert_eq!(settings.pixel_size, 0.5);
/// assert_eq!(settings.background, None);
/// assert_eq!(settings.stack_capacity, 1 << 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemSettings {
    /// Pixel size in world units.
    #[serde(default = "DemSettings::default_pixel_size")]
    pub pixel_size: Scalar,
    /// Value of pixels without data. Minimum sample height when not set.
    #[serde(default)]
    pub background: Option<Scalar>,
    /// Triangles with a longer edge are not interpolated. Zero keeps every triangle.
    #[serde(default)]
    pub max_edge_length: Scalar,
    /// Relative tolerance of geometric tests; raised to `100 * eps` when smaller.
    #[serde(default = "DemSettings::default_tolerance")]
    pub tolerance: Scalar,
    /// Limit of triangles waiting for legalization during a single point insertion.
    #[serde(default = "DemSettings::default_stack_capacity")]
    pub stack_capacity: usize,
}

impl Default for DemSettings {
    fn default() -> Self {
        Self {
            pixel_size: Self::default_pixel_size(),
            background: None,
            max_edge_length: 0.0,
            tolerance: Self::default_tolerance(),
            stack_capacity: Self::default_stack_capacity(),
        }
    }
}

impl DemSettings {
    fn default_pixel_size() -> Scalar {
        1.0
    }

    fn default_tolerance() -> Scalar {
        DEFAULT_TOLERANCE
    }

    fn default_stack_capacity() -> usize {
        1 << 20
    }

    /// Checks pixel size and maximum edge length.
    pub fn validate(&self) -> Result<()> {
        if !(self.pixel_size.is_finite() && self.pixel_size > 0.0) {
            return Err(TinError::InvalidPixelSize(self.pixel_size));
        }
        if !(self.max_edge_length.is_finite() && self.max_edge_length >= 0.0) {
            return Err(TinError::InvalidMaxEdgeLength(self.max_edge_length));
        }
        Ok(())
    }
}

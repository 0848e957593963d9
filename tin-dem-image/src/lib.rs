pub mod settings;

use image::{DynamicImage, GrayAlphaImage, GrayImage, ImageBuffer, Luma, LumaA};
use thiserror::Error;
use tin_dem_core::grid::DemGrid;

pub use crate::settings::*;

/// Error thrown when rendering elevation image.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DemImageError {
    #[error("Invalid value range: {0}")]
    InvalidRange(String),
    #[error("Grid of {columns}x{rows} pixels does not fit an image")]
    TooLarge { columns: usize, rows: usize },
}

/// Render elevation grid as grayscale image, top row first.
///
/// Values are stretched linearly between darkest and brightest gray.
/// No-data pixels are black, or fully transparent with `transparent_background`.
///
/// # Arguments
/// * `grid` - Elevation grid.
/// * `settings` - Image rendering settings.
///
/// # Returns
/// Grayscale image or error.
///
/// # Examples
/// ```
/// use tin_dem_core::prelude::*;
/// use tin_dem_image::{generate_dem_image, DemImageSettings};
///
/// let metadata = RasterMetadata {
///     columns: 2,
///     rows: 2,
///     pixel_size: 1.0,
///     background: -1.0,
///     ..Default::default()
/// };
/// let grid = DemGrid::new(metadata, vec![2.0, -1.0, 0.0, 1.0]).unwrap();
/// let image = generate_dem_image(&grid, &DemImageSettings::default()).unwrap();
/// assert_eq!(image.to_luma8().into_raw(), vec![255, 0, 0, 127]);
/// ```
pub fn generate_dem_image(
    grid: &DemGrid,
    settings: &DemImageSettings,
) -> Result<DynamicImage, DemImageError> {
    settings.range.validate()?;
    let too_large = || DemImageError::TooLarge {
        columns: grid.width(),
        rows: grid.height(),
    };
    let width = u32::try_from(grid.width()).map_err(|_| too_large())?;
    let height = u32::try_from(grid.height()).map_err(|_| too_large())?;
    let (min, max) = match settings.range {
        ValueRange::Auto => grid.min_max().unwrap_or((0.0, 0.0)),
        ValueRange::Fixed(min, max) => (min, max),
    };
    let span = max - min;
    let scale = settings.depth.max_value();
    let levels = grid.data_iter().map(|v| {
        v.map(|v| {
            if span > 0.0 {
                ((v - min) / span).clamp(0.0, 1.0) * scale
            } else {
                scale
            }
        })
    });

    let image = match (settings.depth, settings.transparent_background) {
        (ImageDepth::Eight, false) => {
            let data = levels.map(|v| v.unwrap_or(0.0) as u8).collect();
            GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
        }
        (ImageDepth::Eight, true) => {
            let data = levels
                .flat_map(|v| match v {
                    Some(v) => [v as u8, u8::MAX],
                    None => [0, 0],
                })
                .collect();
            GrayAlphaImage::from_raw(width, height, data).map(DynamicImage::ImageLumaA8)
        }
        (ImageDepth::Sixteen, false) => {
            let data = levels.map(|v| v.unwrap_or(0.0) as u16).collect();
            ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(width, height, data)
                .map(DynamicImage::ImageLuma16)
        }
        (ImageDepth::Sixteen, true) => {
            let data = levels
                .flat_map(|v| match v {
                    Some(v) => [v as u16, u16::MAX],
                    None => [0, 0],
                })
                .collect();
            ImageBuffer::<LumaA<u16>, Vec<u16>>::from_raw(width, height, data)
                .map(DynamicImage::ImageLumaA16)
        }
    };
    let image = image.ok_or_else(too_large)?;
    tracing::debug!(width, height, min, max, "rendered elevation image");
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use tin_dem_core::prelude::*;

    fn grid() -> DemGrid {
        let metadata = RasterMetadata {
            columns: 3,
            rows: 2,
            pixel_size: 1.0,
            background: -9999.0,
            ..Default::default()
        };
        DemGrid::new(metadata, vec![10.0, 15.0, 20.0, -9999.0, 12.5, 30.0]).unwrap()
    }

    #[test]
    fn test_auto_range() {
        let image = generate_dem_image(&grid(), &DemImageSettings::default()).unwrap();
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);
        assert_eq!(image.to_luma8().into_raw(), vec![0, 63, 127, 0, 31, 255]);
    }

    #[test]
    fn test_fixed_range_clamps() {
        let settings = DemImageSettings {
            range: ValueRange::Fixed(10.0, 20.0),
            ..Default::default()
        };
        let image = generate_dem_image(&grid(), &settings).unwrap();
        assert_eq!(image.to_luma8().into_raw(), vec![0, 127, 255, 0, 63, 255]);
    }

    #[test]
    fn test_transparent_background_16_bit() {
        let settings = DemImageSettings {
            depth: ImageDepth::Sixteen,
            transparent_background: true,
            ..Default::default()
        };
        let image = generate_dem_image(&grid(), &settings).unwrap();
        let pixels = match image {
            DynamicImage::ImageLumaA16(image) => image.into_raw(),
            _ => panic!("expected 16 bit gray image with alpha"),
        };
        assert_eq!(pixels[..2], [0, u16::MAX]);
        assert_eq!(pixels[6..8], [0, 0]);
        assert_eq!(pixels[10..], [u16::MAX, u16::MAX]);
    }

    #[test]
    fn test_flat_and_empty_grids() {
        let metadata = RasterMetadata {
            columns: 2,
            rows: 1,
            pixel_size: 1.0,
            background: 0.0,
            ..Default::default()
        };
        let flat = DemGrid::new(metadata, vec![5.0, 5.0]).unwrap();
        let image = generate_dem_image(&flat, &DemImageSettings::default()).unwrap();
        assert_eq!(image.to_luma8().into_raw(), vec![255, 255]);
        let empty = DemGrid::new(metadata, vec![0.0, 0.0]).unwrap();
        let image = generate_dem_image(&empty, &DemImageSettings::default()).unwrap();
        assert_eq!(image.to_luma8().into_raw(), vec![0, 0]);
    }

    #[test]
    fn test_invalid_range() {
        let settings = DemImageSettings {
            range: ValueRange::Fixed(1.0, 1.0),
            ..Default::default()
        };
        assert_eq!(
            generate_dem_image(&grid(), &settings).err(),
            Some(DemImageError::InvalidRange("1..1".to_owned()))
        );
    }

    #[test]
    fn test_lowest_elevation_is_opaque() {
        let output = generate_dem(
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![0.0, 1.0, 2.0],
            &DemSettings::default(),
        )
        .unwrap();
        let settings = DemImageSettings {
            transparent_background: true,
            ..Default::default()
        };
        let image = generate_dem_image(&output.grid, &settings).unwrap();
        assert_eq!(
            image.to_luma_alpha8().into_raw(),
            vec![255, 255, 0, 0, 0, 255, 127, 255]
        );
    }
}

use crate::{coord::Coord, points::Bounds, Scalar};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error thrown when assembling elevation grid.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DemGridError {
    /// Wrong data length.
    /// (provided, expected)
    #[error("Wrong grid data length (provided: {0}, expected: {1})")]
    WrongDataLength(usize, usize),
    /// Wrong no-data mask length.
    /// (provided, expected)
    #[error("Wrong no-data mask length (provided: {0}, expected: {1})")]
    WrongMaskLength(usize, usize),
}

/// Geo-referencing of an elevation grid.
///
/// Pixel `(row, col)` has its center at `(x_min + col * pixel_size, y_max - row * pixel_size)`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterMetadata {
    /// X of the first column centers.
    pub x_min: Scalar,
    /// Y of the top row centers.
    pub y_max: Scalar,
    pub pixel_size: Scalar,
    pub columns: usize,
    pub rows: usize,
    /// Value of pixels outside the hull or inside disregarded triangles.
    pub background: Scalar,
}

impl RasterMetadata {
    /// Snaps points extent to multiples of pixel size.
    ///
    /// # Arguments
    /// * `bounds` - Points extent.
    /// * `pixel_size` - Pixel size in world units.
    /// * `background` - Background value.
    /// * `tolerance` - Relative tolerance.
    ///
    /// # Examples
    /// ```
    /// use tin_dem_core::prelude::*;
    ///
    /// let bounds = Bounds { x_min: 0.2, x_max: 3.0, y_min: -1.0, y_max: 1.5, ..Default::default() };
    /// let metadata = RasterMetadata::from_bounds(&bounds, 1.0, 0.0, 1.0e-12);
    /// assert_eq!(metadata.x_min, 0.0);
    /// assert_eq!(metadata.y_max, 2.0);
    /// assert_eq!(metadata.columns, 4);
    /// assert_eq!(metadata.rows, 4);
    /// assert_eq!(metadata.pixel_center(3, 1), Coord::new(1.0, -1.0));
    /// ```
    pub fn from_bounds(
        bounds: &Bounds,
        pixel_size: Scalar,
        background: Scalar,
        tolerance: Scalar,
    ) -> Self {
        let c = [bounds.x_min, bounds.x_max, bounds.y_min, bounds.y_max]
            .iter()
            .fold(tolerance.max(pixel_size), |c, v| {
                c.max(v.abs()).max(v.abs() / pixel_size)
            });
        let x_min = (bounds.x_min / pixel_size + c * tolerance).floor() * pixel_size;
        let x_max = (bounds.x_max / pixel_size - c * tolerance).ceil() * pixel_size;
        let y_min = (bounds.y_min / pixel_size + c * tolerance).floor() * pixel_size;
        let y_max = (bounds.y_max / pixel_size - c * tolerance).ceil() * pixel_size;
        Self {
            x_min,
            y_max,
            pixel_size,
            columns: (((x_max - x_min) / pixel_size).round().max(0.0) as usize).saturating_add(1),
            rows: (((y_max - y_min) / pixel_size).round().max(0.0) as usize).saturating_add(1),
            background,
        }
    }

    /// Number of pixels, saturated at `usize::MAX`.
    pub fn len(&self) -> usize {
        self.columns.saturating_mul(self.rows)
    }

    /// Number of pixels, `None` when a buffer of that many values cannot be addressed.
    ///
    /// # Examples
    /// ```
    /// use tin_dem_core::prelude::*;
    ///
    /// let metadata = RasterMetadata { columns: 3, rows: 2, pixel_size: 1.0, ..Default::default() };
    /// assert_eq!(metadata.checked_len(), Some(6));
    /// let metadata = RasterMetadata { columns: 1 << 40, rows: 1 << 40, ..metadata };
    /// assert_eq!(metadata.checked_len(), None);
    /// ```
    pub fn checked_len(&self) -> Option<usize> {
        let limit = isize::MAX as usize / std::mem::size_of::<Scalar>();
        self.columns
            .checked_mul(self.rows)
            .filter(|len| *len <= limit)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// World coordinate of pixel center.
    #[inline]
    pub fn pixel_center(&self, row: usize, col: usize) -> Coord {
        Coord::new(
            self.x_min + col as Scalar * self.pixel_size,
            self.y_max - row as Scalar * self.pixel_size,
        )
    }

    /// Y of the bottom row centers.
    pub fn y_min(&self) -> Scalar {
        self.y_max - self.rows.saturating_sub(1) as Scalar * self.pixel_size
    }

    /// X of the last column centers.
    pub fn x_max(&self) -> Scalar {
        self.x_min + self.columns.saturating_sub(1) as Scalar * self.pixel_size
    }

    /// Returns `(row, col)` of the pixel whose cell contains given world point.
    pub fn pixel_at(&self, point: Coord) -> Option<(usize, usize)> {
        let col = ((point.x - self.x_min) / self.pixel_size).round();
        let row = ((self.y_max - point.y) / self.pixel_size).round();
        if col >= 0.0 && row >= 0.0 && (col as usize) < self.columns && (row as usize) < self.rows
        {
            Some((row as usize, col as usize))
        } else {
            None
        }
    }
}

/// Elevation grid stored row-major, top row first.
///
/// Every pixel also carries a no-data flag, set for pixels outside the convex hull or inside
/// disregarded triangles. Those pixels hold the background value.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemGrid {
    metadata: RasterMetadata,
    values: Vec<Scalar>,
    no_data: Vec<bool>,
}

impl DemGrid {
    /// Create new elevation grid, flagging as no-data every pixel equal to the background value.
    ///
    /// # Arguments
    /// * `metadata` - Geo-referencing.
    /// * `values` - Row-major pixel values.
    ///
    /// # Returns
    /// Grid or error.
    ///
    /// # Examples
    /// ```
    /// use tin_dem_core::prelude::*;
    ///
    /// let metadata = RasterMetadata { columns: 2, rows: 2, pixel_size: 1.0, ..Default::default() };
    /// assert!(DemGrid::new(metadata, vec![0.0, 1.0, 2.0, 3.0]).is_ok());
    /// assert_eq!(
    ///     DemGrid::new(metadata, vec![0.0, 1.0]),
    ///     Err(DemGridError::WrongDataLength(2, 4)),
    /// );
    /// ```
    pub fn new(metadata: RasterMetadata, values: Vec<Scalar>) -> Result<Self, DemGridError> {
        let no_data = values.iter().map(|v| *v == metadata.background).collect();
        Self::with_no_data(metadata, values, no_data)
    }

    /// Create new elevation grid with explicit no-data flags.
    ///
    /// # Arguments
    /// * `metadata` - Geo-referencing.
    /// * `values` - Row-major pixel values.
    /// * `no_data` - Row-major flags of pixels without data.
    ///
    /// # Returns
    /// Grid or error.
    pub fn with_no_data(
        metadata: RasterMetadata,
        values: Vec<Scalar>,
        no_data: Vec<bool>,
    ) -> Result<Self, DemGridError> {
        if values.len() != metadata.len() {
            return Err(DemGridError::WrongDataLength(values.len(), metadata.len()));
        }
        if no_data.len() != metadata.len() {
            return Err(DemGridError::WrongMaskLength(no_data.len(), metadata.len()));
        }
        Ok(Self {
            metadata,
            values,
            no_data,
        })
    }

    pub fn metadata(&self) -> &RasterMetadata {
        &self.metadata
    }

    /// Returns columns.
    pub fn width(&self) -> usize {
        self.metadata.columns
    }

    /// Returns rows.
    pub fn height(&self) -> usize {
        self.metadata.rows
    }

    /// Returns values buffer.
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    /// Returns row-major no-data flags.
    pub fn no_data(&self) -> &[bool] {
        &self.no_data
    }

    /// Returns value at given pixel or `None` if out of bounds.
    pub fn value(&self, row: usize, col: usize) -> Option<Scalar> {
        if row < self.metadata.rows && col < self.metadata.columns {
            self.values.get(row * self.metadata.columns + col).copied()
        } else {
            None
        }
    }

    /// Returns value of the pixel covering given world point or `None` if out of bounds.
    pub fn value_at_point(&self, point: Coord) -> Option<Scalar> {
        let (row, col) = self.metadata.pixel_at(point)?;
        self.value(row, col)
    }

    /// Tells if pixel has no data. Out of bounds pixels have none.
    pub fn is_no_data(&self, row: usize, col: usize) -> bool {
        if row < self.metadata.rows && col < self.metadata.columns {
            self.no_data
                .get(row * self.metadata.columns + col)
                .copied()
                .unwrap_or(true)
        } else {
            true
        }
    }

    /// Returns row-major values with `None` for pixels without data.
    pub fn data_iter(&self) -> impl Iterator<Item = Option<Scalar>> + '_ {
        self.values
            .iter()
            .zip(self.no_data.iter())
            .map(|(value, no_data)| if *no_data { None } else { Some(*value) })
    }

    /// Returns `(min, max)` of pixels with data, `None` if no pixel has data.
    pub fn min_max(&self) -> Option<(Scalar, Scalar)> {
        self.data_iter().flatten().fold(None, |acc, v| match acc {
            Some((min, max)) => Some((v.min(min), v.max(max))),
            None => Some((v, v)),
        })
    }

    /// Returns iterator over `(col, row, value)`.
    ///
    /// # Examples
    /// ```
    /// use tin_dem_core::prelude::*;
    ///
    /// let metadata = RasterMetadata { columns: 2, rows: 2, pixel_size: 1.0, ..Default::default() };
    /// let grid = DemGrid::new(metadata, vec![2.0, 0.0, 0.0, 1.0]).unwrap();
    /// assert_eq!(
    ///     grid.value_iter().collect::<Vec<_>>(),
    ///     vec![(0, 0, 2.0), (1, 0, 0.0), (0, 1, 0.0), (1, 1, 1.0)],
    /// );
    /// assert_eq!(grid.min_max(), Some((1.0, 2.0)));
    /// ```
    pub fn value_iter(&self) -> impl Iterator<Item = (usize, usize, Scalar)> + '_ {
        let columns = self.metadata.columns.max(1);
        self.values
            .iter()
            .enumerate()
            .map(move |(i, v)| (i % columns, i / columns, *v))
    }

    /// Returns iterator over rows, top row first.
    pub fn rows_iter(&self) -> impl Iterator<Item = &[Scalar]> {
        self.values.chunks(self.metadata.columns.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_of_large_coordinates() {
        let bounds = Bounds {
            x_min: 500_000.0,
            x_max: 500_010.0,
            y_min: 6_000_000.0,
            y_max: 6_000_005.0,
            ..Default::default()
        };
        let metadata = RasterMetadata::from_bounds(&bounds, 2.5, -1.0, 1.0e-14);
        assert_eq!(metadata.x_min, 500_000.0);
        assert_eq!(metadata.x_max(), 500_010.0);
        assert_eq!(metadata.y_max, 6_000_005.0);
        assert_eq!(metadata.y_min(), 6_000_000.0);
        assert_eq!(metadata.columns, 5);
        assert_eq!(metadata.rows, 3);
    }

    #[test]
    fn test_value_lookup() {
        let metadata = RasterMetadata {
            x_min: 10.0,
            y_max: 20.0,
            pixel_size: 2.0,
            columns: 3,
            rows: 2,
            background: -9999.0,
        };
        let grid = DemGrid::new(metadata, vec![1.0, 2.0, 3.0, 4.0, 5.0, -9999.0]).unwrap();
        assert_eq!(grid.value(1, 1), Some(5.0));
        assert!(grid.is_no_data(1, 2));
        assert!(!grid.is_no_data(1, 1));
        assert!(grid.is_no_data(2, 0));
        assert_eq!(grid.value(2, 0), None);
        assert_eq!(grid.value_at_point(Coord::new(14.4, 18.2)), Some(-9999.0));
        assert_eq!(grid.value_at_point(Coord::new(7.0, 20.0)), None);
        assert_eq!(grid.min_max(), Some((1.0, 5.0)));
        assert_eq!(grid.rows_iter().count(), 2);
    }

    #[test]
    fn test_no_data_mask_is_independent_of_values() {
        let metadata = RasterMetadata {
            columns: 2,
            rows: 2,
            pixel_size: 1.0,
            ..Default::default()
        };
        let grid = DemGrid::with_no_data(
            metadata,
            vec![2.0, 0.0, 0.0, 1.0],
            vec![false, true, false, false],
        )
        .unwrap();
        assert_eq!(
            grid.data_iter().collect::<Vec<_>>(),
            vec![Some(2.0), None, Some(0.0), Some(1.0)]
        );
        assert_eq!(grid.min_max(), Some((0.0, 2.0)));
        assert_eq!(
            DemGrid::with_no_data(metadata, vec![0.0; 4], vec![false; 3]),
            Err(DemGridError::WrongMaskLength(3, 4))
        );
    }

    #[test]
    fn test_tiny_pixels_saturate() {
        let bounds = Bounds {
            x_max: 1.0e10,
            y_max: 1.0e10,
            ..Default::default()
        };
        let metadata = RasterMetadata::from_bounds(&bounds, 1.0e-12, 0.0, 1.0e-14);
        assert_eq!(metadata.columns, usize::MAX);
        assert_eq!(metadata.len(), usize::MAX);
        assert_eq!(metadata.checked_len(), None);
    }
}

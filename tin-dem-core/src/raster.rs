use crate::{
    error::{Result, TinError},
    grid::{DemGrid, RasterMetadata},
    settings::DemSettings,
    triangulation::Triangulation,
    Scalar,
};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Row by row barycentric interpolation of a triangulation into an elevation grid.
///
/// Every pixel walk starts at the triangle found for the previous pixel and every row starts
/// at the triangle found for the second pixel of the row above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rasterizer {
    metadata: RasterMetadata,
    /// Per triangle, tells if it is short enough to interpolate.
    usable: Vec<bool>,
    values: Vec<Scalar>,
    no_data: Vec<bool>,
    row: usize,
    row_seed: usize,
}

impl Rasterizer {
    /// Create rasterizer covering the extent of triangulation points.
    ///
    /// # Arguments
    /// * `triangulation` - Source triangulation.
    /// * `settings` - Pixel size, background and maximum edge length are used.
    ///
    /// # Returns
    /// Rasterizer, settings error or `GridTooLarge` if the pixel buffers cannot be allocated.
    pub fn new(triangulation: &Triangulation, settings: &DemSettings) -> Result<Self> {
        settings.validate()?;
        let bounds = triangulation.bounds();
        let background = settings.background.unwrap_or(bounds.z_min);
        let metadata = RasterMetadata::from_bounds(
            &bounds,
            settings.pixel_size,
            background,
            triangulation.tolerance(),
        );
        let too_large = TinError::GridTooLarge {
            columns: metadata.columns,
            rows: metadata.rows,
        };
        let len = metadata.checked_len().ok_or_else(|| too_large.clone())?;
        let mut values = Vec::new();
        let mut no_data = Vec::new();
        values
            .try_reserve_exact(len)
            .and_then(|_| no_data.try_reserve_exact(len))
            .map_err(|_| too_large)?;
        let max_sqr = settings.max_edge_length * settings.max_edge_length;
        let usable = (0..triangulation.triangles().len())
            .map(|t| max_sqr <= 0.0 || triangulation.max_sqr_edge_length(t) <= max_sqr)
            .collect::<Vec<_>>();
        tracing::debug!(
            columns = metadata.columns,
            rows = metadata.rows,
            disregarded = usable.iter().filter(|v| !**v).count(),
            "prepared raster"
        );
        Ok(Self {
            metadata,
            usable,
            values,
            no_data,
            row: 0,
            row_seed: 0,
        })
    }

    pub fn metadata(&self) -> &RasterMetadata {
        &self.metadata
    }

    /// Returns `(finished rows, total rows)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.row, self.metadata.rows)
    }

    pub fn is_done(&self) -> bool {
        self.row >= self.metadata.rows
    }

    /// Interpolates next row.
    ///
    /// # Returns
    /// `true` if a row was processed, `false` if all rows are already done.
    pub fn rasterize_row(&mut self, triangulation: &Triangulation) -> Result<bool> {
        if self.is_done() {
            return Ok(false);
        }
        let offset = self.values.len();
        self.values
            .resize(offset + self.metadata.columns, self.metadata.background);
        self.no_data.resize(offset + self.metadata.columns, true);
        self.row_seed = scan_row(
            &self.metadata,
            &self.usable,
            triangulation,
            self.row,
            self.row_seed,
            &mut self.values[offset..],
            &mut self.no_data[offset..],
        )?;
        self.row += 1;
        Ok(true)
    }

    /// Interpolates all remaining rows and returns the grid.
    #[cfg(not(feature = "parallel"))]
    pub fn rasterize(mut self, triangulation: &Triangulation) -> Result<DemGrid> {
        while self.rasterize_row(triangulation)? {}
        self.finish()
    }

    /// Interpolates all remaining rows in parallel and returns the grid.
    ///
    /// Rows are independent here: every row walk starts at triangle 0 instead of the triangle
    /// found in the row above. Values match the sequential path except for pixels lying exactly
    /// on an edge shared by two triangles, where either triangle may be picked. Driving the
    /// rasterizer with `rasterize_row` keeps the row to row seeding.
    #[cfg(feature = "parallel")]
    pub fn rasterize(mut self, triangulation: &Triangulation) -> Result<DemGrid> {
        let first_row = self.row;
        let offset = self.values.len();
        self.values
            .resize(self.metadata.len(), self.metadata.background);
        self.no_data.resize(self.metadata.len(), true);
        let metadata = &self.metadata;
        let usable = &self.usable;
        let columns = metadata.columns.max(1);
        self.values[offset..]
            .par_chunks_mut(columns)
            .zip(self.no_data[offset..].par_chunks_mut(columns))
            .enumerate()
            .try_for_each(|(index, (row, no_data))| {
                scan_row(
                    metadata,
                    usable,
                    triangulation,
                    first_row + index,
                    0,
                    row,
                    no_data,
                )
                .map(|_| ())
            })?;
        self.row = self.metadata.rows;
        self.finish()
    }

    /// Turns finished rasterizer into grid.
    ///
    /// # Returns
    /// Grid or `WrongDataLength` error if some rows were not processed yet.
    pub fn finish(self) -> Result<DemGrid> {
        let grid = DemGrid::with_no_data(self.metadata, self.values, self.no_data)?;
        tracing::info!(
            columns = grid.width(),
            rows = grid.height(),
            "rasterized elevation grid"
        );
        Ok(grid)
    }
}

/// Fills `out` with values of given row and `no_data` with pixels left at background.
///
/// # Returns
/// Triangle found for the second pixel, or `seed` for single column rows.
fn scan_row(
    metadata: &RasterMetadata,
    usable: &[bool],
    triangulation: &Triangulation,
    row: usize,
    seed: usize,
    out: &mut [Scalar],
    no_data: &mut [bool],
) -> Result<usize> {
    let mut triangle = seed;
    let mut next_seed = seed;
    for (col, (value, empty)) in out.iter_mut().zip(no_data.iter_mut()).enumerate() {
        let center = metadata.pixel_center(row, col);
        let location = triangulation.locate(center.x, center.y, triangle)?;
        triangle = location.triangle();
        (*value, *empty) = match location.containing() {
            Some((t, bary)) if usable[t] => (triangulation.interpolate(t, bary), false),
            _ => (metadata.background, true),
        };
        if col == 1 {
            next_seed = triangle;
        }
    }
    Ok(next_seed)
}

/// Rasterizes whole triangulation at once.
///
/// With the `parallel` feature rows are interpolated independently, each starting its walk at
/// triangle 0.
///
/// # Examples
/// ```
/// use tin_dem_core::prelude::*;
///
/// let points = PointSet::from_iter(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 1.0, 2.0]]);
/// let settings = DemSettings::default();
/// let triangulation = triangulate(points, &settings).unwrap();
/// let grid = rasterize(&triangulation, &settings).unwrap();
/// assert_eq!(grid.values(), &[2.0, 0.0, 0.0, 1.0]);
/// ```
pub fn rasterize(triangulation: &Triangulation, settings: &DemSettings) -> Result<DemGrid> {
    Rasterizer::new(triangulation, settings)?.rasterize(triangulation)
}

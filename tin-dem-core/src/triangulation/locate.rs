use crate::{
    coord::Coord,
    error::{Result, TinError},
    triangle::Neighbor,
    triangulation::Triangulation,
    Scalar,
};
use serde::{Deserialize, Serialize};

/// Result of walking the triangulation towards a point.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum Location {
    /// Point lies strictly inside triangle.
    Inside {
        triangle: usize,
        bary: [Scalar; 3],
    },
    /// Point lies on an edge or a corner of triangle (within tolerance).
    OnEdge {
        triangle: usize,
        bary: [Scalar; 3],
    },
    /// Point lies outside the convex hull; `last` is the hull triangle the walk stopped at.
    Outside { last: usize },
}

impl Location {
    /// Triangle the walk ended at, good for seeding the next nearby search.
    pub fn triangle(&self) -> usize {
        match self {
            Self::Inside { triangle, .. } | Self::OnEdge { triangle, .. } => *triangle,
            Self::Outside { last } => *last,
        }
    }

    /// Returns containing triangle with barycentric coordinates, if any.
    pub fn containing(&self) -> Option<(usize, [Scalar; 3])> {
        match self {
            Self::Inside { triangle, bary } | Self::OnEdge { triangle, bary } => {
                Some((*triangle, *bary))
            }
            Self::Outside { .. } => None,
        }
    }

    pub fn is_outside(&self) -> bool {
        matches!(self, Self::Outside { .. })
    }
}

impl Triangulation {
    /// Computes barycentric coordinates of `point` relative to triangle corners.
    pub fn barycentric(&self, triangle: usize, point: Coord) -> [Scalar; 3] {
        let [a, b, c] = self.triangle_coords(triangle);
        let da = a - c;
        let db = b - c;
        let d = point - c;
        let det = da.cross(db);
        let b0 = d.cross(db) / det;
        let b1 = da.cross(d) / det;
        [b0, b1, 1.0 - b0 - b1]
    }

    /// Walks from `start` triangle towards `(x, y)`.
    ///
    /// # Arguments
    /// * `x` - X value.
    /// * `y` - Y value.
    /// * `start` - Triangle to start the walk at (out of range values start at triangle 0).
    ///
    /// # Returns
    /// Location or `InternalInconsistency` error if the walk does not terminate.
    ///
    /// # Examples
    /// ```
    /// use tin_dem_core::prelude::*;
    ///
    /// let points = PointSet::from_iter(vec![
    ///     [0.0, 0.0, 0.0],
    ///     [4.0, 0.0, 0.0],
    ///     [0.0, 4.0, 0.0],
    ///     [4.0, 4.0, 0.0],
    ///     [2.0, 1.0, 0.0],
    /// ]);
    /// let triangulation = triangulate(points, &DemSettings::default()).unwrap();
    /// let inside = triangulation.locate(1.0, 3.0, 0).unwrap();
    /// assert!(matches!(inside, Location::Inside { .. }));
    /// let outside = triangulation.locate(-1.0, 3.0, inside.triangle()).unwrap();
    /// assert!(outside.is_outside());
    /// let corner = triangulation.locate(4.0, 4.0, 0).unwrap();
    /// assert!(matches!(corner, Location::OnEdge { .. }));
    /// ```
    pub fn locate(&self, x: Scalar, y: Scalar, start: usize) -> Result<Location> {
        let point = Coord::new(x, y);
        let tol = self.tolerance();
        let steps = self.triangles().len();
        let mut triangle = if start < steps { start } else { 0 };
        for _ in 0..steps {
            let bary = self.barycentric(triangle, point);
            let edge = if bary.iter().all(|v| *v > tol) {
                return Ok(Location::Inside { triangle, bary });
            } else if bary[0] < -tol {
                1
            } else if bary[1] < -tol {
                2
            } else if bary[2] < -tol {
                0
            } else {
                return Ok(Location::OnEdge { triangle, bary });
            };
            match self.neighbors()[triangle][edge] {
                Neighbor::Interior(next) => triangle = next,
                Neighbor::Boundary(_) => return Ok(Location::Outside { last: triangle }),
            }
        }
        tracing::error!(x, y, steps, "point location walk did not terminate");
        Err(TinError::InternalInconsistency { x, y, steps })
    }
}

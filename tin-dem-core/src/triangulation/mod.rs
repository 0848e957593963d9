pub mod builder;
pub mod locate;

use crate::{
    coord::Coord,
    points::{Bounds, PointSet},
    predicates::in_circumcircle,
    triangle::{EdgeRef, Neighbor, Triangle},
    Scalar,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural defect found by [`Triangulation::validate`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyViolation {
    #[error("Triangle {triangle} is not counter-clockwise")]
    NotCounterClockwise { triangle: usize },
    #[error("Edge {edge} of triangle {triangle} has no matching neighbor edge")]
    AsymmetricNeighbor { triangle: usize, edge: usize },
    #[error("Hull edge {edge} of triangle {triangle} links to an edge that does not continue it")]
    BrokenBoundaryLink { triangle: usize, edge: usize },
    #[error("Hull links visit {visited} edges but the hull has {expected}")]
    OpenBoundaryCycle { visited: usize, expected: usize },
    #[error("Triangulation has {triangles} triangles but {expected} are expected")]
    TriangleCount { triangles: usize, expected: usize },
}

/// Delaunay triangulation of the planar projection of sample points.
///
/// Immutable once built; see [`triangulate`](crate::triangulation::builder::triangulate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangulation {
    points: PointSet,
    triangles: Vec<Triangle>,
    neighbors: Vec<[Neighbor; 3]>,
    bounds: Bounds,
    tolerance: Scalar,
    removed_doublets: usize,
}

impl Triangulation {
    pub(crate) fn new(
        points: PointSet,
        triangles: Vec<Triangle>,
        neighbors: Vec<[Neighbor; 3]>,
        bounds: Bounds,
        tolerance: Scalar,
        removed_doublets: usize,
    ) -> Self {
        Self {
            points,
            triangles,
            neighbors,
            bounds,
            tolerance,
            removed_doublets,
        }
    }

    /// Points left after doublet removal. Triangles index into these.
    pub fn points(&self) -> &PointSet {
        &self.points
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Per triangle, what lies across each of its edges.
    pub fn neighbors(&self) -> &[[Neighbor; 3]] {
        &self.neighbors
    }

    #[inline]
    pub fn neighbor(&self, edge: EdgeRef) -> Neighbor {
        self.neighbors[edge.triangle][edge.edge]
    }

    /// Extent of the input points.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Relative tolerance used while building.
    pub fn tolerance(&self) -> Scalar {
        self.tolerance
    }

    /// Number of coincident input points dropped before building.
    pub fn removed_doublets(&self) -> usize {
        self.removed_doublets
    }

    /// Returns planar coordinates of triangle corners.
    pub fn triangle_coords(&self, triangle: usize) -> [Coord; 3] {
        let t = self.triangles[triangle];
        [
            self.points.coord(t.a),
            self.points.coord(t.b),
            self.points.coord(t.c),
        ]
    }

    /// Returns the largest squared edge length of triangle.
    pub fn max_sqr_edge_length(&self, triangle: usize) -> Scalar {
        let [a, b, c] = self.triangle_coords(triangle);
        (b - a)
            .sqr_magnitude()
            .max((c - b).sqr_magnitude())
            .max((a - c).sqr_magnitude())
    }

    /// Linearly interpolates height inside triangle.
    ///
    /// # Arguments
    /// * `triangle` - Triangle index.
    /// * `bary` - Barycentric coordinates relative to triangle corners.
    pub fn interpolate(&self, triangle: usize, bary: [Scalar; 3]) -> Scalar {
        let t = self.triangles[triangle];
        bary[0] * self.points.z(t.a) + bary[1] * self.points.z(t.b) + bary[2] * self.points.z(t.c)
    }

    /// Returns hull edges in counter-clockwise order, following the boundary links.
    pub fn hull_edges(&self) -> Vec<EdgeRef> {
        let first = self
            .neighbors
            .iter()
            .enumerate()
            .flat_map(|(t, n)| (0..3).map(move |e| (EdgeRef::new(t, e), n[e])))
            .find(|(_, n)| n.is_boundary())
            .map(|(edge, _)| edge);
        let mut result = vec![];
        let mut current = match first {
            Some(edge) => edge,
            None => return result,
        };
        let limit = self.triangles.len() * 3;
        loop {
            result.push(current);
            match self.neighbor(current) {
                Neighbor::Boundary(next) if next != result[0] && result.len() <= limit => {
                    current = next
                }
                _ => break,
            }
        }
        result
    }

    /// Number of points on the convex hull boundary.
    pub fn hull_vertex_count(&self) -> usize {
        self.neighbors
            .iter()
            .flat_map(|n| n.iter())
            .filter(|n| n.is_boundary())
            .count()
    }

    /// Checks winding, neighbor symmetry, hull link cycle and the Euler relation
    /// `T = 2n - b - 2`.
    pub fn validate(&self) -> Result<(), TopologyViolation> {
        for (index, triangle) in self.triangles.iter().enumerate() {
            let [a, b, c] = self.triangle_coords(index);
            if (b - a).cross(c - a) <= 0.0 {
                return Err(TopologyViolation::NotCounterClockwise { triangle: index });
            }
            for edge in 0..3 {
                let (start, end) = triangle.edge(edge);
                match self.neighbors[index][edge] {
                    Neighbor::Interior(other) => {
                        let matching = (0..3)
                            .filter(|f| self.neighbors[other][*f] == Neighbor::Interior(index))
                            .collect::<Vec<_>>();
                        if matching.len() != 1
                            || self.triangles[other].edge(matching[0]) != (end, start)
                        {
                            return Err(TopologyViolation::AsymmetricNeighbor {
                                triangle: index,
                                edge,
                            });
                        }
                    }
                    Neighbor::Boundary(link) => {
                        let valid = link.triangle < self.triangles.len()
                            && link.edge < 3
                            && self.neighbor(link).is_boundary()
                            && self.triangles[link.triangle][link.edge] == end;
                        if !valid {
                            return Err(TopologyViolation::BrokenBoundaryLink {
                                triangle: index,
                                edge,
                            });
                        }
                    }
                }
            }
        }
        let expected = self.hull_vertex_count();
        let visited = self.hull_edges().len();
        if visited != expected {
            return Err(TopologyViolation::OpenBoundaryCycle { visited, expected });
        }
        let expected = (2 * self.points.len()).saturating_sub(expected + 2);
        if self.triangles.len() != expected {
            return Err(TopologyViolation::TriangleCount {
                triangles: self.triangles.len(),
                expected,
            });
        }
        Ok(())
    }

    /// Returns `(triangle, point)` pairs where point lies strictly inside the circumcircle of
    /// triangle, allowing relative slack of `tolerance`.
    pub fn delaunay_violations(&self, tolerance: Scalar) -> Vec<(usize, usize)> {
        let mut result = vec![];
        for (index, triangle) in self.triangles.iter().enumerate() {
            let [a, b, c] = self.triangle_coords(index);
            for point in 0..self.points.len() {
                if triangle.position(point).is_none()
                    && in_circumcircle(a, b, c, self.points.coord(point), tolerance)
                {
                    result.push((index, point));
                }
            }
        }
        result
    }

    /// Tells if no point lies strictly inside any triangle's circumcircle.
    pub fn is_delaunay(&self, tolerance: Scalar) -> bool {
        self.delaunay_violations(tolerance).is_empty()
    }
}

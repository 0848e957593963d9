use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Triangle made of three point indices in counter-clockwise order.
///
/// Edge `e` runs from vertex `e` to vertex `(e + 1) % 3`.
///
/// # Examples
/// ```
/// use tin_dem_core::prelude::*;
///
/// let triangle = Triangle::from([4, 7, 9]);
/// assert_eq!(triangle[1], 7);
/// assert_eq!(triangle.edge(2), (9, 4));
/// assert_eq!(triangle.position(9), Some(2));
/// assert_eq!(triangle.position(5), None);
/// ```
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    /// First point.
    pub a: usize,
    /// Second point.
    pub b: usize,
    /// Third point.
    pub c: usize,
}

impl Triangle {
    #[inline]
    pub fn new(a: usize, b: usize, c: usize) -> Self {
        Self { a, b, c }
    }

    /// Returns point indices as array.
    #[inline]
    pub fn vertices(&self) -> [usize; 3] {
        [self.a, self.b, self.c]
    }

    /// Returns `(start, end)` point indices of given edge.
    #[inline]
    pub fn edge(&self, edge: usize) -> (usize, usize) {
        (self[edge], self[(edge + 1) % 3])
    }

    /// Returns local position of point in this triangle.
    #[inline]
    pub fn position(&self, point: usize) -> Option<usize> {
        self.vertices().iter().position(|v| *v == point)
    }
}

impl From<[usize; 3]> for Triangle {
    fn from([a, b, c]: [usize; 3]) -> Self {
        Self { a, b, c }
    }
}

impl Index<usize> for Triangle {
    type Output = usize;

    fn index(&self, index: usize) -> &usize {
        match index {
            0 => &self.a,
            1 => &self.b,
            2 => &self.c,
            _ => panic!("Triangle vertex index out of range: {}", index),
        }
    }
}

impl IndexMut<usize> for Triangle {
    fn index_mut(&mut self, index: usize) -> &mut usize {
        match index {
            0 => &mut self.a,
            1 => &mut self.b,
            2 => &mut self.c,
            _ => panic!("Triangle vertex index out of range: {}", index),
        }
    }
}

/// Reference to a single edge of a triangle.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeRef {
    /// Triangle index.
    pub triangle: usize,
    /// Local edge index (0, 1 or 2).
    pub edge: usize,
}

impl EdgeRef {
    #[inline]
    pub fn new(triangle: usize, edge: usize) -> Self {
        Self { triangle, edge }
    }
}

/// What lies across a triangle edge.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Neighbor {
    /// Edge is shared with this triangle.
    Interior(usize),
    /// Edge lies on the convex hull; holds the next hull edge in counter-clockwise order.
    Boundary(EdgeRef),
}

impl Neighbor {
    /// Returns next hull edge if edge lies on the hull.
    #[inline]
    pub fn boundary(self) -> Option<EdgeRef> {
        match self {
            Self::Interior(_) => None,
            Self::Boundary(link) => Some(link),
        }
    }

    #[inline]
    pub fn is_boundary(self) -> bool {
        matches!(self, Self::Boundary(_))
    }
}

use crate::{
    coord::Coord,
    error::{Result, TinError},
    Scalar,
};
use serde::{Deserialize, Serialize};
use std::iter::FromIterator;

/// Scattered sample points stored as three parallel coordinate arrays.
///
/// # Examples
/// ```
/// use tin_dem_core::prelude::*;
///
/// let points = PointSet::new(vec![0.0, 1.0], vec![0.0, 0.0], vec![5.0, 6.0]).unwrap();
/// assert_eq!(points.len(), 2);
/// assert_eq!(points.coord(1), Coord::new(1.0, 0.0));
/// assert_eq!(
///     PointSet::new(vec![0.0], vec![], vec![0.0]),
///     Err(TinError::MismatchedLengths { x: 1, y: 0, z: 1 }),
/// );
/// ```
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    /// X values.
    pub x: Vec<Scalar>,
    /// Y values.
    pub y: Vec<Scalar>,
    /// Z values.
    pub z: Vec<Scalar>,
}

impl PointSet {
    /// Create new point set.
    ///
    /// # Arguments
    /// * `x` - X values.
    /// * `y` - Y values.
    /// * `z` - Z values.
    ///
    /// # Returns
    /// Point set or error if arrays differ in length.
    pub fn new(x: Vec<Scalar>, y: Vec<Scalar>, z: Vec<Scalar>) -> Result<Self> {
        let result = Self { x, y, z };
        result.check_lengths()?;
        Ok(result)
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Planar coordinate of point.
    #[inline]
    pub fn coord(&self, index: usize) -> Coord {
        Coord::new(self.x[index], self.y[index])
    }

    /// Height of point.
    #[inline]
    pub fn z(&self, index: usize) -> Scalar {
        self.z[index]
    }

    /// Appends point.
    pub fn push(&mut self, x: Scalar, y: Scalar, z: Scalar) {
        self.x.push(x);
        self.y.push(y);
        self.z.push(z);
    }

    fn check_lengths(&self) -> Result<()> {
        if self.x.len() == self.y.len() && self.x.len() == self.z.len() {
            Ok(())
        } else {
            Err(TinError::MismatchedLengths {
                x: self.x.len(),
                y: self.y.len(),
                z: self.z.len(),
            })
        }
    }

    fn check_finite(&self) -> Result<()> {
        let found = self
            .x
            .iter()
            .zip(self.y.iter())
            .zip(self.z.iter())
            .position(|((x, y), z)| !x.is_finite() || !y.is_finite() || !z.is_finite());
        match found {
            Some(index) => Err(TinError::NonFiniteCoordinate { index }),
            None => Ok(()),
        }
    }
}

impl FromIterator<[Scalar; 3]> for PointSet {
    fn from_iter<I: IntoIterator<Item = [Scalar; 3]>>(iter: I) -> Self {
        let mut result = Self::default();
        for [x, y, z] in iter {
            result.push(x, y, z);
        }
        result
    }
}

/// Axis aligned extent of the sample points.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: Scalar,
    pub x_max: Scalar,
    pub y_min: Scalar,
    pub y_max: Scalar,
    pub z_min: Scalar,
    pub z_max: Scalar,
}

impl Bounds {
    fn from_point(x: Scalar, y: Scalar, z: Scalar) -> Self {
        Self {
            x_min: x,
            x_max: x,
            y_min: y,
            y_max: y,
            z_min: z,
            z_max: z,
        }
    }

    fn include(&mut self, x: Scalar, y: Scalar, z: Scalar) {
        self.x_min = self.x_min.min(x);
        self.x_max = self.x_max.max(x);
        self.y_min = self.y_min.min(y);
        self.y_max = self.y_max.max(y);
        self.z_min = self.z_min.min(z);
        self.z_max = self.z_max.max(z);
    }
}

/// Points ready for triangulation: coincident points removed and a lexicographic order.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedPoints {
    /// Remaining points, in their original relative order.
    pub points: PointSet,
    /// Sorted position to point index.
    pub perm: Vec<usize>,
    /// Extent of all input points.
    pub bounds: Bounds,
    /// Number of dropped coincident points.
    pub removed_doublets: usize,
}

#[inline]
fn within_tolerance(a: Scalar, b: Scalar, tolerance: Scalar) -> bool {
    let cmax = a.abs().max(b.abs());
    !((a - b).abs() > tolerance * cmax && cmax > tolerance)
}

/// Lexicographic `(x, y)` comparison where components closer than `tolerance` relative to their
/// magnitude count as equal.
///
/// # Examples
/// ```
/// use tin_dem_core::prelude::*;
///
/// let tol = 1.0e-9;
/// assert!(less(Coord::new(0.0, 5.0), Coord::new(1.0, 0.0), tol));
/// assert!(less(Coord::new(1.0, 0.0), Coord::new(1.0, 0.5), tol));
/// assert!(!less(Coord::new(1.0, 0.0), Coord::new(1.0 + 1.0e-12, 0.0), tol));
/// ```
pub fn less(p: Coord, q: Coord, tolerance: Scalar) -> bool {
    if !within_tolerance(p.x, q.x, tolerance) {
        p.x < q.x
    } else if !within_tolerance(p.y, q.y, tolerance) {
        p.y < q.y
    } else {
        false
    }
}

/// Tells if both coordinates of `p` and `q` match within `tolerance`.
pub fn coincident(p: Coord, q: Coord, tolerance: Scalar) -> bool {
    within_tolerance(p.x, q.x, tolerance) && within_tolerance(p.y, q.y, tolerance)
}

fn shift_down(points: &PointSet, perm: &mut [usize], mut i: usize, upper: usize, tol: Scalar) {
    let t = perm[i];
    loop {
        let mut j = 2 * i + 1;
        if j >= upper {
            break;
        }
        if j + 1 < upper && less(points.coord(perm[j]), points.coord(perm[j + 1]), tol) {
            j += 1;
        }
        if less(points.coord(perm[j]), points.coord(t), tol) {
            break;
        }
        perm[i] = perm[j];
        i = j;
    }
    perm[i] = t;
}

/// Heap sorts `perm` so that the points it refers to are in increasing [`less`] order.
pub fn heap_sort(points: &PointSet, perm: &mut [usize], tolerance: Scalar) {
    let n = perm.len();
    for i in (0..n / 2).rev() {
        shift_down(points, perm, i, n, tolerance);
    }
    for end in (1..n).rev() {
        perm.swap(0, end);
        shift_down(points, perm, 0, end, tolerance);
    }
}

/// Sorts points, computes their extent and drops coincident points.
///
/// # Arguments
/// * `points` - Raw sample points.
/// * `tolerance` - Relative tolerance (already passed through
///   [`relative_tolerance`](crate::predicates::relative_tolerance)).
///
/// # Returns
/// Prepared points or error.
///
/// # Examples
/// ```
/// use tin_dem_core::prelude::*;
///
/// let points = PointSet::new(
///     vec![1.0, 0.0, 1.0, 0.0],
///     vec![0.0, 0.0, 0.0, 1.0],
///     vec![1.0, 0.0, 3.0, 2.0],
/// ).unwrap();
/// let prepared = prepare(points, 1.0e-9).unwrap();
/// assert_eq!(prepared.removed_doublets, 1);
/// assert_eq!(prepared.points.len(), 3);
/// assert_eq!(prepared.bounds.z_max, 3.0);
/// ```
pub fn prepare(points: PointSet, tolerance: Scalar) -> Result<PreparedPoints> {
    points.check_lengths()?;
    points.check_finite()?;
    let count = points.len();
    if count < 3 {
        return Err(TinError::InsufficientPoints { remaining: count });
    }

    let mut perm = (0..count).collect::<Vec<_>>();
    heap_sort(&points, &mut perm, tolerance);

    let first = perm[0];
    let mut bounds = Bounds::from_point(points.x[first], points.y[first], points.z[first]);
    let mut doublet = vec![false; count];
    let mut removed_doublets = 0;
    for pair in perm.windows(2) {
        let (prev, index) = (pair[0], pair[1]);
        bounds.include(points.x[index], points.y[index], points.z[index]);
        if coincident(points.coord(prev), points.coord(index), tolerance) {
            doublet[index] = true;
            removed_doublets += 1;
        }
    }

    let (points, perm) = if removed_doublets > 0 {
        let mut remap = vec![0; count];
        let mut kept = PointSet::default();
        for index in 0..count {
            if !doublet[index] {
                remap[index] = kept.len();
                kept.push(points.x[index], points.y[index], points.z[index]);
            }
        }
        let perm = perm
            .into_iter()
            .filter(|index| !doublet[*index])
            .map(|index| remap[index])
            .collect::<Vec<_>>();
        (kept, perm)
    } else {
        (points, perm)
    };

    tracing::debug!(
        points = points.len(),
        removed_doublets,
        "sorted points and removed doublets"
    );
    if points.len() < 3 {
        return Err(TinError::InsufficientPoints {
            remaining: points.len(),
        });
    }
    Ok(PreparedPoints {
        points,
        perm,
        bounds,
        removed_doublets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted_coords(prepared: &PreparedPoints) -> Vec<(Scalar, Scalar)> {
        prepared
            .perm
            .iter()
            .map(|i| (prepared.points.x[*i], prepared.points.y[*i]))
            .collect()
    }

    #[test]
    fn test_sorts_lexicographically() {
        let points = PointSet::from_iter(vec![
            [3.0, 1.0, 0.0],
            [1.0, 2.0, 0.0],
            [1.0, -1.0, 0.0],
            [2.0, 0.0, 0.0],
            [-4.0, 7.0, 0.0],
        ]);
        let prepared = prepare(points, 1.0e-12).unwrap();
        assert_eq!(
            sorted_coords(&prepared),
            vec![(-4.0, 7.0), (1.0, -1.0), (1.0, 2.0), (2.0, 0.0), (3.0, 1.0)]
        );
        assert_eq!(prepared.removed_doublets, 0);
        assert_eq!(
            prepared.bounds,
            Bounds {
                x_min: -4.0,
                x_max: 3.0,
                y_min: -1.0,
                y_max: 7.0,
                z_min: 0.0,
                z_max: 0.0,
            }
        );
    }

    #[test]
    fn test_removes_near_duplicates() {
        let points = PointSet::from_iter(vec![
            [0.0, 0.0, 1.0],
            [10.0, 0.0, 2.0],
            [10.0 * (1.0 + 1.0e-11), 0.0, 9.0],
            [0.0, 10.0, 3.0],
            [0.0, 10.0, 4.0],
        ]);
        let prepared = prepare(points, 1.0e-9).unwrap();
        assert_eq!(prepared.removed_doublets, 2);
        assert_eq!(prepared.points.len(), 3);
        assert_eq!(prepared.perm.len(), 3);
        let mut perm = prepared.perm.clone();
        perm.sort_unstable();
        assert_eq!(perm, vec![0, 1, 2]);
        for pair in prepared.perm.windows(2) {
            assert!(less(
                prepared.points.coord(pair[0]),
                prepared.points.coord(pair[1]),
                1.0e-9
            ));
        }
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            prepare(PointSet::from_iter(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]), 1.0e-9),
            Err(TinError::InsufficientPoints { remaining: 2 })
        );
        assert_eq!(
            prepare(
                PointSet::from_iter(vec![[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0, 2.0]]),
                1.0e-9
            ),
            Err(TinError::InsufficientPoints { remaining: 1 })
        );
        assert_eq!(
            prepare(
                PointSet::from_iter(vec![[0.0, 0.0, 0.0], [1.0, Scalar::NAN, 0.0], [2.0, 0.0, 0.0]]),
                1.0e-9
            ),
            Err(TinError::NonFiniteCoordinate { index: 1 })
        );
        let mismatched = PointSet {
            x: vec![0.0; 3],
            y: vec![0.0; 3],
            z: vec![0.0; 2],
        };
        assert_eq!(
            prepare(mismatched, 1.0e-9),
            Err(TinError::MismatchedLengths { x: 3, y: 3, z: 2 })
        );
    }
}

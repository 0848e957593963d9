//! Tolerance aware geometric predicates.
//!
//! Every test scales the caller's relative tolerance by the magnitude of the coordinate
//! differences involved, so results stay meaningful for both tiny local coordinates and large
//! projected ones (e.g. UTM eastings).

use crate::{coord::Coord, Scalar};
use serde::{Deserialize, Serialize};

/// Relative tolerance used when none is configured.
pub const DEFAULT_TOLERANCE: Scalar = 1.0e-20;

/// Position of a point relative to a directed line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Point lies to the left (counter-clockwise side).
    Left,
    /// Point lies to the right (clockwise side).
    Right,
    /// Point lies on the line within tolerance, or the line degenerates to a point.
    OnLine,
}

/// Diagonal picked for a convex quadrilateral by the empty circumcircle criterion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagonal {
    /// Diagonal from vertex 0 to vertex 2.
    Diag02,
    /// Diagonal from vertex 1 to vertex 3.
    Diag13,
    /// All four vertices are cocircular, both diagonals are valid.
    Cocircular,
}

/// Returns `max(tolerance, 100 * eps)` where `eps` is the unit roundoff of [`Scalar`].
///
/// ```
/// use tin_dem_core::prelude::*;
///
/// assert_eq!(relative_tolerance(1.0e-9), 1.0e-9);
/// assert_eq!(relative_tolerance(0.0), 100.0 * f64::EPSILON / 2.0);
/// ```
pub fn relative_tolerance(tolerance: Scalar) -> Scalar {
    tolerance.max(100.0 * Scalar::EPSILON / 2.0)
}

/// Classifies `u` against the directed line through `v1` and `v2`, shifted by `offset` to the
/// left (negative `offset` shifts it to the right).
///
/// # Arguments
/// * `u` - Tested point.
/// * `v1` - Line start.
/// * `v2` - Line end.
/// * `offset` - Signed perpendicular distance of the tested line from `v1 -> v2`.
/// * `tolerance` - Relative tolerance.
///
/// # Examples
/// ```
/// use tin_dem_core::prelude::*;
///
/// let a = Coord::new(0.0, 0.0);
/// let b = Coord::new(1.0, 0.0);
/// assert_eq!(orientation(Coord::new(0.5, 1.0), a, b, 0.0, 1.0e-12), Orientation::Left);
/// assert_eq!(orientation(Coord::new(0.5, -1.0), a, b, 0.0, 1.0e-12), Orientation::Right);
/// assert_eq!(orientation(Coord::new(3.0, 0.0), a, b, 0.0, 1.0e-12), Orientation::OnLine);
/// assert_eq!(orientation(Coord::new(0.5, 1.0), a, b, 2.0, 1.0e-12), Orientation::Right);
/// ```
pub fn orientation(
    u: Coord,
    v1: Coord,
    v2: Coord,
    offset: Scalar,
    tolerance: Scalar,
) -> Orientation {
    let d = v2 - v1;
    let du = u - v1;
    let scale = d.max_abs().max(du.max_abs()).max(offset.abs());
    let mut t = d.y * du.x - d.x * du.y;
    if offset != 0.0 {
        t += offset * d.magnitude();
    }
    if t.abs() <= tolerance * scale {
        Orientation::OnLine
    } else if t < 0.0 {
        Orientation::Left
    } else {
        Orientation::Right
    }
}

/// Decides which diagonal of the convex quadrilateral `p0 p1 p2 p3` (counter-clockwise) keeps
/// both resulting triangles' circumcircles empty.
///
/// The angles at `p0` and `p2` are first compared through their dot products; only when that
/// is inconclusive the sign of `sin(a0 + a2)` is evaluated.
///
/// # Examples
/// ```
/// use tin_dem_core::prelude::*;
///
/// let flat = [
///     Coord::new(0.0, 0.0),
///     Coord::new(2.0, -1.0),
///     Coord::new(4.0, 0.0),
///     Coord::new(2.0, 1.0),
/// ];
/// assert_eq!(choose_diagonal(flat[0], flat[1], flat[2], flat[3], 1.0e-12), Diagonal::Diag13);
/// assert_eq!(choose_diagonal(flat[1], flat[2], flat[3], flat[0], 1.0e-12), Diagonal::Diag02);
/// ```
pub fn choose_diagonal(
    p0: Coord,
    p1: Coord,
    p2: Coord,
    p3: Coord,
    tolerance: Scalar,
) -> Diagonal {
    let d10 = p1 - p0;
    let d12 = p1 - p2;
    let d30 = p3 - p0;
    let d32 = p3 - p2;
    let tola = tolerance * d10.max_abs().max(d30.max_abs());
    let tolb = tolerance * d12.max_abs().max(d32.max_abs());
    let ca = d10.dot(d30);
    let cb = d12.dot(d32);
    if ca > tola && cb > tolb {
        Diagonal::Diag13
    } else if ca < -tola && cb < -tolb {
        Diagonal::Diag02
    } else {
        let tol = tola.max(tolb);
        let s = d10.cross(d30) * cb + d32.cross(d12) * ca;
        if s > tol {
            Diagonal::Diag13
        } else if s < -tol {
            Diagonal::Diag02
        } else {
            Diagonal::Cocircular
        }
    }
}

/// Tells if `d` lies strictly inside the circumcircle of the counter-clockwise triangle
/// `a b c`, allowing a relative slack of `tolerance` on the squared radius.
pub fn in_circumcircle(a: Coord, b: Coord, c: Coord, d: Coord, tolerance: Scalar) -> bool {
    let ab = b - a;
    let ac = c - a;
    let det = 2.0 * ab.cross(ac);
    if det == 0.0 {
        return false;
    }
    let lb = ab.sqr_magnitude();
    let lc = ac.sqr_magnitude();
    let center = Coord::new(
        a.x + (ac.y * lb - ab.y * lc) / det,
        a.y + (ab.x * lc - ac.x * lb) / det,
    );
    let radius = (a - center).sqr_magnitude();
    (d - center).sqr_magnitude() < radius * (1.0 - tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: Scalar = 1.0e-12;

    #[test]
    fn test_orientation_degenerate_line() {
        let p = Coord::new(1.0, 1.0);
        assert_eq!(
            orientation(Coord::new(5.0, 5.0), p, p, 0.0, TOL),
            Orientation::OnLine
        );
        assert_eq!(orientation(p, p, p, 0.0, TOL), Orientation::OnLine);
    }

    #[test]
    fn test_orientation_scales_with_magnitude() {
        let a = Coord::new(500_000.0, 6_000_000.0);
        let b = Coord::new(500_010.0, 6_000_000.0);
        let above = Coord::new(500_005.0, 6_000_000.001);
        assert_eq!(orientation(above, a, b, 0.0, TOL), Orientation::Left);
        assert_eq!(orientation(above, b, a, 0.0, TOL), Orientation::Right);
        let nearly = Coord::new(500_005.0, 6_000_000.0 + 1.0e-13);
        assert_eq!(orientation(nearly, a, b, 0.0, TOL), Orientation::OnLine);
    }

    #[test]
    fn test_orientation_offset() {
        let a = Coord::new(0.0, 0.0);
        let b = Coord::new(0.0, 2.0);
        let u = Coord::new(-1.0, 1.0);
        assert_eq!(orientation(u, a, b, 0.0, TOL), Orientation::Left);
        assert_eq!(orientation(u, a, b, 1.0, TOL), Orientation::OnLine);
        assert_eq!(orientation(u, a, b, 1.5, TOL), Orientation::Right);
        assert_eq!(orientation(u, a, b, -1.0, TOL), Orientation::Left);
    }

    #[test]
    fn test_choose_diagonal_square_is_cocircular() {
        let square = [
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(1.0, 1.0),
            Coord::new(0.0, 1.0),
        ];
        assert_eq!(
            choose_diagonal(square[0], square[1], square[2], square[3], TOL),
            Diagonal::Cocircular
        );
    }

    #[test]
    fn test_choose_diagonal_falls_back_to_signed_area() {
        // obtuse at p0, acute at p2: the dot products disagree
        let p0 = Coord::new(0.0, 0.0);
        let p1 = Coord::new(3.0, -1.0);
        let p2 = Coord::new(5.0, 0.0);
        let p3 = Coord::new(-0.5, 1.0);
        let expected = if in_circumcircle(p0, p1, p3, p2, 0.0) {
            Diagonal::Diag02
        } else {
            Diagonal::Diag13
        };
        assert_eq!(choose_diagonal(p0, p1, p2, p3, TOL), expected);
    }

    #[test]
    fn test_in_circumcircle() {
        let a = Coord::new(0.0, 0.0);
        let b = Coord::new(2.0, 0.0);
        let c = Coord::new(0.0, 2.0);
        assert!(in_circumcircle(a, b, c, Coord::new(1.0, 1.0), TOL));
        assert!(!in_circumcircle(a, b, c, Coord::new(2.0, 2.0), TOL));
        assert!(!in_circumcircle(a, b, c, Coord::new(3.0, 3.0), TOL));
    }
}

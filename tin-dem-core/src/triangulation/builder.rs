use crate::{
    coord::Coord,
    error::{Result, TinError},
    points::{prepare, PointSet, PreparedPoints},
    predicates::{choose_diagonal, orientation, relative_tolerance, Diagonal, Orientation},
    settings::DemSettings,
    triangle::{EdgeRef, Neighbor, Triangle},
    triangulation::Triangulation,
    Scalar,
};
use serde::{Deserialize, Serialize};

/// Mutable tables of a triangulation under construction.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderState {
    pub triangles: Vec<Triangle>,
    pub neighbors: Vec<[Neighbor; 3]>,
    /// Hull edge ending at the most recently inserted point.
    pub left: EdgeRef,
    /// Number of sorted points already part of the triangulation.
    pub inserted: usize,
}

impl BuilderState {
    #[inline]
    fn neighbor(&self, edge: EdgeRef) -> Neighbor {
        self.neighbors[edge.triangle][edge.edge]
    }

    #[inline]
    fn set_neighbor(&mut self, edge: EdgeRef, neighbor: Neighbor) {
        self.neighbors[edge.triangle][edge.edge] = neighbor;
    }

    #[inline]
    fn edge_points(&self, edge: EdgeRef) -> (usize, usize) {
        self.triangles[edge.triangle].edge(edge.edge)
    }

    fn link(&self, edge: EdgeRef) -> Option<EdgeRef> {
        self.neighbor(edge).boundary()
    }

    /// Rotates around `point` from `start` (an edge ending at `point`) across interior edges
    /// until the hull edge ending at `point` is found.
    fn hull_edge_ending_at(&self, start: EdgeRef, point: usize) -> Option<EdgeRef> {
        let mut current = start;
        for _ in 0..=self.triangles.len() {
            match self.neighbor(current) {
                Neighbor::Boundary(_) => return Some(current),
                Neighbor::Interior(triangle) => {
                    let position = self.triangles[triangle].position(point)?;
                    current = EdgeRef::new(triangle, (position + 2) % 3);
                }
            }
        }
        None
    }

    fn replace_neighbor(&mut self, triangle: usize, old: usize, new: usize) -> bool {
        for neighbor in &mut self.neighbors[triangle] {
            if *neighbor == Neighbor::Interior(old) {
                *neighbor = Neighbor::Interior(new);
                return true;
            }
        }
        false
    }
}

/// Triangles waiting for the empty circumcircle check, bounded by a soft capacity.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct WorkStack {
    items: Vec<usize>,
    capacity: usize,
}

impl WorkStack {
    fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    fn push(&mut self, triangle: usize) -> Result<()> {
        if self.items.len() >= self.capacity {
            return Err(TinError::StackOverflow {
                capacity: self.capacity,
            });
        }
        self.items.push(triangle);
        Ok(())
    }

    fn pop(&mut self) -> Option<usize> {
        self.items.pop()
    }
}

/// Incremental Delaunay triangulation builder.
///
/// Points are inserted in lexicographic order, so every new point lies outside the current
/// convex hull. Each insertion fans new triangles over the visible hull edges and then swaps
/// diagonals until the empty circumcircle property holds again.
///
/// # Examples
/// ```
/// use tin_dem_core::prelude::*;
///
/// let points = PointSet::from_iter(vec![
///     [0.0, 0.0, 0.0],
///     [1.0, 0.0, 0.0],
///     [0.0, 1.0, 0.0],
///     [1.0, 1.0, 0.0],
/// ]);
/// let tolerance = relative_tolerance(DEFAULT_TOLERANCE);
/// let prepared = prepare(points, tolerance).unwrap();
/// let mut builder = TriangulationBuilder::new(prepared, tolerance, 64).unwrap();
/// assert_eq!(builder.progress(), (3, 4));
/// while builder.insert_next().unwrap() {}
/// let triangulation = builder.build().unwrap();
/// assert_eq!(triangulation.triangles().len(), 2);
/// assert!(triangulation.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangulationBuilder {
    prepared: PreparedPoints,
    tolerance: Scalar,
    state: BuilderState,
    stack: WorkStack,
}

impl TriangulationBuilder {
    /// Create builder and seed it with the first non-degenerate triangle fan.
    ///
    /// # Arguments
    /// * `prepared` - Sorted points without doublets.
    /// * `tolerance` - Relative tolerance.
    /// * `stack_capacity` - Maximum number of triangles waiting for legalization.
    ///
    /// # Returns
    /// Builder or `AllPointsCollinear` error.
    pub fn new(prepared: PreparedPoints, tolerance: Scalar, stack_capacity: usize) -> Result<Self> {
        if prepared.perm.len() < 3 {
            return Err(TinError::InsufficientPoints {
                remaining: prepared.perm.len(),
            });
        }
        let state = seed(&prepared, tolerance)?;
        tracing::debug!(
            seed_points = state.inserted,
            seed_triangles = state.triangles.len(),
            "seeded triangulation"
        );
        Ok(Self {
            prepared,
            tolerance,
            state,
            stack: WorkStack::new(stack_capacity),
        })
    }

    /// Returns `(inserted points, total points)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.state.inserted, self.prepared.perm.len())
    }

    pub fn is_done(&self) -> bool {
        self.state.inserted >= self.prepared.perm.len()
    }

    /// Current builder tables.
    pub fn state(&self) -> &BuilderState {
        &self.state
    }

    /// Inserts next point in sorted order.
    ///
    /// # Returns
    /// `true` if a point was inserted, `false` if all points are already inserted.
    pub fn insert_next(&mut self) -> Result<bool> {
        if self.is_done() {
            return Ok(false);
        }
        let point = self.prepared.perm[self.state.inserted];
        self.insert(point)?;
        self.state.inserted += 1;
        Ok(true)
    }

    /// Inserts all remaining points and returns finished triangulation.
    pub fn build(mut self) -> Result<Triangulation> {
        while self.insert_next()? {}
        let PreparedPoints {
            points,
            bounds,
            removed_doublets,
            ..
        } = self.prepared;
        let BuilderState {
            triangles,
            neighbors,
            ..
        } = self.state;
        tracing::info!(
            points = points.len(),
            triangles = triangles.len(),
            removed_doublets,
            "built Delaunay triangulation"
        );
        Ok(Triangulation::new(
            points,
            triangles,
            neighbors,
            bounds,
            self.tolerance,
            removed_doublets,
        ))
    }

    #[inline]
    fn coord(&self, point: usize) -> Coord {
        self.prepared.points.coord(point)
    }

    fn side(&self, point: Coord, edge: EdgeRef) -> Orientation {
        let (a, b) = self.state.edge_points(edge);
        orientation(point, self.coord(a), self.coord(b), 0.0, self.tolerance)
    }

    fn inconsistency(&self, point: usize) -> TinError {
        let coord = self.coord(point);
        tracing::error!(x = coord.x, y = coord.y, "triangulation topology is inconsistent");
        TinError::InternalInconsistency {
            x: coord.x,
            y: coord.y,
            steps: self.state.triangles.len(),
        }
    }

    fn link(&self, edge: EdgeRef, point: usize) -> Result<EdgeRef> {
        self.state
            .link(edge)
            .ok_or_else(|| self.inconsistency(point))
    }

    /// Finds the first hull edge that `point` does not see before the visible chain and the last
    /// visible hull edge.
    ///
    /// # Returns
    /// `(left, right)` hull edges.
    fn visible_boundary_edges(&self, point: usize) -> Result<(EdgeRef, EdgeRef)> {
        let p = self.coord(point);
        let limit = self.state.triangles.len() * 3;
        let left = self.state.left;
        let (mut left, fixed, mut right) = if self.side(p, left) == Orientation::Right {
            (left, false, left)
        } else {
            (left, true, self.link(left, point)?)
        };

        let mut steps = 0;
        loop {
            let next = self.link(right, point)?;
            if self.side(p, next) != Orientation::Right {
                break;
            }
            right = next;
            steps += 1;
            if steps > limit {
                return Err(self.inconsistency(point));
            }
        }

        if !fixed {
            loop {
                let (start, _) = self.state.edge_points(left);
                left = self
                    .state
                    .hull_edge_ending_at(EdgeRef::new(left.triangle, (left.edge + 2) % 3), start)
                    .ok_or_else(|| self.inconsistency(point))?;
                if self.side(p, left) != Orientation::Right {
                    break;
                }
                steps += 1;
                if steps > limit {
                    return Err(self.inconsistency(point));
                }
            }
        }
        Ok((left, right))
    }

    fn insert(&mut self, point: usize) -> Result<()> {
        let (left, right) = self.visible_boundary_edges(point)?;
        let first = self.state.triangles.len();
        let mut next = self.link(left, point)?;
        loop {
            let current = next;
            next = self.link(current, point)?;
            let (start, end) = self.state.edge_points(current);
            let created = self.state.triangles.len();
            self.state.triangles.push(Triangle::new(end, start, point));
            self.state.neighbors.push([
                Neighbor::Interior(current.triangle),
                Neighbor::Interior(created.saturating_sub(1)),
                Neighbor::Interior(created + 1),
            ]);
            self.state
                .set_neighbor(current, Neighbor::Interior(created));
            self.stack.push(created)?;
            if current == right {
                break;
            }
        }
        let last = self.state.triangles.len() - 1;
        self.state
            .set_neighbor(left, Neighbor::Boundary(EdgeRef::new(first, 1)));
        self.state.neighbors[first][1] = Neighbor::Boundary(EdgeRef::new(last, 2));
        self.state.neighbors[last][2] = Neighbor::Boundary(next);
        self.state.left = EdgeRef::new(first, 1);
        self.legalize(point)
    }

    /// Pops triangles containing `point` and swaps the diagonal opposite to it while the
    /// neighbor's apex violates the empty circumcircle property.
    fn legalize(&mut self, point: usize) -> Result<()> {
        let p = self.coord(point);
        while let Some(t) = self.stack.pop() {
            let e = match self.state.triangles[t].position(point) {
                Some(position) => (position + 1) % 3,
                None => continue,
            };
            let u = match self.state.neighbors[t][e] {
                Neighbor::Interior(u) => u,
                Neighbor::Boundary(_) => continue,
            };
            let f = match (0..3).find(|f| self.state.neighbors[u][*f] == Neighbor::Interior(t)) {
                Some(f) => f,
                None => return Err(self.inconsistency(point)),
            };
            let (a, b) = self.state.triangles[t].edge(e);
            let c = self.state.triangles[u][(f + 2) % 3];
            let diagonal =
                choose_diagonal(p, self.coord(a), self.coord(c), self.coord(b), self.tolerance);
            if diagonal != Diagonal::Diag02 {
                continue;
            }
            tracing::trace!(t, u, point, opposite = c, "swapping diagonal");

            let (ep1, em1) = ((e + 1) % 3, (e + 2) % 3);
            let (fp1, fm1) = ((f + 1) % 3, (f + 2) % 3);
            self.state.triangles[t][ep1] = c;
            self.state.triangles[u][fp1] = point;
            let r = self.state.neighbors[t][ep1];
            let s = self.state.neighbors[u][fp1];
            self.state.neighbors[t][ep1] = Neighbor::Interior(u);
            self.state.neighbors[u][fp1] = Neighbor::Interior(t);
            self.state.neighbors[t][e] = s;
            self.state.neighbors[u][f] = r;
            if !self.state.neighbors[u][fm1].is_boundary() {
                self.stack.push(u)?;
            }

            match s {
                Neighbor::Interior(s) => {
                    if !self.state.replace_neighbor(s, u, t) {
                        return Err(self.inconsistency(point));
                    }
                    self.stack.push(t)?;
                }
                Neighbor::Boundary(_) => {
                    if self.state.left == EdgeRef::new(u, fp1) {
                        self.state.left = EdgeRef::new(t, e);
                    }
                    let previous = self
                        .state
                        .hull_edge_ending_at(EdgeRef::new(t, em1), a)
                        .ok_or_else(|| self.inconsistency(point))?;
                    self.state
                        .set_neighbor(previous, Neighbor::Boundary(EdgeRef::new(t, e)));
                }
            }

            match r {
                Neighbor::Interior(r) => {
                    if !self.state.replace_neighbor(r, t, u) {
                        return Err(self.inconsistency(point));
                    }
                }
                Neighbor::Boundary(_) => {
                    if self.state.left == EdgeRef::new(t, ep1) {
                        self.state.left = EdgeRef::new(u, f);
                    }
                    let previous = self
                        .state
                        .hull_edge_ending_at(EdgeRef::new(u, fm1), b)
                        .ok_or_else(|| self.inconsistency(point))?;
                    self.state
                        .set_neighbor(previous, Neighbor::Boundary(EdgeRef::new(u, f)));
                }
            }
        }
        Ok(())
    }
}

/// Builds the initial fan from the collinear prefix of sorted points and the first point off
/// their line.
fn seed(prepared: &PreparedPoints, tolerance: Scalar) -> Result<BuilderState> {
    let perm = &prepared.perm;
    let points = &prepared.points;
    let (m1, m2) = (points.coord(perm[0]), points.coord(perm[1]));
    let mut j = 2;
    let (apex, side) = loop {
        let apex = match perm.get(j) {
            Some(apex) => *apex,
            None => return Err(TinError::AllPointsCollinear),
        };
        match orientation(points.coord(apex), m1, m2, 0.0, tolerance) {
            Orientation::OnLine => j += 1,
            side => break (apex, side),
        }
    };

    let count = j - 1;
    let last = count - 1;
    let mut state = BuilderState {
        triangles: Vec::with_capacity(2 * perm.len()),
        neighbors: Vec::with_capacity(2 * perm.len()),
        left: EdgeRef::default(),
        inserted: j + 1,
    };
    let boundary = |triangle, edge| Neighbor::Boundary(EdgeRef::new(triangle, edge));
    for k in 0..count {
        if side == Orientation::Left {
            state
                .triangles
                .push(Triangle::new(perm[k], perm[k + 1], apex));
            state.neighbors.push([
                if k < last {
                    boundary(k + 1, 0)
                } else {
                    boundary(k, 1)
                },
                if k < last {
                    Neighbor::Interior(k + 1)
                } else {
                    boundary(0, 2)
                },
                if k > 0 {
                    Neighbor::Interior(k - 1)
                } else {
                    boundary(0, 0)
                },
            ]);
        } else {
            state
                .triangles
                .push(Triangle::new(perm[k + 1], perm[k], apex));
            state.neighbors.push([
                if k > 0 {
                    boundary(k - 1, 0)
                } else {
                    boundary(0, 1)
                },
                if k > 0 {
                    Neighbor::Interior(k - 1)
                } else {
                    boundary(last, 2)
                },
                if k < last {
                    Neighbor::Interior(k + 1)
                } else {
                    boundary(last, 0)
                },
            ]);
        }
    }
    state.left = if side == Orientation::Left {
        EdgeRef::new(last, 1)
    } else {
        EdgeRef::new(0, 1)
    };
    Ok(state)
}

/// Triangulates raw points with given settings.
///
/// # Arguments
/// * `points` - Sample points.
/// * `settings` - Settings (tolerance and stack capacity are used).
///
/// # Returns
/// Triangulation or error.
///
/// # Examples
/// ```
/// use tin_dem_core::prelude::*;
///
/// let points = PointSet::from_iter(vec![
///     [0.0, 0.0, 0.0],
///     [2.0, 0.0, 0.0],
///     [1.0, 2.0, 0.0],
///     [1.0, 0.5, 0.0],
/// ]);
/// let triangulation = triangulate(points, &DemSettings::default()).unwrap();
/// assert_eq!(triangulation.triangles().len(), 3);
/// assert_eq!(triangulation.hull_vertex_count(), 3);
/// ```
pub fn triangulate(points: PointSet, settings: &DemSettings) -> Result<Triangulation> {
    let tolerance = relative_tolerance(settings.tolerance);
    let prepared = prepare(points, tolerance)?;
    TriangulationBuilder::new(prepared, tolerance, settings.stack_capacity)?.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: Scalar = 1.0e-12;

    fn build(points: Vec<[Scalar; 3]>) -> Result<Triangulation> {
        let prepared = prepare(PointSet::from_iter(points), TOL)?;
        TriangulationBuilder::new(prepared, TOL, 1 << 10)?.build()
    }

    #[test]
    fn test_single_triangle_both_windings() {
        for apex in [[0.5, 1.0, 0.0], [0.5, -1.0, 0.0]] {
            let triangulation = build(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], apex]).unwrap();
            assert_eq!(triangulation.triangles().len(), 1);
            assert_eq!(triangulation.validate(), Ok(()));
            assert_eq!(triangulation.hull_edges().len(), 3);
        }
    }

    #[test]
    fn test_collinear_prefix_fan() {
        for apex_y in [1.0, -1.0] {
            let triangulation = build(vec![
                [0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 2.0, 0.0],
                [0.0, 3.0, 0.0],
                [2.0, apex_y, 0.0],
            ])
            .unwrap();
            assert_eq!(triangulation.triangles().len(), 3);
            assert_eq!(triangulation.validate(), Ok(()));
            assert!(triangulation.is_delaunay(1.0e-9));
        }
    }

    #[test]
    fn test_square_grid() {
        let points = (0..5)
            .flat_map(|x| (0..4).map(move |y| [x as Scalar, y as Scalar, (x * y) as Scalar]))
            .collect::<Vec<_>>();
        let triangulation = build(points).unwrap();
        assert_eq!(triangulation.validate(), Ok(()));
        assert_eq!(triangulation.hull_vertex_count(), 14);
        assert_eq!(triangulation.triangles().len(), 2 * 20 - 14 - 2);
        assert!(triangulation.is_delaunay(1.0e-9));
    }

    #[test]
    fn test_all_collinear() {
        assert_eq!(
            build(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]),
            Err(TinError::AllPointsCollinear)
        );
    }

    #[test]
    fn test_stack_overflow() {
        let points = PointSet::from_iter(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [2.0, 0.5, 0.0],
        ]);
        let prepared = prepare(points, TOL).unwrap();
        let result = TriangulationBuilder::new(prepared, TOL, 0).and_then(|b| b.build());
        assert_eq!(result, Err(TinError::StackOverflow { capacity: 0 }));
    }
}

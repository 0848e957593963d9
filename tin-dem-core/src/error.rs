use crate::{grid::DemGridError, Scalar};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TinError>;

/// Error thrown while building the triangulation or rasterizing it.
///
/// Every variant is terminal for the current invocation. Pixels outside the convex hull or
/// inside disregarded triangles are never reported as errors, they get the background value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TinError {
    /// Coordinate arrays have different lengths.
    #[error("Coordinate arrays differ in length (x: {x}, y: {y}, z: {z})")]
    MismatchedLengths { x: usize, y: usize, z: usize },
    /// A coordinate is NaN or infinite.
    #[error("Point {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },
    /// Fewer than three points are left after removing doublets.
    #[error("Number of points is less than three ({remaining} left after removing doublets)")]
    InsufficientPoints { remaining: usize },
    /// No three points span a triangle.
    #[error("All points are collinear (in floating point arithmetic)")]
    AllPointsCollinear,
    /// Edge legalization needed more room than configured.
    #[error("Legalization stack exceeded its capacity of {capacity} triangles")]
    StackOverflow { capacity: usize },
    /// Point location walk did not terminate on a mesh that should be Delaunay.
    #[error("Point location of ({x}, {y}) did not terminate after {steps} steps")]
    InternalInconsistency { x: Scalar, y: Scalar, steps: usize },
    /// Pixel size is not a positive finite number.
    #[error("Pixel size must be positive and finite, got {0}")]
    InvalidPixelSize(Scalar),
    /// Maximum edge length is negative or not finite.
    #[error("Maximum edge length must be zero or positive and finite, got {0}")]
    InvalidMaxEdgeLength(Scalar),
    /// Grid of that many pixels cannot be allocated.
    #[error("Grid of {columns} x {rows} pixels is too large")]
    GridTooLarge { columns: usize, rows: usize },
    /// Output grid could not be assembled.
    #[error(transparent)]
    Grid(#[from] DemGridError),
    /// Observer asked to stop processing.
    #[error("Processing was cancelled")]
    Cancelled,
    /// Generator was driven after it completed, failed or handed out its output.
    #[error("Generator has already completed")]
    AlreadyCompleted,
}

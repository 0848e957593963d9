pub mod coord;
pub mod error;
pub mod generator;
pub mod grid;
pub mod points;
pub mod predicates;
pub mod raster;
pub mod settings;
pub mod triangle;
pub mod triangulation;

/// Scalar type.
pub type Scalar = f64;

pub mod prelude {
    pub use crate::{
        coord::*, error::TinError, generator::process_status::*, generator::*, grid::*,
        points::*, predicates::*, raster::*, settings::*, triangle::*,
        triangulation::builder::*, triangulation::locate::*, triangulation::*, Scalar,
    };
}

use crate::{
    points::PointSet, raster::Rasterizer, triangulation::builder::TriangulationBuilder,
    triangulation::Triangulation,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum ProcessingChange {
    Preparing {
        points: PointSet,
    },
    Triangulating {
        builder: TriangulationBuilder,
    },
    Rasterizing {
        triangulation: Triangulation,
        rasterizer: Rasterizer,
    },
}

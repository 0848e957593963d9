use thiserror::Error;
use tin_dem_core::error::TinError;
use tin_dem_image::DemImageError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Elevation grid error: {0}")]
    Dem(#[from] TinError),
    #[error("Elevation image error: {0}")]
    DemImage(#[from] DemImageError),
    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },
}

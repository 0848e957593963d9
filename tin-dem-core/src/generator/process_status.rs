use serde::{Deserialize, Serialize};

/// Elevation grid processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessStatus {
    /// There is work left for further processing steps.
    InProgress,
    /// Output was produced during last processing step.
    Completed,
}

/// Stage the generator is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratorStage {
    /// Sorting points and removing doublets.
    Preparing,
    /// Inserting points one at a time.
    Triangulating,
    /// Interpolating grid rows one at a time.
    Rasterizing,
    /// Nothing left to do (output ready, taken or generation failed).
    Completed,
}

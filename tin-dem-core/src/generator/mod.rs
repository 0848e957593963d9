pub mod process_status;
mod processing_change;

use crate::{
    error::{Result, TinError},
    generator::{
        process_status::{GeneratorStage, ProcessStatus},
        processing_change::ProcessingChange,
    },
    grid::DemGrid,
    points::{prepare, PointSet},
    predicates::relative_tolerance,
    raster::{rasterize, Rasterizer},
    settings::DemSettings,
    triangulation::{
        builder::{triangulate, TriangulationBuilder},
        Triangulation,
    },
    Scalar,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Triangulation together with the elevation grid interpolated from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemOutput {
    pub triangulation: Triangulation,
    pub grid: DemGrid,
}

/// Step-wise elevation grid generator.
///
/// Every call to [`process`](DemGenerator::process) does a bounded amount of work: all of the
/// point preparation, a single point insertion or a single grid row, so progress can be
/// reported and generation cancelled in between.
///
/// # Examples
/// ```
/// use tin_dem_core::prelude::*;
///
/// let mut generator = DemGenerator::new(
///     vec![0.0, 1.0, 0.0],
///     vec![0.0, 0.0, 1.0],
///     vec![0.0, 1.0, 2.0],
///     DemSettings::default(),
/// ).unwrap();
/// assert_eq!(generator.stage(), GeneratorStage::Preparing);
/// generator.process_wait().unwrap();
/// assert_eq!(generator.stage(), GeneratorStage::Completed);
/// let output = generator.into_output().unwrap();
/// assert_eq!(output.grid.values(), &[2.0, 0.0, 0.0, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemGenerator {
    settings: DemSettings,
    current: Option<ProcessingChange>,
    output: Option<DemOutput>,
}

impl DemGenerator {
    /// Create new generator.
    ///
    /// # Arguments
    /// * `x` - X values.
    /// * `y` - Y values.
    /// * `z` - Z values.
    /// * `settings` - Settings.
    ///
    /// # Returns
    /// New generator instance or error if arrays differ in length.
    pub fn new(
        x: Vec<Scalar>,
        y: Vec<Scalar>,
        z: Vec<Scalar>,
        settings: DemSettings,
    ) -> Result<Self> {
        Ok(Self::from_points(PointSet::new(x, y, z)?, settings))
    }

    /// Create new generator from point set.
    pub fn from_points(points: PointSet, settings: DemSettings) -> Self {
        Self {
            settings,
            current: Some(ProcessingChange::Preparing { points }),
            output: None,
        }
    }

    pub fn settings(&self) -> &DemSettings {
        &self.settings
    }

    /// Get generated output if generation is completed.
    pub fn output(&self) -> Option<&DemOutput> {
        self.output.as_ref()
    }

    pub fn into_output(self) -> Option<DemOutput> {
        self.output
    }

    /// Tells if there is work left to process.
    pub fn in_progress(&self) -> bool {
        self.current.is_some()
    }

    /// Returns current stage.
    pub fn stage(&self) -> GeneratorStage {
        match &self.current {
            Some(ProcessingChange::Preparing { .. }) => GeneratorStage::Preparing,
            Some(ProcessingChange::Triangulating { .. }) => GeneratorStage::Triangulating,
            Some(ProcessingChange::Rasterizing { .. }) => GeneratorStage::Rasterizing,
            None => GeneratorStage::Completed,
        }
    }

    /// Get processing progress of current stage.
    ///
    /// # Returns
    /// `(current, limit, percentage)`
    pub fn progress(&self) -> (usize, usize, Scalar) {
        let (current, limit) = match &self.current {
            Some(ProcessingChange::Preparing { points }) => (0, points.len()),
            Some(ProcessingChange::Triangulating { builder }) => builder.progress(),
            Some(ProcessingChange::Rasterizing { rasterizer, .. }) => rasterizer.progress(),
            None => match &self.output {
                Some(output) => (output.grid.height(), output.grid.height()),
                None => (0, 0),
            },
        };
        let factor = if limit > 0 {
            current as Scalar / limit as Scalar
        } else {
            0.0
        };
        (current, limit, factor)
    }

    /// Process single step.
    ///
    /// # Returns
    /// Result with process status when ok, otherwise error. Processing a generator that has
    /// nothing left to do gives `AlreadyCompleted` error.
    pub fn process(&mut self) -> Result<ProcessStatus> {
        let current = match self.current.take() {
            Some(current) => current,
            None => return Err(TinError::AlreadyCompleted),
        };
        match current {
            ProcessingChange::Preparing { points } => {
                self.settings.validate()?;
                let tolerance = relative_tolerance(self.settings.tolerance);
                let prepared = prepare(points, tolerance)?;
                let builder =
                    TriangulationBuilder::new(prepared, tolerance, self.settings.stack_capacity)?;
                self.current = Some(ProcessingChange::Triangulating { builder });
                Ok(ProcessStatus::InProgress)
            }
            ProcessingChange::Triangulating { mut builder } => {
                if builder.insert_next()? {
                    self.current = Some(ProcessingChange::Triangulating { builder });
                } else {
                    let triangulation = builder.build()?;
                    let rasterizer = Rasterizer::new(&triangulation, &self.settings)?;
                    self.current = Some(ProcessingChange::Rasterizing {
                        triangulation,
                        rasterizer,
                    });
                }
                Ok(ProcessStatus::InProgress)
            }
            ProcessingChange::Rasterizing {
                triangulation,
                mut rasterizer,
            } => {
                rasterizer.rasterize_row(&triangulation)?;
                if rasterizer.is_done() {
                    let grid = rasterizer.finish()?;
                    self.output = Some(DemOutput {
                        triangulation,
                        grid,
                    });
                    Ok(ProcessStatus::Completed)
                } else {
                    self.current = Some(ProcessingChange::Rasterizing {
                        triangulation,
                        rasterizer,
                    });
                    Ok(ProcessStatus::InProgress)
                }
            }
        }
    }

    /// Process until output is ready.
    ///
    /// # Returns
    /// Ok or generation error.
    pub fn process_wait(&mut self) -> Result<()> {
        while self.process()? == ProcessStatus::InProgress {}
        Ok(())
    }

    /// Process until output is ready or time runs out.
    ///
    /// # Arguments
    /// * `timeout` - Duration of time that processing can take.
    ///
    /// # Returns
    /// Process status or generation error.
    pub fn process_wait_timeout(&mut self, timeout: Duration) -> Result<ProcessStatus> {
        let timer = Instant::now();
        loop {
            let status = self.process()?;
            if status != ProcessStatus::InProgress || timer.elapsed() > timeout {
                return Ok(status);
            }
        }
    }

    /// Process until output is ready.
    ///
    /// # Arguments
    /// * `f` - Callback triggered on every processing step. Signature: `fn(progress, limit, factor)`.
    ///
    /// # Returns
    /// Ok or generation error.
    pub fn process_wait_tracked<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(usize, usize, Scalar),
    {
        self.process_wait_cancellable(|c, l, p| {
            f(c, l, p);
            true
        })
    }

    /// Process until output is ready or observer asks to stop.
    ///
    /// # Arguments
    /// * `f` - Callback triggered on every processing step, returning `false` cancels.
    ///   Signature: `fn(progress, limit, factor) -> bool`.
    ///
    /// # Returns
    /// Ok, `Cancelled` error or generation error. Cancelled generator has nothing left to do.
    pub fn process_wait_cancellable<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(usize, usize, Scalar) -> bool,
    {
        loop {
            let (c, l, p) = self.progress();
            if !f(c, l, p) {
                tracing::info!(stage = ?self.stage(), "generation cancelled");
                self.current = None;
                return Err(TinError::Cancelled);
            }
            if self.process()? != ProcessStatus::InProgress {
                let (c, l, p) = self.progress();
                f(c, l, p);
                return Ok(());
            }
        }
    }

    /// Process until output is ready or time runs out.
    ///
    /// # Arguments
    /// * `f` - Callback triggered on every processing step. Signature: `fn(progress, limit, factor)`.
    /// * `timeout` - Duration of time that processing can take.
    ///
    /// # Returns
    /// Process status or generation error.
    pub fn process_wait_timeout_tracked<F>(
        &mut self,
        mut f: F,
        timeout: Duration,
    ) -> Result<ProcessStatus>
    where
        F: FnMut(usize, usize, Scalar),
    {
        let timer = Instant::now();
        let (c, l, p) = self.progress();
        f(c, l, p);
        loop {
            let status = self.process()?;
            let (c, l, p) = self.progress();
            f(c, l, p);
            if status != ProcessStatus::InProgress || timer.elapsed() > timeout {
                return Ok(status);
            }
        }
    }
}

/// Triangulates points and interpolates the elevation grid in one go.
///
/// # Arguments
/// * `x` - X values.
/// * `y` - Y values.
/// * `z` - Z values.
/// * `settings` - Settings.
///
/// # Returns
/// Triangulation and grid, or error.
///
/// # Examples
/// ```
/// use tin_dem_core::prelude::*;
///
/// let output = generate_dem(
///     vec![0.0, 2.0, 0.0, 2.0],
///     vec![0.0, 0.0, 2.0, 2.0],
///     vec![1.0, 1.0, 1.0, 1.0],
///     &DemSettings::default(),
/// ).unwrap();
/// assert_eq!(output.grid.width(), 3);
/// assert!(output.grid.values().iter().all(|v| (v - 1.0).abs() < 1.0e-12));
/// ```
pub fn generate_dem(
    x: Vec<Scalar>,
    y: Vec<Scalar>,
    z: Vec<Scalar>,
    settings: &DemSettings,
) -> Result<DemOutput> {
    settings.validate()?;
    let triangulation = triangulate(PointSet::new(x, y, z)?, settings)?;
    let grid = rasterize(&triangulation, settings)?;
    Ok(DemOutput {
        triangulation,
        grid,
    })
}

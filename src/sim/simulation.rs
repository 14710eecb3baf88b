//! Trial driver: owns one surface, its actuator and the settled baseline
//!
//! A trial starts from `reset`, which either restores the stored baseline or
//! builds and settles a fresh surface and keeps a deep copy of it. Cutting
//! only ever touches the working copy.

use glam::Vec2;

use super::actuator::{Actuator, ActuatorInput};
use super::point::PointId;
use super::score::{ScoreBreakdown, Scorer};
use super::state::{Surface, Tensioner};
use super::tick::StepReport;
use super::trajectory::circle;
use crate::config::ExperimentConfig;
use crate::consts::{PATTERN_CENTER, PATTERN_RADIUS, PATTERN_WAYPOINTS};
use crate::error::{ConfigError, SimError};
use crate::persistence::Snapshot;

#[derive(Debug, Clone)]
pub struct Simulation {
    config: ExperimentConfig,
    surface: Surface,
    actuator: Actuator,
    baseline: Option<(Surface, Actuator)>,
    scorer: Scorer,
}

impl Simulation {
    /// Build an unsettled surface from `config`
    pub fn new(config: ExperimentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (surface, actuator) = build(&config)?;
        Ok(Self {
            scorer: Scorer::new(config.score),
            config,
            surface,
            actuator,
            baseline: None,
        })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn actuator(&self) -> &Actuator {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut Actuator {
        &mut self.actuator
    }

    /// Settled surface that `reset` restores, once one has been stored
    pub fn baseline(&self) -> Option<&Surface> {
        self.baseline.as_ref().map(|(surface, _)| surface)
    }

    /// Restore the baseline, or build, settle and store one
    pub fn reset(&mut self) -> crate::Result<()> {
        if let Some((surface, actuator)) = &self.baseline {
            self.surface = surface.clone();
            self.actuator = actuator.clone();
            log::info!("Surface reset to stored baseline");
            return Ok(());
        }

        let (surface, actuator) = build(&self.config)?;
        self.surface = surface;
        self.actuator = actuator;
        self.settle(self.config.simulation.settle_steps)?;
        self.baseline = Some((self.surface.clone(), self.actuator.clone()));
        log::info!(
            "Stored baseline after {} settle steps ({} points)",
            self.config.simulation.settle_steps,
            self.surface.live_count()
        );
        Ok(())
    }

    /// Drop the stored baseline so the next `reset` rebuilds from config
    pub fn clear_baseline(&mut self) {
        self.baseline = None;
    }

    /// Step `steps` times with a released actuator
    pub fn settle(&mut self, steps: u32) -> Result<(), SimError> {
        let mut idle = self.actuator.clone();
        idle.release();
        for i in 0..steps {
            self.surface.step(&mut idle)?;
            if (i + 1) % 100 == 0 {
                log::debug!("Settling: {}/{} steps", i + 1, steps);
            }
        }
        Ok(())
    }

    /// Apply one tick of input and run `update_iterations` physics steps
    pub fn update(&mut self, input: &ActuatorInput) -> Result<StepReport, SimError> {
        self.actuator.apply(input);
        let mut report = StepReport::default();
        for _ in 0..self.config.simulation.update_iterations {
            report.merge(self.surface.step(&mut self.actuator)?);
        }
        Ok(report)
    }

    pub fn move_actuator(&mut self, x: f32, y: f32) {
        self.actuator.move_to(x, y);
    }

    pub fn pin_position(&mut self, x: f32, y: f32, max_displacement: Option<f32>) -> Option<Tensioner> {
        self.surface.pin_position(x, y, max_displacement)
    }

    pub fn unpin_position(&mut self, x: f32, y: f32) -> Option<PointId> {
        self.surface.unpin_position(x, y)
    }

    pub fn tension(&mut self, tensioner: &Tensioner, delta: Vec2) -> Option<Vec2> {
        self.surface.tension(tensioner.point, delta)
    }

    /// Configured cut waypoints, or the default circle around the pattern
    pub fn trajectory(&self) -> Vec<Vec2> {
        match &self.config.trajectory {
            Some(points) => points.clone(),
            None => circle(Vec2::splat(PATTERN_CENTER), PATTERN_RADIUS, PATTERN_WAYPOINTS),
        }
    }

    /// Feed every input through `update`, then lift the actuator
    pub fn run_trajectory<I>(&mut self, inputs: I) -> Result<StepReport, SimError>
    where
        I: IntoIterator<Item = ActuatorInput>,
    {
        let mut report = StepReport::default();
        let mut ticks = 0usize;
        for input in inputs {
            report.merge(self.update(&input)?);
            ticks += 1;
        }
        report.merge(self.update(&ActuatorInput {
            release: true,
            ..Default::default()
        })?);

        log::info!(
            "Trajectory done after {} ticks: {} links cut, {} torn, {} points removed",
            ticks,
            report.cut,
            report.torn,
            report.removed.len()
        );
        Ok(report)
    }

    /// Score against the configured target shape
    pub fn score(&self) -> f32 {
        self.scorer.score(&self.surface, &self.config.shape)
    }

    pub fn breakdown(&self) -> ScoreBreakdown {
        self.scorer.breakdown(&self.surface, &self.config.shape)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.surface.clone(), self.actuator.clone())
    }

    /// Replace the working surface and actuator. The baseline is untouched.
    pub fn restore(&mut self, snapshot: Snapshot) {
        let (surface, actuator) = snapshot.into_parts();
        self.surface = surface;
        self.actuator = actuator;
    }
}

fn build(config: &ExperimentConfig) -> Result<(Surface, Actuator), ConfigError> {
    let surface = Surface::new(&config.cloth, config.bounds, &config.shape)?;
    let actuator = Actuator::from_config(&config.actuator, config.bounds);
    Ok((surface, actuator))
}

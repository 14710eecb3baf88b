//! Experiment configuration
//!
//! One JSON document describes the cloth grid, the actuator, the boundary box,
//! the target pattern and the trial settings. Every section has defaults so a
//! partial file is enough.

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Bounds;
use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::{ActuatorMode, ScoreConfig, TargetShape};

/// Which grid points start pinned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinCondition {
    /// First and last rows
    #[default]
    TopAndBottom,
    /// Last row only
    Top,
    /// The four grid corners
    Corners,
    /// Nothing pinned
    None,
}

impl PinCondition {
    pub fn pins(&self, row: usize, col: usize, width: usize, height: usize) -> bool {
        let last_row = row + 1 == height;
        match self {
            PinCondition::TopAndBottom => row == 0 || last_row,
            PinCondition::Top => last_row,
            PinCondition::Corners => (row == 0 || last_row) && (col == 0 || col + 1 == width),
            PinCondition::None => false,
        }
    }
}

/// Cloth grid and physics parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClothConfig {
    /// Points per row
    pub width: usize,
    /// Number of rows
    pub height: usize,
    pub dx: f32,
    pub dy: f32,
    /// Position of the first grid point
    pub origin: Vec2,
    /// Downward acceleration
    pub gravity: f32,
    /// 1.0 = links snap back fully each pass; larger is stretchier
    pub elasticity: f32,
    pub damping: f32,
    pub pin: PinCondition,
    /// Relaxation passes per step
    pub iterations: u32,
    pub dt: f32,
    /// Links break when stretched past this multiple of their rest length
    pub tear_factor: Option<f32>,
}

impl Default for ClothConfig {
    fn default() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            dx: GRID_SPACING,
            dy: GRID_SPACING,
            origin: Vec2::splat(GRID_ORIGIN),
            gravity: GRAVITY,
            elasticity: 1.0,
            damping: DAMPING,
            pin: PinCondition::TopAndBottom,
            iterations: RELAXATION_ITERATIONS,
            dt: SIM_DT,
            tear_factor: None,
        }
    }
}

impl ClothConfig {
    /// Grid of `width` x `height` points, otherwise defaults
    pub fn grid(width: usize, height: usize, spacing: f32) -> Self {
        Self {
            width,
            height,
            dx: spacing,
            dy: spacing,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let too_many = self
            .width
            .checked_mul(self.height)
            .is_none_or(|n| n > u32::MAX as usize);
        if self.width == 0 || self.height == 0 || too_many {
            return Err(ConfigError::InvalidGrid {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.dx.is_finite() && self.dy.is_finite() && self.dx > 0.0 && self.dy > 0.0) {
            return Err(ConfigError::InvalidSpacing {
                dx: self.dx,
                dy: self.dy,
            });
        }
        if !self.origin.is_finite() {
            return Err(ConfigError::invalid_parameter("origin must be finite"));
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::invalid_parameter(format!(
                "gravity must be finite, got {}",
                self.gravity
            )));
        }
        if !(self.elasticity.is_finite() && self.elasticity > 0.0) {
            return Err(ConfigError::invalid_parameter(format!(
                "elasticity must be positive, got {}",
                self.elasticity
            )));
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(ConfigError::invalid_parameter(format!(
                "damping must be in [0, 1], got {}",
                self.damping
            )));
        }
        if self.iterations == 0 {
            return Err(ConfigError::invalid_parameter("iterations must be at least 1"));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::invalid_parameter(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if let Some(factor) = self.tear_factor {
            if !(factor.is_finite() && factor > 1.0) {
                return Err(ConfigError::invalid_parameter(format!(
                    "tear_factor must exceed 1, got {factor}"
                )));
            }
        }
        Ok(())
    }
}

/// Initial actuator state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Highest `z` at which the actuator still touches the cloth
    pub height_limit: f32,
    /// Starts pressed
    pub down: bool,
    pub mode: ActuatorMode,
    /// Grab radius
    pub influence: f32,
    /// Cut radius
    pub cut: f32,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            height_limit: ACTUATOR_HEIGHT_LIMIT,
            down: false,
            mode: ActuatorMode::Drag,
            influence: ACTUATOR_INFLUENCE,
            cut: ACTUATOR_CUT_RADIUS,
        }
    }
}

impl ActuatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let radii_ok = self.influence.is_finite()
            && self.cut.is_finite()
            && self.influence >= 0.0
            && self.cut >= 0.0;
        if !radii_ok {
            return Err(ConfigError::invalid_parameter(format!(
                "actuator radii must be non-negative, got influence={} cut={}",
                self.influence, self.cut
            )));
        }
        if !self.height_limit.is_finite() {
            return Err(ConfigError::invalid_parameter("height_limit must be finite"));
        }
        Ok(())
    }
}

/// Trial settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Free steps run before the baseline is stored
    pub settle_steps: u32,
    /// Physics steps per decision tick
    pub update_iterations: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            settle_steps: SETTLE_STEPS,
            update_iterations: 1,
        }
    }
}

/// Complete experiment description
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub cloth: ClothConfig,
    pub actuator: ActuatorConfig,
    pub bounds: Bounds,
    pub shape: TargetShape,
    pub simulation: SimulationConfig,
    pub score: ScoreConfig,
    /// Cut waypoints; a circle around the default pattern when absent
    pub trajectory: Option<Vec<Vec2>>,
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cloth.validate()?;
        validate_bounds(&self.bounds)?;
        self.actuator.validate()?;
        self.score.validate()?;
        if self.simulation.update_iterations == 0 {
            return Err(ConfigError::invalid_parameter(
                "update_iterations must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded experiment config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Experiment config saved to {}", path.as_ref().display());
        Ok(())
    }
}

pub fn validate_bounds(bounds: &Bounds) -> Result<(), ConfigError> {
    if bounds.is_degenerate() {
        return Err(ConfigError::DegenerateBounds {
            x: bounds.x,
            y: bounds.y,
            z: bounds.z,
        });
    }
    Ok(())
}
